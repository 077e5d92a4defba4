//! Kept in its own test binary: `:cd` changes the process working
//! directory, which would race with the other tests in a shared binary.

mod common;

use common::{interpreter, model, run_err, run_ok};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn cwd() -> PathBuf {
    std::env::current_dir().unwrap().canonicalize().unwrap()
}

#[test]
fn cd_pwd_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().canonicalize().unwrap();
    let start = cwd();
    let mut m = model(&["a"]);
    let (mut ex, _) = interpreter();

    assert_eq!(run_err(&mut ex, &mut m, "cd -"), "No previous directory");

    run_ok(&mut ex, &mut m, &[format!("cd {}", target.display()).as_str()]);
    assert_eq!(cwd(), target);
    run_ok(&mut ex, &mut m, &["pwd"]);
    let shown = m.state().status_text().map(PathBuf::from).unwrap();
    assert_eq!(shown.canonicalize().unwrap(), target);

    run_ok(&mut ex, &mut m, &["cd -"]);
    assert_eq!(cwd(), start);
    assert_eq!(m.state().session.previous_dir.as_deref(), Some(target.as_path()));
}
