mod common;

use common::{interpreter, model, run_err, run_ok, text};
use core_ex::{Command, LineAddress, LineRangeSpec};
use core_text::Position;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn numbered(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("l{i}")).collect()
}

proptest! {
    #[test]
    fn copy_adds_exactly_the_copied_lines(
        len in 1usize..12,
        a in 0usize..12,
        b in 0usize..12,
        dest in 0usize..13,
    ) {
        let (start, end) = (a % len, b % len);
        let (start, end) = (start.min(end), start.max(end));
        let dest = dest % (len + 1);
        let lines = numbered(len);
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let mut m = model(&refs);
        let (mut ex, _) = interpreter();
        let command = Command::Copy {
            range: LineRangeSpec::Pair {
                left: LineAddress::Number(start + 1),
                right: LineAddress::Number(end + 1),
                move_caret_first: false,
            },
            destination: LineAddress::Number(dest),
        };
        ex.run(&mut m, &command);
        prop_assert!(!m.state().status_is_error());
        let after = text(&m);
        let count = end - start + 1;
        prop_assert_eq!(after.len(), len + count);
        prop_assert_eq!(&after[dest..dest + count], &lines[start..=end]);
        prop_assert_eq!(m.cursor().line, dest + count - 1);
    }
}

#[test]
fn delete_yank_and_put_through_registers() {
    let mut m = model(&["one", "two", "three", "four"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["2,3d a", "$put a"]);
    assert_eq!(text(&m), ["one", "four", "two", "three"]);
    assert_eq!(m.cursor().line, 3);
    run_ok(&mut ex, &mut m, &["1y", "0put"]);
    assert_eq!(text(&m), ["one", "one", "four", "two", "three"]);
    run_ok(&mut ex, &mut m, &["3pu!"]);
    assert_eq!(text(&m)[2], "one");
    assert_eq!(run_err(&mut ex, &mut m, "put q"), "Nothing in register q");
}

#[test]
fn delete_reports_above_threshold() {
    let mut m = model(&["a", "b", "c", "d"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["1,3d"]);
    assert_eq!(m.state().status_text(), Some("3 fewer lines"));
    assert_eq!(text(&m), ["d"]);
    run_ok(&mut ex, &mut m, &["d"]);
    assert!(text(&m).is_empty());
    assert_eq!(m.cursor(), Position::origin());
}

#[test]
fn move_lines_and_reject_overlap() {
    let mut m = model(&["a", "b", "c", "d", "e"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["1,2m$"]);
    assert_eq!(text(&m), ["c", "d", "e", "a", "b"]);
    assert_eq!(m.cursor().line, 4);
    run_ok(&mut ex, &mut m, &["$m0"]);
    assert_eq!(text(&m), ["b", "c", "d", "e", "a"]);
    assert_eq!(m.cursor().line, 0);
    assert_eq!(
        run_err(&mut ex, &mut m, "1,3m2"),
        "Cannot move a range of lines into itself"
    );
}

#[test]
fn join_forms() {
    let mut m = model(&["a", "   b", "c", "d", "e"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["j"]);
    assert_eq!(text(&m), ["a b", "c", "d", "e"]);
    run_ok(&mut ex, &mut m, &["2j! 3"]);
    assert_eq!(text(&m), ["a b", "cde"]);
}

#[test]
fn shift_uses_shiftwidth() {
    let mut m = model(&["x", "", "\ty"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["set sw=4 et", "%>"]);
    assert_eq!(text(&m), ["    x", "", "            y"]);
    run_ok(&mut ex, &mut m, &["%<<"]);
    assert_eq!(text(&m), ["x", "", "    y"]);
}

#[test]
fn retab_changes_tabstop() {
    let mut m = model(&["\tx", "        y"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["retab! 4"]);
    assert_eq!(text(&m), ["\t\tx", "\t\ty"]);
    assert_eq!(m.state().options.tabstop(), 4);
}

#[test]
fn marks_feed_addresses() {
    let mut m = model(&["a", "b", "c"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["2ka", "3mark b", "'a,'bd"]);
    assert_eq!(text(&m), ["a"]);
    assert_eq!(run_err(&mut ex, &mut m, "mark 1"), "Invalid mark name: 1");
}

#[test]
fn jump_and_search_move_the_caret() {
    let mut m = model(&["alpha", "  beta", "gamma", "beta again"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["2"]);
    assert_eq!(m.cursor(), Position::new(1, 2));
    assert_eq!(m.state().mark('\''), Some(Position::new(0, 0)));
    run_ok(&mut ex, &mut m, &["/beta"]);
    assert_eq!(m.cursor().line, 3);
    assert_eq!(m.state().mark('\''), Some(Position::new(1, 0)));
    run_ok(&mut ex, &mut m, &["/"]);
    assert_eq!(m.cursor().line, 1);
    run_ok(&mut ex, &mut m, &["99"]);
    assert_eq!(m.cursor().line, 3);
    assert_eq!(run_err(&mut ex, &mut m, "/nothing"), "Pattern not found: nothing");
}

#[test]
fn undo_and_redo_whole_commands() {
    let mut m = model(&["a", "b", "c"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["1,2d", "u"]);
    assert_eq!(text(&m), ["a", "b", "c"]);
    run_ok(&mut ex, &mut m, &["redo"]);
    assert_eq!(text(&m), ["c"]);
    run_ok(&mut ex, &mut m, &["redo"]);
    assert_eq!(m.state().status_text(), Some("Already at newest change"));
}

#[test]
fn zero_line_buffer_rejects_line_commands() {
    let mut m = model(&[]);
    let (mut ex, _) = interpreter();
    for line in ["t0", "m0", "d", "y", "j", ">", "p", "fold", "s/a/b/"] {
        assert_eq!(run_err(&mut ex, &mut m, line), "Invalid range", "{line}");
        assert!(text(&m).is_empty(), "{line}");
    }
    assert_eq!(m.state().undo_depth(), 0);
}

#[test]
fn failed_delete_on_empty_buffer_keeps_registers() {
    let mut m = model(&["keep"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["y", "d"]);
    assert!(text(&m).is_empty());
    assert_eq!(run_err(&mut ex, &mut m, "d"), "Invalid range");
    assert_eq!(run_err(&mut ex, &mut m, "y"), "Invalid range");
    run_ok(&mut ex, &mut m, &["put", "put 0"]);
    assert_eq!(text(&m), ["keep", "keep"]);
}
