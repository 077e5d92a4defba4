mod common;

use common::{interpreter, model, run_err, run_ok, text};
use core_ex::{Command, ConfirmDecision, LineRange, LineRangeSpec, MatchSpan, RunResult};
use core_state::SubstituteFlags;
use pretty_assertions::assert_eq;

fn delete_current() -> Box<Command> {
    Box::new(Command::Delete {
        range: LineRangeSpec::None,
        register: None,
    })
}

#[test]
fn global_deletes_only_lines_matching_before_the_run() {
    let mut m = model(&["keep", "hit 1", "keep", "hit 2", "keep"]);
    let (mut ex, _) = interpreter();
    let command = Command::Global {
        range: LineRangeSpec::None,
        pattern: "hit".into(),
        matching: true,
        command: delete_current(),
    };
    ex.run(&mut m, &command);
    assert!(!m.state().status_is_error());
    assert_eq!(text(&m), ["keep", "keep", "keep"]);
    assert_eq!(m.state().tracked_locations(), 0);
    assert_eq!(m.state().transaction_depth(), 0);
}

#[test]
fn global_undo_is_a_single_step() {
    let mut m = model(&["a1", "b", "a2", "b", "a3"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["g/a/d"]);
    assert_eq!(text(&m), ["b", "b"]);
    let depth = m.state().undo_depth();
    run_ok(&mut ex, &mut m, &["u"]);
    assert_eq!(text(&m), ["a1", "b", "a2", "b", "a3"]);
    assert_eq!(m.state().undo_depth(), depth - 1);
}

#[test]
fn global_stops_at_the_first_failure_and_keeps_partial_edits() {
    let mut m = model(&["x", "x", "x"]);
    let (mut ex, _) = interpreter();
    // The second run of `.,.+1d` on the last line has no line below it.
    let message = run_err(&mut ex, &mut m, "g/x/.,.+1d");
    assert_eq!(message, "Invalid address");
    assert_eq!(text(&m), ["x"]);
    assert_eq!(m.state().transaction_depth(), 0);
    run_ok(&mut ex, &mut m, &["u"]);
    assert_eq!(text(&m), ["x", "x", "x"]);
}

#[test]
fn global_with_range_and_empty_pattern() {
    let mut m = model(&["a", "a", "a", "a"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["/a", "2,3g//s/a/b/"]);
    assert_eq!(text(&m), ["a", "b", "b", "a"]);
}

#[test]
fn vglobal_on_all_matching_lines_is_informational() {
    let mut m = model(&["a", "a"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["v/a/d"]);
    assert_eq!(
        m.state().status_text(),
        Some("Pattern found in every line: a")
    );
}

fn confirm_substitute(pattern: &str) -> Command {
    Command::Substitute {
        range: LineRangeSpec::Entire,
        pattern: pattern.into(),
        replacement: "Z".into(),
        flags: SubstituteFlags::CONFIRM,
    }
}

#[test]
fn confirm_points_at_the_first_match_in_range_order() {
    let mut m = model(&["none", "xx here", "x"]);
    let (mut ex, _) = interpreter();
    match ex.run(&mut m, &confirm_substitute("x")) {
        RunResult::AwaitingSubstituteConfirmation(p) => {
            assert_eq!(p.span(), MatchSpan { line: 1, start: 0, end: 1 });
            assert_eq!(p.range(), LineRange::new(0, 2));
            assert_eq!(p.pattern(), "x");
            assert_eq!(p.replacement(), "Z");
            assert!(p.flags().contains(SubstituteFlags::CONFIRM));
            ex.abandon(&mut m, p);
        }
        RunResult::Completed => panic!("expected a confirmation prompt"),
    }
    assert_eq!(text(&m), ["none", "xx here", "x"]);
}

#[test]
fn confirm_without_matches_completes_with_not_found() {
    let mut m = model(&["none"]);
    let (mut ex, _) = interpreter();
    let result = ex.run(&mut m, &confirm_substitute("x"));
    assert!(matches!(result, RunResult::Completed));
    assert_eq!(m.state().status_text(), Some("Pattern not found: x"));
}

#[test]
fn confirm_protocol_to_the_end() {
    let mut m = model(&["x", "y", "x"]);
    let (mut ex, _) = interpreter();
    let mut result = ex.run(&mut m, &confirm_substitute("x"));
    let mut decisions = [ConfirmDecision::Skip, ConfirmDecision::Replace].into_iter();
    while let RunResult::AwaitingSubstituteConfirmation(p) = result {
        let decision = decisions.next().expect("more prompts than expected");
        result = ex.resume(&mut m, p, decision);
    }
    assert_eq!(text(&m), ["x", "y", "Z"]);
    let last = m.state().session.last_substitute.clone().unwrap();
    assert_eq!((last.pattern.as_str(), last.replacement.as_str()), ("x", "Z"));
    assert_eq!(m.state().tracked_locations(), 0);
}

#[test]
fn reuse_previous_flags() {
    let mut m = model(&["aa", "aa"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["s/a/b/g", "2s/a/c/&"]);
    assert_eq!(text(&m), ["bb", "cc"]);
}

#[test]
fn substitute_honours_ignorecase_and_smartcase() {
    let mut m = model(&["Foo foo"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["set ic", "s/foo/x/g"]);
    assert_eq!(text(&m), ["x x"]);

    let mut m = model(&["Foo foo"]);
    run_ok(&mut ex, &mut m, &["set ic scs", "s/Foo/x/g"]);
    assert_eq!(text(&m), ["x foo"]);

    let mut m = model(&["Foo foo"]);
    run_ok(&mut ex, &mut m, &["set ic"]);
    assert_eq!(run_err(&mut ex, &mut m, "s/FOO/x/I"), "Pattern not found: FOO");
    assert_eq!(text(&m), ["Foo foo"]);
}

#[test]
fn substitute_print_flag_shows_last_line() {
    let mut m = model(&["a", "a"]);
    let (mut ex, _) = interpreter();
    run_ok(&mut ex, &mut m, &["%s/a/b/#"]);
    assert_eq!(m.state().panel(), ["  2 b"]);
}
