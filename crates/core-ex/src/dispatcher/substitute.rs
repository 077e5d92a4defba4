//! `:s`, `:&`, `:&&` and `:~`.
//!
//! Without the `c` flag every line of the range is rewritten in one pass
//! under a single transaction. With it, `start` stops at the first match and
//! hands back a [`PendingSubstitute`]; the caller answers each prompt through
//! `Interpreter::resume`. The pending value tracks the current line and the
//! end of the range as locations, so replacements that split lines keep the
//! rest of the walk aligned. Every confirmed replacement after the first is
//! linked into the first one's undo step.

use super::display::print_line;
use super::{ConfirmDecision, Interpreter, RunResult, count_noun, should_report};
use crate::command::{DefaultRange, LineRange, LineRangeSpec, PrintFlags};
use crate::error::ExError;
use crate::range::resolve_range;
use crate::search::{MatchSpan, Replacement, compile, expand_tilde, find_from};
use core_model::{EditorModel, ModelTransaction};
use core_state::{EditorState, SearchDirection, SubstituteFlags};
use core_text::{LocationId, Position};
use regex::Regex;
use tracing::{debug, trace};

/// A confirm-substitute stopped at a match, waiting for a decision.
#[derive(Debug)]
pub struct PendingSubstitute {
    regex: Regex,
    replacement: Replacement,
    pattern: String,
    replacement_raw: String,
    /// Flags in effect (`gdefault` applied).
    flags: SubstituteFlags,
    /// Flags as given, remembered for `:&`.
    recorded: SubstituteFlags,
    current: LocationId,
    end: LocationId,
    span: MatchSpan,
    range: LineRange,
    substitutions: usize,
    lines_changed: usize,
    last_line: Option<usize>,
}

impl PendingSubstitute {
    /// The match the prompt is about.
    pub fn span(&self) -> MatchSpan {
        self.span
    }

    pub fn range(&self) -> LineRange {
        self.range
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement_raw
    }

    pub fn flags(&self) -> SubstituteFlags {
        self.flags
    }

    /// Give back the tracked locations.
    pub fn release(self, state: &mut EditorState) {
        state.release_location(self.current);
        state.release_location(self.end);
        trace!(target: "ex.substitute", "pending_released");
    }

    fn global(&self) -> bool {
        self.flags.contains(SubstituteFlags::GLOBAL)
    }

    /// Where to look after leaving the current match alone.
    fn skip_target(&self, text: &str) -> Position {
        if !self.global() {
            return Position::new(self.span.line + 1, 0);
        }
        if !self.span_fits(text) {
            return Position::new(self.span.line, 0);
        }
        Position::new(self.span.line, step_past(text, self.span.start, self.span.end))
    }

    /// False once the line was edited under the pending match.
    fn span_fits(&self, text: &str) -> bool {
        let MatchSpan { start, end, .. } = self.span;
        start <= end
            && end <= text.len()
            && text.is_char_boundary(start)
            && text.is_char_boundary(end)
    }

    /// Move to the first match at or after `from`; false when the range is
    /// exhausted.
    fn seek(&mut self, model: &mut EditorModel, from: Position) -> bool {
        let state = model.state_mut();
        let Some(end) = state.resolve_location(self.end).map(|p| p.line) else {
            return false;
        };
        self.range.end = end;
        if from.line > end {
            return false;
        }
        let Some(span) = find_from(state.active_buffer(), &self.regex, from, end) else {
            return false;
        };
        state.release_location(self.current);
        self.current = state.track_location(Position::new(span.line, 0));
        self.span = span;
        model.set_cursor(Position::new(span.line, span.start));
        trace!(target: "ex.substitute", line = span.line, start = span.start, "next_match");
        true
    }

    /// Replace the current match; returns where the next search starts.
    fn replace_current(&mut self, model: &mut EditorModel) -> Result<Position, ExError> {
        let state = model.state();
        let line = state
            .resolve_location(self.current)
            .ok_or(ExError::InvalidAddress)?
            .line;
        let end_line = state
            .resolve_location(self.end)
            .ok_or(ExError::InvalidAddress)?
            .line;
        let text = state
            .active_buffer()
            .line(line)
            .ok_or(ExError::InvalidAddress)?;
        self.span.line = line;
        if !self.span_fits(&text) {
            debug!(target: "ex.substitute", line, "stale_match_reseek");
            return Ok(Position::new(line, 0));
        }
        let Some(caps) = self.regex.captures_at(&text, self.span.start) else {
            return Ok(self.skip_target(&text));
        };
        let Some(whole) = caps.get(0) else {
            return Ok(self.skip_target(&text));
        };
        let head = format!("{}{}", &text[..whole.start()], self.replacement.expand(&caps));
        let tail = &text[whole.end()..];
        let rewritten = format!("{head}{tail}");
        let new_lines: Vec<&str> = rewritten.split('\n').collect();
        let linked = self.substitutions > 0;
        {
            let mut txn = if linked {
                ModelTransaction::begin_linked(model, "substitute")
            } else {
                ModelTransaction::begin(model, "substitute")
            };
            txn.state_mut().splice_lines(line, 1, &new_lines);
        }
        let state = model.state_mut();
        if end_line == line && new_lines.len() > 1 {
            state.release_location(self.end);
            self.end = state.track_location(Position::new(line + new_lines.len() - 1, 0));
        }
        let after = Position::new(
            line + head.matches('\n').count(),
            head.len() - head.rfind('\n').map_or(0, |i| i + 1),
        );
        if self.last_line != Some(line) {
            self.lines_changed += 1;
        }
        self.substitutions += 1;
        self.last_line = Some(after.line);
        trace!(target: "ex.substitute", line, inserted = new_lines.len(), "confirmed_replace");
        Ok(if !self.global() {
            Position::new(line + new_lines.len(), 0)
        } else if whole.start() == whole.end() {
            let next = tail.chars().next().map_or(1, char::len_utf8);
            Position::new(after.line, after.byte + next)
        } else {
            after
        })
    }

    /// Text of the line holding the current match, following edits made
    /// while the prompt was open.
    fn current_text(&mut self, model: &EditorModel) -> String {
        let state = model.state();
        if let Some(here) = state.resolve_location(self.current) {
            self.span.line = here.line;
        }
        state.active_buffer().line(self.span.line).unwrap_or_default()
    }
}

/// Byte offset just past a match, stepping over one character for an empty
/// match so the walk always advances.
fn step_past(text: &str, start: usize, end: usize) -> usize {
    if start < end {
        return end;
    }
    end + text[end..].chars().next().map_or(1, char::len_utf8)
}

fn print_flags(flags: SubstituteFlags) -> Option<PrintFlags> {
    let mut out = PrintFlags::empty();
    if flags.contains(SubstituteFlags::PRINT_NUMBER) {
        out |= PrintFlags::NUMBER;
    }
    if flags.contains(SubstituteFlags::PRINT_LIST) {
        out |= PrintFlags::LIST;
    }
    let any = SubstituteFlags::PRINT | SubstituteFlags::PRINT_NUMBER | SubstituteFlags::PRINT_LIST;
    flags.intersects(any).then_some(out)
}

fn not_found(pattern: &str, flags: SubstituteFlags) -> Result<RunResult, ExError> {
    if flags.contains(SubstituteFlags::SUPPRESS_ERRORS) {
        Ok(RunResult::Completed)
    } else {
        Err(ExError::PatternNotFound(pattern.to_string()))
    }
}

fn matches_noun(n: usize) -> String {
    if n == 1 {
        "1 match".to_string()
    } else {
        format!("{n} matches")
    }
}

/// `:s/pat/rep/flags`.
pub(super) fn start(
    interp: &Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    pattern: &str,
    replacement: &str,
    flags: SubstituteFlags,
) -> Result<RunResult, ExError> {
    let state = model.state();
    let session = &state.session;
    let mut flags = flags;
    if flags.contains(SubstituteFlags::USE_PREVIOUS_FLAGS) {
        if let Some(last) = &session.last_substitute {
            flags |= last.flags;
        }
        flags.remove(SubstituteFlags::USE_PREVIOUS_FLAGS);
    }
    let pattern = if pattern.is_empty() {
        session
            .last_search_pattern()
            .ok_or(ExError::NoPreviousPattern)?
            .to_string()
    } else {
        pattern.to_string()
    };
    let previous = session
        .last_substitute
        .as_ref()
        .map(|s| s.replacement.as_str());
    let replacement = expand_tilde(replacement, previous, state.options.toggle("magic"));
    substitute_with(interp, model, range, pattern, replacement, flags)
}

/// `:s` with no pattern, `:&`, `:&&`, `:~`: rerun the last substitute.
pub(super) fn repeat(
    interp: &Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    flags: SubstituteFlags,
    use_last_search: bool,
) -> Result<RunResult, ExError> {
    let session = &model.state().session;
    let last = session
        .last_substitute
        .clone()
        .ok_or(ExError::NoPreviousSubstitute)?;
    let mut flags = flags;
    if flags.contains(SubstituteFlags::USE_PREVIOUS_FLAGS) {
        flags |= last.flags;
        flags.remove(SubstituteFlags::USE_PREVIOUS_FLAGS);
    }
    let pattern = if use_last_search || flags.contains(SubstituteFlags::USE_LAST_SEARCH) {
        session
            .last_search_pattern()
            .ok_or(ExError::NoPreviousPattern)?
            .to_string()
    } else {
        last.pattern
    };
    flags.remove(SubstituteFlags::USE_LAST_SEARCH);
    substitute_with(interp, model, range, pattern, last.replacement, flags)
}

fn substitute_with(
    interp: &Interpreter,
    model: &mut EditorModel,
    range: &LineRangeSpec,
    pattern: String,
    replacement_raw: String,
    recorded: SubstituteFlags,
) -> Result<RunResult, ExError> {
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let state = model.state_mut();
    let mut flags = recorded;
    if state.options.toggle("gdefault") {
        flags.toggle(SubstituteFlags::GLOBAL);
    }
    let regex = compile(&pattern, &state.options, flags)?;
    let replacement = Replacement::parse(&replacement_raw, state.options.toggle("magic"));
    state.session.record_search(&pattern, SearchDirection::Forward);
    debug!(
        target: "ex.substitute",
        pattern = %pattern,
        start = r.start,
        end = r.end,
        flags = ?flags,
        "substitute"
    );

    if flags.contains(SubstituteFlags::CONFIRM) {
        if interp.is_nested() {
            return Err(ExError::Unsupported("c".into()));
        }
        let Some(span) = find_from(state.active_buffer(), &regex, Position::new(r.start, 0), r.end)
        else {
            return not_found(&pattern, flags);
        };
        let current = state.track_location(Position::new(span.line, 0));
        let end = state.track_location(Position::new(r.end, 0));
        model.set_cursor(Position::new(span.line, span.start));
        return Ok(RunResult::AwaitingSubstituteConfirmation(PendingSubstitute {
            regex,
            replacement,
            pattern,
            replacement_raw,
            flags,
            recorded,
            current,
            end,
            span,
            range: r,
            substitutions: 0,
            lines_changed: 0,
            last_line: None,
        }));
    }

    let global = flags.contains(SubstituteFlags::GLOBAL);
    let count_only = flags.contains(SubstituteFlags::COUNT_ONLY);
    let mut substitutions = 0;
    let mut lines_changed = 0;
    let mut last_line = None;
    {
        let mut txn = ModelTransaction::begin(model, "substitute");
        let end_id = txn.track(Position::new(r.end, 0));
        let mut line = r.start;
        loop {
            let Some(end) = txn.resolve(end_id).map(|p| p.line) else {
                break;
            };
            if line > end {
                break;
            }
            let Some(text) = txn.state().active_buffer().line(line) else {
                break;
            };
            let mut found = 0;
            let mut rewritten = String::new();
            let mut copied = 0;
            for caps in regex.captures_iter(&text) {
                let Some(m) = caps.get(0) else {
                    continue;
                };
                found += 1;
                if !count_only {
                    rewritten.push_str(&text[copied..m.start()]);
                    rewritten.push_str(&replacement.expand(&caps));
                    copied = m.end();
                }
                if !global {
                    break;
                }
            }
            if found == 0 {
                line += 1;
                continue;
            }
            substitutions += found;
            lines_changed += 1;
            if count_only {
                last_line = Some(line);
                line += 1;
                continue;
            }
            rewritten.push_str(&text[copied..]);
            let new_lines: Vec<&str> = rewritten.split('\n').collect();
            txn.state_mut().splice_lines(line, 1, &new_lines);
            let last = line + new_lines.len() - 1;
            last_line = Some(last);
            line = last + 1;
        }
    }

    let Some(last) = last_line else {
        return not_found(&pattern, flags);
    };
    let state = model.state_mut();
    if count_only {
        state.set_info(format!(
            "{} on {}",
            matches_noun(substitutions),
            count_noun(lines_changed, "line")
        ));
        return Ok(RunResult::Completed);
    }
    state.session.record_substitute(&pattern, &replacement_raw, recorded);
    if let Some(print) = print_flags(flags) {
        print_line(state, last, print);
    }
    if should_report(state, substitutions) {
        state.set_info(format!(
            "{} on {}",
            count_noun(substitutions, "substitution"),
            count_noun(lines_changed, "line")
        ));
    }
    model.set_cursor(Position::new(last, 0));
    trace!(target: "ex.substitute", substitutions, lines_changed, "substitute_done");
    Ok(RunResult::Completed)
}

/// Continue a confirm-substitute after the user's answer.
pub(super) fn resume(
    model: &mut EditorModel,
    mut pending: PendingSubstitute,
    decision: ConfirmDecision,
) -> Result<RunResult, ExError> {
    debug!(target: "ex.substitute", ?decision, line = pending.span.line, "confirm_decision");
    match advance(model, &mut pending, decision) {
        Ok(true) => Ok(RunResult::AwaitingSubstituteConfirmation(pending)),
        Ok(false) => {
            finish(model, pending);
            Ok(RunResult::Completed)
        }
        Err(e) => {
            pending.release(model.state_mut());
            Err(e)
        }
    }
}

/// Apply `decision`; true while another match awaits confirmation.
fn advance(
    model: &mut EditorModel,
    pending: &mut PendingSubstitute,
    decision: ConfirmDecision,
) -> Result<bool, ExError> {
    match decision {
        ConfirmDecision::Quit => Ok(false),
        ConfirmDecision::Skip => {
            let text = pending.current_text(model);
            let from = pending.skip_target(&text);
            Ok(pending.seek(model, from))
        }
        ConfirmDecision::Replace => {
            let from = pending.replace_current(model)?;
            Ok(pending.seek(model, from))
        }
        ConfirmDecision::ReplaceAll => loop {
            let from = pending.replace_current(model)?;
            if !pending.seek(model, from) {
                return Ok(false);
            }
        },
    }
}

fn finish(model: &mut EditorModel, pending: PendingSubstitute) {
    let substitutions = pending.substitutions;
    let lines_changed = pending.lines_changed;
    let last_line = pending.last_line;
    let pattern = pending.pattern.clone();
    let replacement = pending.replacement_raw.clone();
    let recorded = pending.recorded;
    let print = print_flags(pending.flags);
    let state = model.state_mut();
    pending.release(state);
    state.session.record_substitute(&pattern, &replacement, recorded);
    if let Some(last) = last_line {
        if let Some(print) = print {
            print_line(state, last, print);
        }
        if should_report(state, substitutions) {
            state.set_info(format!(
                "{} on {}",
                count_noun(substitutions, "substitution"),
                count_noun(lines_changed, "line")
            ));
        }
        model.set_cursor(Position::new(last, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::Buffer;
    use pretty_assertions::assert_eq;

    fn setup(lines: &[&str]) -> (Interpreter, EditorModel) {
        let state = EditorState::new(Buffer::from_lines("t", lines));
        (Interpreter::new(), EditorModel::new(state))
    }

    fn text(m: &EditorModel) -> Vec<String> {
        let b = m.state().active_buffer();
        b.lines(0..b.line_count())
    }

    fn pending(result: RunResult) -> PendingSubstitute {
        match result {
            RunResult::AwaitingSubstituteConfirmation(p) => p,
            RunResult::Completed => panic!("expected a pending confirmation"),
        }
    }

    #[test]
    fn first_match_or_every_match() {
        let (mut ex, mut m) = setup(&["aaa", "aaa"]);
        ex.run_line(&mut m, "s/a/b/");
        ex.run_line(&mut m, "2s/a/b/g");
        assert_eq!(text(&m), ["baa", "bbb"]);
        assert_eq!(m.cursor(), Position::new(1, 0));
    }

    #[test]
    fn gdefault_inverts_g() {
        let (mut ex, mut m) = setup(&["aaa"]);
        ex.run_line(&mut m, "set gd");
        ex.run_line(&mut m, "s/a/b/");
        assert_eq!(text(&m), ["bbb"]);
        ex.run_line(&mut m, "s/b/c/g");
        assert_eq!(text(&m), ["cbb"]);
    }

    #[test]
    fn groups_whole_match_and_line_splits() {
        let (mut ex, mut m) = setup(&["key=value", "tail"]);
        ex.run_line(&mut m, r"s/\(\w\+\)=\(\w\+\)/\2:\1 [&]/");
        assert_eq!(text(&m), ["value:key [key=value]", "tail"]);
        ex.run_line(&mut m, r"s/ /\r/");
        assert_eq!(text(&m), ["value:key", "[key=value]", "tail"]);
        assert_eq!(m.cursor(), Position::new(1, 0));
    }

    #[test]
    fn missing_pattern_reports_or_stays_quiet_with_e() {
        let (mut ex, mut m) = setup(&["abc"]);
        ex.run_line(&mut m, "%s/zz/y/");
        assert_eq!(m.state().status_text(), Some("Pattern not found: zz"));
        ex.run_line(&mut m, "%s/zz/y/e");
        assert!(!m.state().status_is_error());
        assert_eq!(m.state().undo_depth(), 0);
    }

    #[test]
    fn count_only_leaves_buffer_alone() {
        let (mut ex, mut m) = setup(&["a a", "b", "a"]);
        ex.run_line(&mut m, "%s/a//gn");
        assert_eq!(text(&m), ["a a", "b", "a"]);
        assert_eq!(m.state().status_text(), Some("3 matches on 2 lines"));
    }

    #[test]
    fn report_threshold_message() {
        let (mut ex, mut m) = setup(&["x", "x", "x"]);
        ex.run_line(&mut m, "%s/x/y/");
        assert_eq!(m.state().status_text(), Some("3 substitutions on 3 lines"));
    }

    #[test]
    fn repeat_forms_reuse_last_substitute() {
        let (mut ex, mut m) = setup(&["one one", "one one"]);
        ex.run_line(&mut m, "s/one/two/g");
        ex.run_line(&mut m, "2&&");
        assert_eq!(text(&m), ["two two", "two two"]);

        let (mut ex, mut m) = setup(&["a b"]);
        ex.run_line(&mut m, "s/a/X/");
        ex.run_line(&mut m, "/b");
        ex.run_line(&mut m, "~");
        assert_eq!(text(&m), ["X X"]);

        let (mut ex, mut m) = setup(&["a"]);
        ex.run_line(&mut m, "&");
        assert_eq!(
            m.state().status_text(),
            Some("No previous substitute regular expression")
        );
    }

    #[test]
    fn tilde_uses_previous_replacement() {
        let (mut ex, mut m) = setup(&["a", "b"]);
        ex.run_line(&mut m, "s/a/xy/");
        ex.run_line(&mut m, "2s/b/~z/");
        assert_eq!(text(&m), ["xy", "xyz"]);
    }

    #[test]
    fn confirm_walks_matches_in_range_order() {
        let (mut ex, mut m) = setup(&["no", "foo foo", "bar", "foo"]);
        let p = pending(ex.run_line(&mut m, "%s/foo/X/gc"));
        assert_eq!(p.span(), MatchSpan { line: 1, start: 0, end: 3 });
        assert_eq!(m.cursor(), Position::new(1, 0));
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Skip));
        assert_eq!(p.span(), MatchSpan { line: 1, start: 4, end: 7 });
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Replace));
        assert_eq!(p.span().line, 3);
        assert_eq!(text(&m), ["no", "foo X", "bar", "foo"]);
        let done = ex.resume(&mut m, p, ConfirmDecision::Replace);
        assert!(matches!(done, RunResult::Completed));
        assert_eq!(text(&m), ["no", "foo X", "bar", "X"]);
        assert_eq!(m.state().tracked_locations(), 0);
        assert_eq!(
            m.state().session.last_substitute.as_ref().map(|s| s.pattern.as_str()),
            Some("foo")
        );
        ex.run_line(&mut m, "u");
        assert_eq!(text(&m), ["no", "foo foo", "bar", "foo"]);
    }

    #[test]
    fn confirm_without_match_reports_not_found() {
        let (mut ex, mut m) = setup(&["abc"]);
        let result = ex.run_line(&mut m, "%s/zzz/y/c");
        assert!(matches!(result, RunResult::Completed));
        assert_eq!(m.state().status_text(), Some("Pattern not found: zzz"));
        assert_eq!(m.state().tracked_locations(), 0);
    }

    #[test]
    fn confirm_replace_all_and_quit() {
        let (mut ex, mut m) = setup(&["a", "a", "a"]);
        let p = pending(ex.run_line(&mut m, "%s/a/b/c"));
        let done = ex.resume(&mut m, p, ConfirmDecision::ReplaceAll);
        assert!(matches!(done, RunResult::Completed));
        assert_eq!(text(&m), ["b", "b", "b"]);

        let (mut ex, mut m) = setup(&["a", "a"]);
        let p = pending(ex.run_line(&mut m, "%s/a/b/c"));
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Replace));
        ex.resume(&mut m, p, ConfirmDecision::Quit);
        assert_eq!(text(&m), ["b", "a"]);
        assert_eq!(m.state().tracked_locations(), 0);
    }

    #[test]
    fn confirm_split_keeps_range_end() {
        let (mut ex, mut m) = setup(&["a-a", "z"]);
        let p = pending(ex.run_line(&mut m, r"1s/-/\r/gc"));
        assert_eq!(p.range(), LineRange::new(0, 0));
        let done = ex.resume(&mut m, p, ConfirmDecision::Replace);
        assert!(matches!(done, RunResult::Completed));
        assert_eq!(text(&m), ["a", "a", "z"]);
    }

    #[test]
    fn confirm_rescans_a_line_edited_while_waiting() {
        let (mut ex, mut m) = setup(&["foo foo"]);
        let p = pending(ex.run_line(&mut m, "%s/foo/X/gc"));
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Skip));
        assert_eq!(p.span(), MatchSpan { line: 0, start: 4, end: 7 });
        ex.run_line(&mut m, "s/.*/x/");
        let done = ex.resume(&mut m, p, ConfirmDecision::Replace);
        assert!(matches!(done, RunResult::Completed));
        assert_eq!(text(&m), ["x"]);
        assert_eq!(m.state().tracked_locations(), 0);

        let (mut ex, mut m) = setup(&["foo foo"]);
        let p = pending(ex.run_line(&mut m, "%s/foo/X/gc"));
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Skip));
        ex.run_line(&mut m, "s/.*/foo/");
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Replace));
        assert_eq!(p.span(), MatchSpan { line: 0, start: 0, end: 3 });
        let done = ex.resume(&mut m, p, ConfirmDecision::Replace);
        assert!(matches!(done, RunResult::Completed));
        assert_eq!(text(&m), ["X"]);
    }

    #[test]
    fn confirm_skip_after_a_shrinking_edit() {
        let (mut ex, mut m) = setup(&["foo foo", "foo"]);
        let p = pending(ex.run_line(&mut m, "%s/foo/X/gc"));
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Skip));
        ex.run_line(&mut m, "1s/.*/é/");
        let p = pending(ex.resume(&mut m, p, ConfirmDecision::Skip));
        assert_eq!(p.span(), MatchSpan { line: 1, start: 0, end: 3 });
        ex.abandon(&mut m, p);
        assert_eq!(text(&m), ["é", "foo"]);
        assert_eq!(m.state().tracked_locations(), 0);
    }

    #[test]
    fn abandon_releases_locations() {
        let (mut ex, mut m) = setup(&["a"]);
        let p = pending(ex.run_line(&mut m, "s/a/b/c"));
        assert_eq!(m.state().tracked_locations(), 2);
        ex.abandon(&mut m, p);
        assert_eq!(m.state().tracked_locations(), 0);
        assert_eq!(text(&m), ["a"]);
    }
}
