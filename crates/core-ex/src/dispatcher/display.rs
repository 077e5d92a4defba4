//! List-style output: `:print` / `:number` / `:list`, `:marks`, `:registers`.
//!
//! Everything goes to the status panel, one entry per row.

use super::place_caret;
use crate::command::{DefaultRange, LineRangeSpec, PrintFlags};
use crate::error::ExError;
use crate::range::resolve_range;
use core_model::EditorModel;
use core_state::{EditorState, RegisterKind};

/// `:list` rendering: tabs and control characters as `^X`, `$` at the end.
fn list_form(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for c in text.chars() {
        match c {
            '\x7f' => out.push_str("^?"),
            c if (c as u32) < 0x20 => {
                out.push('^');
                out.push(char::from(b'@' + c as u8));
            }
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

/// Push line `idx` to the panel decorated per `flags` and the `number` option.
pub(super) fn print_line(state: &mut EditorState, idx: usize, flags: PrintFlags) {
    let Some(text) = state.active_buffer().line(idx) else {
        return;
    };
    let text = if flags.contains(PrintFlags::LIST) {
        list_form(&text)
    } else {
        text
    };
    let row = if flags.contains(PrintFlags::NUMBER) || state.options.toggle("number") {
        format!("{:>3} {text}", idx + 1)
    } else {
        text
    };
    state.push_panel_line(row);
}

pub(super) fn print(
    model: &mut EditorModel,
    range: &LineRangeSpec,
    flags: PrintFlags,
) -> Result<(), ExError> {
    let r = resolve_range(model, range, DefaultRange::CurrentLine)?;
    let state = model.state_mut();
    for idx in r.start..=r.end {
        print_line(state, idx, flags);
    }
    place_caret(model, r.end);
    Ok(())
}

fn selected(names: Option<&str>, name: char) -> bool {
    names.is_none_or(|n| n.contains(name))
}

pub(super) fn marks(state: &mut EditorState, names: Option<&str>) {
    let current = state.file_name.clone();
    let rows: Vec<String> = state
        .marks
        .entries()
        .into_iter()
        .filter(|e| selected(names, e.name))
        .map(|e| {
            let text = match &e.file {
                Some(file) if Some(file) != current.as_ref() => file.display().to_string(),
                _ => state
                    .active_buffer()
                    .line(e.position.line)
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            };
            format!(
                " {}  {:>5} {:>4} {}",
                e.name,
                e.position.line + 1,
                e.position.byte,
                text
            )
        })
        .collect();
    state.push_panel_line("mark line  col file/text");
    for row in rows {
        state.push_panel_line(row);
    }
}

fn escape_register(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' => "^J".to_string(),
            '\t' => "^I".to_string(),
            c => c.to_string(),
        })
        .collect()
}

pub(super) fn registers(state: &mut EditorState, names: Option<&str>) {
    let mut rows: Vec<String> = state
        .registers
        .entries()
        .into_iter()
        .map(|(name, value)| (name, value.clone()))
        .chain(
            ['/', ':']
                .into_iter()
                .filter_map(|name| state.read_register(name).map(|v| (name, v))),
        )
        .filter(|(name, _)| selected(names, *name))
        .map(|(name, value)| {
            let kind = match value.kind {
                RegisterKind::Linewise => 'l',
                RegisterKind::Characterwise => 'c',
            };
            format!("  {kind}  \"{name}   {}", escape_register(&value.text))
        })
        .collect();
    rows.insert(0, "Type Name Content".to_string());
    for row in rows {
        state.push_panel_line(row);
    }
}
