//! `:set`, `:echo` and `:let`.
//!
//! `:set` supports show-changed, `name`, `noname`, `invname` / `name!` and
//! `name=value`. The remaining forms (`+=`, `^=`, `-=`, `&`, `?`, `all`,
//! `termcap`) report "option not supported" with the token as typed.

use crate::command::{SetArgument, SetOp};
use crate::error::ExError;
use crate::expr::{Expr, evaluate};
use core_state::{EditorState, OptionKind, Options};
use tracing::debug;

pub(super) fn set(state: &mut EditorState, args: &[SetArgument]) -> Result<(), ExError> {
    for arg in args {
        apply(state, arg)?;
    }
    Ok(())
}

fn apply(state: &mut EditorState, arg: &SetArgument) -> Result<(), ExError> {
    debug!(target: "state.options", token = arg.token(), "set");
    match &arg.op {
        SetOp::ShowChanged => {
            let rows: Vec<String> = state
                .options
                .entries(true)
                .into_iter()
                .map(|(desc, value)| format!("  {}", Options::render(desc, value)))
                .collect();
            state.push_panel_line("--- Options ---");
            for row in rows {
                state.push_panel_line(row);
            }
        }
        SetOp::UseSetting(name) => {
            let desc = Options::lookup(name).ok_or_else(|| ExError::UnknownOption(name.clone()))?;
            if desc.kind == OptionKind::Toggle {
                state.options.set_toggle(name, true)?;
            } else {
                let value = state.options.get(name)?;
                let shown = format!("  {}", Options::render(desc, value));
                state.set_info(shown);
            }
        }
        SetOp::ResetSetting(name) => state.options.set_toggle(name, false)?,
        SetOp::InvertSetting(name) => {
            state.options.invert(name)?;
        }
        SetOp::Assign { name, value } => state.options.set_from_str(name, value)?,
        SetOp::ShowAll
        | SetOp::ShowTermcap
        | SetOp::Default(_)
        | SetOp::Query(_)
        | SetOp::Add { .. }
        | SetOp::Multiply { .. }
        | SetOp::Subtract { .. } => return Err(ExError::Unsupported(arg.token().to_string())),
    }
    Ok(())
}

pub(super) fn echo(state: &mut EditorState, exprs: &[Expr]) -> Result<(), ExError> {
    let values = exprs
        .iter()
        .map(|e| evaluate(e, &state.session).map(|v| v.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    state.set_info(values.join(" "));
    Ok(())
}

pub(super) fn let_variable(state: &mut EditorState, name: &str, expr: &Expr) -> Result<(), ExError> {
    let value = evaluate(expr, &state.session)?;
    state.session.set_variable(name, value);
    Ok(())
}
