//! External command execution for `:!`, `:r !`, `:range!` and `:make`.
//!
//! Commands run through a `ShellRunner` so tests can substitute a fake.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellOutput {
    /// stdout followed by stderr.
    pub output: String,
    /// Exit code; `None` when terminated by a signal.
    pub status: Option<i32>,
}

impl ShellOutput {
    /// Output split into lines, without a trailing empty line.
    pub fn lines(&self) -> Vec<String> {
        let body = self.output.strip_suffix('\n').unwrap_or(&self.output);
        if body.is_empty() {
            return Vec::new();
        }
        body.split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect()
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

pub trait ShellRunner {
    /// Run `command` with `shell`, feeding `input` on stdin when given.
    fn run(&mut self, shell: &str, command: &str, input: Option<&str>) -> io::Result<ShellOutput>;
}

/// Runs commands through the platform shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

fn shell_flag(shell: &str) -> &'static str {
    let lower = shell.to_ascii_lowercase();
    if lower.ends_with("cmd.exe") || lower.ends_with("cmd") {
        "/C"
    } else {
        "-c"
    }
}

impl ShellRunner for SystemShell {
    fn run(&mut self, shell: &str, command: &str, input: Option<&str>) -> io::Result<ShellOutput> {
        debug!(target: "ex.shell", shell, command, piped = input.is_some(), "spawn");
        let mut child = Command::new(shell)
            .arg(shell_flag(shell))
            .arg(command)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        // Feed stdin from a separate thread so a chatty child cannot deadlock
        // on a full stdout pipe.
        let writer = match (input, child.stdin.take()) {
            (Some(text), Some(mut stdin)) => {
                let text = text.to_string();
                Some(std::thread::spawn(move || stdin.write_all(text.as_bytes())))
            }
            _ => None,
        };
        let out = child.wait_with_output()?;
        if let Some(handle) = writer
            && let Ok(Err(e)) = handle.join()
            && e.kind() != io::ErrorKind::BrokenPipe
        {
            warn!(target: "ex.shell", error = %e, "stdin_write_failed");
        }
        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        let status = out.status.code();
        debug!(target: "ex.shell", ?status, bytes = output.len(), "exit");
        Ok(ShellOutput { output, status })
    }
}
