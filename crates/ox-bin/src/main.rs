//! ox-ex entrypoint.
use anyhow::Result;
use clap::Parser;
use core_ex::Interpreter;
use ox_ex::Session;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Once;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE: &str = "ox-ex.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "ox-ex", version, about = "Line-mode ex command interpreter")]
struct Args {
    /// File to edit. A missing file starts as a new, empty buffer.
    pub path: Option<PathBuf>,
    /// Ex command to run after loading; may be repeated.
    #[arg(short = 'c', value_name = "CMD")]
    pub commands: Vec<String>,
    /// Command file to source after the `-c` commands; may be repeated.
    #[arg(short = 'S', value_name = "SCRIPT")]
    pub scripts: Vec<PathBuf>,
    /// Configuration file (overrides discovery of `ox-ex.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(false)
        .with_writer(nb_writer)
        .try_init()
    {
        Ok(()) => Some(guard),
        // Global subscriber already installed; dropping the guard stops the writer.
        Err(_) => None,
    }
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn run(args: Args) -> Result<usize> {
    let config = core_config::load_from(args.config.clone())?;
    let stdin = io::stdin();
    let mut session = Session::new(Interpreter::new(), stdin.lock(), io::stdout(), io::stderr());

    if let Some(path) = args.path.as_deref() {
        session.open(path)?;
    }
    let applied = config.apply_options(&mut session.model_mut().state_mut().options);
    debug!(target: "runtime", applied, path = ?config.path, "config_options_applied");

    for script in config.startup_scripts() {
        if !script.exists() {
            debug!(target: "runtime", path = %script.display(), "startup_script_missing");
            continue;
        }
        session.source(&script)?;
    }
    for command in &args.commands {
        if session.exit_requested() {
            break;
        }
        session.run_line(command)?;
    }
    for script in &args.scripts {
        if session.exit_requested() {
            break;
        }
        session.source(script)?;
    }
    if args.commands.is_empty() && args.scripts.is_empty() {
        session.run_input()?;
    }
    Ok(session.failures())
}

fn main() -> Result<ExitCode> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let args = Args::parse();
    info!(target: "runtime", path = ?args.path, commands = args.commands.len(), "startup");
    let failures = run(args)?;
    info!(target: "runtime", failures, "shutdown");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}
