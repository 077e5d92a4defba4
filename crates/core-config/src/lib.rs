//! Configuration loading and parsing.
//!
//! `ox-ex.toml` (or an override path provided by the binary) holds initial
//! option values and the command files to source at startup:
//!
//! ```toml
//! [options]
//! tabstop = 4
//! expandtab = true
//! [startup]
//! source = ["~/.ox-exrc"]
//! ```
//!
//! A missing or malformed file yields the defaults; unknown option names are
//! logged and skipped when applied.

use anyhow::Result;
use core_state::{OptionValue, Options};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "ox-ex.toml";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct StartupConfig {
    #[serde(default)]
    pub source: Vec<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub startup: StartupConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: ConfigFile,
    pub path: Option<PathBuf>,
}

/// Best-effort config path: working directory first, then the platform
/// config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("ox-ex").join(CONFIG_FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), options = file.options.len(), "config_loaded");
            Ok(Config {
                file,
                path: Some(path),
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

fn expand_home(raw: &str) -> PathBuf {
    match (raw.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

impl Config {
    /// Push `[options]` into the settings table. Returns how many applied.
    pub fn apply_options(&self, options: &mut Options) -> usize {
        let mut applied = 0;
        for (name, value) in &self.file.options {
            let result = match value {
                toml::Value::Boolean(b) => options.set(name, OptionValue::Toggle(*b)),
                toml::Value::Integer(n) => options.set(name, OptionValue::Number(*n)),
                toml::Value::String(s) => options.set_from_str(name, s),
                other => {
                    warn!(target: "config", option = %name, kind = other.type_str(), "config_option_unsupported_type");
                    continue;
                }
            };
            match result {
                Ok(()) => applied += 1,
                Err(e) => warn!(target: "config", option = %name, error = %e, "config_option_skipped"),
            }
        }
        applied
    }

    /// Command files listed under `[startup] source`, with `~/` expanded.
    pub fn startup_scripts(&self) -> Vec<PathBuf> {
        self.file
            .startup
            .source
            .iter()
            .map(|s| expand_home(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), body).unwrap();
        tmp
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.file.options.is_empty());
        assert!(cfg.startup_scripts().is_empty());
        assert!(cfg.path.is_none());
    }

    #[test]
    fn applies_typed_options() {
        let tmp = write_config(
            "[options]\ntabstop = 4\nexpandtab = true\nshell = \"/bin/bash\"\nsw = \"2\"\n",
        );
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.path.as_deref(), Some(tmp.path()));
        let mut opts = Options::new();
        assert_eq!(cfg.apply_options(&mut opts), 4);
        assert_eq!(opts.tabstop(), 4);
        assert!(opts.toggle("expandtab"));
        assert_eq!(opts.text("shell"), "/bin/bash");
        assert_eq!(opts.shiftwidth(), 2);
    }

    #[test]
    fn unknown_and_mistyped_options_are_skipped() {
        let tmp = write_config("[options]\nbogus = 1\nignorecase = 3\nnumber = true\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        let mut opts = Options::new();
        assert_eq!(cfg.apply_options(&mut opts), 1);
        assert!(opts.toggle("number"));
        assert!(!opts.toggle("ignorecase"));
    }

    #[test]
    fn startup_sources_listed_in_order() {
        let tmp = write_config("[startup]\nsource = [\"a.ex\", \"/abs/b.ex\"]\n");
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(
            cfg.startup_scripts(),
            vec![PathBuf::from("a.ex"), PathBuf::from("/abs/b.ex")]
        );
    }

    #[test]
    fn malformed_file_falls_back_and_warns() {
        let tmp = write_config("[options\ntabstop = ");
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::INFO)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();

        let cfg = with_default(subscriber, || {
            load_from(Some(tmp.path().to_path_buf())).unwrap()
        });

        let log_output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed"));
        assert!(cfg.file.options.is_empty());
    }
}
