//! Unified logging for site-sentry.
//!
//! [`init_log_bridge`] installs a `log::Log` implementation that routes every
//! `log::info!()` etc. to a debug log file:
//!
//! - `/tmp/site_sentry_debug.log` on Unix/macOS
//! - `%TEMP%\site_sentry_debug.log` on Windows
//!
//! When `RUST_LOG` is set, records are mirrored to stderr as well.
//!
//! Level precedence: the `--log-level` CLI flag, then `RUST_LOG`, then the
//! config file (applied later through [`apply_config_level`]).

use parking_lot::Mutex;
use site_sentry_config::LogLevel;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Set when the level came from the CLI or `RUST_LOG` and must not be
/// overridden by the config file.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

static LOGGER: OnceLock<BridgeLogger> = OnceLock::new();

struct BridgeLogger {
    file: Mutex<Option<File>>,
    mirror_stderr: bool,
}

impl log::Log for BridgeLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{}] [{:<5}] [{}] {}\n",
            get_timestamp(),
            record.level(),
            record.target(),
            record.args()
        );

        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
        if self.mirror_stderr {
            eprint!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = self.file.lock().as_mut() {
            let _ = file.flush();
        }
    }
}

/// Path of the debug log file
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/site_sentry_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("site_sentry_debug.log")
    }
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Parse the level part of `RUST_LOG`.
///
/// Only a bare level or the level of the last `target=level` directive is
/// honoured; per-target filtering is not supported.
fn level_from_rust_log(value: &str) -> Option<LogLevel> {
    let directive = value.split(',').next_back()?.trim();
    let level = directive.rsplit('=').next()?;
    LogLevel::from_name(level)
}

/// Install the log bridge. Safe to call more than once; later calls only
/// adjust the level.
///
/// `cli_level` (from `--log-level`) wins over `RUST_LOG`; if neither is set
/// the level stays at `Info` until [`apply_config_level`] runs.
pub fn init_log_bridge(cli_level: Option<LogLevel>) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_level = rust_log.as_deref().and_then(level_from_rust_log);

    let level = match (cli_level, env_level) {
        (Some(level), _) | (None, Some(level)) => {
            LEVEL_PINNED.store(true, Ordering::SeqCst);
            level
        }
        (None, None) => LogLevel::Info,
    };

    let logger = LOGGER.get_or_init(|| {
        let file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .create(true)
            .open(log_path())
            .ok();
        let logger = BridgeLogger {
            file: Mutex::new(file),
            mirror_stderr: rust_log.is_some(),
        };
        if let Some(file) = logger.file.lock().as_mut() {
            let _ = writeln!(
                file,
                "{}\nsite-sentry debug session started at {}\n{}",
                "=".repeat(80),
                get_timestamp(),
                "=".repeat(80)
            );
        }
        logger
    });

    // Fails only if another logger was installed first, which is harmless.
    let _ = log::set_logger(logger);
    log::set_max_level(level.to_level_filter());
}

/// Apply the config file's level unless the CLI or `RUST_LOG` pinned one
pub fn apply_config_level(level: LogLevel) {
    if LEVEL_PINNED.load(Ordering::SeqCst) {
        return;
    }
    log::set_max_level(level.to_level_filter());
}
