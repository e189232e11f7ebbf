//! Tracing setup for the patchwork tools
//!
//! [`init`] writes every event that passes the file filter to a log file and,
//! when a filter was requested or in debug builds, mirrors events to stderr so
//! command output on stdout stays machine readable.
//!
//! Filters come from `PATCHWORK_LOG`, then `RUST_LOG`. A bare level such as
//! `PATCHWORK_LOG=trace` applies to the patchwork crates only and keeps
//! everything else at `warn`. Without either variable the file gets `warn` and
//! the console gets `info` for the patchwork crates.
//!
//! The file lives in `<data_local_dir>/patchwork/logs/` unless
//! [`LogConfig::log_file_path`] names a file or a directory.

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Crates whose targets `PATCHWORK_LOG=<level>` expands to.
const CRATES: &[&str] = &[
    "patchwork_text",
    "patchwork_patch",
    "patchwork_buffer",
    "patchwork_bin",
];

/// Keeps the file writer alive.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct LogConfig {
    pub log_file_path: Option<PathBuf>,
}

/// Installs the global subscriber.
///
/// Keep the returned guard until exit; dropping it stops the background
/// writer after flushing.
pub fn init(config: LogConfig) -> Result<LogGuard, BoxError> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(create_file_filter());

    let console_enabled = filter_requested() || cfg!(debug_assertions);
    let console_layer = if console_enabled {
        Some(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(create_filter()),
        )
    } else {
        None
    };

    Registry::default()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Routes events through the test harness capture. Later calls are no-ops.
pub fn test() {
    let _ = fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init();
}

fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("patchwork-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir, name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("patchwork")
        .join("logs");

    (dir, filename)
}

fn filter_requested() -> bool {
    env::var_os("PATCHWORK_LOG").is_some() || env::var_os("RUST_LOG").is_some()
}

fn create_file_filter() -> EnvFilter {
    if filter_requested() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

fn create_filter() -> EnvFilter {
    if let Ok(level) = env::var("PATCHWORK_LOG") {
        return expand_patchwork_log(&level);
    }
    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }
    EnvFilter::new(directives("info"))
}

/// A bare level is scoped to [`CRATES`]; full directive syntax passes through.
fn expand_patchwork_log(value: &str) -> EnvFilter {
    if value.contains('=') || value.contains(':') || value.contains(',') {
        return EnvFilter::new(value);
    }
    EnvFilter::new(directives(value))
}

fn directives(level: &str) -> String {
    let mut directives = String::from("warn");
    for name in CRATES {
        directives.push(',');
        directives.push_str(name);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level_expands_to_every_crate() {
        let expanded = directives("debug");
        assert!(expanded.starts_with("warn,"));
        for name in CRATES {
            assert!(expanded.contains(&format!("{name}=debug")), "{expanded}");
        }
    }

    #[test]
    fn override_with_extension_is_a_file() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let file = tmp_dir.path().join("custom.log");
        let (dir, name) = resolve_log_path(Some(file));
        assert_eq!(dir, tmp_dir.path());
        assert_eq!(name, "custom.log");
    }

    #[test]
    fn override_without_extension_is_a_directory() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let (dir, name) = resolve_log_path(Some(tmp_dir.path().to_path_buf()));
        assert_eq!(dir, tmp_dir.path());
        assert!(name.starts_with("patchwork-"));
        assert!(name.ends_with(".log"));
    }

    #[test]
    fn test_init_is_idempotent() {
        test();
        test();
    }
}
