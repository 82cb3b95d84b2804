use std::io::IsTerminal;
use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;

use crate::args::GlobalArgs;

/// Initialize the dual-layer tracing subscriber.
///
/// Sets up:
/// - Terminal layer: stderr, level from `-q`/`-v` unless `RUST_LOG` is set
/// - File layer: `ideals.log` in the user cache directory with daily
///   rotation, `RUST_LOG` or "info" ("debug" when `debug` is set)
///
/// Returns a `WorkerGuard` that must be kept alive for the file logging to
/// work, or `None` when no log file could be opened.
pub fn init_tracing(global: &GlobalArgs, debug: bool) -> Option<WorkerGuard> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(global.log_directive()));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .with_filter(stderr_filter);

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("ideals")
        .filename_suffix("log")
        .build(log_dir());

    let (file_layer, guard) = match appender {
        Ok(appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let default_directive = if debug { "debug" } else { "info" };
            let file_filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive));
            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_thread_ids(true)
                .with_thread_names(true)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        Err(err) => {
            eprintln!("Log file disabled: {err}");
            (None, None)
        }
    };

    Registry::default().with(stderr_layer).with(file_layer).init();

    guard
}

fn log_dir() -> PathBuf {
    ProjectDirs::from("org", "ideals", "ideals")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .unwrap_or_else(std::env::temp_dir)
}
