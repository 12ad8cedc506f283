//! Optional JSON trace logging for host processes.

#[cfg(feature = "trace")]
use std::path::Path;
#[cfg(feature = "trace")]
use std::sync::Once;

#[cfg(feature = "trace")]
static INIT: Once = Once::new();

/// Start writing JSON trace events under `log_dir`. The log file name and
/// the default filter target both derive from the crate name, so the
/// shipped binary logs to `hatsuon-trace.jsonl` at `hatsuon=debug` unless
/// `RUST_LOG` overrides it.
///
/// Returns the writer's flush guard on the first call; hosts here are
/// short-lived (the CLI, test harnesses), so the caller holds it until
/// exit to flush buffered events. Later calls are no-ops returning `None`.
#[cfg(feature = "trace")]
pub fn init_tracing(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let mut guard = None;
    INIT.call_once(|| {
        let file_appender = tracing_appender::rolling::never(
            log_dir,
            concat!(env!("CARGO_PKG_NAME"), "-trace.jsonl"),
        );
        let (non_blocking, flush_guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::fmt()
            .json()
            .with_writer(non_blocking)
            .with_target(true)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(concat!(env!("CARGO_PKG_NAME"), "=debug"))
                }),
            )
            .init();

        guard = Some(flush_guard);
    });
    guard
}

#[cfg(not(feature = "trace"))]
pub fn init_tracing(_log_dir: &std::path::Path) {}
