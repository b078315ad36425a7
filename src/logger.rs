//! Process-wide tracing setup.

use once_cell::sync::OnceCell;
use tracing::Span;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Install the `fmt` subscriber once per process.
///
/// `RUST_LOG` selects the filter, `info` otherwise. Later calls are no-ops,
/// as is the first one when the host already installed a subscriber.
pub fn init_logger(service_name: &'static str) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let installed = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .try_init()
            .is_ok();

        if installed {
            tracing::info!(service = service_name, "logger initialized");
        }
    });
}

/// Span wrapping one guarded procedure call.
pub fn procedure_span(procedure: &str) -> Span {
    tracing::info_span!("procedure", name = %procedure)
}
