//! Structured logging setup shared by Tablero binaries.
//!
//! - `LOG_FORMAT=json` switches to JSON lines for log shipping; anything else
//!   (or unset) prints human-readable text.
//! - `RUST_LOG` filters as usual and defaults to `info`.
//!
//! ```rust,ignore
//! tb_common::logging::init_logging("tb-access-probe");
//! tracing::info!(module = %name, "Catalog refreshed");
//! ```
//!
//! Gate decisions are logged at `debug` and individual denials at `trace`
//! under the `tb_access` target, so `RUST_LOG=info,tb_access=trace` shows
//! why a check was denied.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format selected through `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_FORMAT").unwrap_or_default())
    }

    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Install the global subscriber for `service_name`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(service_name: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match LogFormat::from_env() {
        LogFormat::Json => init_json_logging(env_filter),
        LogFormat::Text => init_text_logging(env_filter),
    };

    if installed {
        tracing::debug!(service = service_name, "Logging initialized");
    }
}

fn init_json_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_file(true)
                .with_line_number(true)
                .with_target(true)
                .flatten_event(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init()
        .is_ok()
}

fn init_text_logging(env_filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_ansi(true),
        )
        .try_init()
        .is_ok()
}
