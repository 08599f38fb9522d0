use prometheus::register_counter_vec;
use prometheus::CounterVec;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use lazy_static::lazy_static;

/// Used when `LOG_LEVEL` is unset or unparsable. Per-query sqlx statements
/// are too chatty at info.
pub const DEFAULT_LOG_FILTER: &str = "info,sqlx=warn";

lazy_static! {
    pub static ref QUIZ_CNTR: CounterVec = register_counter_vec!(
        "quiz_questions_served_total",
        "Number of questions handed out to quiz rounds",
        &["category"]
    )
    .unwrap();
    pub static ref QUESTION_CHANGES_CNTR: CounterVec = register_counter_vec!(
        "questions_changed_total",
        "Number of questions created or deleted",
        &["action"]
    )
    .unwrap();
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn span_events_enabled() -> bool {
    std::env::var("INCLUDE_SPAN_EVENTS").is_ok_and(|value| value.eq_ignore_ascii_case("true"))
}

/// Installs the global subscriber for the server and cli binaries.
pub fn init_tracing() {
    let span_events = if span_events_enabled() {
        FmtSpan::ENTER | FmtSpan::EXIT
    } else {
        FmtSpan::NONE
    };
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_span_events(span_events);

    tracing_subscriber::registry()
        .with(log_filter())
        .with(fmt_layer)
        .init();
}
