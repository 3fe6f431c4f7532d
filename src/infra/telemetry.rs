use std::{io, sync::Once};

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const REMOTE_REQUESTS_TOTAL: &str = "vitamins_remote_requests_total";
pub const REMOTE_FAILURES_TOTAL: &str = "vitamins_remote_failures_total";
pub const REMOTE_REQUEST_MS: &str = "vitamins_remote_request_ms";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            REMOTE_REQUESTS_TOTAL,
            Unit::Count,
            "Total number of backend requests, labelled by operation."
        );
        describe_counter!(
            REMOTE_FAILURES_TOTAL,
            Unit::Count,
            "Total number of backend requests that failed, labelled by operation."
        );
        describe_histogram!(
            REMOTE_REQUEST_MS,
            Unit::Milliseconds,
            "Backend request latency in milliseconds."
        );
    });
}
