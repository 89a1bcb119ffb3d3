use crate::error::TuiError;
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::BoxMakeWriter, MakeWriter},
    layer::SubscriberExt as _,
    registry::LookupSpan,
    util::SubscriberInitExt as _,
    EnvFilter, Layer as _,
};

/// Set to `json` for structured log lines
const LOG_FORMAT_VAR: &str = "XRAY_LOG_FORMAT";

/// Installs the global subscriber. The dashboard owns stdout, so logs go to
/// `log_file` when one is given and are discarded otherwise.
pub fn init(log_level: &str, log_file: Option<&Path>) -> Result<(), TuiError> {
    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| TuiError::Logging(format!("{}: {e}", path.display())))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::sink),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| TuiError::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(make_fmt_layer(writer))
        .try_init()
        .map_err(|e| TuiError::Logging(e.to_string()))
}

pub fn make_fmt_layer<S, W>(writer: W) -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let use_json = std::env::var(LOG_FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(writer)
            .with_span_events(FmtSpan::NONE)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_line_number(true)
            .with_file(true)
            .with_writer(writer)
            .with_span_events(FmtSpan::NONE)
            .boxed()
    }
}
