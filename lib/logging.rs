use crate::build_info;
use std::error::Error as StdError;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing_log::LogTracer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for runtime logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    /// Parses `LOG_FORMAT`: `json` (default) or `text`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("text") => Self::Text,
            _ => Self::Json,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// Fields attached to the bootstrap event so every run can be traced back to a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingContext {
    pub service: String,
    pub mode: String,
    pub run_id: String,
    pub build_version: String,
    pub build_commit: String,
    pub format: LogFormat,
}

/// Installs the process-wide subscriber and emits one `logging_initialized` event.
///
/// `log` records from dependencies are bridged into `tracing`. `RUST_LOG` takes precedence
/// over `default_level`.
pub fn init_logging(service: &str, mode: &str, default_level: &str) -> LoggingContext {
    let context = LoggingContext {
        service: service.to_string(),
        mode: mode.to_string(),
        run_id: build_run_id(service),
        build_version: build_info::VERSION.to_string(),
        build_commit: build_info::short_commit_hash().to_string(),
        format: LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()),
    };

    install_subscriber(context.format, default_level);

    tracing::info!(
        event = "logging_initialized",
        service = %context.service,
        mode = %context.mode,
        run_id = %context.run_id,
        build_version = %context.build_version,
        build_commit = %context.build_commit,
        log_format = context.format.as_str(),
        "initialized logging"
    );

    context
}

fn install_subscriber(format: LogFormat, default_level: &str) {
    let _ = LogTracer::init();

    let result = match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(default_env_filter(default_level))
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .flatten_event(true),
            )
            .try_init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(default_env_filter(default_level))
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    };

    let _ = result;
}

fn default_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn build_run_id(service: &str) -> String {
    let epoch_millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or_default();
    format!("{service}-{}-{epoch_millis}", process::id())
}

/// Renders an error and its full source chain, one cause per line.
pub fn format_error_report(err: &(dyn StdError + 'static)) -> String {
    let mut report = format!("error: {err}");
    let mut current_source = err.source();
    let mut source_index = 1usize;
    while let Some(source) = current_source {
        report.push_str(&format!("\ncaused by ({source_index}): {source}"));
        current_source = source.source();
        source_index += 1;
    }
    report
}
