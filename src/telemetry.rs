//! Structured logging setup.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Directive applied when `RUST_LOG` is unset or unusable.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback filter directive does not parse.
    #[error("invalid log filter directive: {0}")]
    InvalidDirective(#[from] tracing_subscriber::filter::ParseError),
    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Installs a fmt subscriber filtered by `RUST_LOG`, or by
/// `default_directive` when that variable is unset or invalid.
///
/// # Errors
///
/// Returns [`TelemetryError`] when `default_directive` is invalid or a
/// global subscriber has already been set.
pub fn init_tracing(default_directive: &str) -> Result<(), TelemetryError> {
    let filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), default_directive)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(TelemetryError::Install)
}

fn build_filter(
    from_env: Option<String>,
    default_directive: &str,
) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = from_env.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(default_directive)?)
}
