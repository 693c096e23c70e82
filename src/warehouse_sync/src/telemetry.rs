//! Structured logging setup for the binary.

use shared_utils::env::get_env_opt;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset or invalid.
    pub filter: String,
    /// One JSON object per event instead of human readable lines.
    pub json: bool,
    /// Emit span open/close events (per-country timing).
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Settings from `RUST_LOG` and `LOG_JSON` (`1` or `true`).
    pub fn from_env() -> Self {
        Self {
            filter: get_env_opt("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            json: get_env_opt("LOG_JSON").is_some_and(|v| is_truthy(&v)),
            span_events: false,
        }
    }

    /// Replaces the filter directives.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Switches JSON output.
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Switches span open/close events.
    pub fn with_span_events(mut self, span_events: bool) -> Self {
        self.span_events = span_events;
        self
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json {
        let layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_target(true)
            .with_current_span(true);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
    } else {
        let layer = fmt::layer()
            .with_span_events(span_events)
            .with_target(false);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
    }
}

/// [`init_tracing`] with [`TracingConfig::from_env`].
pub fn init_tracing_from_env() -> Result<(), TryInitError> {
    init_tracing(&TracingConfig::from_env())
}
