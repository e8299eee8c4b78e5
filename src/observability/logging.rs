//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Pick the log level from `RUST_LOG`, falling back to configuration
//! - Choose between full and compact line layout

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Full => registry.with(fmt::layer()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
    }
}

fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("portfolio_feeds={level},feeds_cli={level},tower_http={level}"))
}
