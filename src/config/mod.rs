//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FeedsConfig (validated, immutable)
//!     → secrets.rs (resolve credentials named by *_env fields)
//!     → lifecycle::startup builds clients, caches and feeds from both
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Credentials never appear in the file, only the names of the
//!   environment variables that hold them

pub mod loader;
pub mod schema;
pub mod secrets;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, CheckoutConfig, FeedSettings, FeedsConfig, GithubConfig, LanyardConfig,
    ListenerConfig, LogFormat, ObservabilityConfig, ProvidersConfig, RetryConfig, SanityConfig,
    SpotifyConfig, TimeoutConfig, UmamiConfig,
};
pub use secrets::{EnvSource, SecretSource, Secrets, SpotifyCredentials};
pub use validation::{validate_config, ValidationError};
