//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → retry_policy() / circuit_breaker() / request_timeout()
//!     → client defaults (CLI flags override)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BreakerConfig, ClientConfig, ObservabilityConfig, PaginationConfig, TimeoutConfig,
    TracingConfig,
};
pub use validation::{validate_config, ValidationError};
