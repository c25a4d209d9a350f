//! Error types for the validator.
//!
//! Validation findings are never errors: they are returned as
//! [`ValidationIssue`](crate::dsl::validation::ValidationIssue) values.
//! The types here cover the fallible edges of the crate.
//!
//! - [`DslError`]: the document could not be loaded into a structural tree.
//! - [`ConfigError`]: a validator configuration could not be built.

pub mod config_error;
pub mod dsl_error;

pub use config_error::ConfigError;
pub use dsl_error::DslError;

/// Convenience alias for document loading results.
pub type DslResult<T> = Result<T, DslError>;
/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
