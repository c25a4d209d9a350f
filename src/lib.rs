//! # dslcheck: a Dify app DSL validator
//!
//! `dslcheck` checks a Dify application document (YAML, JSON or TOML) before it
//! is imported and reports every problem it can find in one pass:
//!
//! - **Schema**: `version`, `app.mode`, the `workflow.graph` container and
//!   `model_config` for chat-style apps.
//! - **Graph**: node ids, per-type required fields from the node-type registry,
//!   edge endpoints, variable references, reachability and cycles.
//! - **Version**: compatibility of the document's format version with the one
//!   the validator supports.
//! - **Frontend** (opt-in): canvas layout and feature panel settings.
//!
//! Validation never fails as a call; every outcome is a [`ValidationResult`]
//! with `errors`, `warnings` and best-effort document `info`.
//!
//! # Quick Start
//!
//! ```rust
//! use dslcheck::DslValidator;
//!
//! let yaml = r#"
//! version: "0.4.0"
//! app:
//!   mode: workflow
//! workflow:
//!   graph:
//!     nodes:
//!       - id: start
//!         data: { type: start, title: Start }
//!       - id: end
//!         data: { type: end, title: End, outputs: [] }
//!     edges:
//!       - { source: start, target: end }
//! "#;
//!
//! let result = DslValidator::default().validate(yaml);
//! assert!(result.success);
//! assert_eq!(result.info.node_count, 2);
//! ```

pub mod api;
pub mod config;
pub mod dsl;
pub mod error;

pub use crate::api::{
    supported_app_modes, supported_dsl_version, validate_dsl, DslValidator, DslValidatorBuilder,
    NodeSchemaInfo,
};
pub use crate::config::ValidatorConfig;
pub use crate::dsl::validation::{
    FieldShape, FieldSpec, IssueCode, NodeRole, NodeTypeRegistry, NodeTypeSpec, Severity,
    ValidationInfo, ValidationIssue, ValidationResult,
};
pub use crate::dsl::{AppMode, DslFormat, FormatVersion, NodeListing, NodeSummary, StructuralNode};
pub use crate::error::{ConfigError, DslError};
