//! Public API layer: stable entry points for external consumers.

mod validator;

pub use validator::{
    supported_app_modes, supported_dsl_version, validate_dsl, DslValidator, DslValidatorBuilder,
    NodeSchemaInfo,
};
