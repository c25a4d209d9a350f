pub mod inventory;
pub mod parser;
pub mod schema;
pub mod structural;
pub mod validation;

pub use inventory::{list_nodes, NodeListing, NodeSummary};
pub use parser::{load_document, load_document_bytes, DslFormat};
pub use schema::{AppMode, FormatVersion, CURRENT_DSL_VERSION};
pub use structural::{NodeKind, Scalar, StructuralNode};
pub use validation::{validate_document, validate_dsl, validate_dsl_bytes};
