pub mod cli;
pub mod codegen;
pub mod compare;
pub mod error;
pub mod ir;
pub mod logging;
pub mod manifest;
pub mod patcher;
pub mod pipeline;
pub mod schema;

pub use compare::{equal_definition, equal_type};
pub use error::{PatchError, SchemaError};
pub use patcher::{FieldPatch, Patcher};
pub use schema::{SchemaParser, parse_forest};
