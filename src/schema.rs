//! Schema ingestion: three interlinked documents → IR forest.
//!
//! Objects come first because method parameters and response bodies point
//! into them. Pointers into the responses document stay name-only stubs;
//! the responses extractor produces their bodies on its own pass.
pub mod method;
pub mod parser;
pub mod pointer;
pub mod resolver;
pub mod response;

use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::Forest;

pub use parser::SchemaParser;
pub use pointer::{Document, Pointer};
pub use resolver::{ObjectIndex, Reference, Resolver};

/// Parse all three documents in dependency order. Stops at the first error.
pub fn parse_forest(objects: Value, methods: &Value, responses: &Value) -> Result<Forest, SchemaError> {
    let parser = SchemaParser::new(objects);
    let objects = parser.parse_objects()?;
    let methods = parser.parse_methods(methods)?;
    let responses = parser.parse_responses(responses)?;
    Ok(Forest { objects, methods, responses })
}
