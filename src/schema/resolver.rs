//! Reference resolution against the loaded objects document.
//!
//! A [`Reference`] is a parsed pointer plus a handle to the read-only object
//! index. Nothing is looked up until [`Reference::resolve`] is called, so
//! definitions that point at each other parse in bounded time.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::Definition;

use super::parser::SchemaParser;
use super::pointer::{Document, Pointer};

/// The objects document, immutable once loaded.
#[derive(Debug, Default)]
pub struct ObjectIndex {
    root: Value,
}

impl ObjectIndex {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolver {
    index: Arc<ObjectIndex>,
}

impl Resolver {
    pub fn new(index: Arc<ObjectIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &ObjectIndex {
        &self.index
    }

    /// Parse `raw` and check the target document is one we can address.
    pub fn reference(&self, raw: &str) -> Result<Reference, SchemaError> {
        let pointer = Pointer::parse(raw)?;
        match pointer.document() {
            Document::Objects | Document::Responses => Ok(Reference {
                pointer,
                resolver: self.clone(),
            }),
            other => Err(SchemaError::UnsupportedReferenceDocument {
                pointer: raw.to_string(),
                document: other.file_name().to_string(),
            }),
        }
    }

    pub fn resolve(&self, pointer: &Pointer) -> Result<Definition, SchemaError> {
        match pointer.document() {
            Document::Objects => {
                let node = pointer.lookup(self.index.root()).ok_or_else(|| {
                    SchemaError::UnresolvedReference { pointer: pointer.to_string() }
                })?;
                let parser = SchemaParser::with_resolver(self.clone());
                let expr = parser.parse_node(node, pointer.as_str())?;
                Ok(Definition::new(pointer.name(), expr))
            }
            // response bodies come from the responses extractor, not from here
            Document::Responses => Ok(Definition::stub(pointer.name())),
            other => Err(SchemaError::UnsupportedReferenceDocument {
                pointer: pointer.to_string(),
                document: other.file_name().to_string(),
            }),
        }
    }
}

/// Deferred pointer into another definition.
#[derive(Clone)]
pub struct Reference {
    pointer: Pointer,
    resolver: Resolver,
}

impl Reference {
    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn target_name(&self) -> &str {
        self.pointer.name()
    }

    pub fn document(&self) -> Document {
        self.pointer.document()
    }

    /// Re-parse the target. Pure: calling it twice gives equal definitions.
    pub fn resolve(&self) -> Result<Definition, SchemaError> {
        tracing::trace!(pointer = %self.pointer, "resolving reference");
        self.resolver.resolve(&self.pointer)
    }
}

// the resolver holds the whole objects document; keep it out of debug dumps
impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reference").field(&self.pointer.as_str()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ScalarKind, Shape};
    use serde_json::json;

    fn resolver(doc: Value) -> Resolver {
        Resolver::new(Arc::new(ObjectIndex::new(doc)))
    }

    #[test]
    fn object_pointer_resolves_to_parsed_definition() {
        let r = resolver(json!({"definitions": {"base_ok": {"type": "integer", "enum": [1]}}}));
        let reference = r.reference("objects.json#/definitions/base_ok").unwrap();
        let def = reference.resolve().unwrap();
        assert_eq!(def.name, "base_ok");
        assert!(matches!(def.expr.shape, Shape::Enum(ref e) if e.kind == ScalarKind::Integer));
    }

    #[test]
    fn response_pointer_is_a_stub() {
        let r = resolver(json!({"definitions": {}}));
        let def = r
            .reference("responses.json#/definitions/users_get_response")
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(def.name, "users_get_response");
        assert!(def.expr.is_untyped());
        assert!(def.expr.properties.is_empty());
    }

    #[test]
    fn missing_target_is_unresolved() {
        let r = resolver(json!({"definitions": {}}));
        let reference = r.reference("objects.json#/definitions/nope").unwrap();
        assert_eq!(
            reference.resolve().unwrap_err(),
            SchemaError::UnresolvedReference {
                pointer: "objects.json#/definitions/nope".to_string()
            }
        );
    }

    #[test]
    fn methods_document_is_not_addressable() {
        let r = resolver(json!({}));
        let err = r.reference("methods.json#/methods/0").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedReferenceDocument { ref document, .. } if document == "methods.json"));
    }

    #[test]
    fn debug_output_shows_only_the_pointer() {
        let r = resolver(json!({"definitions": {"a": {"type": "string"}}}));
        let reference = r.reference("objects.json#/definitions/a").unwrap();
        assert_eq!(format!("{reference:?}"), r#"Reference("objects.json#/definitions/a")"#);
    }
}
