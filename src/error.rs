use thiserror::Error;

/// Failures while turning schema documents into IR.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("malformed schema at `{path}`: {reason}")]
    MalformedSchema { path: String, reason: String },

    #[error("unresolved reference `{pointer}`")]
    UnresolvedReference { pointer: String },

    #[error("unsupported reference document `{document}` in `{pointer}`")]
    UnsupportedReferenceDocument { pointer: String, document: String },

    #[error("invalid pointer `{pointer}`: {reason}")]
    InvalidPointer { pointer: String, reason: &'static str },
}

impl SchemaError {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSchema { path: path.to_string(), reason: reason.into() }
    }
}

/// Failures of the source patcher. The input text is never touched on error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("source does not parse: {reason}")]
    MalformedSource { reason: String },

    #[error("struct with name {name} not found")]
    DeclarationNotFound { name: String },

    #[error("{name} is not a struct type (found {found})")]
    NotAnAggregateType { name: String, found: &'static str },

    #[error("{declaration} has a field slot without exactly one name; cannot address `{field}`")]
    AmbiguousFieldName { declaration: String, field: String },

    #[error("field with name {field} not found in {declaration}")]
    FieldNotFound { declaration: String, field: String },

    #[error("`{text}` is not a type expression: {reason}")]
    MalformedTypeExpression { text: String, reason: String },
}
