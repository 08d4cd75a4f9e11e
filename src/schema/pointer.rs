//! Pointer grammar: `<document-id> "/" <segment> ("/" <segment>)*`.
//!
//! The document id is a file name with an optional trailing `#`
//! (`objects.json#/definitions/users_user`). Pointers are parsed once, up
//! front, so lookups never split strings again.

use std::fmt;

use serde_json::Value;

use crate::error::SchemaError;

/// The three documents of one API description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    Objects,
    Methods,
    Responses,
}

impl Document {
    pub const ALL: [Document; 3] = [Document::Objects, Document::Methods, Document::Responses];

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Objects => "objects.json",
            Self::Methods => "methods.json",
            Self::Responses => "responses.json",
        }
    }

    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|doc| doc.file_name() == name)
    }

    /// Guess which document a loaded value is from its top-level shape.
    pub fn detect(value: &Value) -> Option<Self> {
        if value.get("methods").is_some_and(Value::is_array) {
            return Some(Self::Methods);
        }
        match value.get("title").and_then(Value::as_str) {
            Some("objects") => Some(Self::Objects),
            Some("responses") => Some(Self::Responses),
            _ => None,
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pointer {
    raw: String,
    document: Document,
    segments: Vec<String>,
}

impl Pointer {
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let invalid = |reason| SchemaError::InvalidPointer { pointer: raw.to_string(), reason };

        let (document_id, path) = raw.split_once('/').ok_or_else(|| invalid("missing path"))?;
        let document_id = document_id.strip_suffix('#').unwrap_or(document_id);
        if document_id.is_empty() {
            return Err(invalid("missing document id"));
        }
        let document = Document::from_file_name(document_id).ok_or_else(|| {
            SchemaError::UnsupportedReferenceDocument {
                pointer: raw.to_string(),
                document: document_id.to_string(),
            }
        })?;

        let segments = path
            .split('/')
            .map(|seg| {
                if seg.is_empty() {
                    Err(invalid("empty path segment"))
                } else {
                    Ok(seg.replace("~1", "/").replace("~0", "~"))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { raw: raw.to_string(), document, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn document(&self) -> Document {
        self.document
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final path segment: the name of the pointed-at definition.
    pub fn name(&self) -> &str {
        // parse() rejects pointers without at least one segment
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Walk the segments from `root`.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |node, seg| match node {
            Value::Object(map) => map.get(seg),
            Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
