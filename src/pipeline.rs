//! Loading the three documents and running parse → emit → patch.
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::codegen::{Codegen, Naming};
use crate::ir::Forest;
use crate::patcher::{self, FieldPatch};
use crate::schema::{self, Document};

/// The raw documents, already loaded.
#[derive(Debug, Clone)]
pub struct SchemaDocuments {
    pub objects: Value,
    pub methods: Value,
    pub responses: Value,
}

impl SchemaDocuments {
    /// Read `objects.json`, `methods.json` and `responses.json` from `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        Ok(Self {
            objects: load_document(dir, Document::Objects)?,
            methods: load_document(dir, Document::Methods)?,
            responses: load_document(dir, Document::Responses)?,
        })
    }

    pub fn get(&self, document: Document) -> &Value {
        match document {
            Document::Objects => &self.objects,
            Document::Methods => &self.methods,
            Document::Responses => &self.responses,
        }
    }

    pub fn parse(&self) -> Result<Forest> {
        schema::parse_forest(self.objects.clone(), &self.methods, &self.responses)
            .context("failed to parse schema")
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub naming: Naming,
    pub patches: Vec<FieldPatch>,
}

/// Parse, emit, then apply every patch in order. Any failure means no output.
pub fn generate(docs: &SchemaDocuments, options: &GenerateOptions) -> Result<String> {
    let forest = docs.parse()?;
    tracing::info!(
        objects = forest.objects.len(),
        methods = forest.methods.len(),
        responses = forest.responses.len(),
        "parsed schema"
    );

    let mut cg = Codegen::new(options.naming);
    cg.emit_forest(&forest).context("failed to emit sources")?;
    let source = cg.into_string();

    if options.patches.is_empty() {
        return Ok(source);
    }
    let patched = patcher::apply_patches(&source, &options.patches).context("failed to patch generated sources")?;
    tracing::info!(count = options.patches.len(), "applied patches");
    Ok(patched)
}

fn load_document(dir: &Path, document: Document) -> Result<Value> {
    let path = dir.join(document.file_name());
    let bytes = std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value =
        serde_json::from_slice(&bytes).with_context(|| format!("failed to parse JSON in {}", path.display()))?;
    match Document::detect(&value) {
        Some(found) if found == document => {}
        found => {
            tracing::warn!(path = %path.display(), expected = %document, ?found, "document does not look like the expected kind");
        }
    }
    Ok(value)
}
