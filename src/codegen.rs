//! Emit Rust source from the IR forest.
//!
//! - objects with properties → `struct` (fields not listed in `required` are `Option`)
//! - string enums → `enum` with serde renames; numeric enums → alias + consts
//! - `oneOf` → `#[serde(untagged)] enum`; `allOf` → struct with merged/flattened parts
//! - arrays → `Vec<T>`; untyped nodes → `serde_json::Value`
//! - references are emitted by name only, never dereferenced; a reference to
//!   an object on a reference cycle is boxed
//!
//! Inline shapes get a name derived from their parent and field. Two inline
//! shapes that compare structurally equal, with the same `required` lists at
//! every level, share one declaration.
pub mod naming;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::compare;
use crate::error::SchemaError;
use crate::ir::{Definition, EnumShape, EnumValue, Forest, MethodDefinition, ResponseDefinition, ScalarKind, Shape, TypeExpr};
use crate::schema::Document;

pub use naming::Naming;

const HEADER: &str = "// Code generated by apigen. DO NOT EDIT.\n";

pub struct Codegen {
    naming: Naming,
    out: String,
    declared: HashSet<String>,
    consts: HashSet<String>,
    /// emitted name of every top-level definition
    top_level: HashMap<(Document, String), String>,
    /// objects that can reach themselves through references
    cyclic: HashSet<String>,
    /// inline shapes emitted so far, by declared name
    inline: IndexMap<String, TypeExpr>,
}

impl Codegen {
    pub fn new(naming: Naming) -> Self {
        let mut out = String::from(HEADER);
        if !naming.rename {
            out.push_str("#![allow(non_camel_case_types, non_snake_case)]\n");
        }
        out.push_str("\nuse serde::{Deserialize, Serialize};\n\n");
        Self {
            naming,
            out,
            declared: HashSet::new(),
            consts: HashSet::new(),
            top_level: HashMap::new(),
            cyclic: HashSet::new(),
            inline: IndexMap::new(),
        }
    }

    pub fn emit_forest(&mut self, forest: &Forest) -> Result<(), SchemaError> {
        // top-level names are fixed up front so references can name them
        // before they are emitted
        for def in &forest.objects {
            self.top_level_name(Document::Objects, &def.name);
        }
        for def in &forest.responses {
            self.top_level_name(Document::Responses, &def.name);
        }
        self.cyclic = cyclic_objects(&forest.objects);

        for def in &forest.objects {
            self.emit_object(def)?;
        }
        for def in &forest.responses {
            self.emit_response(def)?;
        }
        for method in &forest.methods {
            self.emit_method(method)?;
        }
        tracing::debug!(
            objects = forest.objects.len(),
            responses = forest.responses.len(),
            methods = forest.methods.len(),
            inline = self.inline.len(),
            "emitted forest"
        );
        Ok(())
    }

    fn emit_object(&mut self, def: &Definition) -> Result<(), SchemaError> {
        let name = self.top_level_name(Document::Objects, &def.name);
        self.emit_named(&name, &def.expr, &def.expr.required)
    }

    fn emit_response(&mut self, def: &ResponseDefinition) -> Result<(), SchemaError> {
        let name = self.top_level_name(Document::Responses, &def.name);
        self.emit_named(&name, &def.expr.expr, &def.expr.required)
    }

    fn emit_method(&mut self, method: &MethodDefinition) -> Result<(), SchemaError> {
        let base = self.naming.type_name(&method.name);
        let name = self.claim(&format!("{base}Params"));

        let mut docs = Vec::new();
        if let Some(description) = &method.description {
            docs.push(description.clone());
            docs.push(String::new());
        }
        if !method.access_token_type.is_empty() {
            docs.push(format!("Access: {}", method.access_token_type.join(", ")));
        }
        for response in &method.responses {
            let hint = naming::inline_type_name(&base, &response.name);
            let ty = self.type_ref(&hint, &response.expr)?;
            docs.push(format!("Response `{}`: [`{ty}`]", response.name));
        }

        let mut body = String::new();
        let mut fields = FieldSet::default();
        for param in &method.parameters {
            self.push_field(&mut body, &mut fields, &name, &param.name, &param.expr, !param.required, false)?;
        }

        push_doc(&mut self.out, "", &docs.join("\n"));
        self.out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        self.out.push_str(&format!("pub struct {name} {{\n{body}}}\n\n"));
        self.out.push_str(&format!(
            "impl {name} {{\n    pub const METHOD: &'static str = {:?};\n}}\n\n",
            method.name
        ));
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn emit_named(&mut self, name: &str, expr: &TypeExpr, required: &[String]) -> Result<(), SchemaError> {
        match &expr.shape {
            _ if expr.is_object() => self.emit_struct(name, expr, required),
            Shape::Enum(e) => self.emit_enum(name, expr, e),
            Shape::OneOf(arms) => self.emit_one_of(name, expr, arms),
            Shape::AllOf(parts) => self.emit_all_of(name, expr, parts, required),
            _ => {
                let ty = self.type_ref(&format!("{name}Inner"), expr)?;
                self.push_description(expr);
                self.out.push_str(&format!("pub type {name} = {ty};\n\n"));
                Ok(())
            }
        }
    }

    fn emit_struct(&mut self, name: &str, expr: &TypeExpr, required: &[String]) -> Result<(), SchemaError> {
        let mut body = String::new();
        let mut fields = FieldSet::default();
        for prop in &expr.properties {
            let optional = !required.contains(&prop.name);
            self.push_field(&mut body, &mut fields, name, &prop.name, &prop.expr, optional, false)?;
        }
        self.push_description(expr);
        self.out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        self.out.push_str(&format!("pub struct {name} {{\n{body}}}\n\n"));
        Ok(())
    }

    fn emit_all_of(
        &mut self,
        name: &str,
        expr: &TypeExpr,
        parts: &[TypeExpr],
        required: &[String],
    ) -> Result<(), SchemaError> {
        let mut body = String::new();
        let mut fields = FieldSet::default();
        for prop in &expr.properties {
            let optional = !required.contains(&prop.name);
            self.push_field(&mut body, &mut fields, name, &prop.name, &prop.expr, optional, false)?;
        }
        for (i, part) in parts.iter().enumerate() {
            if let Some(reference) = part.as_reference() {
                let target = reference.target_name().to_string();
                self.push_field(&mut body, &mut fields, name, &target, part, false, true)?;
            } else if part.is_object() {
                for prop in &part.properties {
                    let optional = !(required.contains(&prop.name) || part.is_required(&prop.name));
                    self.push_field(&mut body, &mut fields, name, &prop.name, &prop.expr, optional, false)?;
                }
            } else {
                self.push_field(&mut body, &mut fields, name, &format!("part_{i}"), part, false, true)?;
            }
        }
        self.push_description(expr);
        self.out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        self.out.push_str(&format!("pub struct {name} {{\n{body}}}\n\n"));
        Ok(())
    }

    fn emit_one_of(&mut self, name: &str, expr: &TypeExpr, arms: &[TypeExpr]) -> Result<(), SchemaError> {
        let mut body = String::new();
        let mut variants = HashSet::new();
        for (i, arm) in arms.iter().enumerate() {
            let label = match &arm.shape {
                Shape::Ref(r) => self.naming.variant_name(r.target_name()),
                Shape::Base(kind) => self.naming.variant_name(kind.as_str()),
                _ => format!("Variant{i}"),
            };
            let variant = unique(&mut variants, label);
            let ty = self.field_type(&format!("{name}{variant}"), arm)?;
            push_doc(&mut body, "    ", arm.description.as_deref().unwrap_or_default());
            body.push_str(&format!("    {variant}({ty}),\n"));
        }
        self.push_description(expr);
        self.out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        self.out.push_str("#[serde(untagged)]\n");
        self.out.push_str(&format!("pub enum {name} {{\n{body}}}\n\n"));
        Ok(())
    }

    fn emit_enum(&mut self, name: &str, expr: &TypeExpr, e: &EnumShape) -> Result<(), SchemaError> {
        self.push_description(expr);
        if e.kind != ScalarKind::String || e.values.is_empty() {
            self.out.push_str(&format!("pub type {name} = {};\n", scalar_type(e.kind)));
            for (i, value) in e.values.iter().enumerate() {
                let label = e.names.get(i).cloned().unwrap_or_else(|| value.to_string());
                let konst = self.naming.const_name(&format!("{name}_{label}"));
                let konst = unique(&mut self.consts, konst);
                self.out.push_str(&format!("pub const {konst}: {name} = {};\n", literal(value)));
            }
            self.out.push('\n');
            return Ok(());
        }

        let mut body = String::new();
        let mut variants = HashSet::new();
        for (i, value) in e.values.iter().enumerate() {
            let raw = value.to_string();
            let label = e.names.get(i).map_or_else(|| raw.clone(), Clone::clone);
            let variant = unique(&mut variants, self.naming.variant_name(&label));
            body.push_str(&format!("    #[serde(rename = {raw:?})]\n    {variant},\n"));
        }
        self.out.push_str("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
        self.out.push_str(&format!("pub enum {name} {{\n{body}}}\n\n"));
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn push_field(
        &mut self,
        body: &mut String,
        fields: &mut FieldSet,
        owner: &str,
        raw_name: &str,
        expr: &TypeExpr,
        optional: bool,
        flatten: bool,
    ) -> Result<(), SchemaError> {
        // allOf parts may repeat a property; the first one wins
        if !fields.raw.insert(raw_name.to_string()) {
            return Ok(());
        }
        // distinct schema names can still convert to the same identifier
        let field = unique(&mut fields.idents, self.naming.field_name(raw_name));
        let mut ty = self.field_type(&naming::inline_type_name(owner, raw_name), expr)?;
        if optional {
            ty = format!("Option<{ty}>");
        }

        push_doc(body, "    ", expr.description.as_deref().unwrap_or_default());
        if flatten {
            body.push_str("    #[serde(flatten)]\n");
        } else if field.strip_prefix("r#").unwrap_or(&field) != raw_name {
            body.push_str(&format!("    #[serde(rename = {raw_name:?})]\n"));
        }
        if optional {
            body.push_str("    #[serde(default, skip_serializing_if = \"Option::is_none\")]\n");
        }
        body.push_str(&format!("    pub {field}: {ty},\n"));
        Ok(())
    }

    fn type_ref(&mut self, hint: &str, expr: &TypeExpr) -> Result<String, SchemaError> {
        Ok(match &expr.shape {
            _ if expr.is_object() => self.inline(hint, expr)?,
            Shape::Untyped | Shape::Plain => "serde_json::Value".to_string(),
            Shape::Base(kind) => scalar_type(*kind).to_string(),
            Shape::Ref(r) => self.reference_name(r.document(), r.target_name()),
            Shape::Array(item) => format!("Vec<{}>", self.type_ref(&format!("{hint}Item"), item)?),
            Shape::Enum(e) if e.kind != ScalarKind::String => scalar_type(e.kind).to_string(),
            Shape::Enum(_) | Shape::AllOf(_) | Shape::OneOf(_) => self.inline(hint, expr)?,
        })
    }

    /// Like `type_ref`, boxing references that can lead back to themselves.
    fn field_type(&mut self, hint: &str, expr: &TypeExpr) -> Result<String, SchemaError> {
        let ty = self.type_ref(hint, expr)?;
        Ok(match &expr.shape {
            Shape::Ref(r) if r.document() == Document::Objects && self.cyclic.contains(r.target_name()) => {
                format!("Box<{ty}>")
            }
            _ => ty,
        })
    }

    fn reference_name(&self, document: Document, raw: &str) -> String {
        match self.top_level.get(&(document, raw.to_string())) {
            Some(name) => name.clone(),
            None => self.naming.type_name(raw),
        }
    }

    fn top_level_name(&mut self, document: Document, raw: &str) -> String {
        let key = (document, raw.to_string());
        if let Some(name) = self.top_level.get(&key) {
            return name.clone();
        }
        let wanted = self.naming.type_name(raw);
        let name = self.claim(&wanted);
        self.top_level.insert(key, name.clone());
        name
    }

    /// Declare (or reuse) a named type for an inline shape.
    fn inline(&mut self, hint: &str, expr: &TypeExpr) -> Result<String, SchemaError> {
        for (name, seen) in &self.inline {
            if same_required(seen, expr) && compare::equal_type(seen, expr)? {
                tracing::trace!(%name, hint, "reusing structurally equal inline type");
                return Ok(name.clone());
            }
        }
        let name = self.claim(hint);
        self.inline.insert(name.clone(), expr.clone());
        self.emit_named(&name, expr, &expr.required)?;
        Ok(name)
    }

    /// Reserve a type name, suffixing a counter on collision.
    fn claim(&mut self, wanted: &str) -> String {
        let mut name = wanted.to_string();
        let mut n = 2;
        while self.declared.contains(&name) {
            name = format!("{wanted}{n}");
            n += 1;
        }
        self.declared.insert(name.clone());
        name
    }

    fn push_description(&mut self, expr: &TypeExpr) {
        push_doc(&mut self.out, "", expr.description.as_deref().unwrap_or_default());
    }
}

fn scalar_type(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Integer => "i64",
        ScalarKind::Number => "f64",
        ScalarKind::String => "String",
        ScalarKind::Boolean => "bool",
    }
}

fn literal(value: &EnumValue) -> String {
    match value {
        EnumValue::Integer(i) => i.to_string(),
        EnumValue::Number(n) => format!("{:?}", n.0),
        EnumValue::String(s) => format!("{s:?}"),
    }
}

fn unique(used: &mut HashSet<String>, wanted: String) -> String {
    let mut name = wanted.clone();
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{wanted}{n}");
        n += 1;
    }
    used.insert(name.clone());
    name
}

/// Names already taken inside one struct body.
#[derive(Default)]
struct FieldSet {
    raw: HashSet<String>,
    idents: HashSet<String>,
}

/// `required` lists agree at every level. Positional, like `equal_type`.
fn same_required(a: &TypeExpr, b: &TypeExpr) -> bool {
    if a.required != b.required {
        return false;
    }
    let props = a
        .properties
        .iter()
        .zip(&b.properties)
        .all(|(x, y)| same_required(&x.expr, &y.expr));
    props
        && match (&a.shape, &b.shape) {
            (Shape::AllOf(xs), Shape::AllOf(ys)) | (Shape::OneOf(xs), Shape::OneOf(ys)) => {
                xs.iter().zip(ys).all(|(x, y)| same_required(x, y))
            }
            (Shape::Array(x), Shape::Array(y)) => same_required(x, y),
            _ => true,
        }
}

/// Objects that reach themselves by following references at any depth.
fn cyclic_objects(objects: &[Definition]) -> HashSet<String> {
    let graph: HashMap<&str, Vec<&str>> = objects
        .iter()
        .map(|def| {
            let mut targets = Vec::new();
            collect_references(&def.expr, &mut targets);
            (def.name.as_str(), targets)
        })
        .collect();

    graph
        .keys()
        .filter(|start| reaches(&graph, start, start))
        .map(|name| name.to_string())
        .collect()
}

/// Whether `to` is reachable from `from` by at least one edge.
fn reaches(graph: &HashMap<&str, Vec<&str>>, from: &str, to: &str) -> bool {
    let mut visited = HashSet::new();
    let mut stack: Vec<&str> = graph.get(from).cloned().unwrap_or_default();
    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if visited.insert(node) {
            stack.extend(graph.get(node).into_iter().flatten());
        }
    }
    false
}

fn collect_references<'a>(expr: &'a TypeExpr, out: &mut Vec<&'a str>) {
    for prop in &expr.properties {
        collect_references(&prop.expr, out);
    }
    match &expr.shape {
        Shape::Ref(r) if r.document() == Document::Objects => out.push(r.target_name()),
        Shape::AllOf(parts) | Shape::OneOf(parts) => {
            for part in parts {
                collect_references(part, out);
            }
        }
        Shape::Array(item) => collect_references(item, out),
        _ => {}
    }
}

fn push_doc(out: &mut String, indent: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push_str(&format!("{indent}///\n"));
        } else {
            out.push_str(&format!("{indent}/// {line}\n"));
        }
    }
}
