//! Recursive descent from raw schema nodes to [`TypeExpr`].
//!
//! Keyword precedence, first match wins:
//! 1. `properties` are collected (never terminal)
//! 2. `$ref`   → reference
//! 3. `allOf`  → conjunction (checked before `type`: some all-of nodes have none)
//! 4. no `type` → untyped placeholder
//! 5. `type` + `enum` → enum; scalar → base; `object` + `oneOf` → disjunction;
//!    `array` → array (needs `items`); anything else keeps what was collected

use std::sync::Arc;

use ordered_float::OrderedFloat;
use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::{Definition, EnumShape, EnumValue, ScalarKind, Shape, TypeExpr};

use super::resolver::{ObjectIndex, Resolver};

#[derive(Debug, Clone, Default)]
pub struct SchemaParser {
    resolver: Resolver,
}

impl SchemaParser {
    /// `objects` is the whole objects document; every `objects.json` pointer is
    /// looked up in it.
    pub fn new(objects: Value) -> Self {
        Self::with_resolver(Resolver::new(Arc::new(ObjectIndex::new(objects))))
    }

    pub fn from_slice(objects: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_slice(objects)?))
    }

    pub fn with_resolver(resolver: Resolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Every entry of the objects document's `definitions`, in document order.
    pub fn parse_objects(&self) -> Result<Vec<Definition>, SchemaError> {
        let definitions = definitions_map(self.resolver.index().root(), "objects")?;
        let mut defs = Vec::with_capacity(definitions.len());
        for (name, node) in definitions {
            let expr = self.parse_node(node, &format!("definitions/{name}"))?;
            defs.push(Definition::new(name.clone(), expr));
        }
        tracing::debug!(count = defs.len(), "parsed object definitions");
        Ok(defs)
    }

    pub fn parse_type_expr(&self, node: &Value) -> Result<TypeExpr, SchemaError> {
        self.parse_node(node, "#")
    }

    /// `path` is only used for error context.
    pub(crate) fn parse_node(&self, node: &Value, path: &str) -> Result<TypeExpr, SchemaError> {
        let mut expr = TypeExpr {
            description: node.get("description").map(json_string),
            ..TypeExpr::default()
        };

        // 1) properties
        if let Some(props) = node.get("properties") {
            let props = props
                .as_object()
                .ok_or_else(|| SchemaError::malformed(path, "properties must be an object"))?;
            for (name, prop) in props {
                let prop_expr = self.parse_node(prop, &format!("{path}/properties/{name}"))?;
                expr.properties.push(Definition::new(name.clone(), prop_expr));
            }
        }
        if let Some(required) = node.get("required").and_then(Value::as_array) {
            expr.required = required.iter().map(json_string).collect();
        }

        // 2) $ref
        if let Some(raw) = node.get("$ref") {
            let raw = raw
                .as_str()
                .ok_or_else(|| SchemaError::malformed(path, "$ref must be a string"))?;
            expr.shape = Shape::Ref(self.resolver.reference(raw)?);
            return Ok(expr);
        }

        // 3) allOf
        if let Some(items) = node.get("allOf").and_then(Value::as_array) {
            let parts = self.parse_list(items, &format!("{path}/allOf"))?;
            expr.shape = Shape::AllOf(parts);
            return Ok(expr);
        }

        // 4) typeless placeholder
        let Some(type_name) = node.get("type").map(json_string) else {
            tracing::trace!(path, "node has no type keyword");
            return Ok(expr);
        };
        expr.type_name = Some(type_name.clone());

        // 5) typed
        if let Some(literals) = node.get("enum").and_then(Value::as_array) {
            expr.shape = Shape::Enum(parse_enum(node, &type_name, literals, path)?);
            return Ok(expr);
        }

        if let Some(kind) = ScalarKind::from_keyword(&type_name) {
            expr.shape = Shape::Base(kind);
            return Ok(expr);
        }
        match type_name.as_str() {
            "object" => {
                expr.shape = Shape::Plain;
                if let Some(items) = node.get("oneOf").and_then(Value::as_array) {
                    let arms = self.parse_list(items, &format!("{path}/oneOf"))?;
                    expr.shape = Shape::OneOf(arms);
                }
            }
            "array" => {
                let items = node
                    .get("items")
                    .ok_or_else(|| SchemaError::malformed(path, "array must have items field"))?;
                let item = self.parse_node(items, &format!("{path}/items"))?;
                expr.shape = Shape::Array(Box::new(item));
            }
            other => {
                tracing::debug!(path, type_name = other, "unrecognized type keyword, keeping collected shape");
                expr.shape = Shape::Plain;
            }
        }

        Ok(expr)
    }

    fn parse_list(&self, items: &[Value], path: &str) -> Result<Vec<TypeExpr>, SchemaError> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.parse_node(item, &format!("{path}/{i}")))
            .collect()
    }
}

pub(crate) fn definitions_map<'a>(
    document: &'a Value,
    kind: &str,
) -> Result<&'a serde_json::Map<String, Value>, SchemaError> {
    document
        .get("definitions")
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::malformed("definitions", format!("{kind} document has no definitions map")))
}

fn parse_enum(node: &Value, type_name: &str, literals: &[Value], path: &str) -> Result<EnumShape, SchemaError> {
    let kind = match ScalarKind::from_keyword(type_name) {
        Some(kind @ (ScalarKind::String | ScalarKind::Number | ScalarKind::Integer)) => kind,
        _ => {
            return Err(SchemaError::malformed(path, format!("unsupported enum type: {type_name}")));
        }
    };

    let values = literals
        .iter()
        .map(|lit| {
            let value = match kind {
                ScalarKind::String => lit.as_str().map(|s| EnumValue::String(s.to_string())),
                ScalarKind::Number => lit.as_f64().map(|f| EnumValue::Number(OrderedFloat(f))),
                ScalarKind::Integer => lit.as_i64().map(EnumValue::Integer),
                ScalarKind::Boolean => None,
            };
            value.ok_or_else(|| SchemaError::malformed(path, format!("enum literal {lit} is not a {kind}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let names: Vec<String> = node
        .get("enumNames")
        .and_then(Value::as_array)
        .map(|names| names.iter().map(json_string).collect())
        .unwrap_or_default();
    if !names.is_empty() && names.len() != values.len() {
        return Err(SchemaError::malformed(
            path,
            format!("enumNames has {} entries for {} enum values", names.len(), values.len()),
        ));
    }

    Ok(EnumShape { kind, values, names })
}

/// String content for strings, JSON text for everything else.
pub(crate) fn json_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
