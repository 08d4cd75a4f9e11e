use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::{ResponseDefinition, ResponseExpr};

use super::parser::{SchemaParser, definitions_map, json_string};

impl SchemaParser {
    /// Every entry of the responses document's `definitions`, in order.
    pub fn parse_responses(&self, document: &Value) -> Result<Vec<ResponseDefinition>, SchemaError> {
        let definitions = definitions_map(document, "responses")?;
        let mut defs = Vec::with_capacity(definitions.len());
        for (name, node) in definitions {
            let expr = self.parse_response_expr(node, &format!("definitions/{name}"))?;
            defs.push(ResponseDefinition { name: name.clone(), expr });
        }
        tracing::debug!(count = defs.len(), "parsed response definitions");
        Ok(defs)
    }

    fn parse_response_expr(&self, node: &Value, path: &str) -> Result<ResponseExpr, SchemaError> {
        let response = node
            .get("properties")
            .and_then(|props| props.get("response"))
            .ok_or_else(|| SchemaError::malformed(path, "properties.response field does not exist"))?;

        let expr = self.parse_node(response, &format!("{path}/properties/response"))?;
        let required = response
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().map(json_string).collect())
            .unwrap_or_default();
        Ok(ResponseExpr { expr, required })
    }
}
