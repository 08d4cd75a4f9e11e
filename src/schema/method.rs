use serde_json::Value;

use crate::error::SchemaError;
use crate::ir::{Definition, MethodDefinition, MethodParam};

use super::parser::{SchemaParser, json_string};

impl SchemaParser {
    /// Every entry of the methods document's `methods` array, in order.
    pub fn parse_methods(&self, document: &Value) -> Result<Vec<MethodDefinition>, SchemaError> {
        let methods = document
            .get("methods")
            .and_then(Value::as_array)
            .ok_or_else(|| SchemaError::malformed("methods", "methods document has no methods array"))?;

        let defs = methods
            .iter()
            .enumerate()
            .map(|(i, method)| self.parse_method_at(method, &format!("methods/{i}")))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = defs.len(), "parsed method definitions");
        Ok(defs)
    }

    pub fn parse_method(&self, method: &Value) -> Result<MethodDefinition, SchemaError> {
        self.parse_method_at(method, "method")
    }

    fn parse_method_at(&self, method: &Value, path: &str) -> Result<MethodDefinition, SchemaError> {
        let name = method
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::malformed(path, "method must have a name"))?;
        let path = format!("methods/{name}");

        let mut def = MethodDefinition {
            name: name.to_string(),
            description: method.get("description").map(json_string),
            access_token_type: method
                .get("access_token_type")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().map(json_string).collect())
                .unwrap_or_default(),
            ..MethodDefinition::default()
        };

        for param in method.get("parameters").and_then(Value::as_array).into_iter().flatten() {
            let param_name = param
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| SchemaError::malformed(&path, "parameter must have a name"))?;
            let expr = self.parse_node(param, &format!("{path}/parameters/{param_name}"))?;
            def.parameters.push(MethodParam {
                name: param_name.to_string(),
                required: param.get("required").and_then(Value::as_bool).unwrap_or(false),
                expr,
            });
        }

        if let Some(responses) = method.get("responses").and_then(Value::as_object) {
            for (resp_name, resp) in responses {
                let expr = self.parse_node(resp, &format!("{path}/responses/{resp_name}"))?;
                def.responses.push(Definition::new(resp_name.clone(), expr));
            }
        }

        Ok(def)
    }
}
