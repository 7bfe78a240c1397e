// src/inputs.rs
//! Typed access to node inputs through the node's declared field list.

use serde_json::Value;
use tracing::debug;

use crate::coerce;
use crate::node::NodeInputs;
use crate::params::InputParam;

/// A view over raw inputs that only answers for declared names and fills in
/// declared defaults for values that are missing or null.
pub struct DeclaredInputs<'a> {
    inputs: &'a NodeInputs,
    params: &'a [InputParam],
}

impl<'a> DeclaredInputs<'a> {
    pub fn new(inputs: &'a NodeInputs, params: &'a [InputParam]) -> Self {
        Self { inputs, params }
    }

    /// Configured value, else the declared default. `None` for undeclared names.
    pub fn value(&self, name: &str) -> Option<&'a Value> {
        let Some(param) = self.params.iter().find(|p| p.name == name) else {
            debug!(input = name, "lookup of undeclared input ignored");
            return None;
        };
        match self.inputs.get(name) {
            Some(Value::Null) | None => param.default.as_ref(),
            Some(value) => Some(value),
        }
    }

    /// Whether the value would switch an optional setting on: present and truthy.
    pub fn present(&self, name: &str) -> bool {
        self.value(name).map(coerce::is_truthy).unwrap_or(false)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.value(name).map(coerce::parse_float)
    }

    pub fn integer(&self, name: &str) -> Option<f64> {
        self.value(name).map(coerce::parse_int)
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.value(name).and_then(coerce::parse_bool)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.value(name).and_then(coerce::as_string)
    }

    /// Float only if the value is present and truthy.
    pub fn optional_float(&self, name: &str) -> Option<f64> {
        self.present(name).then(|| self.float(name)).flatten()
    }

    /// Integer only if the value is present and truthy.
    pub fn optional_integer(&self, name: &str) -> Option<f64> {
        self.present(name).then(|| self.integer(name)).flatten()
    }
}

/// Typed node parameters decoded from declared inputs.
pub trait FromNodeInputs: Sized {
    fn from_inputs(inputs: &DeclaredInputs<'_>) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamType;
    use serde_json::json;

    fn params() -> Vec<InputParam> {
        vec![
            InputParam::new("Temperature", "temperature", ParamType::Number).with_default(0.9),
            InputParam::new("Top P", "topP", ParamType::Number),
            InputParam::new("Streaming", "streaming", ParamType::Boolean).with_default(true),
            InputParam::new("Model Name", "modelName", ParamType::String),
        ]
    }

    #[test]
    fn test_declared_defaults_fill_missing_values() {
        let raw = json!({ "temperature": null }).as_object().cloned().unwrap();
        let params = params();
        let inputs = DeclaredInputs::new(&raw, &params);

        assert_eq!(inputs.float("temperature"), Some(0.9));
        assert_eq!(inputs.boolean("streaming"), Some(true));
        assert_eq!(inputs.float("topP"), None);
        assert_eq!(inputs.string("modelName"), None);
    }

    #[test]
    fn test_configured_values_win() {
        let raw = json!({ "temperature": "0.5", "streaming": false, "modelName": "claude-3" })
            .as_object()
            .cloned()
            .unwrap();
        let params = params();
        let inputs = DeclaredInputs::new(&raw, &params);

        assert_eq!(inputs.float("temperature"), Some(0.5));
        assert_eq!(inputs.boolean("streaming"), Some(false));
        assert_eq!(inputs.string("modelName").as_deref(), Some("claude-3"));
    }

    #[test]
    fn test_undeclared_names_are_invisible() {
        let raw = json!({ "zylonApiKey": "secret" }).as_object().cloned().unwrap();
        let params = params();
        let inputs = DeclaredInputs::new(&raw, &params);

        assert!(inputs.value("zylonApiKey").is_none());
        assert!(!inputs.present("zylonApiKey"));
    }

    #[test]
    fn test_optional_values_need_truthiness() {
        let raw = json!({ "topP": "" }).as_object().cloned().unwrap();
        let params = params();
        let inputs = DeclaredInputs::new(&raw, &params);
        assert_eq!(inputs.optional_float("topP"), None);

        let raw = json!({ "topP": "0.8" }).as_object().cloned().unwrap();
        let inputs = DeclaredInputs::new(&raw, &params);
        assert_eq!(inputs.optional_float("topP"), Some(0.8));

        let raw = json!({ "topP": "abc" }).as_object().cloned().unwrap();
        let inputs = DeclaredInputs::new(&raw, &params);
        assert!(inputs.optional_float("topP").unwrap().is_nan());
    }
}
