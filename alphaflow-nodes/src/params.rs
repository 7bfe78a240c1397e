// src/params.rs
//! Declarative input field specs shared by node and credential descriptors.
//!
//! The form renderer consumes these as JSON, so the serialized shape uses the
//! camelCase keys it expects (`additionalParams`, `credentialNames`, `type`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node_type::NodeError;

/// How a field is rendered and what value shape the host stores for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Password,
    String,
    Number,
    Boolean,
    Credential,
}

/// A single configurable field, e.g. "temperature" or "zylonApiKey".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InputParam {
    pub label: String,
    /// Key used to look up the runtime value in `NodeData::inputs`.
    pub name: String,
    #[serde(rename = "type")]
    pub type_: ParamType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Numeric granularity for number inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    /// Hidden behind the "additional parameters" toggle in the form.
    #[serde(default, skip_serializing_if = "is_false")]
    pub additional_params: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Only set on `credential` fields: which credential descriptors may be attached.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credential_names: Vec<String>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl InputParam {
    pub fn new(label: &str, name: &str, type_: ParamType) -> Self {
        Self {
            label: label.to_string(),
            name: name.to_string(),
            type_,
            placeholder: None,
            default: None,
            step: None,
            optional: false,
            additional_params: false,
            description: None,
            credential_names: Vec::new(),
        }
    }

    /// The "Connect Credential" reference a node uses to name the credential
    /// descriptors it accepts.
    pub fn credential(label: &str, credential_names: &[&str]) -> Self {
        let mut param = Self::new(label, "credential", ParamType::Credential);
        param.credential_names = credential_names.iter().map(|n| n.to_string()).collect();
        param
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field as advanced (collapsed by default in the form).
    pub fn additional(mut self) -> Self {
        self.additional_params = true;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Field names must be unique within one descriptor: they double as lookup keys.
pub fn ensure_unique_names(params: &[InputParam]) -> Result<(), NodeError> {
    let mut seen = HashSet::new();
    for param in params {
        if !seen.insert(param.name.as_str()) {
            return Err(NodeError::InvalidConfig(format!(
                "duplicate input name '{}'",
                param.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_serializes_in_form_shape() {
        let param = InputParam::new("Max Tokens", "maxTokensToSample", ParamType::Number)
            .with_step(1.0)
            .optional()
            .additional();

        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(
            value,
            json!({
                "label": "Max Tokens",
                "name": "maxTokensToSample",
                "type": "number",
                "step": 1.0,
                "optional": true,
                "additionalParams": true
            })
        );
    }

    #[test]
    fn test_credential_reference() {
        let param = InputParam::credential("Connect Credential", &["zylonApi"]);
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(value["name"], "credential");
        assert_eq!(value["type"], "credential");
        assert_eq!(value["credentialNames"], json!(["zylonApi"]));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let params = vec![
            InputParam::new("Top P", "topP", ParamType::Number),
            InputParam::new("Top P again", "topP", ParamType::Number),
        ];
        match ensure_unique_names(&params) {
            Err(NodeError::InvalidConfig(msg)) => assert!(msg.contains("topP")),
            other => panic!("Expected InvalidConfig, got {other:?}"),
        }

        assert!(ensure_unique_names(&params[..1]).is_ok());
    }

    #[test]
    fn test_param_deserializes_with_defaults() {
        let param: InputParam = serde_json::from_value(json!({
            "label": "API Key",
            "name": "zylonApiKey",
            "type": "password"
        }))
        .unwrap();

        assert_eq!(param.type_, ParamType::Password);
        assert!(!param.optional);
        assert!(param.credential_names.is_empty());
    }
}
