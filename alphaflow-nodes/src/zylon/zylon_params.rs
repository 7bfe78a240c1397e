// src/zylon/zylon_params.rs

use tracing::warn;

use crate::chat_models::{AnthropicInput, ThinkingConfig};
use crate::inputs::{DeclaredInputs, FromNodeInputs};

pub const MODEL_NAME: &str = "modelName";
pub const TEMPERATURE: &str = "temperature";
pub const STREAMING: &str = "streaming";
pub const MAX_TOKENS: &str = "maxTokensToSample";
pub const TOP_P: &str = "topP";
pub const TOP_K: &str = "topK";
pub const EXTENDED_THINKING: &str = "extendedThinking";
pub const BUDGET_TOKENS: &str = "budgetTokens";
pub const ALLOW_IMAGE_UPLOADS: &str = "allowImageUploads";

pub const DEFAULT_TEMPERATURE: f64 = 0.9;
pub const DEFAULT_BUDGET_TOKENS: f64 = 1024.0;

/// Key used when no credential yields a secret. The endpoint rejects it on
/// the first real call instead of node construction failing.
pub const PLACEHOLDER_API_KEY: &str = "no-key";

/// Sampling temperature and extended thinking exclude each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationMode {
    Standard { temperature: f64 },
    Reasoning { budget_tokens: f64 },
}

/// Zylon chat parameters decoded from the node's declared inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ZylonChatParams {
    pub model_name: Option<String>,
    pub temperature: f64,
    pub streaming: Option<bool>,
    pub max_tokens: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<f64>,
    pub extended_thinking: bool,
    pub budget_tokens: f64,
    pub allow_image_uploads: bool,
}

impl FromNodeInputs for ZylonChatParams {
    fn from_inputs(inputs: &DeclaredInputs<'_>) -> Self {
        Self {
            model_name: inputs.string(MODEL_NAME),
            temperature: inputs.float(TEMPERATURE).unwrap_or(DEFAULT_TEMPERATURE),
            streaming: inputs.boolean(STREAMING),
            max_tokens: inputs.optional_integer(MAX_TOKENS),
            top_p: inputs.optional_float(TOP_P),
            top_k: inputs.optional_float(TOP_K),
            extended_thinking: inputs.boolean(EXTENDED_THINKING).unwrap_or(false),
            budget_tokens: inputs.integer(BUDGET_TOKENS).unwrap_or(DEFAULT_BUDGET_TOKENS),
            allow_image_uploads: inputs.boolean(ALLOW_IMAGE_UPLOADS).unwrap_or(false),
        }
    }
}

impl ZylonChatParams {
    /// Extended thinking wins over any configured temperature.
    pub fn generation_mode(&self) -> GenerationMode {
        if self.extended_thinking {
            GenerationMode::Reasoning {
                budget_tokens: self.budget_tokens,
            }
        } else {
            GenerationMode::Standard {
                temperature: self.temperature,
            }
        }
    }

    /// Assemble the client options. The endpoint always comes from `host`,
    /// never from the inputs.
    pub fn to_anthropic_input(&self, host: &str, api_key: Option<String>) -> AnthropicInput {
        let (temperature, thinking) = match self.generation_mode() {
            GenerationMode::Standard { temperature } => (Some(temperature), None),
            GenerationMode::Reasoning { budget_tokens } => {
                (None, Some(ThinkingConfig::enabled(budget_tokens)))
            }
        };

        let api_key = api_key.unwrap_or_else(|| {
            warn!("no Zylon API key resolved, using placeholder key");
            PLACEHOLDER_API_KEY.to_string()
        });

        AnthropicInput {
            temperature,
            model: self.model_name.clone(),
            streaming: self.streaming.unwrap_or(true),
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            top_k: self.top_k,
            thinking,
            anthropic_api_url: Some(host.to_string()),
            anthropic_api_key: Some(api_key),
        }
    }
}
