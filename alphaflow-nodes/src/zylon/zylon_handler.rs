// src/zylon/zylon_handler.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::chat_models::ChatAnthropic;
use crate::config::ZylonConfig;
use crate::credential::{credential_param, get_credential_data};
use crate::inputs::{DeclaredInputs, FromNodeInputs};
use crate::node::{NodeData, NodeInitContext};
use crate::node_type::{base_classes, NodeDescription, NodeError, NodeOutput, NodeType};
use crate::params::{InputParam, ParamType};
use crate::zylon::zylon_credential::{ZYLON_API_CREDENTIAL, ZYLON_API_KEY_PARAM};
use crate::zylon::zylon_params::*;

pub const CHAT_ZYLON: &str = "chatZylon";

/// ChatZylonNode builds a `ChatAnthropic` client pointed at a Zylon host.
///
/// The host comes from `ZYLON_HOST`, read on every `init`, unless a fixed
/// configuration was supplied with `with_config`.
pub struct ChatZylonNode {
    config: Option<ZylonConfig>,
}

impl ChatZylonNode {
    pub fn new() -> Self {
        Self { config: None }
    }

    pub fn with_config(config: ZylonConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn current_config(&self) -> ZylonConfig {
        match &self.config {
            Some(config) => config.clone(),
            None => ZylonConfig::from_env(),
        }
    }
}

impl Default for ChatZylonNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeType for ChatZylonNode {
    fn name(&self) -> &str {
        CHAT_ZYLON
    }

    fn display_name(&self) -> &str {
        CHAT_ZYLON
    }

    fn description(&self) -> NodeDescription {
        NodeDescription {
            label: CHAT_ZYLON.to_string(),
            name: CHAT_ZYLON.to_string(),
            version: 8.0,
            type_: CHAT_ZYLON.to_string(),
            icon: "zylon.svg".to_string(),
            category: "Chat Models".to_string(),
            description: "Wrapper around Zylon".to_string(),
            base_classes: base_classes(CHAT_ZYLON, ChatAnthropic::CAPABILITIES),
            credential: Some(InputParam::credential(
                "Connect Credential",
                &[ZYLON_API_CREDENTIAL],
            )),
            inputs: vec![
                InputParam::new("Model Name", MODEL_NAME, ParamType::String)
                    .with_placeholder("claude-3-7-sonnet-latest")
                    .optional(),
                InputParam::new("Temperature", TEMPERATURE, ParamType::Number)
                    .with_step(0.1)
                    .with_default(DEFAULT_TEMPERATURE)
                    .optional(),
                InputParam::new("Streaming", STREAMING, ParamType::Boolean)
                    .with_default(true)
                    .optional()
                    .additional(),
                InputParam::new("Max Tokens", MAX_TOKENS, ParamType::Number)
                    .with_step(1.0)
                    .optional()
                    .additional(),
                InputParam::new("Top P", TOP_P, ParamType::Number)
                    .with_step(0.1)
                    .optional()
                    .additional(),
                InputParam::new("Top K", TOP_K, ParamType::Number)
                    .with_step(0.1)
                    .optional()
                    .additional(),
                InputParam::new("Extended Thinking", EXTENDED_THINKING, ParamType::Boolean)
                    .with_description(
                        "Enable extended thinking for reasoning model such as Claude Sonnet 3.7",
                    )
                    .optional()
                    .additional(),
                InputParam::new("Budget Tokens", BUDGET_TOKENS, ParamType::Number)
                    .with_step(1.0)
                    .with_default(1024)
                    .with_description(
                        "Maximum number of tokens Claude is allowed use for its internal reasoning process",
                    )
                    .optional()
                    .additional(),
                InputParam::new("Allow Image Uploads", ALLOW_IMAGE_UPLOADS, ParamType::Boolean)
                    .with_description(
                        "Allow image input. Refer to the <a href=\"https://docs.flowiseai.com/using-flowise/uploads#image\" target=\"_blank\">docs</a> for more details.",
                    )
                    .with_default(false)
                    .optional(),
            ],
        }
    }

    async fn init(
        &self,
        node_data: &NodeData,
        _input: &str,
        ctx: &NodeInitContext<'_>,
    ) -> Result<NodeOutput, NodeError> {
        // 1) decode declared inputs
        let description = self.description();
        let params =
            ZylonChatParams::from_inputs(&DeclaredInputs::new(&node_data.inputs, &description.inputs));

        // 2) resolve the secret; errors from the resolver go out untouched
        let credential_data =
            get_credential_data(ctx.credentials, &node_data.credential, ctx.options).await?;
        let api_key = credential_param(ZYLON_API_KEY_PARAM, &credential_data, node_data);

        // 3) assemble options against the configured host
        let config = self.current_config();
        let options = params.to_anthropic_input(&config.host, api_key);

        debug!(
            node = %node_data.id,
            model = ?options.model,
            streaming = options.streaming,
            reasoning = options.thinking.is_some(),
            host = %config.host,
            "initialising chatZylon"
        );

        // 4) hand construction to the client
        let model = ChatAnthropic::new(options)?.with_image_uploads(params.allow_image_uploads);
        Ok(NodeOutput::ChatModel(Arc::new(model)))
    }
}
