// src/chat_models/mod.rs
//! Chat-model clients that nodes hand back to the host.
//!
//! Nodes only construct these. The first `invoke` is where the options are
//! checked and the endpoint is contacted.

pub mod anthropic;

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use anthropic::{AnthropicInput, ChatAnthropic, ClientError, ThinkingConfig};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One turn of a conversation, text only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The assistant's reply to one `invoke`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub content: String,
    /// Reasoning text, only present when extended thinking was on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}

/// The generic chat-model capability the host consumes.
#[async_trait]
pub trait BaseChatModel: Debug + Send + Sync {
    /// Provider family, e.g. "anthropic".
    fn llm_type(&self) -> &'static str;

    fn model_name(&self) -> &str;

    /// Endpoint the client talks to.
    fn base_url(&self) -> &str;

    fn is_streaming(&self) -> bool;

    fn supports_image_input(&self) -> bool {
        false
    }

    /// Capability tags of the concrete client type, most specific first.
    fn capabilities(&self) -> &'static [&'static str];

    /// Request parameters sent with every call, without the messages.
    fn invocation_params(&self) -> Value;

    /// Send the conversation and wait for the complete reply.
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ClientError>;
}
