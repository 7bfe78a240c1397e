// src/chat_models/anthropic.rs

use async_trait::async_trait;
use derivative::Derivative;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, trace};

use super::{BaseChatModel, ChatMessage, ChatResponse, ChatRole};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Reasons the client refuses an options object or a request fails.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Anthropic model name is required")]
    MissingModel,

    #[error("Anthropic API key not found")]
    MissingApiKey,

    #[error("Anthropic API key is not a valid header value")]
    InvalidApiKey,

    #[error("`{0}` and `{1}` cannot be set together")]
    IncompatibleParameters(&'static str, &'static str),

    #[error("Invalid value for `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("Invalid Anthropic API url '{0}'")]
    InvalidBaseUrl(String),

    #[error("Anthropic API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Anthropic stream reported an error: {0}")]
    Stream(String),

    #[error("Unexpected Anthropic response: {0}")]
    InvalidResponse(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Extended thinking settings: `{ "type": "enabled", "budget_tokens": n }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThinkingConfig {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(serialize_with = "serialize_number")]
    pub budget_tokens: f64,
}

impl ThinkingConfig {
    pub fn enabled(budget_tokens: f64) -> Self {
        Self {
            type_: "enabled".to_string(),
            budget_tokens,
        }
    }
}

/// Options object accepted by [`ChatAnthropic::new`].
///
/// Numbers are kept exactly as coerced from the form, NaN included; the
/// client decides what is acceptable when it builds a request. Unset options
/// are not serialized, which keeps "unset" distinguishable from "explicit
/// default".
#[derive(Clone, Serialize, Deserialize, PartialEq, Derivative)]
#[derivative(Debug)]
#[serde(rename_all = "camelCase")]
pub struct AnthropicInput {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_streaming")]
    pub streaming: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub max_tokens: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub top_p: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub top_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[derivative(Debug = "ignore")]
    pub anthropic_api_key: Option<String>,
}

fn default_streaming() -> bool {
    true
}

impl AnthropicInput {
    /// Minimal options: model, endpoint and key, streaming on.
    pub fn new(model: &str, api_url: &str, api_key: &str) -> Self {
        Self {
            temperature: None,
            model: Some(model.to_string()),
            streaming: true,
            max_tokens: None,
            top_p: None,
            top_k: None,
            thinking: None,
            anthropic_api_url: Some(api_url.to_string()),
            anthropic_api_key: Some(api_key.to_string()),
        }
    }
}

/// Whole numbers go out as integers, the rest as floats (NaN becomes null).
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

fn serialize_opt_number<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serialize_number(v, serializer),
        None => serializer.serialize_none(),
    }
}

/// Client for the Anthropic Messages API or any compatible endpoint.
///
/// Construction only rejects option combinations that can never work.
/// Numbers, the endpoint and the key are checked when a request is built.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ChatAnthropic {
    model: String,
    temperature: Option<f64>,
    max_tokens: Option<f64>,
    top_p: Option<f64>,
    top_k: Option<f64>,
    thinking: Option<ThinkingConfig>,
    streaming: bool,
    api_url: String,
    #[derivative(Debug = "ignore")]
    api_key: Option<String>,
    image_uploads: bool,
    #[derivative(Debug = "ignore")]
    http: Client,
}

impl ChatAnthropic {
    pub const CAPABILITIES: &'static [&'static str] = &[
        "ChatAnthropic",
        "ChatAnthropicMessages",
        "BaseChatModel",
        "BaseLanguageModel",
        "Runnable",
    ];

    pub fn new(input: AnthropicInput) -> Result<Self, ClientError> {
        let model = input
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or(ClientError::MissingModel)?;

        if input.temperature.is_some() && input.thinking.is_some() {
            return Err(ClientError::IncompatibleParameters("temperature", "thinking"));
        }

        let api_url = input
            .anthropic_api_url
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let http = Client::builder().build()?;

        trace!(model = %model, api_url = %api_url, "ChatAnthropic client constructed");

        Ok(Self {
            model,
            temperature: input.temperature,
            max_tokens: input.max_tokens,
            top_p: input.top_p,
            top_k: input.top_k,
            thinking: input.thinking,
            streaming: input.streaming,
            api_url,
            api_key: input.anthropic_api_key,
            image_uploads: false,
            http,
        })
    }

    /// Enable image content in messages.
    pub fn with_image_uploads(mut self, allow: bool) -> Self {
        self.image_uploads = allow;
        self
    }

    pub fn messages_endpoint(&self) -> String {
        format!("{}/v1/messages", self.api_url.trim_end_matches('/'))
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    pub fn thinking(&self) -> Option<&ThinkingConfig> {
        self.thinking.as_ref()
    }

    /// JSON body for one Messages API call. System turns are lifted into the
    /// top-level `system` field.
    pub fn request_body(&self, messages: &[ChatMessage]) -> Result<Value, ClientError> {
        let max_tokens = match self.max_tokens {
            Some(v) => token_count("maxTokens", v)?,
            None => DEFAULT_MAX_TOKENS,
        };

        let mut body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "stream": self.streaming,
        });
        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(finite("temperature", temperature)?);
        }
        if let Some(top_p) = self.top_p {
            body["top_p"] = json!(finite("topP", top_p)?);
        }
        if let Some(top_k) = self.top_k {
            body["top_k"] = number_value(finite("topK", top_k)?);
        }
        if let Some(thinking) = &self.thinking {
            body["thinking"] = json!({
                "type": thinking.type_,
                "budget_tokens": token_count("budget_tokens", thinking.budget_tokens)?,
            });
        }

        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        body["messages"] = Value::Array(
            messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| json!({ "role": m.role, "content": m.content }))
                .collect(),
        );
        Ok(body)
    }

    fn endpoint(&self) -> Result<Url, ClientError> {
        Url::parse(&self.messages_endpoint())
            .map_err(|_| ClientError::InvalidBaseUrl(self.api_url.clone()))
    }

    fn request_headers(&self) -> Result<HeaderMap, ClientError> {
        let api_key = self.api_key.as_deref().ok_or(ClientError::MissingApiKey)?;
        let mut key_header =
            HeaderValue::from_str(api_key).map_err(|_| ClientError::InvalidApiKey)?;
        key_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key_header);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, ClientError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ClientError::InvalidParameter { name, value })
    }
}

fn token_count(name: &'static str, value: f64) -> Result<u32, ClientError> {
    if value.is_finite() && value.fract() == 0.0 && value >= 1.0 && value <= u32::MAX as f64 {
        Ok(value as u32)
    } else {
        Err(ClientError::InvalidParameter { name, value })
    }
}

/// Same rule as `serialize_number`, for values built with `json!`.
fn number_value(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

fn append(target: &mut Option<String>, text: &str) {
    target.get_or_insert_with(String::new).push_str(text);
}

/// Reply of a non-streaming call.
fn parse_message(value: &Value) -> Result<ChatResponse, ClientError> {
    let blocks = value
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::InvalidResponse("missing `content` array".into()))?;

    let mut response = ChatResponse {
        model: value["model"].as_str().map(str::to_string),
        stop_reason: value["stop_reason"].as_str().map(str::to_string),
        ..Default::default()
    };
    for block in blocks {
        match block["type"].as_str() {
            Some("text") => response.content.push_str(block["text"].as_str().unwrap_or_default()),
            Some("thinking") => {
                append(&mut response.thinking, block["thinking"].as_str().unwrap_or_default())
            }
            _ => {}
        }
    }
    Ok(response)
}

/// Fold a server-sent event body into one reply.
fn parse_event_stream(body: &str) -> Result<ChatResponse, ClientError> {
    let mut response = ChatResponse::default();
    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let event: Value = serde_json::from_str(data.trim())
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        match event["type"].as_str() {
            Some("message_start") => {
                response.model = event["message"]["model"].as_str().map(str::to_string);
            }
            Some("content_block_delta") => {
                let delta = &event["delta"];
                match delta["type"].as_str() {
                    Some("text_delta") => {
                        response.content.push_str(delta["text"].as_str().unwrap_or_default())
                    }
                    Some("thinking_delta") => append(
                        &mut response.thinking,
                        delta["thinking"].as_str().unwrap_or_default(),
                    ),
                    _ => {}
                }
            }
            Some("message_delta") => {
                if let Some(reason) = event["delta"]["stop_reason"].as_str() {
                    response.stop_reason = Some(reason.to_string());
                }
            }
            Some("error") => {
                let message = event["error"]["message"].as_str().unwrap_or("unknown error");
                return Err(ClientError::Stream(message.to_string()));
            }
            _ => {}
        }
    }
    Ok(response)
}

#[async_trait]
impl BaseChatModel for ChatAnthropic {
    fn llm_type(&self) -> &'static str {
        "anthropic"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn base_url(&self) -> &str {
        &self.api_url
    }

    fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn supports_image_input(&self) -> bool {
        self.image_uploads
    }

    fn capabilities(&self) -> &'static [&'static str] {
        Self::CAPABILITIES
    }

    fn invocation_params(&self) -> Value {
        let max_tokens = self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS as f64);
        let mut params = json!({
            "model": self.model,
            "max_tokens": number_value(max_tokens),
            "stream": self.streaming,
        });
        if let Some(temperature) = self.temperature {
            params["temperature"] = json!(temperature);
        }
        if let Some(top_p) = self.top_p {
            params["top_p"] = json!(top_p);
        }
        if let Some(top_k) = self.top_k {
            params["top_k"] = number_value(top_k);
        }
        if let Some(thinking) = &self.thinking {
            params["thinking"] = json!({
                "type": thinking.type_,
                "budget_tokens": number_value(thinking.budget_tokens),
            });
        }
        params
    }

    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, ClientError> {
        let body = self.request_body(messages)?;
        let url = self.endpoint()?;
        let headers = self.request_headers()?;

        debug!(model = %self.model, url = %url, stream = self.streaming, "sending messages request");

        let response = self.http.post(url).headers(headers).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if self.streaming {
            parse_event_stream(&response.text().await?)
        } else {
            parse_message(&response.json::<Value>().await?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AnthropicInput {
        AnthropicInput::new("claude-3", "http://localhost:8001", "sk-test-123")
    }

    fn hello() -> Vec<ChatMessage> {
        vec![ChatMessage::user("Hello")]
    }

    #[test]
    fn test_construct_with_defaults() {
        let client = ChatAnthropic::new(input()).expect("client should build");
        assert_eq!(client.model_name(), "claude-3");
        assert_eq!(client.invocation_params()["max_tokens"], json!(DEFAULT_MAX_TOKENS));
        assert!(client.is_streaming());
        assert!(!client.supports_image_input());
        assert_eq!(client.messages_endpoint(), "http://localhost:8001/v1/messages");
        assert_eq!(client.capabilities()[0], "ChatAnthropic");
    }

    #[test]
    fn test_missing_model_rejected() {
        let mut options = input();
        options.model = None;
        assert!(matches!(ChatAnthropic::new(options), Err(ClientError::MissingModel)));

        let mut blank = input();
        blank.model = Some("  ".into());
        assert!(matches!(ChatAnthropic::new(blank), Err(ClientError::MissingModel)));
    }

    #[test]
    fn test_temperature_and_thinking_are_exclusive() {
        let mut options = input();
        options.temperature = Some(0.7);
        options.thinking = Some(ThinkingConfig::enabled(1024.0));
        assert!(matches!(
            ChatAnthropic::new(options),
            Err(ClientError::IncompatibleParameters("temperature", "thinking"))
        ));
    }

    #[test]
    fn test_construction_defers_value_checks() {
        let mut nan_temperature = input();
        nan_temperature.temperature = Some(f64::NAN);

        let mut fractional_tokens = input();
        fractional_tokens.max_tokens = Some(12.5);

        let mut nan_budget = input();
        nan_budget.thinking = Some(ThinkingConfig::enabled(f64::NAN));

        let mut bare_host = input();
        bare_host.anthropic_api_url = Some("zylon-gateway".into());

        let mut pasted_key = input();
        pasted_key.anthropic_api_key = Some("sk-pasted\n".into());

        let mut no_key = input();
        no_key.anthropic_api_key = None;

        for options in [
            nan_temperature,
            fractional_tokens,
            nan_budget,
            bare_host,
            pasted_key,
            no_key,
        ] {
            let debug = format!("{options:?}");
            assert!(ChatAnthropic::new(options).is_ok(), "construction failed for {debug}");
        }
    }

    #[test]
    fn test_request_body_rejects_malformed_numbers() {
        let mut options = input();
        options.temperature = Some(f64::NAN);
        let client = ChatAnthropic::new(options).unwrap();
        assert!(matches!(
            client.request_body(&hello()),
            Err(ClientError::InvalidParameter { name: "temperature", .. })
        ));

        let mut options = input();
        options.max_tokens = Some(12.5);
        let client = ChatAnthropic::new(options).unwrap();
        assert!(matches!(
            client.request_body(&hello()),
            Err(ClientError::InvalidParameter { name: "maxTokens", .. })
        ));

        let mut options = input();
        options.thinking = Some(ThinkingConfig::enabled(f64::NAN));
        let client = ChatAnthropic::new(options).unwrap();
        assert!(matches!(
            client.request_body(&hello()),
            Err(ClientError::InvalidParameter { name: "budget_tokens", .. })
        ));
    }

    #[tokio::test]
    async fn test_invoke_checks_options_before_sending() {
        let mut options = input();
        options.temperature = Some(f64::NAN);
        let client = ChatAnthropic::new(options).unwrap();
        assert!(matches!(
            client.invoke(&hello()).await,
            Err(ClientError::InvalidParameter { name: "temperature", .. })
        ));

        let mut options = input();
        options.anthropic_api_url = Some("zylon-gateway".into());
        let client = ChatAnthropic::new(options).unwrap();
        match client.invoke(&hello()).await {
            Err(ClientError::InvalidBaseUrl(url)) => assert_eq!(url, "zylon-gateway"),
            other => panic!("Expected InvalidBaseUrl, got {other:?}"),
        }

        let mut options = input();
        options.anthropic_api_key = Some("sk-pasted\n".into());
        let client = ChatAnthropic::new(options).unwrap();
        assert!(matches!(client.invoke(&hello()).await, Err(ClientError::InvalidApiKey)));

        let mut options = input();
        options.anthropic_api_key = None;
        let client = ChatAnthropic::new(options).unwrap();
        assert!(matches!(client.invoke(&hello()).await, Err(ClientError::MissingApiKey)));
    }

    #[test]
    fn test_request_body_shape() {
        let mut options = input();
        options.max_tokens = Some(256.0);
        options.streaming = false;
        options.thinking = Some(ThinkingConfig::enabled(2048.0));
        let client = ChatAnthropic::new(options).unwrap();

        let body = client
            .request_body(&[
                ChatMessage::system("Be brief."),
                ChatMessage::user("Hi"),
                ChatMessage::assistant("Hello!"),
                ChatMessage::user("Bye"),
            ])
            .unwrap();

        assert_eq!(body["model"], "claude-3");
        assert_eq!(body["max_tokens"], json!(256));
        assert_eq!(body["stream"], json!(false));
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["thinking"], json!({ "type": "enabled", "budget_tokens": 2048 }));
        assert_eq!(
            body["messages"],
            json!([
                { "role": "user", "content": "Hi" },
                { "role": "assistant", "content": "Hello!" },
                { "role": "user", "content": "Bye" }
            ])
        );
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn test_invocation_params() {
        let mut options = input();
        options.max_tokens = Some(256.0);
        options.top_k = Some(5.0);
        options.thinking = Some(ThinkingConfig::enabled(2048.0));
        let client = ChatAnthropic::new(options).unwrap();

        let params = client.invocation_params();
        assert_eq!(params["model"], "claude-3");
        assert_eq!(params["max_tokens"], 256);
        assert_eq!(params["stream"], true);
        assert_eq!(params["top_k"], 5.0);
        assert_eq!(params["thinking"], json!({ "type": "enabled", "budget_tokens": 2048 }));
        assert!(params.get("temperature").is_none());
        assert!(params.get("top_p").is_none());
    }

    #[test]
    fn test_parse_message_response() {
        let response = parse_message(&json!({
            "model": "claude-3",
            "stop_reason": "end_turn",
            "content": [
                { "type": "thinking", "thinking": "User greets." },
                { "type": "text", "text": "Hello" },
                { "type": "text", "text": " there" }
            ]
        }))
        .unwrap();

        assert_eq!(response.content, "Hello there");
        assert_eq!(response.thinking.as_deref(), Some("User greets."));
        assert_eq!(response.model.as_deref(), Some("claude-3"));
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));

        assert!(matches!(
            parse_message(&json!({ "id": "msg_1" })),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_event_stream() {
        let body = r#"event: message_start
data: {"type":"message_start","message":{"model":"claude-3"}}

event: content_block_delta
data: {"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"Hmm."}}

event: content_block_delta
data: {"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"Hel"}}

event: content_block_delta
data: {"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"lo"}}

event: message_delta
data: {"type":"message_delta","delta":{"stop_reason":"end_turn"}}

event: message_stop
data: {"type":"message_stop"}
"#;
        let response = parse_event_stream(body).unwrap();
        assert_eq!(response.content, "Hello");
        assert_eq!(response.thinking.as_deref(), Some("Hmm."));
        assert_eq!(response.model.as_deref(), Some("claude-3"));
        assert_eq!(response.stop_reason.as_deref(), Some("end_turn"));
    }

    #[test]
    fn test_event_stream_error() {
        let body = r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        match parse_event_stream(body) {
            Err(ClientError::Stream(message)) => assert_eq!(message, "Overloaded"),
            other => panic!("Expected stream error, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_output_hides_key() {
        let options = input();
        let client = ChatAnthropic::new(options.clone()).unwrap();

        assert!(!format!("{options:?}").contains("sk-test-123"));
        assert!(!format!("{client:?}").contains("sk-test-123"));
    }

    #[test]
    fn test_options_serialize_whole_numbers_as_integers() {
        let mut options = input();
        options.max_tokens = Some(256.0);
        options.temperature = Some(0.5);
        let value = serde_json::to_value(&options).unwrap();

        assert_eq!(value["maxTokens"], json!(256));
        assert_eq!(value["temperature"], json!(0.5));
        assert!(value.get("topP").is_none());
        assert!(value.get("thinking").is_none());
    }
}
