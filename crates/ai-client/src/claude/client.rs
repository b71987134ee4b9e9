use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::error::AiError;
use crate::traits::strict_schema_for;

use super::types::{ContentBlock, Message, MessagesRequest, MessagesResponse, ToolChoice, ToolDef};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Wraps the Claude Messages API (spec §4.5/§4.6: relevance judging and
/// briefing composition).
#[derive(Clone)]
pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("reqwest client builds"),
            api_key: api_key.into(),
            base_url: API_URL.to_string(),
            model: "claude-3-5-sonnet-latest".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Free-form chat completion, used for the deterministic fallback path
    /// callers take when they don't need structured output.
    pub async fn chat(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, AiError> {
        let messages = [Message::user(user)];
        let response = self.send(system, &messages, max_tokens, None, None).await?;
        response
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                _ => None,
            })
            .ok_or(AiError::EmptyResponse)
    }

    /// Forces the model to respond via a single synthetic tool call whose
    /// input schema is `T`'s, then deserializes that input as `T`.
    pub async fn extract<T>(&self, system: &str, user: &str, max_tokens: u32) -> Result<T, AiError>
    where
        T: JsonSchema + DeserializeOwned,
    {
        let messages = [Message::user(user)];
        let tool_name = "emit_result".to_string();
        let tools = vec![ToolDef {
            name: tool_name.clone(),
            description: "Emit the structured result.".to_string(),
            input_schema: strict_schema_for::<T>(),
        }];
        let response = self
            .send(
                system,
                &messages,
                max_tokens,
                Some(tools),
                Some(ToolChoice::Tool { name: tool_name }),
            )
            .await?;
        let input = response
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::ToolUse { input } => Some(input),
                _ => None,
            })
            .ok_or(AiError::EmptyResponse)?;
        Ok(serde_json::from_value(input)?)
    }

    async fn send(
        &self,
        system: &str,
        messages: &[Message],
        max_tokens: u32,
        tools: Option<Vec<ToolDef>>,
        tool_choice: Option<ToolChoice>,
    ) -> Result<MessagesResponse, AiError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            system: Some(system),
            messages,
            tools,
            tool_choice,
        };

        let response = self
            .http
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}
