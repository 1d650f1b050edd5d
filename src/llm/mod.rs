//! 模型响应器：输入带角色的对话历史，返回一条回复

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;

/// 保留的上游错误响应体最大字节数
const MAX_PROVIDER_BODY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("model provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("model provider returned no reply")]
    EmptyReply,
}

#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, history: &[ChatMessage]) -> Result<ChatMessage, ResponderError>;
}

/// 根据配置选择响应器：有 API key 时调用 OpenAI 兼容接口，否则回显
pub fn from_config(config: &Config) -> Result<Arc<dyn Responder>, ResponderError> {
    match config.openai_api_key.as_deref() {
        Some(key) => {
            tracing::info!("Using chat completions responder with model {}", config.openai_model);
            Ok(Arc::new(OpenAiResponder::new(
                &config.openai_base_url,
                key,
                &config.openai_model,
                config.responder_timeout(),
            )?))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, replies will echo the last user message");
            Ok(Arc::new(EchoResponder))
        }
    }
}

/// OpenAI 兼容的 `/chat/completions` 客户端
pub struct OpenAiResponder {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl OpenAiResponder {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ResponderError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Responder for OpenAiResponder {
    async fn respond(&self, history: &[ChatMessage]) -> Result<ChatMessage, ResponderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&CompletionRequest {
                model: &self.model,
                temperature: 0.0,
                messages: history,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = truncate_body(response.text().await.unwrap_or_default(), MAX_PROVIDER_BODY);
            tracing::error!("Model provider error {}: {}", status, body);
            return Err(ResponderError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(ResponderError::EmptyReply)
    }
}

fn truncate_body(mut body: String, max: usize) -> String {
    if body.len() > max {
        let mut end = max;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

/// 离线响应器，回显最后一条用户消息
pub struct EchoResponder;

#[async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, history: &[ChatMessage]) -> Result<ChatMessage, ResponderError> {
        history
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| ChatMessage::assistant(format!("You said: {}", m.content)))
            .ok_or(ResponderError::EmptyReply)
    }
}
