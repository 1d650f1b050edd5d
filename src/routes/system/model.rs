use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// `/v1/invoke` 请求：已有对话历史，加上可选的一条新用户消息
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub messages: Vec<ChatMessage>,
}

impl InvokeRequest {
    pub fn history(&self) -> Vec<ChatMessage> {
        let mut history = self.messages.clone();
        if let Some(message) = &self.message {
            history.push(ChatMessage::user(message.as_str()));
        }
        history
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}
