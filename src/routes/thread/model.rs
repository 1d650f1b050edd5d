use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::prefixed_id;
use crate::llm::ChatMessage;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    #[serde(default = "new_thread_id")]
    pub id: String,
    pub assistant_id: String,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "new_message_id")]
    pub id: String,
    /// 由路径参数覆盖
    #[serde(default)]
    pub thread_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub thread_id: String,
    pub assistant_id: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

fn new_thread_id() -> String {
    prefixed_id("thread")
}

fn new_message_id() -> String {
    prefixed_id("msg")
}

impl Message {
    /// 把模型回复包装为线程消息
    pub fn from_reply(thread_id: &str, reply: ChatMessage) -> Self {
        Self {
            id: new_message_id(),
            thread_id: thread_id.to_string(),
            role: reply.role,
            content: reply.content,
            metadata: None,
            created_at: Utc::now(),
        }
    }

    pub fn to_chat(&self) -> ChatMessage {
        ChatMessage {
            role: self.role.clone(),
            content: self.content.clone(),
        }
    }
}

impl Run {
    pub fn completed(thread: &Thread) -> Self {
        Self {
            id: prefixed_id("run"),
            thread_id: thread.id.clone(),
            assistant_id: thread.assistant_id.clone(),
            status: RunStatus::Completed,
            created_at: Utc::now(),
            last_error: None,
        }
    }

    pub fn failed(thread: &Thread, error: String) -> Self {
        Self {
            status: RunStatus::Failed,
            last_error: Some(error),
            ..Self::completed(thread)
        }
    }
}
