use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::prefixed_id;

pub const DEFAULT_ASSISTANT_ID: &str = "asst_default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assistant {
    #[serde(default = "new_assistant_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_assistant_id() -> String {
    prefixed_id("asst")
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

impl Assistant {
    /// 服务启动时预置的默认助手
    pub fn default_assistant() -> Self {
        let mut metadata = Map::new();
        metadata.insert("temperature".into(), Value::from(0));

        Self {
            id: DEFAULT_ASSISTANT_ID.to_string(),
            name: "Simple Chat Assistant".to_string(),
            description: Some("A simple chat assistant".to_string()),
            model: default_model(),
            metadata: Some(metadata),
            created_at: Utc::now(),
        }
    }
}
