use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::prefixed_id;
use crate::routes::system::InvokeResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default = "new_deployment_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_status")]
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeploymentInvokeResponse {
    pub result: InvokeResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub status: String,
}

fn new_deployment_id() -> String {
    prefixed_id("deployment")
}

fn default_status() -> String {
    "active".to_string()
}
