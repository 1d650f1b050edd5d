//! 平台兼容接口：返回固定的租户、工作区和组织信息

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};

pub async fn get_tenants() -> Json<Value> {
    Json(json!({
        "data": [{
            "id": "default",
            "name": "Default Tenant",
            "created_at": Utc::now(),
        }]
    }))
}

pub async fn get_usage_limits() -> Json<Value> {
    Json(json!({
        "has_exceeded_limit": false,
        "limits": {}
    }))
}

pub async fn get_workspace_tags() -> Json<Value> {
    Json(json!({
        "data": [],
        "has_more": false
    }))
}

pub async fn get_workspace_stats() -> Json<Value> {
    Json(json!({
        "total_runs": 0,
        "total_tokens": 0,
        "total_successful_runs": 0,
        "total_error_runs": 0
    }))
}

pub async fn get_workspaces() -> Json<Value> {
    Json(json!({
        "data": [{
            "id": "default",
            "name": "Default Workspace",
            "created_at": Utc::now(),
        }]
    }))
}

pub async fn get_org_info() -> Json<Value> {
    Json(json!({
        "id": "default",
        "name": "Default Organization",
        "created_at": Utc::now(),
        "settings": {
            "allow_token_sharing": true
        }
    }))
}
