use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 列表接口的统一包装：`{"data": [...]}`
#[derive(Debug, Serialize, Deserialize)]
pub struct DataList<T> {
    pub data: Vec<T>,
}

impl<T> From<Vec<T>> for DataList<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// 生成带类型前缀的资源 ID，例如 `thread_3f2a...`
pub fn prefixed_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}
