//! 缓存键生成
//!
//! 记忆化结果的键为 `memo:{operation}:{sha256}`，摘要覆盖参数的规范化 JSON。
//! 对象字段按键排序输出，仅字段顺序不同的两次调用共用同一条目。

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// 记忆化缓存键前缀
const MEMO_PREFIX: &str = "memo:";

/// 生成记忆化缓存键
pub fn memo_key<A>(operation: &str, args: &A) -> Result<String, serde_json::Error>
where
    A: Serialize + ?Sized,
{
    let value = serde_json::to_value(args)?;
    let mut canonical = String::new();
    write_canonical(&value, &mut canonical)?;

    let digest = Sha256::digest(canonical.as_bytes());
    Ok(format!("{}{}:{:x}", MEMO_PREFIX, operation, digest))
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(item, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn field_order_does_not_change_key() {
        let a = json!({"thread": "t1", "limit": 10, "nested": {"x": 1, "y": [1, 2]}});
        let b = json!({"nested": {"y": [1, 2], "x": 1}, "limit": 10, "thread": "t1"});
        assert_eq!(memo_key("list", &a).unwrap(), memo_key("list", &b).unwrap());
    }

    #[test]
    fn hash_maps_are_canonical() {
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for i in 0..32 {
            first.insert(format!("k{i}"), i);
        }
        for i in (0..32).rev() {
            second.insert(format!("k{i}"), i);
        }
        assert_eq!(memo_key("op", &first).unwrap(), memo_key("op", &second).unwrap());
    }

    #[test]
    fn operation_and_arguments_separate_keys() {
        let args = json!({"id": "asst_default"});
        let key = memo_key("get_assistant", &args).unwrap();
        assert!(key.starts_with("memo:get_assistant:"));
        assert_ne!(key, memo_key("get_deployment", &args).unwrap());
        assert_ne!(key, memo_key("get_assistant", &json!({"id": "asst_other"})).unwrap());
    }

    #[test]
    fn array_order_is_significant() {
        assert_ne!(
            memo_key("op", &json!([1, 2])).unwrap(),
            memo_key("op", &json!([2, 1])).unwrap()
        );
    }

    #[test]
    fn non_string_map_keys_are_rejected() {
        let mut args = HashMap::new();
        args.insert(vec![1u8], "x");
        assert!(memo_key("op", &args).is_err());
    }
}
