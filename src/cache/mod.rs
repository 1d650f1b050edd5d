// 缓存模块
// 响应缓存、缓存键和后端存储

pub mod keys;
pub mod models;
pub mod operations;
pub mod store;

// 重新导出常用类型和函数，方便其他模块使用
pub use keys::memo_key;
pub use operations::ResponseCache;
pub use store::{CacheError, CacheStore, MemoryStore, RedisStore};
