use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub redis_url: Option<String>,
    pub cache_ttl_secs: u64,
    pub cache_lookup_ttl_secs: u64,
    pub cache_timeout_ms: u64,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub trust_proxy_headers: bool,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub responder_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".into(),
            server_port: 8123,
            redis_url: None,
            cache_ttl_secs: 3600,
            cache_lookup_ttl_secs: 60,
            cache_timeout_ms: 1500,
            rate_limit_window_secs: 60,
            rate_limit_requests: 60,
            trust_proxy_headers: true,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".into(),
            openai_model: "gpt-3.5-turbo".into(),
            responder_timeout_secs: 30,
        }
    }
}

impl Config {
    /// 从 `.env` 文件和进程环境变量加载配置
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意键值来源加载配置，缺失或无法解析的值使用默认值
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Config {
            server_host: text("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
            redis_url: text("REDIS_URL"),
            cache_ttl_secs: parse_or(&lookup, "CACHE_TTL", defaults.cache_ttl_secs),
            cache_lookup_ttl_secs: parse_or(
                &lookup,
                "CACHE_LOOKUP_TTL",
                defaults.cache_lookup_ttl_secs,
            ),
            cache_timeout_ms: parse_or(&lookup, "CACHE_TIMEOUT_MS", defaults.cache_timeout_ms),
            rate_limit_window_secs: match parse_or(
                &lookup,
                "RATE_LIMIT_WINDOW",
                defaults.rate_limit_window_secs,
            ) {
                // 零长度窗口不会保留任何请求记录，等于不限流
                0 => {
                    tracing::warn!("RATE_LIMIT_WINDOW must be positive, using default");
                    defaults.rate_limit_window_secs
                }
                secs => secs,
            },
            rate_limit_requests: parse_or(
                &lookup,
                "RATE_LIMIT_REQUESTS",
                defaults.rate_limit_requests,
            ),
            trust_proxy_headers: parse_or(
                &lookup,
                "TRUST_PROXY_HEADERS",
                defaults.trust_proxy_headers,
            ),
            openai_api_key: text("OPENAI_API_KEY"),
            openai_base_url: text("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            openai_model: text("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            responder_timeout_secs: parse_or(
                &lookup,
                "RESPONDER_TIMEOUT",
                defaults.responder_timeout_secs,
            ),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// 按 ID 查询的缓存有效期
    ///
    /// 失效删除可能与正在进行的未命中计算交错，计算结束后写回旧值，
    /// 因此这类条目使用较短的有效期来限制读到旧数据的时长。
    pub fn lookup_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs.min(self.cache_lookup_ttl_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn responder_timeout(&self) -> Duration {
        Duration::from_secs(self.responder_timeout_secs)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value for {}: {:?}, using default", name, raw);
            default
        }),
        None => default,
    }
}
