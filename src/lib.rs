use std::sync::Arc;

use cache::ResponseCache;
use config::Config;
use llm::Responder;
use registry::Registry;

pub mod cache;
pub mod common;
pub mod config;
pub mod error;
pub mod llm;
pub mod middleware;
pub mod registry;
pub mod router;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cache: ResponseCache,
    pub registry: Arc<Registry>,
    pub responder: Arc<dyn Responder>,
}
