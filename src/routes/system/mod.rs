mod handler;
mod model;

pub use handler::{health_check, invoke, root};
pub(crate) use handler::invoke_cached;
pub use model::{InvokeRequest, InvokeResponse};
