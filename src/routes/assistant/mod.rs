mod handler;
mod model;

pub use handler::{create_assistant, get_assistant, list_assistants};
pub use model::{Assistant, DEFAULT_ASSISTANT_ID};
