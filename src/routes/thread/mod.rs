mod handler;
mod model;

pub use handler::{create_message, create_run, create_thread, get_run, get_thread, list_messages};
pub use model::{Message, Run, RunStatus, Thread};
