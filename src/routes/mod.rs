pub mod assistant;
pub mod deployment;
pub mod platform;
pub mod system;
pub mod thread;
