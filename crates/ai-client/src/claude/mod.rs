mod client;
mod types;

pub use client::ClaudeClient;
pub use types::{ContentBlock, Message, Role};
