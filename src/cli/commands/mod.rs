//! CLI command implementations.

mod chat;
mod config;
mod ping;
mod search;
mod seed;
mod serve;

pub use chat::{run_chat, ChatSession, CONNECTION_ERROR_MESSAGE};
pub use config::run_config;
pub use ping::run_ping;
pub use search::run_search;
pub use seed::run_seed;
pub use serve::{router, run_serve};
