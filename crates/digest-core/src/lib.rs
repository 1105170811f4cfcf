pub mod config;
pub mod error;
pub mod input;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::DigestError;
pub use input::{ChatLog, ConversationInput};
pub use store::LogStore;
pub use types::{Conversation, Direction, Message, MessageKind, RawMessage};
