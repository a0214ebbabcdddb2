//! Chats, participants and messages.
//!
//! - [`chats`] -- chat lifecycle and membership.
//! - [`messages`] -- posting, reading, editing and deleting messages.

pub mod chats;
pub mod error;
pub mod messages;

pub use chats::{ChatService, ChatUpdate, NewChat, Participation};
pub use error::{ChatError, ChatResult};
pub use messages::{MessageEdit, MessageService, NewMessage};
