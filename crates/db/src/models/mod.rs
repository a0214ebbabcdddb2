//! Row structs for the auth and chat tables.
//!
//! Each submodule contains a `FromRow` struct matching the table columns and
//! the conversion into the matching `chatline_core` entity.

pub mod account;
pub mod chat;
pub mod login_history;
pub mod session;
