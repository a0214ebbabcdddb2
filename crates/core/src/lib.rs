//! Chatline domain layer.
//!
//! Entities, token primitives and the storage / cache ports the auth and chat
//! services are written against. This crate has no database or network dependencies.

pub mod account;
pub mod chat;
pub mod hashing;
pub mod memory;
pub mod session;
pub mod store;
pub mod tokens;
pub mod types;
