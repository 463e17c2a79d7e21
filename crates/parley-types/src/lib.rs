//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley chat
//! application: users, chat sessions, messages, anonymous quotas, and their
//! associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod quota;
pub mod user;
