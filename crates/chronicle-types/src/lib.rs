//! Shared domain types for chronicle.
//!
//! This crate contains the core domain types used across the chronicle
//! engine: messages, chat sessions, the persisted history state, the
//! storage policy, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
