//! Infrastructure implementations for chronicle.
//!
//! Storage medium implementations (file, memory, null) plus the TOML
//! configuration loader. Everything here implements ports defined in
//! `chronicle-core`.

pub mod config;
pub mod medium;
