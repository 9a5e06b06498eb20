//! Storage medium implementations.
//!
//! `memory` backs tests and ephemeral use, `file` persists one file per
//! key under a namespace directory, and `null` is the no-op medium for
//! execution contexts without any persistence surface.

pub mod file;
pub mod memory;
pub mod null;

pub use file::FileMedium;
pub use memory::MemoryMedium;
pub use null::NullMedium;
