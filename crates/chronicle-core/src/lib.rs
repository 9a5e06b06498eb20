//! Storage engine and session store for chronicle.
//!
//! This crate defines the persistence "port" (`StorageMedium`) that the
//! infrastructure layer implements, plus everything built on top of it:
//! the pure codec/optimizer, the storage adapter, the legacy migrator,
//! the session store, the conversation sync engine, and the
//! change-notification bus. It depends only on `chronicle-types` --
//! never on `chronicle-infra` or any I/O crate.

pub mod codec;
pub mod notify;
pub mod storage;
pub mod store;
pub mod sync;
