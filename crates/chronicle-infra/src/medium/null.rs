//! No-op storage medium.
//!
//! Stands in for execution contexts where no persistence surface exists
//! (prerendering, headless smoke tests). Reads see an empty namespace
//! and writes succeed without storing anything, so the engine never
//! fails just because the medium is absent.

use chronicle_core::storage::medium::StorageMedium;
use chronicle_types::error::MediumError;

#[derive(Debug, Default, Clone, Copy)]
pub struct NullMedium;

impl NullMedium {
    pub fn new() -> Self {
        Self
    }
}

impl StorageMedium for NullMedium {
    fn get(&self, _key: &str) -> Result<Option<String>, MediumError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), MediumError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), MediumError> {
        Ok(())
    }
}
