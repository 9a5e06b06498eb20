//! In-memory storage medium.

use std::collections::HashMap;
use std::sync::Mutex;

use chronicle_core::storage::medium::StorageMedium;
use chronicle_types::error::MediumError;

/// Hash-map-backed medium with an optional byte quota.
///
/// The quota counts keys plus values, the way a browser accounts its
/// local-storage limit. Useful both as an ephemeral store and for
/// exercising capacity failures.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium that rejects writes once keys plus values would exceed
    /// `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(bytes),
        }
    }

    /// Total bytes currently stored (keys plus values).
    pub fn used_bytes(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.iter().map(|(k, v)| k.len() + v.len()).sum(),
            Err(_) => 0,
        }
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| MediumError::Io("medium lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| MediumError::Io("medium lock poisoned".to_string()))?;

        if let Some(quota) = self.quota_bytes {
            let current: usize = entries.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = entries
                .get(key)
                .map(|v| key.len() + v.len())
                .unwrap_or(0);
            let prospective = current - replaced + key.len() + value.len();
            if prospective > quota {
                return Err(MediumError::QuotaExceeded);
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| MediumError::Io("medium lock poisoned".to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
