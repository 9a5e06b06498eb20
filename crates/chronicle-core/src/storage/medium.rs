//! Storage medium port.
//!
//! A string key-value surface with synchronous, near-instant operations.
//! Implementations live in chronicle-infra.

use chronicle_types::error::MediumError;

/// Trait for the raw persistence medium.
///
/// Implementations must be cheap: these calls run on every mutation of
/// the session store.
pub trait StorageMedium: Send + Sync {
    /// Read a value. Returns `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, MediumError>;

    /// Write a value (upsert).
    fn set(&self, key: &str, value: &str) -> Result<(), MediumError>;

    /// Remove a key. No-op when the key is absent.
    fn remove(&self, key: &str) -> Result<(), MediumError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory medium used by the engine's own tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chronicle_types::error::MediumError;

    use super::StorageMedium;

    /// Test double: a hash map plus per-key write counters and a
    /// switchable quota failure.
    #[derive(Default)]
    pub(crate) struct TestMedium {
        entries: Mutex<HashMap<String, String>>,
        set_counts: Mutex<HashMap<String, usize>>,
        fail_with_quota: AtomicBool,
    }

    impl TestMedium {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent `set` fail with `QuotaExceeded`.
        pub(crate) fn fail_with_quota(&self, fail: bool) {
            self.fail_with_quota.store(fail, Ordering::SeqCst);
        }

        pub(crate) fn raw(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        pub(crate) fn insert_raw(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }

        pub(crate) fn contains(&self, key: &str) -> bool {
            self.entries.lock().unwrap().contains_key(key)
        }

        /// Number of `set` calls seen for `key`.
        pub(crate) fn set_count(&self, key: &str) -> usize {
            self.set_counts.lock().unwrap().get(key).copied().unwrap_or(0)
        }
    }

    impl StorageMedium for TestMedium {
        fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
            *self
                .set_counts
                .lock()
                .unwrap()
                .entry(key.to_string())
                .or_insert(0) += 1;
            if self.fail_with_quota.load(Ordering::SeqCst) {
                return Err(MediumError::QuotaExceeded);
            }
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), MediumError> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }
}
