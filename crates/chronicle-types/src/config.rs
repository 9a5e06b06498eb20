//! Storage policy configuration.
//!
//! The caps below are policy knobs, not protocol requirements: any fixed,
//! documented values work as long as eviction and truncation behave
//! deterministically. Loaded from `config.toml` by the infrastructure
//! layer, with per-field defaults so partial files parse.

use serde::{Deserialize, Serialize};

/// Default maximum number of retained sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 50;

/// Default per-session message cap.
pub const DEFAULT_MAX_MESSAGES_PER_SESSION: usize = 100;

/// Default hard byte budget for the persisted history (5 MiB).
pub const DEFAULT_MAX_TOTAL_BYTES: usize = 5 * 1024 * 1024;

/// Default warning threshold (4 MiB).
pub const DEFAULT_WARN_BYTES: usize = 4 * 1024 * 1024;

/// Size and count limits applied when persisting the session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoragePolicy {
    /// Sessions beyond this count are dropped by LRU eviction.
    pub max_sessions: usize,
    /// Messages beyond this count are tail-truncated per session.
    pub max_messages_per_session: usize,
    /// Hard budget; a save whose optimized payload exceeds this fails.
    pub max_total_bytes: usize,
    /// Soft threshold; a save beyond this succeeds but signals a warning.
    pub warn_bytes: usize,
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            max_messages_per_session: DEFAULT_MAX_MESSAGES_PER_SESSION,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            warn_bytes: DEFAULT_WARN_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let policy = StoragePolicy::default();
        assert_eq!(policy.max_sessions, 50);
        assert_eq!(policy.max_messages_per_session, 100);
        assert_eq!(policy.max_total_bytes, 5 * 1024 * 1024);
        assert_eq!(policy.warn_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let policy: StoragePolicy = toml::from_str("max_sessions = 10").unwrap();
        assert_eq!(policy.max_sessions, 10);
        assert_eq!(policy.max_messages_per_session, DEFAULT_MAX_MESSAGES_PER_SESSION);
        assert_eq!(policy.max_total_bytes, DEFAULT_MAX_TOTAL_BYTES);
    }
}
