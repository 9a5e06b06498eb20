//! Storage policy loader.
//!
//! Reads `config.toml` from the data directory and deserializes it into
//! a [`StoragePolicy`]. Falls back to the defaults when the file is
//! missing or malformed.

use std::path::Path;

use chronicle_types::config::StoragePolicy;

/// Load the storage policy from `{data_dir}/config.toml`.
///
/// - Missing file: returns [`StoragePolicy::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the
///   default.
/// - Valid file: returns the parsed policy, with per-field defaults for
///   anything left unset.
pub fn load_policy(data_dir: &Path) -> StoragePolicy {
    let config_path = data_dir.join("config.toml");

    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "no config.toml at {}, using defaults",
                config_path.display()
            );
            return StoragePolicy::default();
        }
        Err(err) => {
            tracing::warn!(
                "failed to read {}: {err}, using defaults",
                config_path.display()
            );
            return StoragePolicy::default();
        }
    };

    match toml::from_str::<StoragePolicy>(&content) {
        Ok(policy) => policy,
        Err(err) => {
            tracing::warn!(
                "failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            StoragePolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        let policy = load_policy(tmp.path());
        assert_eq!(policy, StoragePolicy::default());
    }

    #[test]
    fn valid_partial_toml_parses_with_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "max_sessions = 5\nmax_total_bytes = 1048576\n",
        )
        .unwrap();

        let policy = load_policy(tmp.path());
        assert_eq!(policy.max_sessions, 5);
        assert_eq!(policy.max_total_bytes, 1_048_576);
        assert_eq!(
            policy.max_messages_per_session,
            StoragePolicy::default().max_messages_per_session
        );
    }

    #[test]
    fn malformed_toml_returns_defaults() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "max_sessions = [oops").unwrap();
        assert_eq!(load_policy(tmp.path()), StoragePolicy::default());
    }
}
