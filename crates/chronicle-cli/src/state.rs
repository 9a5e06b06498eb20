//! Shared CLI state: the opened session store and its adapter.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chronicle_core::notify::ChangeBus;
use chronicle_core::storage::adapter::HistoryStore;
use chronicle_core::store::SessionStore;
use chronicle_infra::config::load_policy;
use chronicle_infra::medium::FileMedium;

/// Application state shared by all CLI commands.
pub struct AppState {
    pub store: SessionStore<FileMedium>,
    pub adapter: HistoryStore<FileMedium>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Open the history store at the given directory, or the platform
    /// default (`{data_dir}/chronicle`).
    pub fn open(dir_override: Option<PathBuf>) -> Result<Self> {
        let data_dir = match dir_override {
            Some(dir) => dir,
            None => dirs::data_dir()
                .context("no platform data directory available")?
                .join("chronicle"),
        };

        let policy = load_policy(&data_dir);
        let medium = FileMedium::open(&data_dir)
            .with_context(|| format!("failed to open history store at {}", data_dir.display()))?;
        let adapter = HistoryStore::new(Arc::new(medium), Arc::new(ChangeBus::new()), policy);

        let mut store = SessionStore::new(adapter.clone());
        store.init();

        Ok(Self {
            store,
            adapter,
            data_dir,
        })
    }

    /// Fail the command when the last mutation did not reach disk.
    pub fn ensure_saved(&self) -> Result<()> {
        if let Some(err) = self.store.error() {
            bail!("history not saved: {err}");
        }
        Ok(())
    }
}
