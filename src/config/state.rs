// Application state module
// Immutable per-process state shared by every connection

use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::storage::ImageStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ImageStore,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store = ImageStore::new(
            &config.storage.upload_dir,
            &config.storage.public_prefix,
        );

        Self {
            config,
            store,
            active_connections: AtomicUsize::new(0),
        }
    }
}
