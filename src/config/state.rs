// Application state module
// The explicit context object handlers receive instead of process globals

use std::sync::atomic::AtomicBool;

use super::types::Config;
use crate::storage::DiagramStore;

/// Shared application state
///
/// Constructed once at startup and passed to every handler as `Arc<AppState>`.
pub struct AppState {
    pub config: Config,
    pub store: DiagramStore,

    // Cached config value for lock-free access on the hot path
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config, store: DiagramStore) -> Self {
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            store,
            cached_access_log,
        }
    }
}
