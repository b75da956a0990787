use std::sync::Arc;

use crate::services::{Clock, LogNotifier, Notifier, SystemClock};
use crate::store::MemoryStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates a new empty application state with the system clock and
    /// log-only notifications
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier),
            Arc::new(SystemClock),
        )
    }

    /// Assembles state from explicit collaborators; tests swap in a manual
    /// clock and a recording notifier here
    pub fn with_parts(
        store: Arc<MemoryStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }
}
