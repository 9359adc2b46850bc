use std::sync::Arc;

use crate::cache::ResultCache;
use crate::db::Database;
use crate::notify::Notifier;

/// Shared application state available to all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Per-event result cache, invalidated after every committed mutation.
    pub cache: Arc<ResultCache>,
    /// Best-effort update channel towards connected observers.
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(db: Database, cache: Arc<ResultCache>, notifier: Notifier) -> Self {
        AppState {
            db,
            cache,
            notifier,
        }
    }
}
