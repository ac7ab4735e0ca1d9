use std::sync::{Arc, Mutex};

use repertoire_core::Database;

use crate::error::ApiError;

/// Shared handle on the catalog database.
///
/// SQLite calls block, so every store operation runs on the blocking pool
/// while holding the lock.
#[derive(Debug, Clone)]
pub struct AppState {
    db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub(crate) async fn with_db<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Database) -> repertoire_core::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut guard = db
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
            f(&mut *guard).map_err(ApiError::from)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    }
}
