//! Shared state for the HTTP API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::intake::IntakeService;

/// Shared context for all API routes.
///
/// The database connection is a single-owner mutex: uploads and queries are
/// short synchronous call chains, and serializing them through one guard is
/// the intended concurrency model for this service.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
    pub intake: Arc<IntakeService>,
}

impl ApiContext {
    pub fn new(conn: Connection, intake: Arc<IntakeService>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            intake,
        }
    }

    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
