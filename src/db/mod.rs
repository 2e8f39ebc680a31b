pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Corrupt JSON in column {column}: {reason}")]
    CorruptJson { column: String, reason: String },

    #[error("Database lock poisoned")]
    LockPoisoned,
}

/// Acquire the connection mutex, mapping a poisoned lock to a typed error.
pub fn lock_db(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
    conn.lock().map_err(|_| DatabaseError::LockPoisoned)
}
