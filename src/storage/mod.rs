//! Diagram storage module
//!
//! One "current" diagram lives in the data directory; when a database URL is
//! configured every save is also appended to the `diagrams` table. The file
//! is the only read path, database rows are write-only history.

mod file;
mod postgres;

pub use file::FileStore;
pub use postgres::Database;

use crate::config::StorageConfig;
use crate::logger;
use thiserror::Error;

/// Storage failure taxonomy
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no diagram found")]
    NotFound,
    #[error("diagram file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Diagram persistence handle
///
/// File-backed always; database-backed additionally when configured.
pub struct DiagramStore {
    files: FileStore,
    database: Option<Database>,
}

impl DiagramStore {
    /// Build the store, connecting to PostgreSQL when a URL is configured
    ///
    /// A connection failure here is returned to the caller and aborts
    /// startup; the service never runs half-configured.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StoreError> {
        let database = match &config.database_url {
            Some(url) => Some(Database::connect(url).await?),
            None => None,
        };
        Ok(Self {
            files: FileStore::new(&config.data_dir, &config.diagram_file),
            database,
        })
    }

    /// Store for file-only operation (used by tests)
    #[cfg(test)]
    pub fn file_only(files: FileStore) -> Self {
        Self {
            files,
            database: None,
        }
    }

    pub const fn files(&self) -> &FileStore {
        &self.files
    }

    /// Read the current diagram bytes
    pub async fn load(&self) -> Result<Vec<u8>, StoreError> {
        self.files.load().await
    }

    /// Persist a new diagram
    ///
    /// Database variant: the insert must succeed first; the file write that
    /// follows only mirrors the row and its failure is logged and swallowed.
    /// File variant: the write is the save, its failure is the caller's 500.
    pub async fn save(&self, content: &[u8]) -> Result<(), StoreError> {
        if let Some(database) = &self.database {
            database
                .insert_diagram(&String::from_utf8_lossy(content))
                .await?;

            if let Err(e) = self.files.save(content).await {
                logger::log_warning(&format!("Could not mirror diagram to disk: {e}"));
            }
            return Ok(());
        }

        self.files.save(content).await.map_err(StoreError::from)
    }
}
