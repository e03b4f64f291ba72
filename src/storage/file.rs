//! File-backed diagram storage
//!
//! The data directory holds at most one current diagram under the
//! configured name. Readers fall back to any other `*.bpmn` file present,
//! first match in directory iteration order (the order is unspecified and
//! callers must not rely on it).

use std::path::{Path, PathBuf};

use tokio::fs;

use super::StoreError;

const DIAGRAM_EXTENSION: &str = "bpmn";

/// Diagram file access rooted at the data directory
pub struct FileStore {
    data_dir: PathBuf,
    diagram_file: String,
}

impl FileStore {
    pub fn new(data_dir: &str, diagram_file: &str) -> Self {
        Self {
            data_dir: PathBuf::from(data_dir),
            diagram_file: diagram_file.to_string(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path the next save will write to
    pub fn diagram_path(&self) -> PathBuf {
        self.data_dir.join(&self.diagram_file)
    }

    /// Resolve the file a read should serve
    ///
    /// The configured diagram file wins; otherwise the first `*.bpmn` entry
    /// found in the directory. None when no candidate exists (including an
    /// unreadable or missing data directory).
    pub async fn resolve(&self) -> Option<PathBuf> {
        let primary = self.diagram_path();
        if fs::metadata(&primary).await.is_ok() {
            return Some(primary);
        }

        let mut entries = fs::read_dir(&self.data_dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(DIAGRAM_EXTENSION)
                && fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false)
            {
                return Some(path);
            }
        }
        None
    }

    /// Read the current diagram bytes
    pub async fn load(&self) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve().await.ok_or(StoreError::NotFound)?;
        Ok(fs::read(path).await?)
    }

    /// Overwrite the current diagram
    pub async fn save(&self, content: &[u8]) -> std::io::Result<()> {
        fs::write(self.diagram_path(), content).await
    }
}
