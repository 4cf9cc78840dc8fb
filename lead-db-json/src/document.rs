use std::io;
use std::path::{Path, PathBuf};

use lead_core::{Lead, RepositoryError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// On-disk layout: one document holding every lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Document {
    /// Last id handed out; ids are never reused after a delete.
    pub next_id: i64,
    pub leads: Vec<Lead>,
}

impl Document {
    pub fn find(&self, id: i64) -> Option<&Lead> {
        self.leads.iter().find(|lead| lead.id == id)
    }

    pub fn find_mut(&mut self, id: i64) -> Option<&mut Lead> {
        self.leads.iter_mut().find(|lead| lead.id == id)
    }
}

// Interrupted or timed-out filesystem calls may succeed on a retry.
fn io_error(path: &Path, err: io::Error) -> RepositoryError {
    let message = format!("{}: {err}", path.display());
    match err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
            RepositoryError::Connection(message)
        }
        _ => RepositoryError::Database(message),
    }
}

/// Reads the document at `path`; a missing file is an empty store.
pub(crate) async fn load(path: &Path) -> Result<Document, RepositoryError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "lead file missing, starting empty");
            return Ok(Document::default());
        }
        Err(err) => return Err(io_error(path, err)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Document::default());
    }
    serde_json::from_slice(&bytes)
        .map_err(|e| RepositoryError::Serialization(format!("{}: {e}", path.display())))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `document` next to `path` and renames it into place, so readers
/// never see a half-written file.
pub(crate) async fn store(path: &Path, document: &Document) -> Result<(), RepositoryError> {
    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    let temp = temp_path(path);
    tokio::fs::write(&temp, bytes)
        .await
        .map_err(|e| io_error(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| io_error(path, e))?;
    debug!(path = %path.display(), leads = document.leads.len(), "lead file written");
    Ok(())
}
