//! JSON conversation mirror
//!
//! The history document is one JSON array of
//! `{session_id, timestamp, messages}` records. Every save reads the whole
//! array, replaces or appends the record for the session and rewrites the
//! file through a temporary sibling and a rename. Saves are serialized by a
//! single async mutex.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use voice_support_core::ConversationRecord;

use crate::PersistenceError;

/// Sink for transcript snapshots
#[async_trait]
pub trait ConversationMirror: Send + Sync {
    /// Insert or replace the record for `record.session_id`
    async fn save(&self, record: &ConversationRecord) -> Result<(), PersistenceError>;

    /// Look up a stored record
    async fn find(&self, session_id: &str) -> Result<Option<ConversationRecord>, PersistenceError>;
}

/// History document stored as a pretty-printed JSON array
pub struct JsonConversationMirror {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonConversationMirror {
    /// Use `path` without touching the filesystem
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Use `path`, creating it as an empty array when absent
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let mirror = Self::new(path);
        mirror.ensure_file().await?;
        Ok(mirror)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the document (and its parent directory) as `[]` if missing
    pub async fn ensure_file(&self) -> Result<(), PersistenceError> {
        if tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| PersistenceError::io(&self.path, e))?
        {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::io(parent, e))?;
        }
        tokio::fs::write(&self.path, b"[]")
            .await
            .map_err(|e| PersistenceError::io(&self.path, e))?;

        tracing::info!(path = %self.path.display(), "Created conversation history file");
        Ok(())
    }

    /// Read every record; a missing or blank file reads as empty
    pub async fn load_all(&self) -> Result<Vec<ConversationRecord>, PersistenceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|e| PersistenceError::Corrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(&self, records: &[ConversationRecord]) -> Result<(), PersistenceError> {
        let body = serde_json::to_vec_pretty(records)?;

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "history".to_string());
        let tmp = self.path.with_file_name(format!(
            ".{}.{}.tmp",
            file_name,
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PersistenceError::io(&tmp, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(PersistenceError::io(&self.path, e));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationMirror for JsonConversationMirror {
    async fn save(&self, record: &ConversationRecord) -> Result<(), PersistenceError> {
        let _guard = self.write_lock.lock().await;

        let mut records = self.load_all().await?;
        match records.iter_mut().find(|r| r.session_id == record.session_id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_all(&records).await?;

        tracing::debug!(
            session_id = %record.session_id,
            messages = record.messages.len(),
            total_records = records.len(),
            "Conversation mirrored to disk"
        );
        Ok(())
    }

    async fn find(&self, session_id: &str) -> Result<Option<ConversationRecord>, PersistenceError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|r| r.session_id == session_id))
    }
}
