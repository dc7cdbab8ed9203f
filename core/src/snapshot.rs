// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session snapshots and the stores that keep them

use crate::dice::DieState;
use crate::turn::Turn;
use crate::{GameStatus, Peg, Player, PlayerId};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Everything needed to resume a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub game_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub game_state: GameStatus,
    pub players: Vec<Player>,
    pub pegs: Vec<Peg>,
    pub current_turn: Option<Turn>,
    pub winner: Option<PlayerId>,
    pub die_state: DieState,
}

/// Persists snapshots on behalf of a session
pub trait SnapshotStore: Send {
    /// The last saved snapshot, if any
    fn load(&self) -> Result<Option<SessionSnapshot>>;

    /// Replace the saved snapshot
    fn save(&self, snapshot: &SessionSnapshot) -> Result<()>;
}

/// Snapshot file on disk. Files ending in `.json` are written as JSON,
/// everything else as CBOR.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_json(&self) -> bool {
        self.path.extension().map_or(false, |ext| ext == "json")
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let buffer = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        let snapshot = if self.is_json() {
            serde_json::from_slice(&buffer).context("Failed to parse JSON snapshot")?
        } else {
            serde_cbor::from_slice(&buffer).context("Failed to parse CBOR snapshot")?
        };
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let data = if self.is_json() {
            serde_json::to_vec_pretty(snapshot).context("Failed to serialize snapshot to JSON")?
        } else {
            serde_cbor::to_vec(snapshot).context("Failed to serialize snapshot to CBOR")?
        };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());

        // Write to a temporary file, then rename for atomic replacement
        let tmp_path = dir.join(format!(".tmp_{}", file_name));
        {
            let mut file = std::fs::File::create(&tmp_path).context("Failed to create temporary file")?;
            file.write_all(&data).context("Failed to write snapshot data")?;
            file.flush().context("Failed to flush file buffer")?;
        }
        std::fs::rename(&tmp_path, &self.path).context("Failed to rename temporary file")?;

        tracing::debug!("Snapshot saved to {:?} ({} bytes)", self.path, data.len());
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a caller can keep a handle
/// and inspect what the session saved.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<SessionSnapshot>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing snapshot
    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
        }
    }

    pub fn latest(&self) -> Option<SessionSnapshot> {
        self.slot.lock().clone()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<SessionSnapshot>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }
}
