//! JSON snapshot persistence for the expert ledger
//!
//! The whole ledger is rewritten on every change: serialize to a sibling
//! temp file, then rename over the target so readers never see a torn file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{StorageError, StorageResult, StoredExpert};

/// On-disk ledger format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// Last identifier handed out; identifiers are never reused.
    pub next_id: u64,
    pub experts: Vec<StoredExpert>,
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Read a snapshot, or an empty one when the file does not exist yet.
pub fn load_snapshot(path: &Path) -> StorageResult<LedgerSnapshot> {
    if !path.exists() {
        return Ok(LedgerSnapshot::default());
    }
    let text = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    if text.trim().is_empty() {
        tracing::warn!(path = %path.display(), "empty ledger file, starting fresh");
        return Ok(LedgerSnapshot::default());
    }
    let mut snapshot: LedgerSnapshot =
        serde_json::from_str(&text).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    // Hand-edited files may carry ids past the counter.
    let max_id = snapshot.experts.iter().map(|row| row.id).max().unwrap_or(0);
    snapshot.next_id = snapshot.next_id.max(max_id);
    Ok(snapshot)
}

/// Atomically replace the snapshot at `path`.
pub fn save_snapshot(path: &Path, snapshot: &LedgerSnapshot) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }
    let bytes = serde_json::to_vec_pretty(snapshot).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, bytes).map_err(|e| io_error(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;
    Ok(())
}
