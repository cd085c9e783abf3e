//! 狀態快照
//!
//! 快照是帶版本號的 JSON 文件 `{ "version": 1, "state": { ... } }`。
//! 還原後的狀態與原狀態完全相等，再次序列化得到相同的位元組。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::GameState;

/// 目前的快照格式版本
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found}")]
    UnsupportedVersion { found: u32 },
}

/// 快照文件
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: u32,
    pub state: GameState,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    state: &'a GameState,
}

impl SnapshotDocument {
    pub fn new(state: GameState) -> Self {
        Self { version: SNAPSHOT_VERSION, state }
    }
}

/// 序列化為快照 JSON
pub fn to_json(state: &GameState) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&SnapshotRef { version: SNAPSHOT_VERSION, state })?)
}

/// 從快照 JSON 還原
pub fn from_json(json: &str) -> Result<GameState, SnapshotError> {
    let document: SnapshotDocument = serde_json::from_str(json)?;
    if document.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion { found: document.version });
    }
    Ok(document.state)
}

// ============================================================================
// 單元測試
// ============================================================================
