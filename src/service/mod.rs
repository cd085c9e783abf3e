//! 服務層模組
//!
//! 命令進入 `Engine`，由各 reducer 修改草稿狀態：
//! - `round`: Blind 選擇、跳過、發牌、選牌、棄牌與結算
//! - `scoring`: 逐張計分的出牌管線
//! - `shop` / `consumables`: 商店、卡包、Joker 與消耗品
//! - `snapshot` / `sessions`: 持久化與多局管理

pub mod commands;
pub mod consumables;
pub mod engine;
pub mod error;
pub mod round;
pub mod scoring;
pub mod sessions;
pub mod shop;
pub mod snapshot;
pub mod state;

pub use commands::{Command, Outcome};
pub use engine::{apply, Engine};
pub use error::{EngineError, EntityKind, NotApplicable};
pub use scoring::{glass_shatters, score_card, CardContribution};
pub use sessions::{SessionError, SessionRegistry};
pub use snapshot::{SnapshotDocument, SnapshotError, SNAPSHOT_VERSION};
pub use state::{GameState, GameplayState, HandScoring};

#[cfg(test)]
mod integration_tests;
