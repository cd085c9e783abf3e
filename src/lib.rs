//! 確定性的卡牌遊戲規則引擎
//!
//! - `game`: 規則資料與純演算法（牌型判定、效果分派、亂數、商店）
//! - `service`: 整局狀態、命令與引擎（套用 / 提交 / 復原 / 重播）

pub mod game;
pub mod service;

pub use service::{apply, Command, Engine, EngineError, GameState, NotApplicable, Outcome};
