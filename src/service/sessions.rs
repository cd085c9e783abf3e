//! 多局並行
//!
//! `SessionRegistry` 以 session id 保存各自的 `Engine`，各局之間不共享可變狀態。
//! Session id 是 `(命名空間, 序號, 遊戲種子)` 的偽 UUID，同一個命名空間下依建立順序可重現。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::game::config::{ConfigError, GameConfig};
use crate::game::rng::seeded_uuid;
use crate::seed;

use super::commands::{Command, Outcome};
use super::engine::Engine;
use super::error::EngineError;
use super::snapshot::{self, SnapshotError};
use super::state::GameState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown session {0}")]
    UnknownSession(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Session id → Engine
#[derive(Debug)]
pub struct SessionRegistry {
    namespace: String,
    sessions: DashMap<String, Engine>,
    created: AtomicU64,
}

impl SessionRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            sessions: DashMap::new(),
            created: AtomicU64::new(0),
        }
    }

    fn next_id(&self, game_seed: &str) -> String {
        let n = self.created.fetch_add(1, Ordering::Relaxed);
        seeded_uuid(&seed!(self.namespace, n, game_seed))
    }

    fn insert(&self, game_seed: &str, engine: Engine) -> String {
        let id = self.next_id(game_seed);
        self.sessions.insert(id.clone(), engine);
        id
    }

    /// 開新局，回傳 session id
    pub fn create(&self, game_seed: &str, config: &GameConfig) -> Result<String, SessionError> {
        let engine = Engine::new(game_seed, config)?;
        let id = self.insert(game_seed, engine);
        info!(session = %id, seed = game_seed, "session created");
        Ok(id)
    }

    /// 從快照 JSON 開一個新 session
    pub fn restore(&self, json: &str) -> Result<String, SessionError> {
        let state = snapshot::from_json(json)?;
        let game_seed = state.seed.clone();
        let id = self.insert(&game_seed, Engine::from_state(state));
        info!(session = %id, seed = %game_seed, "session restored");
        Ok(id)
    }

    pub fn apply(&self, session: &str, cmd: Command) -> Result<Outcome, SessionError> {
        let mut engine = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| SessionError::UnknownSession(session.to_string()))?;
        Ok(engine.apply(cmd)?)
    }

    pub fn undo(&self, session: &str) -> Result<Arc<GameState>, SessionError> {
        let mut engine = self
            .sessions
            .get_mut(session)
            .ok_or_else(|| SessionError::UnknownSession(session.to_string()))?;
        Ok(engine.undo()?)
    }

    /// 已提交狀態的共享快照
    pub fn snapshot(&self, session: &str) -> Result<Arc<GameState>, SessionError> {
        self.sessions
            .get(session)
            .map(|engine| engine.snapshot())
            .ok_or_else(|| SessionError::UnknownSession(session.to_string()))
    }

    /// 匯出快照 JSON
    pub fn export(&self, session: &str) -> Result<String, SessionError> {
        let state = self.snapshot(session)?;
        Ok(snapshot::to_json(&state)?)
    }

    pub fn remove(&self, session: &str) -> Option<Engine> {
        let removed = self.sessions.remove(session).map(|(_, engine)| engine);
        if removed.is_some() {
            debug!(session, "session removed");
        }
        removed
    }

    pub fn contains(&self, session: &str) -> bool {
        self.sessions.contains_key(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new("default")
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::blinds::Stage;

    #[test]
    fn test_create_and_apply() {
        let registry = SessionRegistry::new("test");
        let id = registry.create("alpha", &GameConfig::default()).unwrap();
        assert_eq!(id.len(), 36);
        assert!(registry.contains(&id));

        registry.apply(&id, Command::SmallBlindSelected).unwrap();
        assert_eq!(registry.snapshot(&id).unwrap().stage, Stage::Blind);
        registry.undo(&id).unwrap();
        assert_eq!(registry.snapshot(&id).unwrap().stage, Stage::PreBlind);
    }

    #[test]
    fn test_ids_are_reproducible_and_distinct() {
        let a = SessionRegistry::new("ns");
        let b = SessionRegistry::new("ns");
        let config = GameConfig::default();
        let first = a.create("seed", &config).unwrap();
        let second = a.create("seed", &config).unwrap();
        assert_ne!(first, second);
        assert_eq!(b.create("seed", &config).unwrap(), first);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_unknown_session() {
        let registry = SessionRegistry::default();
        assert!(matches!(
            registry.apply("nope", Command::ShopOpen),
            Err(SessionError::UnknownSession(id)) if id == "nope"
        ));
        assert!(registry.remove("nope").is_none());
    }

    #[test]
    fn test_rejected_command_surfaces_engine_error() {
        let registry = SessionRegistry::default();
        let id = registry.create("beta", &GameConfig::default()).unwrap();
        assert!(matches!(
            registry.apply(&id, Command::ShopOpen),
            Err(SessionError::Engine(EngineError::NotApplicable(_)))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let registry = SessionRegistry::default();
        let mut config = GameConfig::default();
        config.rules.hand_size = 0;
        assert!(matches!(registry.create("bad", &config), Err(SessionError::Config(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_export_and_restore() {
        let registry = SessionRegistry::default();
        let id = registry.create("gamma", &GameConfig::default()).unwrap();
        registry.apply(&id, Command::SmallBlindSelected).unwrap();

        let json = registry.export(&id).unwrap();
        let copy = registry.restore(&json).unwrap();
        assert_ne!(copy, id);
        assert_eq!(*registry.snapshot(&copy).unwrap(), *registry.snapshot(&id).unwrap());

        // 兩局各自前進
        let card = registry.snapshot(&id).unwrap().gameplay.hand[0];
        registry.apply(&copy, Command::CardSelected { id: card }).unwrap();
        assert!(registry.snapshot(&id).unwrap().gameplay.selected.is_empty());
        assert!(registry.remove(&copy).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_sessions_run_in_parallel() {
        let registry = SessionRegistry::new("parallel");
        let config = GameConfig::default();
        let ids: Vec<String> = (0..4)
            .map(|i| registry.create(&format!("game{i}"), &config).unwrap())
            .collect();

        std::thread::scope(|scope| {
            for id in &ids {
                let registry = &registry;
                scope.spawn(move || {
                    registry.apply(id, Command::SmallBlindSelected).unwrap();
                    let hand = registry.snapshot(id).unwrap().gameplay.hand.clone();
                    for card in hand.into_iter().take(2) {
                        registry.apply(id, Command::CardSelected { id: card }).unwrap();
                    }
                    registry.apply(id, Command::DiscardSelectedCards).unwrap();
                });
            }
        });

        for id in &ids {
            let state = registry.snapshot(id).unwrap();
            assert_eq!(state.gameplay.remaining_discards, 2);
            assert_eq!(state.gameplay.discarded.len(), 2);
        }
    }
}
