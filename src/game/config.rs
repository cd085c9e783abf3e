//! 遊戲設定
//!
//! 新局的初始參數，可由 JSON 文件載入：
//!
//! ```json
//! { "starting_money": 10, "rules": { "hand_size": 9 } }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{STARTING_MONEY, UNDO_DEPTH};
use super::rules::StaticRules;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// 新局設定
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_money: i64,
    pub rules: StaticRules,
    /// 引擎保留的歷史深度，超過時捨棄最舊的一筆
    pub undo_depth: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_money: STARTING_MONEY,
            rules: StaticRules::default(),
            undo_depth: UNDO_DEPTH,
        }
    }
}

impl GameConfig {
    /// 從 JSON 載入並驗證
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rules = &self.rules;
        if rules.hand_size == 0 {
            return Err(ConfigError::Invalid("hand_size must be at least 1".into()));
        }
        if rules.max_selected == 0 || rules.max_selected > rules.hand_size {
            return Err(ConfigError::Invalid(format!(
                "max_selected must be in 1..={}",
                rules.hand_size
            )));
        }
        if rules.min_straight_flush_cards == 0 || rules.min_straight_flush_cards > 5 {
            return Err(ConfigError::Invalid(
                "min_straight_flush_cards must be in 1..=5".into(),
            ));
        }
        if rules.hands_per_round == 0 {
            return Err(ConfigError::Invalid("hands_per_round must be at least 1".into()));
        }
        if !rules.probability_multiplier.is_finite() || rules.probability_multiplier < 0.0 {
            return Err(ConfigError::Invalid(
                "probability_multiplier must be a non-negative number".into(),
            ));
        }
        if self.starting_money < rules.money_floor {
            return Err(ConfigError::Invalid(format!(
                "starting_money {} is below money_floor {}",
                self.starting_money, rules.money_floor
            )));
        }
        if rules.discount_percent > 100 {
            return Err(ConfigError::Invalid("discount_percent must be <= 100".into()));
        }
        if rules.winning_round == Some(0) {
            return Err(ConfigError::Invalid("winning_round starts at 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_partial() {
        let config = GameConfig::from_json(r#"{ "starting_money": 10, "rules": { "hand_size": 9 } }"#)
            .unwrap();
        assert_eq!(config.starting_money, 10);
        assert_eq!(config.rules.hand_size, 9);
        assert_eq!(config.rules.discards_per_round, 3);
        assert_eq!(config.undo_depth, UNDO_DEPTH);

        let config = GameConfig::from_json(r#"{ "undo_depth": 3 }"#).unwrap();
        assert_eq!(config.undo_depth, 3);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(GameConfig::from_json("{}").unwrap(), GameConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = GameConfig::from_json(r#"{ "rules": { "max_selected": 12 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_json(r#"{ "starting_money": -5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
