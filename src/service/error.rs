//! 命令失敗的型別
//!
//! 命令要嘛完整套用，要嘛回傳錯誤且已提交的狀態不變。

use thiserror::Error;

use crate::game::blinds::{BlindError, BlindType, Stage};
use crate::game::cards::CardId;

/// 找不到的實體種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Card,
    Joker,
    Consumable,
    ShopItem,
    Pack,
    PackItem,
    Voucher,
}

/// 命令在目前狀態下不適用的原因
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NotApplicable {
    #[error("command is not valid during {0:?}")]
    WrongStage(Stage),
    #[error("{0:?} blind is not the next blind")]
    BlindNotNext(BlindType),
    #[error("the boss blind cannot be skipped")]
    BossBlindCannotBeSkipped,
    #[error(transparent)]
    Blind(#[from] BlindError),
    #[error("card {0} is already selected")]
    AlreadySelected(CardId),
    #[error("card {0} is not selected")]
    NotSelected(CardId),
    #[error("no more than {0} cards can be selected")]
    SelectionFull(usize),
    #[error("no cards are selected")]
    NothingSelected,
    #[error("no hands left this blind")]
    NoHandsLeft,
    #[error("no discards left this blind")]
    NoDiscardsLeft,
    #[error("this blind requires exactly {0} cards")]
    MustPlayExactly(usize),
    #[error("a hand is being scored")]
    ScoringInProgress,
    #[error("no hand is being scored")]
    NoScoringInProgress,
    #[error("{0} cards are still waiting to be scored")]
    CardsLeftToScore(usize),
    #[error("every scoring card has been scored")]
    NothingLeftToScore,
    #[error("the shop is not open")]
    ShopNotOpen,
    #[error("the shop is already open")]
    ShopAlreadyOpen,
    #[error("no pack is open")]
    NoOpenPack,
    #[error("a pack is already open")]
    PackAlreadyOpen,
    #[error("costs ${price} but only ${available} can be spent")]
    InsufficientFunds { price: i64, available: i64 },
    #[error("joker slots are full")]
    JokerSlotsFull,
    #[error("consumable slots are full")]
    ConsumableSlotsFull,
    #[error("item {0} is a different kind")]
    WrongItemKind(CardId),
    #[error("needs {min}..={max} selected cards, got {selected}")]
    InvalidSelection { min: usize, max: usize, selected: usize },
    #[error("no joker can receive this effect")]
    NoEligibleJoker,
}

/// 引擎錯誤
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{kind:?} {id} not found")]
    NotFound { kind: EntityKind, id: CardId },
    #[error(transparent)]
    NotApplicable(#[from] NotApplicable),
    #[error("nothing to undo")]
    NothingToUndo,
}

impl EngineError {
    pub fn not_found(kind: EntityKind, id: CardId) -> Self {
        EngineError::NotFound { kind, id }
    }
}

impl From<BlindError> for EngineError {
    fn from(err: BlindError) -> Self {
        match err {
            BlindError::BossCannotBeSkipped => NotApplicable::BossBlindCannotBeSkipped.into(),
            other => NotApplicable::Blind(other).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boss_skip_maps_to_named_reason() {
        let err: EngineError = BlindError::BossCannotBeSkipped.into();
        assert_eq!(err, EngineError::NotApplicable(NotApplicable::BossBlindCannotBeSkipped));
    }

    #[test]
    fn test_messages() {
        let err = EngineError::not_found(EntityKind::Joker, 7);
        assert_eq!(err.to_string(), "Joker 7 not found");
        let err: EngineError = NotApplicable::InsufficientFunds { price: 6, available: 2 }.into();
        assert_eq!(err.to_string(), "costs $6 but only $2 can be spent");
    }
}
