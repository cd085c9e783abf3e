//! Joker 定義系統 - 聲明式效果模板
//!
//! 每個 Joker 的元數據與效果列表都是靜態資料：
//!
//! ```text
//! JokerDef = 名稱 + 稀有度 + 價格 + [Effect]
//!
//! Effect = 觸發事件 × 守衛條件 × 動作
//! ```
//!
//! # 添加新 Joker
//!
//! 在 `JokerId` 加入變體，定義效果常量，並在 `JOKER_DEFS` 對應位置添加條目：
//!
//! ```rust,ignore
//! const NEW_JOKER: &[Effect] = &[Effect::when(
//!     GameEvent::CardScored,
//!     Condition::CardSuit(Suit::Diamonds),
//!     EffectAction::AddMoney(3),
//! )];
//! ```

use serde::{Deserialize, Serialize};

use super::cards::{Rank, Suit};
use super::effects::{CompareOp, Condition, Deferred, Effect, EffectAction, GameEvent};
use super::hand_types::HandId;

use EffectAction::*;
use GameEvent::*;

// ============================================================================
// 稀有度
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common = 1,
    Uncommon = 2,
    Rare = 3,
    Legendary = 4,
}

impl From<u8> for Rarity {
    fn from(value: u8) -> Self {
        match value {
            2 => Self::Uncommon,
            3 => Self::Rare,
            4 => Self::Legendary,
            _ => Self::Common,
        }
    }
}

impl From<Rarity> for u8 {
    fn from(value: Rarity) -> Self {
        value as u8
    }
}

// ============================================================================
// 效果常量
// ============================================================================

const ODD_RANKS: &[Rank] = &[Rank::Ace, Rank::Three, Rank::Five, Rank::Seven, Rank::Nine];
const EVEN_RANKS: &[Rank] = &[Rank::Two, Rank::Four, Rank::Six, Rank::Eight, Rank::Ten];
const FIBONACCI_RANKS: &[Rank] = &[Rank::Ace, Rank::Two, Rank::Three, Rank::Five, Rank::Eight];
const SUBJECT_ONLY_COPY: &[Condition] = &[Condition::IsSubject, Condition::OnlyCopy];

const fn hand_done(action: EffectAction) -> Effect {
    Effect::on(HandScoringDone, action)
}

const fn contains(hand: HandId, action: EffectAction) -> Effect {
    Effect::when(HandScoringDone, Condition::HandContains(hand), action)
}

const fn per_card(guard: Condition, action: EffectAction) -> Effect {
    Effect::when(CardScored, guard, action)
}

const JOKER: &[Effect] = &[hand_done(AddMult(4.0))];
const GREEDY: &[Effect] = &[per_card(Condition::CardSuit(Suit::Diamonds), AddMult(3.0))];
const LUSTY: &[Effect] = &[per_card(Condition::CardSuit(Suit::Hearts), AddMult(3.0))];
const WRATHFUL: &[Effect] = &[per_card(Condition::CardSuit(Suit::Spades), AddMult(3.0))];
const GLUTTONOUS: &[Effect] = &[per_card(Condition::CardSuit(Suit::Clubs), AddMult(3.0))];

const JOLLY: &[Effect] = &[contains(HandId::Pair, AddMult(8.0))];
const ZANY: &[Effect] = &[contains(HandId::ThreeKind, AddMult(12.0))];
const MAD: &[Effect] = &[contains(HandId::TwoPair, AddMult(10.0))];
const CRAZY: &[Effect] = &[contains(HandId::Straight, AddMult(12.0))];
const DROLL: &[Effect] = &[contains(HandId::Flush, AddMult(10.0))];
const SLY: &[Effect] = &[contains(HandId::Pair, AddChips(50))];
const WILY: &[Effect] = &[contains(HandId::ThreeKind, AddChips(100))];
const CLEVER: &[Effect] = &[contains(HandId::TwoPair, AddChips(80))];
const DEVIOUS: &[Effect] = &[contains(HandId::Straight, AddChips(100))];
const CRAFTY: &[Effect] = &[contains(HandId::Flush, AddChips(80))];

const HALF: &[Effect] = &[Effect::when(HandScoringDone, Condition::PlayedAtMost(3), AddMult(20.0))];
const BANNER: &[Effect] = &[hand_done(AddChipsPerDiscard(30))];
const MYSTIC_SUMMIT: &[Effect] = &[Effect::when(
    HandScoringDone,
    Condition::DiscardsRemaining(CompareOp::Eq, 0),
    AddMult(15.0),
)];
const ABSTRACT: &[Effect] = &[hand_done(AddMultPerJoker(3.0))];

const FOUR_FINGERS: &[Effect] = &[
    Effect::when(JokerAdded, Condition::IsSubject, SetMinStraightFlushCards(4)),
    Effect::when(JokerSold, Condition::All(SUBJECT_ONLY_COPY), ResetMinStraightFlushCards),
];
const SCARY_FACE: &[Effect] = &[per_card(Condition::CardIsFace, AddChips(30))];
const SMILEY_FACE: &[Effect] = &[per_card(Condition::CardIsFace, AddMult(5.0))];
const EVEN_STEVEN: &[Effect] = &[per_card(Condition::CardRankIn(EVEN_RANKS), AddMult(4.0))];
const ODD_TODD: &[Effect] = &[per_card(Condition::CardRankIn(ODD_RANKS), AddChips(31))];
const SCHOLAR: &[Effect] = &[
    per_card(Condition::CardRankIn(&[Rank::Ace]), AddChips(20)),
    per_card(Condition::CardRankIn(&[Rank::Ace]), AddMult(4.0)),
];
const FIBONACCI: &[Effect] = &[per_card(Condition::CardRankIn(FIBONACCI_RANKS), AddMult(8.0))];

const GOLDEN: &[Effect] = &[Effect::on(BlindDefeated, AddMoney(4))];
const BULL: &[Effect] = &[hand_done(AddChipsPerMoney(2))];
const CARTOMANCER: &[Effect] = &[Effect::on(BlindSelected, Queue(Deferred::CreateRandomTarot))];
const ACROBAT: &[Effect] = &[Effect::when(
    HandScoringDone,
    Condition::HandsRemaining(CompareOp::Eq, 0),
    MultiplyMult(3.0),
)];
const CAVENDISH: &[Effect] = &[hand_done(MultiplyMult(3.0))];

const PAREIDOLIA: &[Effect] = &[
    Effect::when(JokerAdded, Condition::IsSubject, SetAllCardsAreFaces(true)),
    Effect::when(JokerSold, Condition::All(SUBJECT_ONLY_COPY), ResetAllCardsAreFaces),
];
const SHOWMAN: &[Effect] = &[
    Effect::when(JokerAdded, Condition::IsSubject, SetAllowDuplicateJokers(true)),
    Effect::when(JokerSold, Condition::All(SUBJECT_ONLY_COPY), ResetAllowDuplicateJokers),
];
const OOPS_ALL_6S: &[Effect] = &[
    Effect::when(JokerAdded, Condition::IsSubject, ScaleProbabilities(2.0)),
    Effect::when(JokerSold, Condition::IsSubject, ScaleProbabilities(0.5)),
];
const RED_CARD: &[Effect] = &[
    Effect::on(BlindSkipped, Queue(Deferred::GrowOwnMult(3.0))),
    hand_done(AddOwnMult),
];

const DUO: &[Effect] = &[contains(HandId::Pair, MultiplyMult(2.0))];
const TRIO: &[Effect] = &[contains(HandId::ThreeKind, MultiplyMult(3.0))];
const FAMILY: &[Effect] = &[contains(HandId::FourKind, MultiplyMult(4.0))];
const ORDER: &[Effect] = &[contains(HandId::Straight, MultiplyMult(3.0))];
const TRIBE: &[Effect] = &[contains(HandId::Flush, MultiplyMult(2.0))];

// ============================================================================
// Joker 定義表
// ============================================================================

/// Joker 定義
#[derive(Clone, Copy, Debug)]
pub struct JokerDef {
    pub name: &'static str,
    pub rarity: Rarity,
    pub price: i64,
    pub effects: &'static [Effect],
}

const fn def(name: &'static str, rarity: Rarity, price: i64, effects: &'static [Effect]) -> JokerDef {
    JokerDef { name, rarity, price, effects }
}

/// Joker 定義表（順序與 `JokerId` 枚舉一致）
pub static JOKER_DEFS: [JokerDef; 40] = [
    def("Joker", Rarity::Common, 2, JOKER),
    def("Greedy Joker", Rarity::Common, 5, GREEDY),
    def("Lusty Joker", Rarity::Common, 5, LUSTY),
    def("Wrathful Joker", Rarity::Common, 5, WRATHFUL),
    def("Gluttonous Joker", Rarity::Common, 5, GLUTTONOUS),
    def("Jolly Joker", Rarity::Common, 3, JOLLY),
    def("Zany Joker", Rarity::Common, 4, ZANY),
    def("Mad Joker", Rarity::Common, 4, MAD),
    def("Crazy Joker", Rarity::Common, 4, CRAZY),
    def("Droll Joker", Rarity::Common, 4, DROLL),
    def("Sly Joker", Rarity::Common, 3, SLY),
    def("Wily Joker", Rarity::Common, 4, WILY),
    def("Clever Joker", Rarity::Common, 4, CLEVER),
    def("Devious Joker", Rarity::Common, 4, DEVIOUS),
    def("Crafty Joker", Rarity::Common, 4, CRAFTY),
    def("Half Joker", Rarity::Common, 5, HALF),
    def("Banner", Rarity::Common, 5, BANNER),
    def("Mystic Summit", Rarity::Common, 5, MYSTIC_SUMMIT),
    def("Abstract Joker", Rarity::Common, 4, ABSTRACT),
    def("Four Fingers", Rarity::Uncommon, 7, FOUR_FINGERS),
    def("Scary Face", Rarity::Common, 4, SCARY_FACE),
    def("Smiley Face", Rarity::Common, 4, SMILEY_FACE),
    def("Even Steven", Rarity::Common, 4, EVEN_STEVEN),
    def("Odd Todd", Rarity::Common, 4, ODD_TODD),
    def("Scholar", Rarity::Common, 4, SCHOLAR),
    def("Fibonacci", Rarity::Uncommon, 8, FIBONACCI),
    def("Golden Joker", Rarity::Common, 6, GOLDEN),
    def("Bull", Rarity::Uncommon, 6, BULL),
    def("Cartomancer", Rarity::Uncommon, 6, CARTOMANCER),
    def("Acrobat", Rarity::Uncommon, 6, ACROBAT),
    def("Cavendish", Rarity::Common, 4, CAVENDISH),
    def("Pareidolia", Rarity::Uncommon, 5, PAREIDOLIA),
    def("Showman", Rarity::Uncommon, 5, SHOWMAN),
    def("Oops! All 6s", Rarity::Uncommon, 4, OOPS_ALL_6S),
    def("Red Card", Rarity::Common, 5, RED_CARD),
    def("The Duo", Rarity::Rare, 8, DUO),
    def("The Trio", Rarity::Rare, 8, TRIO),
    def("The Family", Rarity::Rare, 8, FAMILY),
    def("The Order", Rarity::Rare, 8, ORDER),
    def("The Tribe", Rarity::Rare, 8, TRIBE),
];

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_joker_has_effects() {
        for def in JOKER_DEFS.iter() {
            assert!(!def.effects.is_empty(), "{} has no effects", def.name);
            assert!(def.price > 0);
        }
    }

    #[test]
    fn test_rarity_roundtrip() {
        for rarity in [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Legendary] {
            assert_eq!(Rarity::from(u8::from(rarity)), rarity);
        }
        assert_eq!(Rarity::from(9), Rarity::Common);
    }

    #[test]
    fn test_rule_jokers_revert_only_last_copy() {
        for effects in [FOUR_FINGERS, PAREIDOLIA, SHOWMAN] {
            let sold = effects.iter().find(|e| e.trigger == JokerSold).unwrap();
            assert_eq!(sold.guard, Some(Condition::All(SUBJECT_ONLY_COPY)));
        }
    }
}
