//! Blind 和 Boss Blind 定義
//!
//! 每回合固定三個 Blind：Small → Big → Boss。狀態只能依
//! `NotStarted → InProgress → {Completed | Skipped}` 前進，Boss 不能跳過。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cards::{PlayingCardState, Suit};
use super::effects::{Deferred, Effect, EffectAction, GameEvent};
use super::rng::{random_int, seed_string};
use super::tags::TagId;

/// 遊戲階段
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// 選擇或跳過 Blind
    PreBlind,
    /// 出牌中
    Blind,
    Shop,
    End(GameEnd),
}

/// 遊戲結束狀態
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEnd {
    Win,
    Lose,
}

/// Blind 類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlindType {
    Small,
    Big,
    Boss,
}

impl BlindType {
    pub fn all() -> &'static [BlindType] {
        &[BlindType::Small, BlindType::Big, BlindType::Boss]
    }

    pub fn reward(&self) -> i64 {
        match self {
            BlindType::Small => 3,
            BlindType::Big => 4,
            BlindType::Boss => 5,
        }
    }

    pub fn score_multiplier(&self) -> f64 {
        match self {
            BlindType::Small => 1.0,
            BlindType::Big => 1.5,
            BlindType::Boss => 2.0,
        }
    }

    pub fn next(&self) -> Option<BlindType> {
        match self {
            BlindType::Small => Some(BlindType::Big),
            BlindType::Big => Some(BlindType::Boss),
            BlindType::Boss => None, // Boss 之後進入下一回合
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlindType::Small => "Small",
            BlindType::Big => "Big",
            BlindType::Boss => "Boss",
        }
    }
}

// ============================================================================
// Boss Blind
// ============================================================================

/// Boss Blind 類型 - 每個有獨特的 debuff 效果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossBlindId {
    TheHook,    // 每手打完後隨機棄 2 張手牌
    TheWall,    // 需要 4x 分數
    TheArm,     // 降低打出牌型的等級
    TheFlint,   // 基礎 chips 和 mult 減半
    TheClub,    // 梅花牌不計分
    TheGoad,    // 黑桃牌不計分
    TheWindow,  // 方塊牌不計分
    TheHead,    // 紅心牌不計分
    ThePsychic, // 必須出 5 張牌
    ThePlant,   // 人頭牌不計分
    TheNeedle,  // 只有 1 次出牌機會
    TheWater,   // 沒有棄牌機會
    VioletVessel, // 最終回合：需要 6x 分數
}

const HOOK: &[Effect] = &[Effect::on(
    GameEvent::HandScoringDone,
    EffectAction::Queue(Deferred::DiscardRandomHeldCards(2)),
)
.with_priority(100)];
const ARM: &[Effect] = &[Effect::on(
    GameEvent::HandScoringStart,
    EffectAction::Queue(Deferred::LevelDownPlayedHand),
)
.with_priority(-100)];
const FLINT: &[Effect] =
    &[Effect::on(GameEvent::HandScoringStart, EffectAction::HalveBaseScore).with_priority(-100)];

impl BossBlindId {
    /// 常規 Boss 列表
    pub fn regular_bosses() -> &'static [BossBlindId] {
        &[
            BossBlindId::TheHook,
            BossBlindId::TheWall,
            BossBlindId::TheArm,
            BossBlindId::TheFlint,
            BossBlindId::TheClub,
            BossBlindId::TheGoad,
            BossBlindId::TheWindow,
            BossBlindId::TheHead,
            BossBlindId::ThePsychic,
            BossBlindId::ThePlant,
            BossBlindId::TheNeedle,
            BossBlindId::TheWater,
        ]
    }

    /// 最終回合專屬 Boss 列表
    pub fn showdown_bosses() -> &'static [BossBlindId] {
        &[BossBlindId::VioletVessel]
    }

    /// Boss Blind 的分數倍數 (大部分是 2x)
    pub fn score_multiplier(&self) -> f64 {
        match self {
            BossBlindId::TheWall => 4.0,
            BossBlindId::VioletVessel => 6.0,
            _ => 2.0,
        }
    }

    /// 被禁用的花色
    pub fn debuffed_suit(&self) -> Option<Suit> {
        match self {
            BossBlindId::TheClub => Some(Suit::Clubs),
            BossBlindId::TheGoad => Some(Suit::Spades),
            BossBlindId::TheWindow => Some(Suit::Diamonds),
            BossBlindId::TheHead => Some(Suit::Hearts),
            _ => None,
        }
    }

    /// 此牌在本 Boss 下是否失效（Wild 牌不受花色禁用影響）
    pub fn debuffs(&self, card: &PlayingCardState, all_faces: bool) -> bool {
        if let Some(suit) = self.debuffed_suit() {
            if card.counts_for_hand()
                && card.suit() == suit
                && card.enhancement != super::cards::Enhancement::Wild
            {
                return true;
            }
        }
        matches!(self, BossBlindId::ThePlant) && card.is_face(all_faces)
    }

    /// 檢查是否需要剛好 5 張牌
    pub fn requires_five_cards(&self) -> bool {
        matches!(self, BossBlindId::ThePsychic)
    }

    /// 出牌次數上限
    pub fn max_hands(&self) -> Option<u32> {
        match self {
            BossBlindId::TheNeedle => Some(1),
            _ => None,
        }
    }

    /// 棄牌次數上限
    pub fn max_discards(&self) -> Option<u32> {
        match self {
            BossBlindId::TheWater => Some(0),
            _ => None,
        }
    }

    /// 事件效果
    pub fn effects(&self) -> &'static [Effect] {
        match self {
            BossBlindId::TheHook => HOOK,
            BossBlindId::TheArm => ARM,
            BossBlindId::TheFlint => FLINT,
            _ => &[],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BossBlindId::TheHook => "The Hook",
            BossBlindId::TheWall => "The Wall",
            BossBlindId::TheArm => "The Arm",
            BossBlindId::TheFlint => "The Flint",
            BossBlindId::TheClub => "The Club",
            BossBlindId::TheGoad => "The Goad",
            BossBlindId::TheWindow => "The Window",
            BossBlindId::TheHead => "The Head",
            BossBlindId::ThePsychic => "The Psychic",
            BossBlindId::ThePlant => "The Plant",
            BossBlindId::TheNeedle => "The Needle",
            BossBlindId::TheWater => "The Water",
            BossBlindId::VioletVessel => "Violet Vessel",
        }
    }
}

// ============================================================================
// 回合分數
// ============================================================================

const ROUND_BASE_SCORES: [i64; 8] = [300, 800, 2_000, 5_000, 11_000, 20_000, 35_000, 50_000];

/// 回合的基礎分數（第 8 回合之後每回合 x1.6）
pub fn round_base_score(round: u32) -> i64 {
    let round = round.max(1) as usize;
    if round <= ROUND_BASE_SCORES.len() {
        return ROUND_BASE_SCORES[round - 1];
    }
    let extra = (round - ROUND_BASE_SCORES.len()) as i32;
    (ROUND_BASE_SCORES[ROUND_BASE_SCORES.len() - 1] as f64 * 1.6f64.powi(extra)).floor() as i64
}

// ============================================================================
// 獎勵
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    RemainingHands,
    Interest,
    GoldCards,
}

impl RewardKind {
    pub fn name(&self) -> &'static str {
        match self {
            RewardKind::RemainingHands => "remaining hands",
            RewardKind::Interest => "interest",
            RewardKind::GoldCards => "gold cards",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedReward {
    pub kind: RewardKind,
    pub amount: i64,
}

/// Blind 獎勵 = 基礎獎勵 + 具名加成
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindReward {
    pub base: i64,
    pub bonuses: Vec<NamedReward>,
}

impl BlindReward {
    pub fn new(base: i64) -> Self {
        Self { base, bonuses: Vec::new() }
    }

    /// 加入非零加成
    pub fn add_bonus(&mut self, kind: RewardKind, amount: i64) {
        if amount != 0 {
            self.bonuses.push(NamedReward { kind, amount });
        }
    }

    pub fn total(&self) -> i64 {
        self.base + self.bonuses.iter().map(|b| b.amount).sum::<i64>()
    }
}

// ============================================================================
// Blind 狀態
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlindStatus {
    NotStarted,
    InProgress,
    Completed,
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BlindError {
    #[error("{kind:?} blind cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        kind: BlindType,
        from: BlindStatus,
        to: BlindStatus,
    },
    #[error("the boss blind cannot be skipped")]
    BossCannotBeSkipped,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlindState {
    pub kind: BlindType,
    pub status: BlindStatus,
    pub target: i64,
    pub reward: BlindReward,
    /// Boss Blind 的種類（只有 Boss 有）
    pub boss: Option<BossBlindId>,
    /// 跳過時獲得的 Tag（Boss 沒有）
    pub skip_tag: Option<TagId>,
}

impl BlindState {
    fn transition(&mut self, from: BlindStatus, to: BlindStatus) -> Result<(), BlindError> {
        if self.status != from {
            return Err(BlindError::InvalidTransition { kind: self.kind, from: self.status, to });
        }
        self.status = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), BlindError> {
        self.transition(BlindStatus::NotStarted, BlindStatus::InProgress)
    }

    pub fn complete(&mut self) -> Result<(), BlindError> {
        self.transition(BlindStatus::InProgress, BlindStatus::Completed)
    }

    pub fn skip(&mut self) -> Result<(), BlindError> {
        if self.kind == BlindType::Boss {
            return Err(BlindError::BossCannotBeSkipped);
        }
        self.transition(BlindStatus::NotStarted, BlindStatus::Skipped)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.status, BlindStatus::Completed | BlindStatus::Skipped)
    }
}

/// 一個回合的三個 Blind
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundBlinds {
    pub round: u32,
    pub small: BlindState,
    pub big: BlindState,
    pub boss: BlindState,
}

impl RoundBlinds {
    /// 以種子決定 Boss 與跳過 Tag
    pub fn new(game_seed: &str, round: u32, final_round: Option<u32>) -> Self {
        let base = round_base_score(round);
        let pool = if final_round == Some(round) {
            BossBlindId::showdown_bosses()
        } else {
            BossBlindId::regular_bosses()
        };
        let boss_seed = seed_string(&[&game_seed, &round, &"boss"]);
        let boss_id = pool[random_int(&boss_seed, 0, pool.len() as i64 - 1) as usize];

        let make = |kind: BlindType| {
            let multiplier = match kind {
                BlindType::Boss => boss_id.score_multiplier(),
                _ => kind.score_multiplier(),
            };
            let skip_tag = match kind {
                BlindType::Boss => None,
                _ => {
                    let tags = TagId::all();
                    let tag_seed = seed_string(&[&game_seed, &round, &kind.name(), &"tag"]);
                    Some(tags[random_int(&tag_seed, 0, tags.len() as i64 - 1) as usize])
                }
            };
            BlindState {
                kind,
                status: BlindStatus::NotStarted,
                target: (base as f64 * multiplier).floor() as i64,
                reward: BlindReward::new(kind.reward()),
                boss: (kind == BlindType::Boss).then_some(boss_id),
                skip_tag,
            }
        };

        Self {
            round,
            small: make(BlindType::Small),
            big: make(BlindType::Big),
            boss: make(BlindType::Boss),
        }
    }

    pub fn get(&self, kind: BlindType) -> &BlindState {
        match kind {
            BlindType::Small => &self.small,
            BlindType::Big => &self.big,
            BlindType::Boss => &self.boss,
        }
    }

    pub fn get_mut(&mut self, kind: BlindType) -> &mut BlindState {
        match kind {
            BlindType::Small => &mut self.small,
            BlindType::Big => &mut self.big,
            BlindType::Boss => &mut self.boss,
        }
    }

    /// 下一個可選的 Blind（依固定順序）
    pub fn next_pending(&self) -> Option<BlindType> {
        BlindType::all()
            .iter()
            .copied()
            .find(|&kind| !self.get(kind).is_resolved())
    }

    /// 目前進行中的 Blind
    pub fn in_progress(&self) -> Option<BlindType> {
        BlindType::all()
            .iter()
            .copied()
            .find(|&kind| self.get(kind).status == BlindStatus::InProgress)
    }

    pub fn boss_id(&self) -> Option<BossBlindId> {
        self.boss.boss
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{CardDef, Enhancement, Rank};

    #[test]
    fn test_blind_type_basics() {
        assert_eq!(BlindType::Small.reward(), 3);
        assert_eq!(BlindType::Big.reward(), 4);
        assert_eq!(BlindType::Boss.reward(), 5);
        assert_eq!(BlindType::Big.score_multiplier(), 1.5);
        assert_eq!(BlindType::Small.next(), Some(BlindType::Big));
        assert_eq!(BlindType::Boss.next(), None);
    }

    #[test]
    fn test_round_base_score() {
        assert_eq!(round_base_score(1), 300);
        assert_eq!(round_base_score(5), 11_000);
        assert_eq!(round_base_score(8), 50_000);
        assert_eq!(round_base_score(9), 80_000);
    }

    #[test]
    fn test_boss_cannot_be_skipped() {
        let mut blinds = RoundBlinds::new("seed", 1, Some(8));
        assert_eq!(blinds.boss.skip(), Err(BlindError::BossCannotBeSkipped));
        assert_eq!(blinds.boss.status, BlindStatus::NotStarted);

        blinds.boss.start().unwrap();
        blinds.boss.complete().unwrap();
        assert_eq!(blinds.boss.status, BlindStatus::Completed);
        assert_eq!(blinds.boss.skip(), Err(BlindError::BossCannotBeSkipped));
    }

    #[test]
    fn test_status_transitions() {
        let mut blinds = RoundBlinds::new("seed", 1, Some(8));
        assert!(blinds.small.complete().is_err());
        blinds.small.skip().unwrap();
        assert!(blinds.small.start().is_err());
        assert_eq!(blinds.next_pending(), Some(BlindType::Big));

        blinds.big.start().unwrap();
        assert_eq!(blinds.in_progress(), Some(BlindType::Big));
        blinds.big.complete().unwrap();
        assert_eq!(blinds.next_pending(), Some(BlindType::Boss));
    }

    #[test]
    fn test_targets_and_tags() {
        let blinds = RoundBlinds::new("seed", 2, Some(8));
        assert_eq!(blinds.small.target, 800);
        assert_eq!(blinds.big.target, 1_200);
        let boss = blinds.boss_id().unwrap();
        assert_eq!(blinds.boss.target, (800.0 * boss.score_multiplier()) as i64);
        assert!(blinds.small.skip_tag.is_some());
        assert!(blinds.boss.skip_tag.is_none());
        assert_eq!(blinds, RoundBlinds::new("seed", 2, Some(8)));
    }

    #[test]
    fn test_final_round_uses_showdown_boss() {
        let blinds = RoundBlinds::new("any", 8, Some(8));
        assert_eq!(blinds.boss_id(), Some(BossBlindId::VioletVessel));
    }

    #[test]
    fn test_debuffs() {
        let mut card = PlayingCardState::new(1, CardDef::new(Rank::Two, Suit::Clubs));
        assert!(BossBlindId::TheClub.debuffs(&card, false));
        card.enhancement = Enhancement::Wild;
        assert!(!BossBlindId::TheClub.debuffs(&card, false));

        let king = PlayingCardState::new(2, CardDef::new(Rank::King, Suit::Hearts));
        assert!(BossBlindId::ThePlant.debuffs(&king, false));
        assert!(!BossBlindId::TheHook.debuffs(&king, false));
    }

    #[test]
    fn test_reward_total() {
        let mut reward = BlindReward::new(5);
        reward.add_bonus(RewardKind::RemainingHands, 2);
        reward.add_bonus(RewardKind::Interest, 0);
        assert_eq!(reward.bonuses.len(), 1);
        assert_eq!(reward.total(), 7);
    }
}
