//! 牌型定義
//!
//! `HandId` 的宣告順序就是牌型優先級（越後越高）。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 牌型 ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandId {
    HighCard,
    Pair,
    TwoPair,
    ThreeKind,
    Straight,
    Flush,
    FullHouse,
    FourKind,
    StraightFlush,
    RoyalFlush,
    // 進階牌型（預設隱藏，第一次打出後公開）
    FlushHouse, // Flush + Full House
    FiveKind,   // 5 張相同點數
    FlushFive,  // Flush + Five of a Kind
}

impl HandId {
    /// 依優先級由低到高
    pub fn all() -> &'static [HandId] {
        &[
            HandId::HighCard,
            HandId::Pair,
            HandId::TwoPair,
            HandId::ThreeKind,
            HandId::Straight,
            HandId::Flush,
            HandId::FullHouse,
            HandId::FourKind,
            HandId::StraightFlush,
            HandId::RoyalFlush,
            HandId::FlushHouse,
            HandId::FiveKind,
            HandId::FlushFive,
        ]
    }

    /// 獲取牌型的基礎 chips 和 mult
    pub fn base_values(&self) -> (i64, f64) {
        match self {
            HandId::HighCard => (5, 1.0),
            HandId::Pair => (10, 2.0),
            HandId::TwoPair => (20, 2.0),
            HandId::ThreeKind => (30, 3.0),
            HandId::Straight => (30, 4.0),
            HandId::Flush => (35, 4.0),
            HandId::FullHouse => (40, 4.0),
            HandId::FourKind => (60, 7.0),
            HandId::StraightFlush => (100, 8.0),
            HandId::RoyalFlush => (100, 8.0),
            HandId::FlushHouse => (140, 14.0),
            HandId::FiveKind => (120, 12.0),
            HandId::FlushFive => (160, 16.0),
        }
    }

    /// 每升一級增加的 chips 和 mult
    pub fn level_increase(&self) -> (i64, f64) {
        match self {
            HandId::HighCard => (10, 1.0),
            HandId::Pair => (15, 1.0),
            HandId::TwoPair => (20, 1.0),
            HandId::ThreeKind => (20, 2.0),
            HandId::Straight => (30, 3.0),
            HandId::Flush => (15, 2.0),
            HandId::FullHouse => (25, 2.0),
            HandId::FourKind => (30, 3.0),
            HandId::StraightFlush => (40, 4.0),
            HandId::RoyalFlush => (40, 4.0),
            HandId::FlushHouse => (40, 4.0),
            HandId::FiveKind => (35, 3.0),
            HandId::FlushFive => (50, 3.0),
        }
    }

    /// 預設隱藏的牌型
    pub fn is_secret_by_default(&self) -> bool {
        matches!(self, HandId::FlushHouse | HandId::FiveKind | HandId::FlushFive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandId::HighCard => "High Card",
            HandId::Pair => "Pair",
            HandId::TwoPair => "Two Pair",
            HandId::ThreeKind => "Three of a Kind",
            HandId::Straight => "Straight",
            HandId::Flush => "Flush",
            HandId::FullHouse => "Full House",
            HandId::FourKind => "Four of a Kind",
            HandId::StraightFlush => "Straight Flush",
            HandId::RoyalFlush => "Royal Flush",
            HandId::FlushHouse => "Flush House",
            HandId::FiveKind => "Five of a Kind",
            HandId::FlushFive => "Flush Five",
        }
    }
}

// ============================================================================
// 牌型等級
// ============================================================================

/// 單一牌型的紀錄
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandState {
    pub times_played: u32,
    pub level: u32,
    pub secret: bool,
}

impl HandState {
    fn initial(id: HandId) -> Self {
        Self {
            times_played: 0,
            level: 0,
            secret: id.is_secret_by_default(),
        }
    }
}

/// 所有牌型的等級表
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandLevels {
    hands: BTreeMap<HandId, HandState>,
}

impl Default for HandLevels {
    fn default() -> Self {
        Self::new()
    }
}

impl HandLevels {
    pub fn new() -> Self {
        let hands = HandId::all()
            .iter()
            .map(|&id| (id, HandState::initial(id)))
            .collect();
        Self { hands }
    }

    pub fn get(&self, id: HandId) -> HandState {
        self.hands
            .get(&id)
            .cloned()
            .unwrap_or_else(|| HandState::initial(id))
    }

    fn entry(&mut self, id: HandId) -> &mut HandState {
        self.hands.entry(id).or_insert_with(|| HandState::initial(id))
    }

    pub fn level(&self, id: HandId) -> u32 {
        self.get(id).level
    }

    /// 目前等級下的基礎分數
    pub fn score_for(&self, id: HandId) -> HandScore {
        HandScore::at_level(id, self.level(id))
    }

    pub fn level_up(&mut self, id: HandId, levels: u32) {
        let state = self.entry(id);
        state.level = state.level.saturating_add(levels);
    }

    /// 降級（最低 0 級）
    pub fn level_down(&mut self, id: HandId) {
        let state = self.entry(id);
        state.level = state.level.saturating_sub(1);
    }

    /// 打出牌型：公開並累加次數
    pub fn record_played(&mut self, id: HandId) {
        let state = self.entry(id);
        state.secret = false;
        state.times_played += 1;
    }

    /// 打出次數最多的牌型（平手取優先級較高者）
    pub fn most_played(&self) -> HandId {
        self.hands
            .iter()
            .max_by_key(|(id, s)| (s.times_played, **id))
            .map(|(id, _)| *id)
            .unwrap_or(HandId::HighCard)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HandId, &HandState)> {
        self.hands.iter()
    }
}

/// 牌型在某等級下的基礎分數
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandScore {
    pub id: HandId,
    pub base_chips: i64,
    pub base_mult: f64,
}

impl HandScore {
    pub fn new(id: HandId) -> Self {
        Self::at_level(id, 0)
    }

    pub fn at_level(id: HandId, level: u32) -> Self {
        let (chips, mult) = id.base_values();
        let (chips_inc, mult_inc) = id.level_increase();
        Self {
            id,
            base_chips: chips + chips_inc * level as i64,
            base_mult: mult + mult_inc * level as f64,
        }
    }
}

// ============================================================================
// 分數累加器
// ============================================================================

/// Chips × Mult 累加器
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub chips: i64,
    pub mult: f64,
}

impl Score {
    pub fn new(chips: i64, mult: f64) -> Self {
        Self { chips, mult }
    }

    pub fn from_hand(hand: &HandScore) -> Self {
        Self::new(hand.base_chips, hand.base_mult)
    }

    /// floor(chips × mult)
    pub fn total(&self) -> i64 {
        (self.chips as f64 * self.mult).floor() as i64
    }
}

// ============================================================================
// 單元測試
// ============================================================================
