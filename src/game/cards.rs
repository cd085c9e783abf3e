//! 卡牌和增強系統定義
//!
//! 卡牌定義（點數 + 花色）是共享的唯讀資料；`PlayingCardState` 是帶有
//! 唯一 id 與三個獨立修飾槽（增強、版本、封印）的實體。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 卡牌、Joker、消耗品等實體的唯一 id
pub type CardId = u32;

// ============================================================================
// 花色與點數
// ============================================================================

/// 花色（宣告順序即平手時的決勝順序）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Clubs,
    Diamonds,
}

impl Suit {
    pub fn all() -> &'static [Suit] {
        &[Suit::Spades, Suit::Hearts, Suit::Clubs, Suit::Diamonds]
    }

    pub fn symbol(&self) -> char {
        match self {
            Suit::Spades => '♠',
            Suit::Hearts => '♥',
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
        }
    }
}

/// 點數，由小到大 2..10, J, Q, K, A
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub fn all() -> &'static [Rank] {
        &[
            Rank::Two,
            Rank::Three,
            Rank::Four,
            Rank::Five,
            Rank::Six,
            Rank::Seven,
            Rank::Eight,
            Rank::Nine,
            Rank::Ten,
            Rank::Jack,
            Rank::Queen,
            Rank::King,
            Rank::Ace,
        ]
    }

    /// 排序值 2..=14（Ace = 14）
    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn from_value(value: u8) -> Option<Rank> {
        Rank::all().iter().copied().find(|r| r.value() == value)
    }

    /// 基礎 chips
    pub fn base_chips(&self) -> i64 {
        match self {
            Rank::Ace => 11,
            Rank::Jack | Rank::Queen | Rank::King => 10,
            r => r.value() as i64,
        }
    }

    /// 是否為人頭牌 (J, Q, K)
    pub fn is_face(&self) -> bool {
        matches!(self, Rank::Jack | Rank::Queen | Rank::King)
    }

    /// 下一個點數（Ace 之後回到 Two，Strength 塔羅用）
    pub fn next(&self) -> Rank {
        Rank::from_value(self.value() + 1).unwrap_or(Rank::Two)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// 卡牌定義：點數 + 花色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardDef {
    pub rank: Rank,
    pub suit: Suit,
}

impl CardDef {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// 全部 52 種定義（花色優先，點數遞增）
    pub fn all() -> Vec<CardDef> {
        Suit::all()
            .iter()
            .flat_map(|&suit| Rank::all().iter().map(move |&rank| CardDef::new(rank, suit)))
            .collect()
    }
}

impl fmt::Display for CardDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

// ============================================================================
// 修飾槽
// ============================================================================

/// 卡片增強類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Enhancement {
    #[default]
    None,
    Bonus, // +30 chips
    Mult,  // +5 mult
    Wild,  // 可當任意花色
    Glass, // x2 Mult，1/4 機率破碎
    Steel, // x1.5 Mult（在手牌中時）
    Stone, // +50 chips，不計花色/點數
    Gold,  // 擊敗 Blind 時仍在手中 +$3
    Lucky, // 1/5 機率 +20 Mult，1/15 機率 +$20
}

impl Enhancement {
    /// 所有增強類型（用於隨機選擇）
    pub fn all() -> &'static [Enhancement] {
        &[
            Enhancement::Bonus,
            Enhancement::Mult,
            Enhancement::Wild,
            Enhancement::Glass,
            Enhancement::Steel,
            Enhancement::Stone,
            Enhancement::Gold,
            Enhancement::Lucky,
        ]
    }
}

/// 卡片封印類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Seal {
    #[default]
    None,
    Gold,   // 打出時 +$3
    Red,    // 觸發 2 次
    Blue,   // 最後一手時仍在手中，產生對應 Celestial
    Purple, // 棄掉時產生 Tarot
}

impl Seal {
    pub fn all() -> &'static [Seal] {
        &[Seal::Gold, Seal::Red, Seal::Blue, Seal::Purple]
    }
}

/// 卡片版本類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Edition {
    #[default]
    Normal,
    Foil,        // +50 chips
    Holographic, // +10 mult
    Polychrome,  // x1.5 mult
    Negative,    // +1 Joker 欄位（用於 Joker）
}

impl Edition {
    /// 常見版本（用於隨機選擇，不含 Negative）
    pub fn all_common() -> &'static [Edition] {
        &[Edition::Foil, Edition::Holographic, Edition::Polychrome]
    }

    pub fn chips(&self) -> i64 {
        match self {
            Edition::Foil => 50,
            _ => 0,
        }
    }

    pub fn mult(&self) -> f64 {
        match self {
            Edition::Holographic => 10.0,
            _ => 0.0,
        }
    }

    pub fn x_mult(&self) -> f64 {
        match self {
            Edition::Polychrome => 1.5,
            _ => 1.0,
        }
    }
}

// ============================================================================
// 卡牌實體
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayingCardState {
    pub id: CardId,
    pub def: CardDef,
    #[serde(default)]
    pub enhancement: Enhancement,
    #[serde(default)]
    pub edition: Edition,
    #[serde(default)]
    pub seal: Seal,
}

impl PlayingCardState {
    pub fn new(id: CardId, def: CardDef) -> Self {
        Self {
            id,
            def,
            enhancement: Enhancement::None,
            edition: Edition::Normal,
            seal: Seal::None,
        }
    }

    pub fn rank(&self) -> Rank {
        self.def.rank
    }

    pub fn suit(&self) -> Suit {
        self.def.suit
    }

    /// 點數 chips（Stone 牌沒有點數）
    pub fn base_chips(&self) -> i64 {
        if self.enhancement == Enhancement::Stone {
            0
        } else {
            self.def.rank.base_chips()
        }
    }

    /// 增強提供的 chips
    pub fn enhancement_chips(&self) -> i64 {
        match self.enhancement {
            Enhancement::Bonus => 30,
            Enhancement::Stone => 50,
            _ => 0,
        }
    }

    /// 增強提供的加法 mult
    pub fn enhancement_mult(&self) -> f64 {
        match self.enhancement {
            Enhancement::Mult => 5.0,
            _ => 0.0,
        }
    }

    /// Wild 牌可匹配任意花色，Stone 牌不匹配任何花色
    pub fn matches_suit(&self, suit: Suit) -> bool {
        match self.enhancement {
            Enhancement::Wild => true,
            Enhancement::Stone => false,
            _ => self.def.suit == suit,
        }
    }

    /// Stone 牌不參與牌型判定
    pub fn counts_for_hand(&self) -> bool {
        self.enhancement != Enhancement::Stone
    }

    /// 是否為人頭牌（`all_faces` 規則下所有牌都是）
    pub fn is_face(&self, all_faces: bool) -> bool {
        if self.enhancement == Enhancement::Stone {
            return false;
        }
        all_faces || self.def.rank.is_face()
    }
}

impl fmt::Display for PlayingCardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.def)
    }
}

// ============================================================================
// Id 分配
// ============================================================================

/// 單調遞增的實體 id 分配器
///
/// 同一局遊戲內所有實體共用一個分配器，因此 id 在任何集合中都唯一。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: CardId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> CardId {
        if self.next == 0 {
            self.next = 1;
        }
        let id = self.next;
        self.next += 1;
        id
    }
}

/// 創建標準 52 張牌組
pub fn standard_deck(ids: &mut IdAllocator) -> Vec<PlayingCardState> {
    CardDef::all()
        .into_iter()
        .map(|def| PlayingCardState::new(ids.next_id(), def))
        .collect()
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn card(rank: Rank, suit: Suit) -> PlayingCardState {
        PlayingCardState::new(1, CardDef::new(rank, suit))
    }

    #[test]
    fn test_rank_order_and_chips() {
        assert!(Rank::Ace > Rank::King);
        assert!(Rank::Ten > Rank::Nine);
        assert_eq!(Rank::Ace.base_chips(), 11);
        assert_eq!(Rank::Queen.base_chips(), 10);
        assert_eq!(Rank::Seven.base_chips(), 7);
        assert_eq!(Rank::from_value(14), Some(Rank::Ace));
        assert_eq!(Rank::from_value(1), None);
        assert_eq!(Rank::Ace.next(), Rank::Two);
        assert_eq!(Rank::Ten.next(), Rank::Jack);
    }

    #[test]
    fn test_stone_has_no_rank_chips() {
        let mut c = card(Rank::King, Suit::Hearts);
        assert_eq!(c.base_chips() + c.enhancement_chips(), 10);
        c.enhancement = Enhancement::Stone;
        assert_eq!(c.base_chips() + c.enhancement_chips(), 50);
        assert!(!c.counts_for_hand());
        assert!(!c.matches_suit(Suit::Hearts));
        assert!(!c.is_face(true));
    }

    #[test]
    fn test_enhancement_and_edition_bonuses() {
        let mut c = card(Rank::Four, Suit::Spades);
        c.enhancement = Enhancement::Mult;
        c.edition = Edition::Holographic;
        assert_eq!(c.enhancement_mult() + c.edition.mult(), 15.0);

        c.enhancement = Enhancement::Bonus;
        c.edition = Edition::Foil;
        assert_eq!(c.enhancement_chips() + c.edition.chips(), 80);
        assert_eq!(Edition::Polychrome.x_mult(), 1.5);
    }

    #[test]
    fn test_wild_matches_every_suit() {
        let mut c = card(Rank::Three, Suit::Hearts);
        assert!(c.matches_suit(Suit::Hearts));
        assert!(!c.matches_suit(Suit::Clubs));
        c.enhancement = Enhancement::Wild;
        assert!(Suit::all().iter().all(|&s| c.matches_suit(s)));
    }

    #[test]
    fn test_face_with_all_faces_rule() {
        let nine = card(Rank::Nine, Suit::Diamonds);
        assert!(!nine.is_face(false));
        assert!(nine.is_face(true));
        assert!(card(Rank::Jack, Suit::Clubs).is_face(false));
    }

    #[test]
    fn test_standard_deck_unique_ids() {
        let mut ids = IdAllocator::new();
        let deck = standard_deck(&mut ids);
        assert_eq!(deck.len(), 52);

        let unique_ids: HashSet<_> = deck.iter().map(|c| c.id).collect();
        let unique_defs: HashSet<_> = deck.iter().map(|c| c.def).collect();
        assert_eq!(unique_ids.len(), 52);
        assert_eq!(unique_defs.len(), 52);
        assert_eq!(ids.next_id(), 53);
    }

    #[test]
    fn test_display() {
        assert_eq!(CardDef::new(Rank::Ace, Suit::Hearts).to_string(), "A♥");
        assert_eq!(CardDef::new(Rank::Ten, Suit::Clubs).to_string(), "10♣");
    }
}
