//! 卡包系統
//!
//! 卡包由「類型」與「稀有度」兩層決定：
//!
//! ```text
//! 類型權重 = 該類型各稀有度權重總和
//! roll_pack(seed)
//!   ├─ weighted_choice(類型總權重)   → PackType
//!   └─ weighted_choice(類型稀有度表) → PackRarity
//! ```
//!
//! 價格、張數、可選數量只依稀有度決定。

use serde::{Deserialize, Serialize};

use super::cards::CardId;
use super::rng::{seed_string, weighted_choice};
use super::shop::{BuyableItem, ShopItem};

/// 卡包類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackType {
    /// Tarot 卡包
    Arcana,
    Celestial,
    Spectral,
    /// 撲克牌卡包
    Standard,
    /// Joker 卡包
    Buffoon,
}

/// 卡包稀有度
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PackRarity {
    Normal,
    Jumbo,
    Mega,
}

impl PackRarity {
    pub fn all() -> &'static [PackRarity] {
        &[PackRarity::Normal, PackRarity::Jumbo, PackRarity::Mega]
    }

    pub fn price(&self) -> i64 {
        match self {
            PackRarity::Normal => 4,
            PackRarity::Jumbo => 6,
            PackRarity::Mega => 8,
        }
    }

    /// 卡包提供的卡片數量
    pub fn card_count(&self) -> usize {
        match self {
            PackRarity::Normal => 3,
            PackRarity::Jumbo | PackRarity::Mega => 5,
        }
    }

    /// 可選擇的卡片數量
    pub fn selections(&self) -> usize {
        match self {
            PackRarity::Normal | PackRarity::Jumbo => 1,
            PackRarity::Mega => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackRarity::Normal => "Normal",
            PackRarity::Jumbo => "Jumbo",
            PackRarity::Mega => "Mega",
        }
    }
}

impl PackType {
    pub fn all() -> &'static [PackType] {
        &[
            PackType::Arcana,
            PackType::Celestial,
            PackType::Spectral,
            PackType::Standard,
            PackType::Buffoon,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackType::Arcana => "Arcana Pack",
            PackType::Celestial => "Celestial Pack",
            PackType::Spectral => "Spectral Pack",
            PackType::Standard => "Standard Pack",
            PackType::Buffoon => "Buffoon Pack",
        }
    }

    /// 稀有度權重表（Normal, Jumbo, Mega）
    pub fn rarity_weights(&self) -> [(PackRarity, f64); 3] {
        let (normal, jumbo, mega) = match self {
            PackType::Arcana | PackType::Celestial | PackType::Standard => (4.0, 2.0, 0.5),
            PackType::Buffoon => (1.2, 0.6, 0.15),
            PackType::Spectral => (0.6, 0.3, 0.07),
        };
        [
            (PackRarity::Normal, normal),
            (PackRarity::Jumbo, jumbo),
            (PackRarity::Mega, mega),
        ]
    }

    /// 類型總權重
    pub fn weight(&self) -> f64 {
        self.rarity_weights().iter().map(|(_, w)| w).sum()
    }
}

/// 依種子決定卡包類型與稀有度
pub fn roll_pack(seed: &str) -> (PackType, PackRarity) {
    let types: Vec<(PackType, f64)> = PackType::all().iter().map(|t| (*t, t.weight())).collect();
    let pack_type = weighted_choice(seed, &types).unwrap_or(PackType::Arcana);
    let rarity_seed = seed_string(&[&seed, &"rarity"]);
    let rarity = weighted_choice(&rarity_seed, &pack_type.rarity_weights()).unwrap_or(PackRarity::Normal);
    (pack_type, rarity)
}

/// 商店中尚未開啟的卡包
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShopPack {
    pub id: CardId,
    pub pack_type: PackType,
    pub rarity: PackRarity,
    pub price: i64,
}

impl ShopPack {
    pub fn name(&self) -> String {
        match self.rarity {
            PackRarity::Normal => self.pack_type.name().to_string(),
            rarity => format!("{} {}", rarity.name(), self.pack_type.name()),
        }
    }
}

/// 開啟中的卡包
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackState {
    pub id: CardId,
    pub pack_type: PackType,
    pub rarity: PackRarity,
    pub items: Vec<ShopItem>,
    pub selections_remaining: usize,
}

impl PackState {
    pub fn new(pack: &ShopPack, items: Vec<ShopItem>) -> Self {
        Self {
            id: pack.id,
            pack_type: pack.pack_type,
            rarity: pack.rarity,
            items,
            selections_remaining: pack.rarity.selections(),
        }
    }

    pub fn find(&self, id: CardId) -> Option<&ShopItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// 取出一個項目並扣除剩餘選擇次數
    pub fn take(&mut self, id: CardId) -> Option<BuyableItem> {
        if self.is_done() {
            return None;
        }
        let pos = self.items.iter().position(|item| item.id() == id)?;
        self.selections_remaining -= 1;
        Some(self.items.remove(pos).item)
    }

    pub fn is_done(&self) -> bool {
        self.selections_remaining == 0 || self.items.is_empty()
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{CardDef, PlayingCardState, Rank, Suit};

    #[test]
    fn test_rarity_tables() {
        assert_eq!(PackRarity::Normal.price(), 4);
        assert_eq!(PackRarity::Jumbo.price(), 6);
        assert_eq!(PackRarity::Mega.price(), 8);
        assert_eq!(PackRarity::Mega.card_count(), 5);
        assert_eq!(PackRarity::Mega.selections(), 2);
        assert_eq!(PackRarity::Jumbo.selections(), 1);
    }

    #[test]
    fn test_type_weight_is_sum_of_rarities() {
        assert!((PackType::Arcana.weight() - 6.5).abs() < 1e-9);
        assert!(PackType::Spectral.weight() < PackType::Buffoon.weight());
    }

    #[test]
    fn test_roll_pack_deterministic() {
        for n in 0..20 {
            let seed = format!("game_1_{n}_pack");
            assert_eq!(roll_pack(&seed), roll_pack(&seed));
        }
    }

    #[test]
    fn test_roll_pack_covers_common_types() {
        let rolled: Vec<_> = (0..200).map(|n| roll_pack(&format!("s{n}")).0).collect();
        for pack_type in [PackType::Arcana, PackType::Celestial, PackType::Standard] {
            assert!(rolled.contains(&pack_type));
        }
    }

    fn card_item(id: CardId) -> ShopItem {
        ShopItem {
            item: BuyableItem::PlayingCard(PlayingCardState::new(id, CardDef::new(Rank::Ace, Suit::Spades))),
            price: 0,
        }
    }

    #[test]
    fn test_take_consumes_selections() {
        let pack = ShopPack { id: 1, pack_type: PackType::Standard, rarity: PackRarity::Mega, price: 8 };
        assert_eq!(pack.name(), "Mega Standard Pack");
        let mut state = PackState::new(&pack, (10..15).map(card_item).collect());
        assert_eq!(state.selections_remaining, 2);

        assert!(state.take(99).is_none());
        assert!(state.take(10).is_some());
        assert!(state.take(10).is_none());
        assert!(state.take(12).is_some());
        assert!(state.is_done());
        assert!(state.take(13).is_none());
    }
}
