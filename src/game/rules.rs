//! 靜態規則
//!
//! 可被 Joker、Voucher 等效果覆寫的全域規則。牌型判定、計分管線和商店
//! 生成都從這裡讀取參數。

use serde::{Deserialize, Serialize};

use super::constants::*;

/// 靜態規則覆寫
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRules {
    /// 順子/同花所需張數（FourFingers 降為 4）
    pub min_straight_flush_cards: usize,
    /// 所有牌視為人頭牌（Pareidolia）
    pub all_cards_are_faces: bool,
    /// 商店可出現已擁有的 Joker（Showman）
    pub allow_duplicate_jokers_in_shop: bool,
    /// 所有機率乘數（Oops! All 6s 為 2）
    pub probability_multiplier: f64,

    pub hands_per_round: u32,
    pub discards_per_round: u32,
    pub hand_size: usize,
    pub max_selected: usize,
    pub joker_slots: usize,
    pub consumable_slots: usize,

    pub shop_card_count: usize,
    pub shop_pack_count: usize,
    /// 商店池中 Tarot 的重複次數
    pub tarot_multiplier: usize,
    /// 商店池中 Celestial 的重複次數
    pub celestial_multiplier: usize,
    /// 商店池中撲克牌的重複次數
    pub playing_card_multiplier: usize,
    pub reroll_base_cost: i64,
    /// 商店折扣百分比（0..=100）
    pub discount_percent: u32,

    pub money_floor: i64,
    pub interest_cap: i64,
    /// 擊敗此回合的 Boss 即獲勝；`None` 為無盡模式
    pub winning_round: Option<u32>,
}

impl Default for StaticRules {
    fn default() -> Self {
        Self {
            min_straight_flush_cards: MIN_STRAIGHT_FLUSH_CARDS,
            all_cards_are_faces: false,
            allow_duplicate_jokers_in_shop: false,
            probability_multiplier: 1.0,
            hands_per_round: PLAYS_PER_BLIND,
            discards_per_round: DISCARDS_PER_BLIND,
            hand_size: HAND_SIZE,
            max_selected: MAX_SELECTED,
            joker_slots: JOKER_SLOTS,
            consumable_slots: CONSUMABLE_SLOTS,
            shop_card_count: SHOP_CARD_COUNT,
            shop_pack_count: SHOP_PACK_COUNT,
            tarot_multiplier: 1,
            celestial_multiplier: 1,
            playing_card_multiplier: 1,
            reroll_base_cost: REROLL_BASE_COST,
            discount_percent: 0,
            money_floor: MONEY_FLOOR,
            interest_cap: MAX_INTEREST,
            winning_round: Some(FINAL_ROUND),
        }
    }
}

impl StaticRules {
    /// 套用折扣後的價格（向下取整，最低 1）
    pub fn discounted(&self, price: i64) -> i64 {
        let pct = self.discount_percent.min(100) as i64;
        (price * (100 - pct) / 100).max(1)
    }

    /// 第 `reroll_count` 次重擲的費用
    pub fn reroll_cost(&self, reroll_count: u32) -> i64 {
        (self.reroll_base_cost + reroll_count as i64).max(0)
    }
}

// ============================================================================
// 單元測試
// ============================================================================
