//! Voucher 永久升級系統
//!
//! 每個商店最多 1 個 Voucher 可購買，購買時立即改寫 `StaticRules`，
//! 效果持續整局遊戲。
//!
//! # 架構
//!
//! 使用聲明式 `VOUCHER_DEFS` 表定義所有 Voucher 的元數據與規則修飾。

use serde::{Deserialize, Serialize};

use super::cards::CardId;
use super::rng::weighted_choice;
use super::rules::StaticRules;

/// Voucher 數量
pub const VOUCHER_COUNT: usize = 22;

/// Voucher 價格
pub const VOUCHER_PRICE: i64 = 10;

// ============================================================================
// 規則修飾
// ============================================================================

/// Voucher 對靜態規則的修改
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RuleModifier {
    AddShopCards(usize),
    SetDiscount(u32),
    ReduceRerollCost(i64),
    AddConsumableSlots(usize),
    AddHands(u32),
    AddDiscards(u32),
    SetTarotMultiplier(usize),
    SetCelestialMultiplier(usize),
    SetPlayingCardMultiplier(usize),
    AddJokerSlots(usize),
    AddHandSize(usize),
    SetInterestCap(i64),
    Nothing,
}

impl RuleModifier {
    pub fn apply(&self, rules: &mut StaticRules) {
        match *self {
            RuleModifier::AddShopCards(n) => rules.shop_card_count += n,
            RuleModifier::SetDiscount(pct) => rules.discount_percent = rules.discount_percent.max(pct),
            RuleModifier::ReduceRerollCost(n) => {
                rules.reroll_base_cost = (rules.reroll_base_cost - n).max(0);
            }
            RuleModifier::AddConsumableSlots(n) => rules.consumable_slots += n,
            RuleModifier::AddHands(n) => rules.hands_per_round += n,
            RuleModifier::AddDiscards(n) => rules.discards_per_round += n,
            RuleModifier::SetTarotMultiplier(n) => rules.tarot_multiplier = rules.tarot_multiplier.max(n),
            RuleModifier::SetCelestialMultiplier(n) => {
                rules.celestial_multiplier = rules.celestial_multiplier.max(n);
            }
            RuleModifier::SetPlayingCardMultiplier(n) => {
                rules.playing_card_multiplier = rules.playing_card_multiplier.max(n);
            }
            RuleModifier::AddJokerSlots(n) => rules.joker_slots += n,
            RuleModifier::AddHandSize(n) => rules.hand_size += n,
            RuleModifier::SetInterestCap(cap) => rules.interest_cap = rules.interest_cap.max(cap),
            RuleModifier::Nothing => {}
        }
    }
}

// ============================================================================
// Voucher 定義系統
// ============================================================================

/// Voucher 定義結構
#[derive(Clone, Copy, Debug)]
pub struct VoucherDef {
    pub id: VoucherId,
    pub name: &'static str,
    /// 前置需求（升級版需要基礎版）
    pub prerequisite: Option<VoucherId>,
    pub modifier: RuleModifier,
}

const fn base(id: VoucherId, name: &'static str, modifier: RuleModifier) -> VoucherDef {
    VoucherDef { id, name, prerequisite: None, modifier }
}

const fn upgrade(id: VoucherId, name: &'static str, requires: VoucherId, modifier: RuleModifier) -> VoucherDef {
    VoucherDef { id, name, prerequisite: Some(requires), modifier }
}

/// Voucher 定義表（順序與 VoucherId 枚舉一致）
pub static VOUCHER_DEFS: [VoucherDef; VOUCHER_COUNT] = [
    // ========== 基礎 Voucher (0-11) ==========
    // 0
    base(VoucherId::Overstock, "Overstock", RuleModifier::AddShopCards(1)),
    // 1
    base(VoucherId::ClearanceSale, "Clearance Sale", RuleModifier::SetDiscount(25)),
    // 2
    base(VoucherId::RerollSurplus, "Reroll Surplus", RuleModifier::ReduceRerollCost(2)),
    // 3
    base(VoucherId::CrystalBall, "Crystal Ball", RuleModifier::AddConsumableSlots(1)),
    // 4
    base(VoucherId::Grabber, "Grabber", RuleModifier::AddHands(1)),
    // 5
    base(VoucherId::Wasteful, "Wasteful", RuleModifier::AddDiscards(1)),
    // 6
    base(VoucherId::TarotMerchant, "Tarot Merchant", RuleModifier::SetTarotMultiplier(2)),
    // 7
    base(VoucherId::PlanetMerchant, "Planet Merchant", RuleModifier::SetCelestialMultiplier(2)),
    // 8
    base(VoucherId::MagicTrick, "Magic Trick", RuleModifier::SetPlayingCardMultiplier(2)),
    // 9
    base(VoucherId::Blank, "Blank", RuleModifier::Nothing),
    // 10
    base(VoucherId::PaintBrush, "Paint Brush", RuleModifier::AddHandSize(1)),
    // 11
    base(VoucherId::SeedMoney, "Seed Money", RuleModifier::SetInterestCap(10)),
    // ========== 升級 Voucher (12-21) ==========
    // 12
    upgrade(VoucherId::OverstockPlus, "Overstock Plus", VoucherId::Overstock, RuleModifier::AddShopCards(1)),
    // 13
    upgrade(VoucherId::Liquidation, "Liquidation", VoucherId::ClearanceSale, RuleModifier::SetDiscount(50)),
    // 14
    upgrade(VoucherId::RerollGlut, "Reroll Glut", VoucherId::RerollSurplus, RuleModifier::ReduceRerollCost(2)),
    // 15
    upgrade(VoucherId::GrabberPlus, "Grabber Plus", VoucherId::Grabber, RuleModifier::AddHands(1)),
    // 16
    upgrade(VoucherId::WastefulPlus, "Wasteful Plus", VoucherId::Wasteful, RuleModifier::AddDiscards(1)),
    // 17
    upgrade(VoucherId::TarotTycoon, "Tarot Tycoon", VoucherId::TarotMerchant, RuleModifier::SetTarotMultiplier(4)),
    // 18
    upgrade(VoucherId::PlanetTycoon, "Planet Tycoon", VoucherId::PlanetMerchant, RuleModifier::SetCelestialMultiplier(4)),
    // 19
    upgrade(VoucherId::Antimatter, "Antimatter", VoucherId::Blank, RuleModifier::AddJokerSlots(1)),
    // 20
    upgrade(VoucherId::Palette, "Palette", VoucherId::PaintBrush, RuleModifier::AddHandSize(1)),
    // 21
    upgrade(VoucherId::MoneyTree, "Money Tree", VoucherId::SeedMoney, RuleModifier::SetInterestCap(20)),
];

/// Voucher ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoucherId {
    /// 商店 +1 卡槽
    Overstock,
    /// 所有物品 -25%
    ClearanceSale,
    /// Reroll 費用 -$2
    RerollSurplus,
    /// 消耗品槽 +1
    CrystalBall,
    /// +1 hand per round
    Grabber,
    /// +1 discard per round
    Wasteful,
    /// Tarot 出現率 x2
    TarotMerchant,
    /// Celestial 出現率 x2
    PlanetMerchant,
    /// 撲克牌出現率 x2
    MagicTrick,
    /// 不做任何事
    Blank,
    /// 手牌上限 +1
    PaintBrush,
    /// 利息上限 $10
    SeedMoney,

    OverstockPlus,
    /// 所有物品 -50%
    Liquidation,
    RerollGlut,
    GrabberPlus,
    WastefulPlus,
    TarotTycoon,
    PlanetTycoon,
    /// Joker 欄位 +1
    Antimatter,
    Palette,
    /// 利息上限 $20
    MoneyTree,
}

impl VoucherId {
    pub fn all() -> impl Iterator<Item = VoucherId> {
        VOUCHER_DEFS.iter().map(|def| def.id)
    }

    pub fn to_index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        VOUCHER_DEFS.get(index).map(|def| def.id)
    }

    pub fn def(&self) -> &'static VoucherDef {
        &VOUCHER_DEFS[self.to_index()]
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    pub fn prerequisite(&self) -> Option<VoucherId> {
        self.def().prerequisite
    }

    pub fn modifier(&self) -> RuleModifier {
        self.def().modifier
    }

    /// 尚未擁有且前置需求已滿足
    pub fn is_available(&self, owned: &[VoucherId]) -> bool {
        !owned.contains(self) && self.prerequisite().map_or(true, |p| owned.contains(&p))
    }

    /// 目前可購買的所有 Voucher
    pub fn available(owned: &[VoucherId]) -> Vec<VoucherId> {
        Self::all().filter(|v| v.is_available(owned)).collect()
    }

    /// 依種子從可購買的 Voucher 中挑一個
    pub fn roll(seed: &str, owned: &[VoucherId]) -> Option<VoucherId> {
        let options: Vec<(VoucherId, f64)> =
            Self::available(owned).into_iter().map(|v| (v, 1.0)).collect();
        weighted_choice(seed, &options)
    }
}

/// 擁有中的 Voucher
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherState {
    pub id: CardId,
    pub voucher: VoucherId,
}

impl VoucherState {
    pub fn new(id: CardId, voucher: VoucherId) -> Self {
        Self { id, voucher }
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voucher_indices() {
        for i in 0..VOUCHER_COUNT {
            let voucher = VoucherId::from_index(i).unwrap();
            assert_eq!(voucher.to_index(), i);
        }
        assert_eq!(VoucherId::from_index(VOUCHER_COUNT), None);
    }

    #[test]
    fn test_upgrade_requires_base() {
        assert!(!VoucherId::GrabberPlus.is_available(&[]));
        assert!(VoucherId::GrabberPlus.is_available(&[VoucherId::Grabber]));
        assert!(!VoucherId::Grabber.is_available(&[VoucherId::Grabber]));
    }

    #[test]
    fn test_roll_only_offers_available() {
        for n in 0..50 {
            let voucher = VoucherId::roll(&format!("voucher_{n}"), &[]).unwrap();
            assert!(voucher.prerequisite().is_none());
        }
        let all: Vec<_> = VoucherId::all().collect();
        assert_eq!(VoucherId::roll("x", &all), None);
    }

    #[test]
    fn test_roll_is_deterministic() {
        let owned = [VoucherId::Overstock];
        assert_eq!(VoucherId::roll("abc_1_voucher", &owned), VoucherId::roll("abc_1_voucher", &owned));
    }

    #[test]
    fn test_modifiers_stack() {
        let mut rules = StaticRules::default();
        VoucherId::Grabber.modifier().apply(&mut rules);
        VoucherId::GrabberPlus.modifier().apply(&mut rules);
        assert_eq!(rules.hands_per_round, 6);

        VoucherId::ClearanceSale.modifier().apply(&mut rules);
        assert_eq!(rules.discounted(100), 75);
        VoucherId::Liquidation.modifier().apply(&mut rules);
        assert_eq!(rules.discounted(100), 50);

        VoucherId::RerollSurplus.modifier().apply(&mut rules);
        VoucherId::RerollGlut.modifier().apply(&mut rules);
        assert_eq!(rules.reroll_cost(0), 1);
    }

    #[test]
    fn test_blank_does_nothing() {
        let mut rules = StaticRules::default();
        VoucherId::Blank.modifier().apply(&mut rules);
        assert_eq!(rules, StaticRules::default());
    }
}
