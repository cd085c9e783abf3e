//! 商店系統
//!
//! 商店內容是遊戲狀態與種子的純函數：
//!
//! ```text
//! build_shop_pool(ctx)
//!   = 所有 Joker（不受倍數影響，無重複規則時扣除已擁有）
//!   + Tarot       × tarot_multiplier
//!   + Celestial   × celestial_multiplier（秘密牌型未解鎖前不出現）
//!   + 撲克牌       × playing_card_multiplier
//!
//! generate_items: seed = (遊戲種子, 回合, Blind, 重擲次數, "shop")
//!   random_ints 抽索引 → realize 成有價格、有狀態的物品
//! ```

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::blinds::BlindType;
use super::cards::{CardDef, CardId, Edition, Enhancement, IdAllocator, PlayingCardState, Seal};
use super::consumables::{CelestialId, Consumable, ConsumableState, SpectralId, TarotId};
use super::hand_types::HandLevels;
use super::joker::{edition_price, JokerId, JokerState};
use super::joker_def::Rarity;
use super::packs::{roll_pack, PackRarity, PackState, PackType, ShopPack};
use super::rng::{random_float, random_ints, seed_string, weighted_choice};
use super::rules::StaticRules;
use super::vouchers::VoucherId;

// ============================================================================
// 物品
// ============================================================================

/// 商品池中的定義（尚未實體化）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoolEntry {
    Joker(JokerId),
    Consumable(Consumable),
    PlayingCard(CardDef),
}

/// 實體化後可購買的物品（封閉的和型別）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BuyableItem {
    Joker(JokerState),
    Consumable(ConsumableState),
    PlayingCard(PlayingCardState),
}

impl BuyableItem {
    pub fn id(&self) -> CardId {
        match self {
            BuyableItem::Joker(j) => j.id,
            BuyableItem::Consumable(c) => c.id,
            BuyableItem::PlayingCard(c) => c.id,
        }
    }

    pub fn name(&self) -> String {
        match self {
            BuyableItem::Joker(j) => j.joker.name().to_string(),
            BuyableItem::Consumable(c) => c.consumable.name().to_string(),
            BuyableItem::PlayingCard(c) => c.to_string(),
        }
    }
}

/// 商店中的物品
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub item: BuyableItem,
    pub price: i64,
}

impl ShopItem {
    pub fn id(&self) -> CardId {
        self.item.id()
    }
}

/// 商店中的 Voucher
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoucherOffer {
    pub id: CardId,
    pub voucher: VoucherId,
    pub price: i64,
}

/// 一次商店造訪的狀態
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopState {
    pub items: Vec<ShopItem>,
    pub packs: Vec<ShopPack>,
    pub voucher: Option<VoucherOffer>,
    pub open_pack: Option<PackState>,
    pub reroll_count: u32,
    /// 剩餘免費重擲次數（D6 Tag）
    pub free_rerolls: u32,
}

impl ShopState {
    pub fn find_item(&self, id: CardId) -> Option<&ShopItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn take_item(&mut self, id: CardId) -> Option<ShopItem> {
        let pos = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(pos))
    }

    pub fn take_pack(&mut self, id: CardId) -> Option<ShopPack> {
        let pos = self.packs.iter().position(|pack| pack.id == id)?;
        Some(self.packs.remove(pos))
    }
}

// ============================================================================
// 商品池
// ============================================================================

/// 建立商店所需的遊戲狀態切片
#[derive(Clone, Copy, Debug)]
pub struct ShopContext<'a> {
    pub game_seed: &'a str,
    pub round: u32,
    pub blind: BlindType,
    pub rules: &'a StaticRules,
    pub owned_jokers: &'a [JokerState],
    pub hands: &'a HandLevels,
}

impl ShopContext<'_> {
    fn joker_allowed(&self, joker: JokerId) -> bool {
        self.rules.allow_duplicate_jokers_in_shop || !self.owned_jokers.iter().any(|j| j.joker == joker)
    }

    /// 已解鎖的 Celestial（秘密牌型打出過後才出現）
    pub fn unlocked_celestials(&self) -> Vec<CelestialId> {
        CelestialId::all()
            .iter()
            .copied()
            .filter(|c| c.hands().iter().any(|h| !self.hands.get(*h).secret))
            .collect()
    }

    /// 目前商店的種子前綴
    pub fn seed(&self, parts: &[&dyn Display]) -> String {
        let blind = self.blind as u8;
        let mut all: Vec<&dyn Display> = Vec::with_capacity(parts.len() + 3);
        all.push(&self.game_seed);
        all.push(&self.round);
        all.push(&blind);
        all.extend_from_slice(parts);
        seed_string(&all)
    }
}

fn repeat<T: Copy>(items: &[T], times: usize) -> impl Iterator<Item = T> + '_ {
    (0..times).flat_map(move |_| items.iter().copied())
}

/// 建立商店商品池
pub fn build_shop_pool(ctx: &ShopContext<'_>) -> Vec<PoolEntry> {
    let rules = ctx.rules;
    let celestials = ctx.unlocked_celestials();
    let cards = CardDef::all();

    let mut pool: Vec<PoolEntry> = JokerId::all()
        .iter()
        .copied()
        .filter(|j| ctx.joker_allowed(*j))
        .map(PoolEntry::Joker)
        .collect();
    pool.extend(
        repeat(TarotId::all(), rules.tarot_multiplier).map(|t| PoolEntry::Consumable(Consumable::Tarot(t))),
    );
    pool.extend(
        repeat(&celestials, rules.celestial_multiplier)
            .map(|c| PoolEntry::Consumable(Consumable::Celestial(c))),
    );
    pool.extend(repeat(&cards, rules.playing_card_multiplier).map(PoolEntry::PlayingCard));
    pool
}

/// 卡包內容的商品池
pub fn build_pack_pool(ctx: &ShopContext<'_>, pack_type: PackType) -> Vec<PoolEntry> {
    match pack_type {
        PackType::Arcana => TarotId::all()
            .iter()
            .map(|t| PoolEntry::Consumable(Consumable::Tarot(*t)))
            .collect(),
        PackType::Celestial => ctx
            .unlocked_celestials()
            .into_iter()
            .map(|c| PoolEntry::Consumable(Consumable::Celestial(c)))
            .collect(),
        PackType::Spectral => SpectralId::all()
            .iter()
            .map(|s| PoolEntry::Consumable(Consumable::Spectral(*s)))
            .collect(),
        PackType::Standard => CardDef::all().into_iter().map(PoolEntry::PlayingCard).collect(),
        PackType::Buffoon => JokerId::all()
            .iter()
            .copied()
            .filter(|j| ctx.joker_allowed(*j))
            .map(PoolEntry::Joker)
            .collect(),
    }
}

/// 從商品池依種子抽出 `count` 個定義（可重複）
pub fn draw_entries(seed: &str, pool: &[PoolEntry], count: usize) -> Vec<PoolEntry> {
    if pool.is_empty() {
        return Vec::new();
    }
    random_ints(seed, count, 0, pool.len() as i64 - 1)
        .into_iter()
        .map(|i| pool[i as usize])
        .collect()
}

// ============================================================================
// 實體化
// ============================================================================

fn roll_edition(seed: &str) -> Edition {
    let weights = [
        (Edition::Normal, 92.0),
        (Edition::Foil, 4.0),
        (Edition::Holographic, 2.8),
        (Edition::Polychrome, 1.2),
    ];
    weighted_choice(seed, &weights).unwrap_or(Edition::Normal)
}

/// 撲克牌的隨機增強、版本與封印
pub fn roll_playing_card(seed: &str, id: CardId, def: CardDef) -> PlayingCardState {
    let mut card = PlayingCardState::new(id, def);
    if random_float(&seed_string(&[&seed, &"enhance"])) < 0.4 {
        let options: Vec<(Enhancement, f64)> = Enhancement::all().iter().map(|e| (*e, 1.0)).collect();
        card.enhancement = weighted_choice(&seed_string(&[&seed, &"enhancement"]), &options)
            .unwrap_or(Enhancement::None);
    }
    card.edition = roll_edition(&seed_string(&[&seed, &"edition"]));
    if random_float(&seed_string(&[&seed, &"seal"])) < 0.2 {
        let options: Vec<(Seal, f64)> = Seal::all().iter().map(|s| (*s, 1.0)).collect();
        card.seal = weighted_choice(&seed_string(&[&seed, &"seal_kind"]), &options).unwrap_or(Seal::None);
    }
    card
}

/// 將定義實體化為有價格的物品
pub fn realize(entry: PoolEntry, seed: &str, ids: &mut IdAllocator, rules: &StaticRules) -> ShopItem {
    let id = ids.next_id();
    let (item, base_price) = match entry {
        PoolEntry::Joker(joker) => {
            let edition = roll_edition(&seed_string(&[&seed, &"edition"]));
            let price = joker.price() + edition_price(edition);
            (BuyableItem::Joker(JokerState::with_edition(id, joker, edition)), price)
        }
        PoolEntry::Consumable(consumable) => {
            (BuyableItem::Consumable(ConsumableState::new(id, consumable)), consumable.price())
        }
        PoolEntry::PlayingCard(def) => {
            let card = roll_playing_card(seed, id, def);
            let price = 1 + edition_price(card.edition);
            (BuyableItem::PlayingCard(card), price)
        }
    };
    ShopItem { item, price: rules.discounted(base_price) }
}

/// 產生商店的隨機商品
pub fn generate_items(ctx: &ShopContext<'_>, reroll_count: u32, count: usize, ids: &mut IdAllocator) -> Vec<ShopItem> {
    let seed = ctx.seed(&[&reroll_count, &"shop"]);
    let pool = build_shop_pool(ctx);
    let entries = draw_entries(&seed, &pool, count);
    debug!(%seed, pool = pool.len(), count = entries.len(), "generated shop items");
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| realize(entry, &seed_string(&[&seed, &i]), ids, ctx.rules))
        .collect()
}

/// 產生商店的卡包槽位
pub fn generate_packs(ctx: &ShopContext<'_>, ids: &mut IdAllocator) -> Vec<ShopPack> {
    (0..ctx.rules.shop_pack_count)
        .map(|slot| {
            let (pack_type, rarity) = roll_pack(&ctx.seed(&[&"pack", &slot]));
            ShopPack {
                id: ids.next_id(),
                pack_type,
                rarity,
                price: ctx.rules.discounted(rarity.price()),
            }
        })
        .collect()
}

/// 開啟卡包時產生內容（卡包內物品免費）
pub fn generate_pack_contents(ctx: &ShopContext<'_>, pack: &ShopPack, ids: &mut IdAllocator) -> Vec<ShopItem> {
    let seed = ctx.seed(&[&"pack", &pack.id, &"contents"]);
    let pool = build_pack_pool(ctx, pack.pack_type);
    let entries = draw_entries(&seed, &pool, pack.rarity.card_count());
    debug!(%seed, pack = %pack.name(), count = entries.len(), "generated pack contents");
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let mut item = realize(entry, &seed_string(&[&seed, &i]), ids, ctx.rules);
            item.price = 0;
            item
        })
        .collect()
}

/// Joker 稀有度權重
pub fn roll_rarity(seed: &str) -> Rarity {
    let weights = [(Rarity::Common, 70.0), (Rarity::Uncommon, 25.0), (Rarity::Rare, 5.0)];
    weighted_choice(seed, &weights).unwrap_or(Rarity::Common)
}

/// 指定稀有度的隨機 Joker（遵守重複規則）
pub fn roll_joker(seed: &str, rarity: Rarity, ctx: &ShopContext<'_>) -> Option<JokerId> {
    let options: Vec<(JokerId, f64)> = JokerId::by_rarity(rarity)
        .into_iter()
        .filter(|j| ctx.joker_allowed(*j))
        .map(|j| (j, 1.0))
        .collect();
    weighted_choice(seed, &options)
}

/// Tag 保證的免費卡包
pub fn free_pack(pack_type: PackType, rarity: PackRarity, ids: &mut IdAllocator) -> ShopPack {
    ShopPack { id: ids.next_id(), pack_type, rarity, price: 0 }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::hand_types::HandId;

    struct Fixture {
        rules: StaticRules,
        jokers: Vec<JokerState>,
        hands: HandLevels,
    }

    impl Fixture {
        fn new() -> Self {
            Self { rules: StaticRules::default(), jokers: Vec::new(), hands: HandLevels::new() }
        }

        fn ctx(&self) -> ShopContext<'_> {
            ShopContext {
                game_seed: "TESTSEED",
                round: 1,
                blind: BlindType::Small,
                rules: &self.rules,
                owned_jokers: &self.jokers,
                hands: &self.hands,
            }
        }
    }

    fn count_jokers(pool: &[PoolEntry], joker: JokerId) -> usize {
        pool.iter().filter(|e| **e == PoolEntry::Joker(joker)).count()
    }

    #[test]
    fn test_pool_composition() {
        let fx = Fixture::new();
        let pool = build_shop_pool(&fx.ctx());
        let celestials = fx.ctx().unlocked_celestials().len();
        assert_eq!(celestials, 9);
        assert_eq!(pool.len(), 40 + 21 + celestials + 52);
    }

    #[test]
    fn test_multipliers_repeat_pools_but_not_jokers() {
        let mut fx = Fixture::new();
        fx.rules.tarot_multiplier = 2;
        let pool = build_shop_pool(&fx.ctx());
        let tarots = pool.iter().filter(|e| matches!(e, PoolEntry::Consumable(Consumable::Tarot(_)))).count();
        assert_eq!(tarots, 42);
        assert_eq!(count_jokers(&pool, JokerId::Joker), 1);
    }

    #[test]
    fn test_owned_joker_excluded_without_duplicates() {
        let mut fx = Fixture::new();
        fx.jokers.push(JokerState::new(1, JokerId::Bull));
        let pool = build_shop_pool(&fx.ctx());
        assert_eq!(count_jokers(&pool, JokerId::Bull), 0);

        let mut ids = IdAllocator::new();
        for reroll in 0..30 {
            for item in generate_items(&fx.ctx(), reroll, 10, &mut ids) {
                if let BuyableItem::Joker(j) = item.item {
                    assert_ne!(j.joker, JokerId::Bull);
                }
            }
        }

        fx.rules.allow_duplicate_jokers_in_shop = true;
        assert_eq!(count_jokers(&build_shop_pool(&fx.ctx()), JokerId::Bull), 1);
    }

    #[test]
    fn test_secret_celestial_unlocks_after_play() {
        let mut fx = Fixture::new();
        assert!(!fx.ctx().unlocked_celestials().contains(&CelestialId::Eris));
        fx.hands.record_played(HandId::FlushFive);
        assert!(fx.ctx().unlocked_celestials().contains(&CelestialId::Eris));
    }

    #[test]
    fn test_generation_is_reproducible() {
        let fx = Fixture::new();
        let a = generate_items(&fx.ctx(), 0, 2, &mut IdAllocator::new());
        let b = generate_items(&fx.ctx(), 0, 2, &mut IdAllocator::new());
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_reroll_changes_seed() {
        let fx = Fixture::new();
        let rolls: Vec<_> = (0..5)
            .map(|r| {
                generate_items(&fx.ctx(), r, 5, &mut IdAllocator::new())
                    .into_iter()
                    .map(|i| i.item.name())
                    .collect::<Vec<_>>()
            })
            .collect();
        assert!(rolls.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_discount_applies_to_prices() {
        let mut fx = Fixture::new();
        fx.rules.discount_percent = 50;
        let mut ids = IdAllocator::new();
        let item = realize(PoolEntry::Consumable(Consumable::Tarot(TarotId::Strength)), "x", &mut ids, &fx.rules);
        assert_eq!(item.price, 1);
        let packs = generate_packs(&fx.ctx(), &mut ids);
        assert_eq!(packs.len(), 2);
        for pack in packs {
            assert_eq!(pack.price, pack.rarity.price() / 2);
        }
    }

    #[test]
    fn test_pack_contents_are_free_and_typed() {
        let fx = Fixture::new();
        let mut ids = IdAllocator::new();
        let pack = ShopPack { id: 500, pack_type: PackType::Arcana, rarity: PackRarity::Jumbo, price: 6 };
        let items = generate_pack_contents(&fx.ctx(), &pack, &mut ids);
        assert_eq!(items.len(), 5);
        for item in items {
            assert_eq!(item.price, 0);
            assert!(matches!(
                item.item,
                BuyableItem::Consumable(ConsumableState { consumable: Consumable::Tarot(_), .. })
            ));
        }
    }

    #[test]
    fn test_roll_joker_respects_rarity_and_ownership() {
        let mut fx = Fixture::new();
        for (i, joker) in JokerId::by_rarity(Rarity::Rare).into_iter().enumerate() {
            if joker != JokerId::TheTribe {
                fx.jokers.push(JokerState::new(i as CardId + 1, joker));
            }
        }
        for n in 0..10 {
            assert_eq!(roll_joker(&format!("r{n}"), Rarity::Rare, &fx.ctx()), Some(JokerId::TheTribe));
        }
        assert_eq!(roll_joker("x", Rarity::Legendary, &fx.ctx()), None);
    }
}
