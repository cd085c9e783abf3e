//! Tag 系統
//!
//! 跳過 Blind 時獲得的獎勵，一次性使用。
//!
//! # 架構
//!
//! 使用聲明式 `TAG_DEFS` 表定義所有 Tag 的元數據。Tag 以三種方式兌現：
//! - 保證物品：進入商店時先放入免費物品
//! - 商店修飾：改變本次商店的價格或重擲費用
//! - 事件效果：與 Joker 相同的效果資料，觸發後即消耗

use serde::{Deserialize, Serialize};

use super::cards::CardId;
use super::effects::{Condition, Effect, EffectAction, EffectSource, GameEvent, RegisteredEffect};
use super::joker_def::Rarity;
use super::packs::{PackRarity, PackType};

// ============================================================================
// Tag 定義系統
// ============================================================================

/// 進入商店時保證出現的免費物品
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Guarantee {
    FreeJoker(Rarity),
    FreePack(PackType, PackRarity),
}

/// 商店修飾
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopModifier {
    /// 初始商品與卡包免費
    Coupon,
    /// 第一次重擲免費
    FreeReroll,
}

/// Tag 定義結構
#[derive(Clone, Copy, Debug)]
pub struct TagDef {
    pub name: &'static str,
    pub guarantee: Option<Guarantee>,
    pub shop: Option<ShopModifier>,
    pub effects: &'static [Effect],
}

const ECONOMY: &[Effect] = &[Effect::on(GameEvent::ShopOpened, EffectAction::DoubleMoney { cap: 40 })];
const SPEED: &[Effect] = &[Effect::on(GameEvent::ShopOpened, EffectAction::AddMoneyPerSkip(5))];
const INVESTMENT: &[Effect] = &[Effect::when(
    GameEvent::BlindDefeated,
    Condition::BossBlindActive,
    EffectAction::AddMoney(25),
)];

const fn guaranteed(name: &'static str, guarantee: Guarantee) -> TagDef {
    TagDef { name, guarantee: Some(guarantee), shop: None, effects: &[] }
}

/// Tag 定義表（順序與 TagId 枚舉一致）
pub static TAG_DEFS: [TagDef; TAG_COUNT] = [
    // 0: UncommonTag
    guaranteed("Uncommon Tag", Guarantee::FreeJoker(Rarity::Uncommon)),
    // 1: RareTag
    guaranteed("Rare Tag", Guarantee::FreeJoker(Rarity::Rare)),
    // 2: BuffoonTag - free Mega Buffoon Pack
    guaranteed("Buffoon Tag", Guarantee::FreePack(PackType::Buffoon, PackRarity::Mega)),
    // 3: CharmTag - free Mega Arcana Pack
    guaranteed("Charm Tag", Guarantee::FreePack(PackType::Arcana, PackRarity::Mega)),
    // 4: MeteorTag - free Mega Celestial Pack
    guaranteed("Meteor Tag", Guarantee::FreePack(PackType::Celestial, PackRarity::Mega)),
    // 5: StandardTag - free Mega Standard Pack
    guaranteed("Standard Tag", Guarantee::FreePack(PackType::Standard, PackRarity::Mega)),
    // 6: EtherealTag - free Spectral Pack
    guaranteed("Ethereal Tag", Guarantee::FreePack(PackType::Spectral, PackRarity::Normal)),
    // 7: CouponTag
    TagDef { name: "Coupon Tag", guarantee: None, shop: Some(ShopModifier::Coupon), effects: &[] },
    // 8: D6Tag
    TagDef { name: "D6 Tag", guarantee: None, shop: Some(ShopModifier::FreeReroll), effects: &[] },
    // 9: EconomyTag - double money (max +$40)
    TagDef { name: "Economy Tag", guarantee: None, shop: None, effects: ECONOMY },
    // 10: SpeedTag - $5 per skipped blind
    TagDef { name: "Speed Tag", guarantee: None, shop: None, effects: SPEED },
    // 11: InvestmentTag - +$25 after defeating the boss blind
    TagDef { name: "Investment Tag", guarantee: None, shop: None, effects: INVESTMENT },
];

/// Tag 常量
pub const TAG_COUNT: usize = 12;

/// Tag 類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TagId {
    UncommonTag,
    RareTag,
    BuffoonTag,
    CharmTag,
    MeteorTag,
    StandardTag,
    EtherealTag,
    CouponTag,
    D6Tag,
    EconomyTag,
    SpeedTag,
    InvestmentTag,
}

impl TagId {
    /// 所有可用的 Tags
    pub fn all() -> &'static [TagId] {
        &[
            TagId::UncommonTag,
            TagId::RareTag,
            TagId::BuffoonTag,
            TagId::CharmTag,
            TagId::MeteorTag,
            TagId::StandardTag,
            TagId::EtherealTag,
            TagId::CouponTag,
            TagId::D6Tag,
            TagId::EconomyTag,
            TagId::SpeedTag,
            TagId::InvestmentTag,
        ]
    }

    pub fn to_index(&self) -> usize {
        *self as usize
    }

    pub fn def(&self) -> &'static TagDef {
        &TAG_DEFS[self.to_index()]
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    pub fn guarantee(&self) -> Option<Guarantee> {
        self.def().guarantee
    }

    pub fn shop_modifier(&self) -> Option<ShopModifier> {
        self.def().shop
    }
}

/// 擁有中的 Tag
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagState {
    pub id: CardId,
    pub tag: TagId,
}

impl TagState {
    pub fn new(id: CardId, tag: TagId) -> Self {
        Self { id, tag }
    }

    pub fn source(&self) -> EffectSource {
        EffectSource::Tag { id: self.id, tag: self.tag }
    }

    pub fn effects(&self) -> impl Iterator<Item = RegisteredEffect> + '_ {
        let source = self.source();
        self.tag
            .def()
            .effects
            .iter()
            .map(move |e| RegisteredEffect::new(source, *e))
    }
}

// ============================================================================
// 單元測試
// ============================================================================
