//! 遊戲核心模組
//!
//! 純規則資料與純演算法，不持有整局狀態：
//! - `constants` / `config` / `rules`: 常量、新局設定、可覆寫的靜態規則
//! - `rng`: 種子字串驅動的確定性亂數
//! - `cards`: 卡牌、增強、封印、版本定義
//! - `hand_types` / `scoring`: 牌型等級表與牌型判定
//! - `effects`: 效果資料與事件分派
//! - `joker` / `joker_def`: Joker 定義與實體
//! - `blinds`: Blind、Boss Blind 與回合分數
//! - `tags` / `vouchers` / `consumables`: 一次性獎勵、永久升級、消耗品
//! - `shop` / `packs`: 商店商品池與卡包

pub mod constants;
pub mod config;
pub mod rules;
pub mod rng;
pub mod cards;
pub mod hand_types;
pub mod scoring;
pub mod effects;
pub mod joker;
pub mod joker_def;
pub mod blinds;
pub mod tags;
pub mod vouchers;
pub mod consumables;
pub mod shop;
pub mod packs;

// Re-export 常用類型
pub use blinds::{BlindReward, BlindState, BlindStatus, BlindType, BossBlindId, GameEnd, RoundBlinds, Stage};
pub use cards::{CardDef, CardId, Edition, Enhancement, IdAllocator, PlayingCardState, Rank, Seal, Suit};
pub use config::{ConfigError, GameConfig};
pub use consumables::{CelestialId, Consumable, ConsumableEffect, ConsumableState, ConsumableType, SpectralId, TarotId};
pub use effects::{
    dispatch, DispatchReport, Effect, EffectAction, EffectContext, EffectError, EffectSource, EventDispatcher,
    GameEvent, PendingAction, RegisteredEffect,
};
pub use hand_types::{HandId, HandLevels, HandState, Score};
pub use joker::{JokerId, JokerState, JOKER_COUNT};
pub use joker_def::Rarity;
pub use packs::{PackRarity, PackState, PackType, ShopPack};
pub use rules::StaticRules;
pub use scoring::{evaluate_hand, HandEvaluation};
pub use shop::{BuyableItem, ShopItem, ShopState, VoucherOffer};
pub use tags::{TagId, TagState, TAG_COUNT};
pub use vouchers::{VoucherId, VoucherState, VOUCHER_COUNT};
