//! 遊戲狀態管理
//!
//! `GameState` 是整局唯一的聚合根。所有實體以 id 定址：
//! 牌組 (`deck`) 是撲克牌的實體表，各牌堆只記錄 id。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::game::blinds::{BlindReward, BlindState, BlindType, BossBlindId, RoundBlinds, Stage};
use crate::game::cards::{standard_deck, CardId, IdAllocator, PlayingCardState};
use crate::game::config::GameConfig;
use crate::game::constants::INTEREST_STEP;
use crate::game::consumables::ConsumableState;
use crate::game::effects::RegisteredEffect;
use crate::game::effects::EffectSource;
use crate::game::hand_types::{HandId, HandLevels, Score};
use crate::game::joker::{occupied_slots, JokerState};
use crate::game::rules::StaticRules;
use crate::game::shop::{ShopContext, ShopState};
use crate::game::tags::TagState;
use crate::game::vouchers::{VoucherId, VoucherState};

/// 正在計分的一手牌
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandScoring {
    pub hand: HandId,
    /// 打出的牌（選擇順序）
    pub played: Vec<CardId>,
    /// 計分牌
    pub scored: Vec<CardId>,
    /// 尚未計分的牌
    pub queue: VecDeque<CardId>,
    pub score: Score,
}

/// 出牌中的狀態
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameplayState {
    pub draw_pile: Vec<CardId>,
    pub hand: Vec<CardId>,
    pub selected: Vec<CardId>,
    pub played: Vec<CardId>,
    pub discarded: Vec<CardId>,
    /// 本 Blind 累積分數
    pub score: i64,
    pub remaining_hands: u32,
    pub remaining_discards: u32,
    pub scoring: Option<HandScoring>,
    pub last_hand: Option<HandId>,
    /// 上一手牌的得分
    pub last_hand_score: i64,
}

/// 遊戲狀態
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub seed: String,
    pub stage: Stage,
    pub money: i64,
    pub round: u32,
    pub blinds: RoundBlinds,
    /// 最近選擇的 Blind（商店種子使用）
    pub current_blind: Option<BlindType>,

    /// 擁有的撲克牌
    pub deck: Vec<PlayingCardState>,
    pub jokers: Vec<JokerState>,
    pub consumables: Vec<ConsumableState>,
    pub tags: Vec<TagState>,
    pub vouchers: Vec<VoucherState>,
    pub hands: HandLevels,
    pub rules: StaticRules,
    /// 新局設定的規則（出售改寫規則的 Joker 時恢復）
    pub base_rules: StaticRules,

    pub shop: Option<ShopState>,
    pub gameplay: GameplayState,

    // 整局統計
    pub blinds_skipped: u32,
    pub hands_played: u32,

    pub ids: IdAllocator,
    pub last_reward: Option<BlindReward>,
}

impl GameState {
    pub fn new(seed: impl Into<String>, config: &GameConfig) -> Self {
        let seed = seed.into();
        let mut ids = IdAllocator::new();
        let deck = standard_deck(&mut ids);
        let rules = config.rules.clone();
        let blinds = RoundBlinds::new(&seed, 1, rules.winning_round);

        Self {
            seed,
            stage: Stage::PreBlind,
            money: config.starting_money,
            round: 1,
            blinds,
            current_blind: None,
            deck,
            jokers: Vec::new(),
            consumables: Vec::new(),
            tags: Vec::new(),
            vouchers: Vec::new(),
            hands: HandLevels::new(),
            gameplay: GameplayState {
                remaining_hands: rules.hands_per_round,
                remaining_discards: rules.discards_per_round,
                ..GameplayState::default()
            },
            base_rules: rules.clone(),
            rules,
            shop: None,
            blinds_skipped: 0,
            hands_played: 0,
            ids,
            last_reward: None,
        }
    }

    // ------------------------------------------------------------------------
    // 查詢
    // ------------------------------------------------------------------------

    pub fn card(&self, id: CardId) -> Option<&PlayingCardState> {
        self.deck.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut PlayingCardState> {
        self.deck.iter_mut().find(|c| c.id == id)
    }

    /// 依 id 順序取出牌的副本（略過已不存在的牌）
    pub fn cards(&self, ids: &[CardId]) -> Vec<PlayingCardState> {
        ids.iter().filter_map(|id| self.card(*id)).cloned().collect()
    }

    /// 手中未選擇的牌
    pub fn held_cards(&self) -> Vec<PlayingCardState> {
        let gameplay = &self.gameplay;
        let held: Vec<CardId> = gameplay
            .hand
            .iter()
            .copied()
            .filter(|id| !gameplay.selected.contains(id))
            .collect();
        self.cards(&held)
    }

    pub fn joker(&self, id: CardId) -> Option<&JokerState> {
        self.jokers.iter().find(|j| j.id == id)
    }

    pub fn consumable(&self, id: CardId) -> Option<&ConsumableState> {
        self.consumables.iter().find(|c| c.id == id)
    }

    pub fn owned_vouchers(&self) -> Vec<VoucherId> {
        self.vouchers.iter().map(|v| v.voucher).collect()
    }

    /// 目前進行中的 Blind
    pub fn blind_in_progress(&self) -> Option<&BlindState> {
        self.blinds.in_progress().map(|kind| self.blinds.get(kind))
    }

    /// 進行中的 Boss Blind（只有打 Boss 時才生效）
    pub fn active_boss(&self) -> Option<BossBlindId> {
        self.blind_in_progress().and_then(|blind| blind.boss)
    }

    pub fn has_free_joker_slot(&self) -> bool {
        occupied_slots(&self.jokers) < self.rules.joker_slots
    }

    pub fn has_free_consumable_slot(&self) -> bool {
        self.consumables.len() < self.rules.consumable_slots
    }

    /// 可花費的金額（高於金幣下限的部分）
    pub fn spendable(&self) -> i64 {
        self.money - self.rules.money_floor
    }

    /// 每 $5 得 $1，不超過利息上限
    pub fn interest(&self) -> i64 {
        (self.money / INTEREST_STEP).clamp(0, self.rules.interest_cap)
    }

    /// 加錢，結果不低於金幣下限
    pub fn add_money(&mut self, amount: i64) {
        self.money = (self.money + amount).max(self.rules.money_floor);
    }

    /// 目前生效的所有效果，依序：Joker（欄位順序）、Tag、Boss Blind
    pub fn owned_effects(&self) -> Vec<RegisteredEffect> {
        let mut effects: Vec<RegisteredEffect> = self.jokers.iter().flat_map(|j| j.effects()).collect();
        effects.extend(self.tags.iter().flat_map(|t| t.effects()));
        if let Some(boss) = self.active_boss() {
            let source = EffectSource::BossBlind(boss);
            effects.extend(boss.effects().iter().map(|e| RegisteredEffect::new(source, *e)));
        }
        effects
    }

    /// 商店生成所需的狀態切片
    pub fn shop_context(&self) -> ShopContext<'_> {
        ShopContext {
            game_seed: &self.seed,
            round: self.round,
            blind: self.current_blind.unwrap_or(BlindType::Small),
            rules: &self.rules,
            owned_jokers: &self.jokers,
            hands: &self.hands,
        }
    }

    /// 商店生成所需的狀態切片與 id 分配器
    pub fn shop_parts(&mut self) -> (ShopContext<'_>, &mut IdAllocator) {
        let ctx = ShopContext {
            game_seed: &self.seed,
            round: self.round,
            blind: self.current_blind.unwrap_or(BlindType::Small),
            rules: &self.rules,
            owned_jokers: &self.jokers,
            hands: &self.hands,
        };
        (ctx, &mut self.ids)
    }

    /// 從所有牌堆與牌組移除一張牌
    pub fn destroy_card(&mut self, id: CardId) {
        self.deck.retain(|c| c.id != id);
        let gameplay = &mut self.gameplay;
        for pile in [
            &mut gameplay.draw_pile,
            &mut gameplay.hand,
            &mut gameplay.selected,
            &mut gameplay.played,
            &mut gameplay.discarded,
        ] {
            pile.retain(|c| *c != id);
        }
    }
}

// ============================================================================
// 單元測試
// ============================================================================
