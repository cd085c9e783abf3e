//! 事件與效果分派
//!
//! 效果是資料：觸發事件 + 優先級 + 可選守衛條件 + 動作。
//!
//! ```text
//! dispatch(event, ctx, effects)
//!   ├─ 過濾 trigger == event
//!   ├─ 依 priority 穩定排序（同優先級保持註冊順序）
//!   └─ 逐一：守衛不成立 → skipped；否則 apply → fired / failures
//! ```
//!
//! 同一次分派中，任何效果的結果都不會讓其他效果被跳過。
//! 結構性變更（產生消耗品、棄牌、Joker 成長、降級牌型）以 `PendingAction`
//! 排入佇列，由引擎在分派結束後執行。

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{trace, warn};

use super::blinds::BossBlindId;
use super::cards::{CardId, Edition, PlayingCardState, Rank, Suit};
use super::hand_types::{HandId, Score};
use super::joker::{JokerId, JokerState};
use super::rules::StaticRules;
use super::scoring::contains_hand;
use super::tags::TagId;

// ============================================================================
// 事件
// ============================================================================

/// 引擎分派的事件類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    HandDealt,
    CardsDiscarded,
    HandScoringStart,
    CardScored,
    HandScoringDone,
    BlindSelected,
    BlindSkipped,
    BlindDefeated,
    ShopOpened,
    ShopRerolled,
    JokerAdded,
    JokerSold,
    TarotUsed,
    CelestialUsed,
    SpectralUsed,
    PackOpened,
}

// ============================================================================
// 效果來源
// ============================================================================

/// 效果的擁有者
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectSource {
    Joker { id: CardId, joker: JokerId },
    JokerEdition { id: CardId, edition: Edition },
    Tag { id: CardId, tag: TagId },
    BossBlind(BossBlindId),
    Custom(u32),
}

impl EffectSource {
    /// 來源實體的 id（若有）
    pub fn entity_id(&self) -> Option<CardId> {
        match self {
            EffectSource::Joker { id, .. }
            | EffectSource::JokerEdition { id, .. }
            | EffectSource::Tag { id, .. } => Some(*id),
            EffectSource::BossBlind(_) | EffectSource::Custom(_) => None,
        }
    }
}

// ============================================================================
// 守衛條件
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    AtMost,
    AtLeast,
}

impl CompareOp {
    pub fn compare(&self, value: u32, target: u32) -> bool {
        match self {
            CompareOp::Eq => value == target,
            CompareOp::AtMost => value <= target,
            CompareOp::AtLeast => value >= target,
        }
    }
}

/// 守衛條件
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Condition {
    Always,
    /// 判定出的牌型恰為此牌型
    HandIs(HandId),
    /// 打出的牌包含此牌型
    HandContains(HandId),
    /// 打出張數不超過 n
    PlayedAtMost(usize),
    /// 當前計分牌符合花色
    CardSuit(Suit),
    /// 當前計分牌是人頭牌
    CardIsFace,
    /// 當前計分牌的點數在列表中
    CardRankIn(&'static [Rank]),
    DiscardsRemaining(CompareOp, u32),
    HandsRemaining(CompareOp, u32),
    /// 事件主體就是效果來源（JokerAdded / JokerSold）
    IsSubject,
    /// 來源 Joker 是場上唯一的同種 Joker
    OnlyCopy,
    BossBlindActive,
    All(&'static [Condition]),
}

impl Condition {
    pub fn holds(&self, source: &EffectSource, ctx: &EffectContext<'_>) -> bool {
        match self {
            Condition::Always => true,
            Condition::HandIs(hand) => ctx.hand == Some(*hand),
            Condition::HandContains(hand) => {
                ctx.hand.is_some() && contains_hand(*hand, ctx.played, &*ctx.rules)
            }
            Condition::PlayedAtMost(n) => ctx.hand.is_some() && ctx.played.len() <= *n,
            Condition::CardSuit(suit) => ctx.card.is_some_and(|c| c.matches_suit(*suit)),
            Condition::CardIsFace => ctx
                .card
                .is_some_and(|c| c.is_face(ctx.rules.all_cards_are_faces)),
            Condition::CardRankIn(ranks) => ctx
                .card
                .is_some_and(|c| c.counts_for_hand() && ranks.contains(&c.rank())),
            Condition::DiscardsRemaining(op, n) => op.compare(ctx.remaining_discards, *n),
            Condition::HandsRemaining(op, n) => op.compare(ctx.remaining_hands, *n),
            Condition::IsSubject => {
                ctx.subject.is_some() && source.entity_id() == ctx.subject
            }
            Condition::OnlyCopy => match source {
                EffectSource::Joker { joker, .. } => {
                    ctx.jokers.iter().filter(|j| j.joker == *joker).count() == 1
                }
                _ => false,
            },
            Condition::BossBlindActive => ctx.boss_blind.is_some(),
            Condition::All(conditions) => conditions.iter().all(|c| c.holds(source, ctx)),
        }
    }
}

// ============================================================================
// 動作
// ============================================================================

/// 分派結束後才執行的結構性動作（模板）
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Deferred {
    CreateRandomTarot,
    CreatePlayedHandCelestial,
    DiscardRandomHeldCards(usize),
    GrowOwnMult(f64),
    LevelDownPlayedHand,
}

/// 已解析、待引擎執行的結構性動作
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PendingAction {
    CreateRandomTarot,
    CreateCelestial(HandId),
    DiscardRandomHeldCards(usize),
    GrowJokerMult { joker: CardId, amount: f64 },
    LevelDownHand(HandId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingEffect {
    pub source: EffectSource,
    pub action: PendingAction,
}

#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum EffectError {
    #[error("effect needs a played hand but none is being scored")]
    MissingHand,
    #[error("effect source is not a joker")]
    NotAJoker,
    #[error("joker {0} is not owned")]
    UnknownJoker(CardId),
    #[error("invalid multiplier factor {0}")]
    InvalidFactor(f64),
}

/// 效果動作
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectAction {
    AddChips(i64),
    AddMult(f64),
    MultiplyMult(f64),
    AddMoney(i64),
    /// 每個剩餘棄牌次數 +n chips
    AddChipsPerDiscard(i64),
    /// 每個持有的 Joker +m mult
    AddMultPerJoker(f64),
    /// 每 $1 +n chips
    AddChipsPerMoney(i64),
    /// 每個已跳過的 Blind +$n
    AddMoneyPerSkip(i64),
    /// 金幣翻倍（最多 +cap）
    DoubleMoney { cap: i64 },
    /// 加上來源 Joker 累積的 mult
    AddOwnMult,
    /// 基礎 chips 和 mult 減半
    HalveBaseScore,
    SetMinStraightFlushCards(usize),
    SetAllCardsAreFaces(bool),
    SetAllowDuplicateJokers(bool),
    /// 恢復新局設定的值
    ResetMinStraightFlushCards,
    ResetAllCardsAreFaces,
    ResetAllowDuplicateJokers,
    ScaleProbabilities(f64),
    Queue(Deferred),
}

fn check_factor(factor: f64) -> Result<f64, EffectError> {
    if factor.is_finite() && factor >= 0.0 {
        Ok(factor)
    } else {
        Err(EffectError::InvalidFactor(factor))
    }
}

fn source_joker(source: &EffectSource) -> Result<CardId, EffectError> {
    match source {
        EffectSource::Joker { id, .. } => Ok(*id),
        _ => Err(EffectError::NotAJoker),
    }
}

impl EffectAction {
    pub fn apply(&self, source: &EffectSource, ctx: &mut EffectContext<'_>) -> Result<(), EffectError> {
        match *self {
            EffectAction::AddChips(n) => ctx.score.chips += n,
            EffectAction::AddMult(m) => ctx.score.mult += m,
            EffectAction::MultiplyMult(x) => ctx.score.mult *= check_factor(x)?,
            EffectAction::AddMoney(n) => ctx.add_money(n),
            EffectAction::AddChipsPerDiscard(n) => {
                ctx.score.chips += n * ctx.remaining_discards as i64;
            }
            EffectAction::AddMultPerJoker(m) => ctx.score.mult += m * ctx.jokers.len() as f64,
            EffectAction::AddChipsPerMoney(n) => ctx.score.chips += n * (*ctx.money).max(0),
            EffectAction::AddMoneyPerSkip(n) => ctx.add_money(n * ctx.blinds_skipped as i64),
            EffectAction::DoubleMoney { cap } => {
                let bonus = (*ctx.money).max(0).min(cap);
                ctx.add_money(bonus);
            }
            EffectAction::AddOwnMult => {
                let id = source_joker(source)?;
                let joker = ctx
                    .jokers
                    .iter()
                    .find(|j| j.id == id)
                    .ok_or(EffectError::UnknownJoker(id))?;
                ctx.score.mult += joker.bonus_mult;
            }
            EffectAction::HalveBaseScore => {
                ctx.score.chips = (ctx.score.chips + 1) / 2;
                ctx.score.mult = (ctx.score.mult / 2.0).ceil().max(1.0);
            }
            EffectAction::SetMinStraightFlushCards(n) => ctx.rules.min_straight_flush_cards = n,
            EffectAction::SetAllCardsAreFaces(on) => ctx.rules.all_cards_are_faces = on,
            EffectAction::SetAllowDuplicateJokers(on) => {
                ctx.rules.allow_duplicate_jokers_in_shop = on;
            }
            EffectAction::ResetMinStraightFlushCards => {
                ctx.rules.min_straight_flush_cards = ctx.base_rules.min_straight_flush_cards;
            }
            EffectAction::ResetAllCardsAreFaces => {
                ctx.rules.all_cards_are_faces = ctx.base_rules.all_cards_are_faces;
            }
            EffectAction::ResetAllowDuplicateJokers => {
                ctx.rules.allow_duplicate_jokers_in_shop = ctx.base_rules.allow_duplicate_jokers_in_shop;
            }
            EffectAction::ScaleProbabilities(x) => {
                ctx.rules.probability_multiplier *= check_factor(x)?;
            }
            EffectAction::Queue(deferred) => {
                let action = match deferred {
                    Deferred::CreateRandomTarot => PendingAction::CreateRandomTarot,
                    Deferred::CreatePlayedHandCelestial => {
                        PendingAction::CreateCelestial(ctx.hand.ok_or(EffectError::MissingHand)?)
                    }
                    Deferred::DiscardRandomHeldCards(n) => PendingAction::DiscardRandomHeldCards(n),
                    Deferred::GrowOwnMult(amount) => PendingAction::GrowJokerMult {
                        joker: source_joker(source)?,
                        amount,
                    },
                    Deferred::LevelDownPlayedHand => {
                        PendingAction::LevelDownHand(ctx.hand.ok_or(EffectError::MissingHand)?)
                    }
                };
                ctx.pending.push(PendingEffect { source: *source, action });
            }
        }
        Ok(())
    }
}

// ============================================================================
// 效果與上下文
// ============================================================================

/// 一條效果規則
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Effect {
    pub trigger: GameEvent,
    pub priority: i32,
    pub guard: Option<Condition>,
    pub action: EffectAction,
}

impl Effect {
    pub const fn on(trigger: GameEvent, action: EffectAction) -> Self {
        Self { trigger, priority: 0, guard: None, action }
    }

    pub const fn when(trigger: GameEvent, guard: Condition, action: EffectAction) -> Self {
        Self { trigger, priority: 0, guard: Some(guard), action }
    }

    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// 帶來源的效果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegisteredEffect {
    pub source: EffectSource,
    pub effect: Effect,
}

impl RegisteredEffect {
    pub fn new(source: EffectSource, effect: Effect) -> Self {
        Self { source, effect }
    }
}

/// 效果可讀寫的遊戲狀態切片
pub struct EffectContext<'a> {
    pub score: &'a mut Score,
    pub money: &'a mut i64,
    pub rules: &'a mut StaticRules,
    /// 新局設定的規則，唯讀
    pub base_rules: &'a StaticRules,
    pub hand: Option<HandId>,
    pub played: &'a [PlayingCardState],
    pub scored: &'a [PlayingCardState],
    pub held: &'a [PlayingCardState],
    pub card: Option<&'a PlayingCardState>,
    pub jokers: &'a [JokerState],
    pub round_index: u32,
    pub boss_blind: Option<BossBlindId>,
    pub remaining_hands: u32,
    pub remaining_discards: u32,
    pub blinds_skipped: u32,
    pub subject: Option<CardId>,
    pub pending: Vec<PendingEffect>,
}

impl<'a> EffectContext<'a> {
    /// 只含必要欄位的上下文，其餘為空
    pub fn new(
        score: &'a mut Score,
        money: &'a mut i64,
        rules: &'a mut StaticRules,
        base_rules: &'a StaticRules,
    ) -> Self {
        Self {
            score,
            money,
            rules,
            base_rules,
            hand: None,
            played: &[],
            scored: &[],
            held: &[],
            card: None,
            jokers: &[],
            round_index: 1,
            boss_blind: None,
            remaining_hands: 0,
            remaining_discards: 0,
            blinds_skipped: 0,
            subject: None,
            pending: Vec::new(),
        }
    }

    /// 加錢，結果不低於金幣下限
    pub fn add_money(&mut self, amount: i64) {
        *self.money = (*self.money + amount).max(self.rules.money_floor);
    }
}

// ============================================================================
// 分派
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct FiredEffect {
    pub source: EffectSource,
    pub priority: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EffectFailure {
    pub source: EffectSource,
    pub error: EffectError,
}

/// 一次分派的結果
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchReport {
    pub event: GameEvent,
    pub fired: Vec<FiredEffect>,
    pub skipped: Vec<EffectSource>,
    pub failures: Vec<EffectFailure>,
}

impl DispatchReport {
    pub fn new(event: GameEvent) -> Self {
        Self { event, fired: Vec::new(), skipped: Vec::new(), failures: Vec::new() }
    }

    /// 此來源是否有效果成功觸發
    pub fn fired_for(&self, source: &EffectSource) -> bool {
        self.fired.iter().any(|f| &f.source == source)
    }
}

/// 分派事件給所有觸發條件相符的效果
pub fn dispatch(
    event: GameEvent,
    ctx: &mut EffectContext<'_>,
    effects: &[RegisteredEffect],
) -> DispatchReport {
    let mut matching: Vec<&RegisteredEffect> =
        effects.iter().filter(|e| e.effect.trigger == event).collect();
    // sort_by_key 是穩定排序
    matching.sort_by_key(|e| e.effect.priority);

    let mut report = DispatchReport::new(event);
    for registered in matching {
        let RegisteredEffect { source, effect } = registered;
        if let Some(guard) = &effect.guard {
            if !guard.holds(source, ctx) {
                trace!(?event, ?source, "effect guard rejected");
                report.skipped.push(*source);
                continue;
            }
        }
        match effect.action.apply(source, ctx) {
            Ok(()) => {
                trace!(?event, ?source, priority = effect.priority, "effect fired");
                report.fired.push(FiredEffect { source: *source, priority: effect.priority });
            }
            Err(error) => {
                warn!(?event, ?source, %error, "effect failed");
                report.failures.push(EffectFailure { source: *source, error });
            }
        }
    }
    report
}

/// 每局一個的分派器，可額外註冊自訂效果
///
/// 額外效果排在遊戲狀態推導出的效果之後（同優先級時）。
#[derive(Clone, Debug, Default)]
pub struct EventDispatcher {
    registered: Vec<RegisteredEffect>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: EffectSource, effect: Effect) {
        self.registered.push(RegisteredEffect::new(source, effect));
    }

    pub fn registered(&self) -> &[RegisteredEffect] {
        &self.registered
    }

    pub fn dispatch(
        &self,
        event: GameEvent,
        ctx: &mut EffectContext<'_>,
        owned: &[RegisteredEffect],
    ) -> DispatchReport {
        if self.registered.is_empty() {
            return dispatch(event, ctx, owned);
        }
        let mut all = owned.to_vec();
        all.extend_from_slice(&self.registered);
        dispatch(event, ctx, &all)
    }
}

// ============================================================================
// 單元測試
// ============================================================================
