//! 命令引擎
//!
//! ```text
//! Engine::apply(cmd)
//!   ├─ draft = 已提交狀態的副本
//!   ├─ Draft::apply(cmd)         ← 各 reducer（round / scoring / shop / consumables）
//!   │    └─ dispatch(event) → 消耗已觸發的 Tag → 執行 PendingAction
//!   ├─ 成功：提交 draft，舊狀態進入歷史（可 undo）
//!   └─ 失敗：丟棄 draft，已提交狀態不變
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::game::blinds::{BlindType, Stage};
use crate::game::cards::{CardId, PlayingCardState};
use crate::game::config::{ConfigError, GameConfig};
use crate::game::constants::UNDO_DEPTH;
use crate::game::consumables::{CelestialId, Consumable, ConsumableState, ConsumableType, TarotId};
use crate::game::effects::{
    DispatchReport, EffectContext, EventDispatcher, GameEvent, PendingAction, PendingEffect,
};
use crate::game::hand_types::{HandId, Score};
use crate::game::rng::{random_int, seed_string};

use super::commands::{Command, Outcome};
use super::error::{EngineError, NotApplicable};
use super::shop::ItemKind;
use super::state::GameState;

// ============================================================================
// 分派框架
// ============================================================================

/// 一次分派中效果可讀取的事件資料
#[derive(Clone, Debug, Default)]
pub(crate) struct EventFrame {
    pub hand: Option<HandId>,
    pub played: Vec<PlayingCardState>,
    pub scored: Vec<PlayingCardState>,
    pub held: Vec<PlayingCardState>,
    pub card: Option<PlayingCardState>,
    pub subject: Option<CardId>,
}

impl EventFrame {
    pub fn subject(id: CardId) -> Self {
        Self { subject: Some(id), ..Self::default() }
    }
}

/// 單一命令的草稿狀態
pub(crate) struct Draft<'d> {
    pub state: GameState,
    dispatcher: &'d EventDispatcher,
    reports: Vec<DispatchReport>,
}

impl<'d> Draft<'d> {
    pub fn new(state: GameState, dispatcher: &'d EventDispatcher) -> Self {
        Self { state, dispatcher, reports: Vec::new() }
    }

    pub fn finish(self) -> (GameState, Outcome) {
        (self.state, Outcome { reports: self.reports })
    }

    pub fn apply(&mut self, cmd: &Command) -> Result<(), EngineError> {
        if let Stage::End(_) = self.state.stage {
            return Err(NotApplicable::WrongStage(self.state.stage).into());
        }
        match *cmd {
            Command::SmallBlindSelected => self.select_blind(BlindType::Small),
            Command::BigBlindSelected => self.select_blind(BlindType::Big),
            Command::BossBlindSelected => self.select_blind(BlindType::Boss),
            Command::BlindSkipped => self.skip_blind(),

            Command::HandDealt => self.deal_hand(),
            Command::CardSelected { id } => self.select_card(id),
            Command::CardDeselected { id } => self.deselect_card(id),
            Command::DiscardSelectedCards => self.discard_selected(),
            Command::HandScoringStart => self.start_scoring(),
            Command::CardScored => self.score_next_card(),
            Command::HandScoringDone => self.finish_scoring(),

            Command::ShopOpen => self.open_shop(),
            Command::ShopBuyCard { id } => self.buy_card(id),
            Command::ShopBuyVoucher { id } => self.buy_voucher(id),
            Command::ShopOpenPack { id } => self.open_pack(id),
            Command::ShopSelectJokerFromPack { id } => self.select_from_pack(id, ItemKind::Joker),
            Command::ShopSelectConsumableFromPack { id } => self.select_from_pack(id, ItemKind::Consumable),
            Command::ShopSelectPlayingCardFromPack { id } => self.select_from_pack(id, ItemKind::PlayingCard),
            Command::ShopSkipPack => self.skip_pack(),
            Command::ShopReroll => self.reroll_shop(),
            Command::ShopClose => self.close_shop(),

            Command::TarotCardUsed { id } => self.use_consumable(id, ConsumableType::Tarot),
            Command::CelestialCardUsed { id } => self.use_consumable(id, ConsumableType::Celestial),
            Command::SpectralCardUsed { id } => self.use_consumable(id, ConsumableType::Spectral),
            Command::ConsumableSold { id } => self.sell_consumable(id),

            Command::JokerAdded { joker, edition } => self.add_joker(joker, edition),
            Command::JokerSold { id } => self.sell_joker(id),
        }
    }

    pub fn expect_stage(&self, stage: Stage) -> Result<(), EngineError> {
        if self.state.stage == stage {
            Ok(())
        } else {
            Err(NotApplicable::WrongStage(self.state.stage).into())
        }
    }

    // ------------------------------------------------------------------------
    // 分派
    // ------------------------------------------------------------------------

    /// 分派不涉及計分的事件
    pub fn dispatch(&mut self, event: GameEvent, frame: &EventFrame) {
        let mut scratch = Score::default();
        self.dispatch_scored(event, frame, &mut scratch);
    }

    /// 分派事件，效果可修改 `score`
    pub fn dispatch_scored(&mut self, event: GameEvent, frame: &EventFrame, score: &mut Score) {
        let effects = self.state.owned_effects();
        let boss = self.state.active_boss();
        let state = &mut self.state;

        let mut ctx = EffectContext::new(score, &mut state.money, &mut state.rules, &state.base_rules);
        ctx.hand = frame.hand;
        ctx.played = &frame.played;
        ctx.scored = &frame.scored;
        ctx.held = &frame.held;
        ctx.card = frame.card.as_ref();
        ctx.jokers = &state.jokers;
        ctx.round_index = state.round;
        ctx.boss_blind = boss;
        ctx.remaining_hands = state.gameplay.remaining_hands;
        ctx.remaining_discards = state.gameplay.remaining_discards;
        ctx.blinds_skipped = state.blinds_skipped;
        ctx.subject = frame.subject;

        let report = self.dispatcher.dispatch(event, &mut ctx, &effects);
        let pending = std::mem::take(&mut ctx.pending);

        self.consume_tags(&report);
        self.apply_pending(pending);
        self.reports.push(report);
    }

    /// Tag 只能使用一次：效果觸發過的 Tag 移除
    fn consume_tags(&mut self, report: &DispatchReport) {
        self.state.tags.retain(|tag| {
            let used = report.fired_for(&tag.source());
            if used {
                debug!(tag = tag.tag.name(), event = ?report.event, "tag redeemed");
            }
            !used
        });
    }

    fn apply_pending(&mut self, pending: Vec<PendingEffect>) {
        for PendingEffect { source, action } in pending {
            match action {
                PendingAction::CreateRandomTarot => {
                    self.create_random_tarot();
                }
                PendingAction::CreateCelestial(hand) => {
                    self.create_consumable(Consumable::Celestial(CelestialId::for_hand(hand)));
                }
                PendingAction::DiscardRandomHeldCards(count) => self.discard_random_held(count),
                PendingAction::GrowJokerMult { joker, amount } => {
                    match self.state.jokers.iter_mut().find(|j| j.id == joker) {
                        Some(state) => state.bonus_mult += amount,
                        None => warn!(?source, joker, "joker to grow is no longer owned"),
                    }
                }
                PendingAction::LevelDownHand(hand) => self.state.hands.level_down(hand),
            }
        }
    }

    // ------------------------------------------------------------------------
    // 結構性動作
    // ------------------------------------------------------------------------

    /// 放入消耗品欄位；欄位已滿時不產生
    pub fn create_consumable(&mut self, consumable: Consumable) -> bool {
        if !self.state.has_free_consumable_slot() {
            debug!(consumable = consumable.name(), "no free consumable slot");
            return false;
        }
        let id = self.state.ids.next_id();
        self.state.consumables.push(ConsumableState::new(id, consumable));
        true
    }

    /// 以新實體 id 作為種子產生隨機 Tarot
    pub fn create_random_tarot(&mut self) -> bool {
        if !self.state.has_free_consumable_slot() {
            return false;
        }
        let id = self.state.ids.next_id();
        let tarot = TarotId::roll(&seed_string(&[&self.state.seed, &id, &"tarot"]));
        self.state.consumables.push(ConsumableState::new(id, Consumable::Tarot(tarot)));
        true
    }

    /// 產生已解鎖牌型的隨機 Celestial
    pub fn create_random_celestial(&mut self) -> bool {
        if !self.state.has_free_consumable_slot() {
            return false;
        }
        let candidates = self.state.shop_context().unlocked_celestials();
        let id = self.state.ids.next_id();
        let seed = seed_string(&[&self.state.seed, &id, &"celestial"]);
        match CelestialId::roll(&seed, &candidates) {
            Some(celestial) => {
                self.state.consumables.push(ConsumableState::new(id, Consumable::Celestial(celestial)));
                true
            }
            None => false,
        }
    }

    /// 從手牌隨機位置起棄掉至多 `count` 張（靠近尾端時會少於 `count`）
    fn discard_random_held(&mut self, count: usize) {
        let len = self.state.gameplay.hand.len();
        if len == 0 {
            return;
        }
        let seed = seed_string(&[&self.state.seed, &self.state.round, &self.state.hands_played, &"hook"]);
        let start = random_int(&seed, 0, len as i64 - 1) as usize;
        let end = (start + count).min(len);

        let gameplay = &mut self.state.gameplay;
        let removed: Vec<CardId> = gameplay.hand.drain(start..end).collect();
        gameplay.selected.retain(|id| !removed.contains(id));
        debug!(?removed, "boss discarded held cards");
        gameplay.discarded.extend(removed);
    }
}

// ============================================================================
// 引擎
// ============================================================================

/// 一局遊戲的引擎：持有已提交的狀態、歷史與命令紀錄
///
/// 歷史與命令紀錄一一對應，最多保留 `undo_depth` 筆；
/// `Engine::replay(base, commands)` 永遠重現目前狀態。
#[derive(Clone, Debug)]
pub struct Engine {
    state: Arc<GameState>,
    history: Vec<Arc<GameState>>,
    log: Vec<Command>,
    undo_depth: usize,
    dispatcher: EventDispatcher,
}

impl Engine {
    pub fn new(seed: &str, config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_state(GameState::new(seed, config)).with_undo_depth(config.undo_depth))
    }

    pub fn from_state(state: GameState) -> Self {
        Self {
            state: Arc::new(state),
            history: Vec::new(),
            log: Vec::new(),
            undo_depth: UNDO_DEPTH,
            dispatcher: EventDispatcher::new(),
        }
    }

    /// 設定歷史深度，立即捨棄多出的舊紀錄
    pub fn with_undo_depth(mut self, depth: usize) -> Self {
        self.undo_depth = depth;
        self.trim_history();
        self
    }

    /// 使用自訂分派器（額外效果）
    pub fn with_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// 已提交狀態的共享快照
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.state)
    }

    /// 保留中的命令紀錄（從 `base()` 起算）
    pub fn commands(&self) -> &[Command] {
        &self.log
    }

    /// 命令紀錄起點的狀態
    pub fn base(&self) -> &GameState {
        self.history.first().unwrap_or(&self.state)
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// 套用一個命令；失敗時已提交的狀態不變
    pub fn apply(&mut self, cmd: Command) -> Result<Outcome, EngineError> {
        debug!(command = ?cmd, "applying command");
        let mut draft = Draft::new(GameState::clone(&self.state), &self.dispatcher);
        if let Err(err) = draft.apply(&cmd) {
            debug!(command = ?cmd, %err, "command rejected");
            return Err(err);
        }
        let (state, outcome) = draft.finish();
        let previous = std::mem::replace(&mut self.state, Arc::new(state));
        self.history.push(previous);
        self.log.push(cmd);
        self.trim_history();
        Ok(outcome)
    }

    fn trim_history(&mut self) {
        let excess = self.history.len().saturating_sub(self.undo_depth);
        if excess > 0 {
            self.history.drain(..excess);
            self.log.drain(..excess);
            debug!(dropped = excess, depth = self.undo_depth, "history trimmed");
        }
    }

    /// 復原上一個命令，回傳被丟棄的狀態
    pub fn undo(&mut self) -> Result<Arc<GameState>, EngineError> {
        let previous = self.history.pop().ok_or(EngineError::NothingToUndo)?;
        self.log.pop();
        Ok(std::mem::replace(&mut self.state, previous))
    }

    /// 從初始狀態依序重播命令
    pub fn replay(initial: GameState, commands: &[Command]) -> Result<Self, EngineError> {
        let mut engine = Self::from_state(initial);
        for cmd in commands {
            engine.apply(cmd.clone())?;
        }
        Ok(engine)
    }
}

/// 純函數形式：回傳套用後的新狀態，輸入狀態不變
pub fn apply(state: &GameState, cmd: &Command) -> Result<(GameState, Outcome), EngineError> {
    let dispatcher = EventDispatcher::new();
    let mut draft = Draft::new(state.clone(), &dispatcher);
    draft.apply(cmd)?;
    Ok(draft.finish())
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::effects::{Effect, EffectAction, EffectSource};
    use crate::game::joker::JokerId;
    use crate::game::tags::{TagId, TagState};

    fn engine() -> Engine {
        Engine::new("engine", &GameConfig::default()).unwrap()
    }

    #[test]
    fn test_rejected_command_keeps_state() {
        let mut engine = engine();
        let before = engine.snapshot();
        let err = engine.apply(Command::ShopReroll).unwrap_err();
        assert_eq!(err, EngineError::NotApplicable(NotApplicable::WrongStage(Stage::PreBlind)));
        assert!(Arc::ptr_eq(&before, &engine.snapshot()));
        assert!(engine.commands().is_empty());
    }

    #[test]
    fn test_snapshot_survives_later_commands() {
        let mut engine = engine();
        let before = engine.snapshot();
        engine.apply(Command::SmallBlindSelected).unwrap();
        assert_eq!(before.stage, Stage::PreBlind);
        assert_eq!(engine.state().stage, Stage::Blind);
    }

    #[test]
    fn test_undo() {
        let mut engine = engine();
        assert_eq!(engine.undo().unwrap_err(), EngineError::NothingToUndo);
        engine.apply(Command::SmallBlindSelected).unwrap();
        let discarded = engine.undo().unwrap();
        assert_eq!(discarded.stage, Stage::Blind);
        assert_eq!(engine.state().stage, Stage::PreBlind);
        assert!(engine.commands().is_empty());
    }

    #[test]
    fn test_replay_reproduces_state() {
        let mut engine = engine();
        let initial = GameState::clone(&engine.snapshot());
        engine.apply(Command::BlindSkipped).unwrap();
        engine.apply(Command::BigBlindSelected).unwrap();
        let first = engine.state().gameplay.hand[0];
        engine.apply(Command::CardSelected { id: first }).unwrap();
        engine.apply(Command::DiscardSelectedCards).unwrap();

        let replayed = Engine::replay(initial, engine.commands()).unwrap();
        assert_eq!(replayed.state(), engine.state());
    }

    #[test]
    fn test_history_is_bounded() {
        let config = GameConfig { undo_depth: 2, ..GameConfig::default() };
        let mut engine = Engine::new("bounded", &config).unwrap();
        engine.apply(Command::SmallBlindSelected).unwrap();
        let hand = engine.state().gameplay.hand.clone();
        for id in hand.iter().take(3) {
            engine.apply(Command::CardSelected { id: *id }).unwrap();
        }
        assert_eq!(engine.commands().len(), 2);
        assert_eq!(engine.base().gameplay.selected, vec![hand[0]]);

        let replayed = Engine::replay(engine.base().clone(), engine.commands()).unwrap();
        assert_eq!(replayed.state(), engine.state());

        engine.undo().unwrap();
        engine.undo().unwrap();
        assert_eq!(engine.state().gameplay.selected, vec![hand[0]]);
        assert_eq!(engine.undo().unwrap_err(), EngineError::NothingToUndo);
    }

    #[test]
    fn test_zero_depth_keeps_no_history() {
        let mut engine = engine().with_undo_depth(0);
        engine.apply(Command::SmallBlindSelected).unwrap();
        assert!(engine.commands().is_empty());
        assert_eq!(engine.base(), engine.state());
        assert_eq!(engine.undo().unwrap_err(), EngineError::NothingToUndo);
    }

    #[test]
    fn test_free_apply_leaves_input() {
        let state = GameState::new("pure", &GameConfig::default());
        let (next, outcome) = apply(&state, &Command::SmallBlindSelected).unwrap();
        assert_eq!(state.stage, Stage::PreBlind);
        assert_eq!(next.stage, Stage::Blind);
        assert_eq!(outcome.events(), vec![GameEvent::BlindSelected, GameEvent::HandDealt]);
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let mut state = GameState::new("over", &GameConfig::default());
        state.stage = Stage::End(crate::game::blinds::GameEnd::Lose);
        let err = apply(&state, &Command::SmallBlindSelected).unwrap_err();
        assert!(matches!(err, EngineError::NotApplicable(NotApplicable::WrongStage(_))));
    }

    #[test]
    fn test_custom_effects_run_after_owned() {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(EffectSource::Custom(1), Effect::on(GameEvent::BlindSelected, EffectAction::AddMoney(7)));
        let mut engine = engine().with_dispatcher(dispatcher);
        let outcome = engine.apply(Command::SmallBlindSelected).unwrap();
        assert!(outcome.fired_for(&EffectSource::Custom(1)));
        assert_eq!(engine.state().money, 11);
    }

    #[test]
    fn test_fired_tags_are_consumed() {
        let mut state = GameState::new("tags", &GameConfig::default());
        state.tags.push(TagState::new(500, TagId::SpeedTag));
        let dispatcher = EventDispatcher::new();
        let mut draft = Draft::new(state, &dispatcher);
        draft.state.blinds_skipped = 2;
        draft.dispatch(GameEvent::ShopOpened, &EventFrame::default());
        assert!(draft.state.tags.is_empty());
        assert_eq!(draft.state.money, 14);
    }

    #[test]
    fn test_pending_tarot_respects_slots() {
        let mut state = GameState::new("slots", &GameConfig::default());
        state.jokers.push(crate::game::joker::JokerState::new(600, JokerId::Cartomancer));
        let dispatcher = EventDispatcher::new();
        let mut draft = Draft::new(state, &dispatcher);
        for _ in 0..3 {
            draft.dispatch(GameEvent::BlindSelected, &EventFrame::default());
        }
        assert_eq!(draft.state.consumables.len(), 2);
        assert!(draft
            .state
            .consumables
            .iter()
            .all(|c| c.consumable.consumable_type() == ConsumableType::Tarot));
    }

    #[test]
    fn test_hook_removes_from_random_index() {
        let mut state = GameState::new("hook", &GameConfig::default());
        state.gameplay.hand = vec![1, 2, 3, 4, 5];
        let dispatcher = EventDispatcher::new();
        let mut draft = Draft::new(state, &dispatcher);
        draft.discard_random_held(2);
        let gameplay = &draft.state.gameplay;
        assert!(matches!(gameplay.discarded.len(), 1 | 2));
        assert_eq!(gameplay.hand.len() + gameplay.discarded.len(), 5);
        if gameplay.discarded.len() == 1 {
            assert_eq!(gameplay.discarded, vec![5]);
        }
    }
}
