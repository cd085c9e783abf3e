//! Blind 狀態機
//!
//! ```text
//! PreBlind ──select──→ Blind ──擊敗──→ Shop ──close──→ PreBlind
//!    │ skip（Small/Big）      └─出牌用完──→ End(Lose)
//!    └──→ PreBlind（下一個 Blind）
//! 擊敗 Boss：回合 +1；擊敗最終回合 Boss → End(Win)
//! ```

use tracing::{debug, info};

use crate::game::blinds::{BlindType, GameEnd, RewardKind, RoundBlinds, Stage};
use crate::game::cards::{CardId, Enhancement, Seal};
use crate::game::constants::{GOLD_CARD_MONEY, MONEY_PER_REMAINING_HAND};
use crate::game::consumables::{CelestialId, Consumable};
use crate::game::effects::GameEvent;
use crate::game::rng::{seed_string, shuffle};
use crate::game::tags::TagState;

use super::engine::{Draft, EventFrame};
use super::error::{EngineError, EntityKind, NotApplicable};
use super::state::GameplayState;

impl Draft<'_> {
    // ------------------------------------------------------------------------
    // 選擇 / 跳過
    // ------------------------------------------------------------------------

    pub(crate) fn select_blind(&mut self, kind: BlindType) -> Result<(), EngineError> {
        self.expect_stage(Stage::PreBlind)?;
        if self.state.blinds.next_pending() != Some(kind) {
            return Err(NotApplicable::BlindNotNext(kind).into());
        }
        self.state.blinds.get_mut(kind).start()?;
        self.state.current_blind = Some(kind);

        let state = &mut self.state;
        let mut draw_pile: Vec<CardId> = state.deck.iter().map(|c| c.id).collect();
        let seed = seed_string(&[&state.seed, &state.round, &(kind as u8), &"shuffle"]);
        shuffle(&seed, &mut draw_pile);

        let boss = state.blinds.get(kind).boss;
        let hands = boss.and_then(|b| b.max_hands()).map_or(state.rules.hands_per_round, |max| {
            max.min(state.rules.hands_per_round)
        });
        let discards = boss.and_then(|b| b.max_discards()).map_or(state.rules.discards_per_round, |max| {
            max.min(state.rules.discards_per_round)
        });
        state.gameplay = GameplayState {
            draw_pile,
            remaining_hands: hands,
            remaining_discards: discards,
            ..GameplayState::default()
        };
        state.stage = Stage::Blind;
        debug!(
            round = state.round,
            blind = kind.name(),
            boss = boss.map(|b| b.name()),
            target = state.blinds.get(kind).target,
            "blind selected"
        );

        self.dispatch(GameEvent::BlindSelected, &EventFrame::default());
        self.deal()
    }

    pub(crate) fn skip_blind(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::PreBlind)?;
        let kind = self
            .state
            .blinds
            .next_pending()
            .ok_or(NotApplicable::WrongStage(self.state.stage))?;
        self.state.blinds.get_mut(kind).skip()?;

        if let Some(tag) = self.state.blinds.get(kind).skip_tag {
            let id = self.state.ids.next_id();
            self.state.tags.push(TagState::new(id, tag));
            debug!(blind = kind.name(), tag = tag.name(), "blind skipped");
        }
        self.state.blinds_skipped += 1;
        self.dispatch(GameEvent::BlindSkipped, &EventFrame::default());
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 手牌
    // ------------------------------------------------------------------------

    fn expect_playing(&self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Blind)?;
        if self.state.gameplay.scoring.is_some() {
            return Err(NotApplicable::ScoringInProgress.into());
        }
        Ok(())
    }

    /// 補牌到手牌上限並分派 HandDealt
    fn deal(&mut self) -> Result<(), EngineError> {
        let hand_size = self.state.rules.hand_size;
        let gameplay = &mut self.state.gameplay;
        let missing = hand_size.saturating_sub(gameplay.hand.len()).min(gameplay.draw_pile.len());
        let drawn: Vec<CardId> = gameplay.draw_pile.drain(..missing).collect();
        gameplay.hand.extend(drawn);

        let frame = EventFrame { held: self.state.held_cards(), ..EventFrame::default() };
        self.dispatch(GameEvent::HandDealt, &frame);
        Ok(())
    }

    pub(crate) fn deal_hand(&mut self) -> Result<(), EngineError> {
        self.expect_playing()?;
        self.deal()
    }

    pub(crate) fn select_card(&mut self, id: CardId) -> Result<(), EngineError> {
        self.expect_playing()?;
        let max = self.state.rules.max_selected;
        let gameplay = &mut self.state.gameplay;
        if !gameplay.hand.contains(&id) {
            return Err(EngineError::not_found(EntityKind::Card, id));
        }
        if gameplay.selected.contains(&id) {
            return Err(NotApplicable::AlreadySelected(id).into());
        }
        if gameplay.selected.len() >= max {
            return Err(NotApplicable::SelectionFull(max).into());
        }
        gameplay.selected.push(id);
        Ok(())
    }

    pub(crate) fn deselect_card(&mut self, id: CardId) -> Result<(), EngineError> {
        self.expect_playing()?;
        let gameplay = &mut self.state.gameplay;
        if !gameplay.hand.contains(&id) {
            return Err(EngineError::not_found(EntityKind::Card, id));
        }
        let pos = gameplay
            .selected
            .iter()
            .position(|c| *c == id)
            .ok_or(NotApplicable::NotSelected(id))?;
        gameplay.selected.remove(pos);
        Ok(())
    }

    pub(crate) fn discard_selected(&mut self) -> Result<(), EngineError> {
        self.expect_playing()?;
        let gameplay = &mut self.state.gameplay;
        if gameplay.selected.is_empty() {
            return Err(NotApplicable::NothingSelected.into());
        }
        if gameplay.remaining_discards == 0 {
            return Err(NotApplicable::NoDiscardsLeft.into());
        }
        gameplay.remaining_discards -= 1;
        let discarded = std::mem::take(&mut gameplay.selected);
        gameplay.hand.retain(|id| !discarded.contains(id));
        gameplay.discarded.extend(discarded.iter().copied());

        let cards = self.state.cards(&discarded);
        // Purple 封印：棄牌時產生 Tarot
        for _ in cards.iter().filter(|c| c.seal == Seal::Purple) {
            self.create_random_tarot();
        }
        let frame = EventFrame { played: cards, held: self.state.held_cards(), ..EventFrame::default() };
        self.dispatch(GameEvent::CardsDiscarded, &frame);
        self.deal()
    }

    // ------------------------------------------------------------------------
    // 結算
    // ------------------------------------------------------------------------

    /// 一手牌計分結束後：判定擊敗、失敗或繼續
    pub(crate) fn resolve_hand(&mut self) -> Result<(), EngineError> {
        let kind = self
            .state
            .blinds
            .in_progress()
            .ok_or(NotApplicable::WrongStage(self.state.stage))?;
        let target = self.state.blinds.get(kind).target;

        if self.state.gameplay.score >= target {
            self.defeat_blind(kind)
        } else if self.state.gameplay.remaining_hands == 0 {
            info!(round = self.state.round, blind = kind.name(), score = self.state.gameplay.score, target, "game lost");
            self.state.stage = Stage::End(GameEnd::Lose);
            Ok(())
        } else {
            self.deal()
        }
    }

    fn defeat_blind(&mut self, kind: BlindType) -> Result<(), EngineError> {
        let held = self.state.held_cards();
        let gold_cards = held.iter().filter(|c| c.enhancement == Enhancement::Gold).count() as i64;

        let mut reward = self.state.blinds.get(kind).reward.clone();
        reward.add_bonus(
            RewardKind::RemainingHands,
            self.state.gameplay.remaining_hands as i64 * MONEY_PER_REMAINING_HAND,
        );
        reward.add_bonus(RewardKind::Interest, self.state.interest());
        reward.add_bonus(RewardKind::GoldCards, gold_cards * GOLD_CARD_MONEY);
        self.state.add_money(reward.total());
        info!(
            round = self.state.round,
            blind = kind.name(),
            score = self.state.gameplay.score,
            reward = reward.total(),
            "blind defeated"
        );
        self.state.last_reward = Some(reward);

        // Boss 狀態在分派時仍為進行中
        let frame = EventFrame { held: held.clone(), ..EventFrame::default() };
        self.dispatch(GameEvent::BlindDefeated, &frame);

        // Blue 封印：留在手中時產生最後一手牌型的 Celestial
        if let Some(hand) = self.state.gameplay.last_hand {
            for _ in held.iter().filter(|c| c.seal == Seal::Blue) {
                self.create_consumable(Consumable::Celestial(CelestialId::for_hand(hand)));
            }
        }

        self.state.blinds.get_mut(kind).complete()?;
        let state = &mut self.state;
        let gameplay = &mut state.gameplay;
        gameplay.draw_pile.clear();
        gameplay.hand.clear();
        gameplay.selected.clear();
        gameplay.played.clear();
        gameplay.discarded.clear();
        gameplay.remaining_hands = state.rules.hands_per_round;
        gameplay.remaining_discards = state.rules.discards_per_round;
        state.shop = None;
        state.stage = Stage::Shop;

        if kind == BlindType::Boss {
            if state.rules.winning_round == Some(state.round) {
                info!(round = state.round, "game won");
                state.stage = Stage::End(GameEnd::Win);
            } else {
                state.round += 1;
                state.blinds = RoundBlinds::new(&state.seed, state.round, state.rules.winning_round);
                info!(round = state.round, boss = ?state.blinds.boss_id(), "round advanced");
            }
        }
        Ok(())
    }
}

// ============================================================================
// 單元測試
// ============================================================================
