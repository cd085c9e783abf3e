//! 消耗品的使用與賣出
//!
//! 消耗品先離開欄位再套用效果，因此 The Emperor 之類可以用自己空出的欄位。
//! 需要選牌的效果作用在目前選中的牌上；作用在手牌上的效果只能在 Blind 中使用。
//! 隨機性的種子為 `(遊戲種子, 消耗品 id, 用途)`。

use tracing::{debug, info};

use crate::game::blinds::Stage;
use crate::game::cards::{CardId, Edition, PlayingCardState, Rank, Suit};
use crate::game::consumables::{Consumable, ConsumableEffect, ConsumableType};
use crate::game::effects::GameEvent;
use crate::game::hand_types::HandId;
use crate::game::joker::JokerState;
use crate::game::rng::{random_int, roll_chance, shuffle};
use crate::game::shop::{roll_joker, roll_rarity};
use crate::seed;

use super::engine::{Draft, EventFrame};
use super::error::{EngineError, EntityKind, NotApplicable};

fn pick<T: Copy>(seed: &str, items: &[T]) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    let index = random_int(seed, 0, items.len() as i64 - 1);
    items.get(index as usize).copied()
}

impl Draft<'_> {
    pub(crate) fn use_consumable(&mut self, id: CardId, kind: ConsumableType) -> Result<(), EngineError> {
        if self.state.gameplay.scoring.is_some() {
            return Err(NotApplicable::ScoringInProgress.into());
        }
        let consumable = self
            .state
            .consumable(id)
            .map(|c| c.consumable)
            .ok_or_else(|| EngineError::not_found(EntityKind::Consumable, id))?;
        if consumable.consumable_type() != kind {
            return Err(NotApplicable::WrongItemKind(id).into());
        }
        let selected = self.state.gameplay.selected.len();
        if !consumable.accepts_selection(selected) {
            let (min, max) = consumable.selection_range();
            return Err(NotApplicable::InvalidSelection { min, max, selected }.into());
        }
        let effect = consumable.effect();
        self.check_usable(effect)?;

        self.state.consumables.retain(|c| c.id != id);
        info!(consumable = consumable.name(), selected, "consumable used");
        self.apply_consumable(id, effect);

        let event = match kind {
            ConsumableType::Tarot => GameEvent::TarotUsed,
            ConsumableType::Celestial => GameEvent::CelestialUsed,
            ConsumableType::Spectral => GameEvent::SpectralUsed,
        };
        self.dispatch(event, &EventFrame::subject(id));
        Ok(())
    }

    pub(crate) fn sell_consumable(&mut self, id: CardId) -> Result<(), EngineError> {
        if self.state.gameplay.scoring.is_some() {
            return Err(NotApplicable::ScoringInProgress.into());
        }
        let value = self
            .state
            .consumable(id)
            .map(|c| c.consumable.sell_value())
            .ok_or_else(|| EngineError::not_found(EntityKind::Consumable, id))?;
        self.state.consumables.retain(|c| c.id != id);
        self.state.add_money(value);
        debug!(consumable = id, value, "consumable sold");
        Ok(())
    }

    /// 效果本身的前置條件
    fn check_usable(&self, effect: ConsumableEffect) -> Result<(), EngineError> {
        use ConsumableEffect::*;
        match effect {
            JokerEditionChance { .. } if !self.state.jokers.iter().any(|j| j.edition == Edition::Normal) => {
                Err(NotApplicable::NoEligibleJoker.into())
            }
            NegativeJoker { .. } if !self.state.jokers.iter().any(|j| j.edition != Edition::Negative) => {
                Err(NotApplicable::NoEligibleJoker.into())
            }
            CreateJoker { .. } if !self.state.has_free_joker_slot() => Err(NotApplicable::JokerSlotsFull.into()),
            DestroyHeldForMoney { .. } | RandomizeHeldSuit | RandomizeHeldRank { .. } => {
                self.expect_stage(Stage::Blind)
            }
            _ => Ok(()),
        }
    }

    fn selected_ids(&self) -> Vec<CardId> {
        self.state.gameplay.selected.clone()
    }

    fn for_each_selected(&mut self, mut change: impl FnMut(&mut PlayingCardState)) {
        for id in self.selected_ids() {
            if let Some(card) = self.state.card_mut(id) {
                change(card);
            }
        }
    }

    fn for_each_in_hand(&mut self, mut change: impl FnMut(&mut PlayingCardState)) {
        for id in self.state.gameplay.hand.clone() {
            if let Some(card) = self.state.card_mut(id) {
                change(card);
            }
        }
    }

    fn shrink_hand_size(&mut self, penalty: usize) {
        let rules = &mut self.state.rules;
        rules.hand_size = rules.hand_size.saturating_sub(penalty).max(1);
    }

    fn apply_consumable(&mut self, id: CardId, effect: ConsumableEffect) {
        use ConsumableEffect::*;
        let game_seed = self.state.seed.clone();
        match effect {
            Enhance(enhancement) => self.for_each_selected(|card| card.enhancement = enhancement),
            ChangeSuit(suit) => self.for_each_selected(|card| card.def.suit = suit),
            IncreaseRank => self.for_each_selected(|card| card.def.rank = card.def.rank.next()),
            ApplySeal(seal) => self.for_each_selected(|card| card.seal = seal),
            RandomEdition => {
                let edition = pick(&seed!(game_seed, id, "edition"), Edition::all_common()).unwrap_or_default();
                self.for_each_selected(|card| card.edition = edition);
            }
            DestroySelected => {
                for card in self.selected_ids() {
                    self.state.destroy_card(card);
                }
            }
            CopyRightOntoLeft => self.copy_right_onto_left(),
            DuplicateSelected(copies) => {
                for source in self.state.cards(&self.selected_ids()) {
                    for _ in 0..copies {
                        let mut copy = source.clone();
                        copy.id = self.state.ids.next_id();
                        self.state.gameplay.hand.push(copy.id);
                        self.state.deck.push(copy);
                    }
                }
            }

            DoubleMoney { cap } => {
                let bonus = self.state.money.clamp(0, cap);
                self.state.add_money(bonus);
            }
            JokerSellValue { cap } => {
                let total: i64 = self.state.jokers.iter().map(|j| j.sell_value).sum();
                self.state.add_money(total.min(cap));
            }

            CreateTarots(count) => {
                for _ in 0..count {
                    self.create_random_tarot();
                }
            }
            CreateCelestials(count) => {
                for _ in 0..count {
                    self.create_random_celestial();
                }
            }
            CreateJoker { rarity, reset_money } => {
                let rarity = rarity.unwrap_or_else(|| roll_rarity(&seed!(game_seed, id, "rarity")));
                let ctx = self.state.shop_context();
                if let Some(joker) = roll_joker(&seed!(game_seed, id, "joker"), rarity, &ctx) {
                    let joker_id = self.state.ids.next_id();
                    self.state.jokers.push(JokerState::new(joker_id, joker));
                    self.dispatch(GameEvent::JokerAdded, &EventFrame::subject(joker_id));
                }
                if reset_money {
                    self.state.money = self.state.rules.money_floor.max(0);
                }
            }
            JokerEditionChance { odds } => {
                let probability = self.state.rules.probability_multiplier;
                if roll_chance(&seed!(game_seed, id, "wheel"), odds, probability) {
                    let candidates: Vec<CardId> = self
                        .state
                        .jokers
                        .iter()
                        .filter(|j| j.edition == Edition::Normal)
                        .map(|j| j.id)
                        .collect();
                    let target = pick(&seed!(game_seed, id, "wheel_joker"), &candidates);
                    let edition = pick(&seed!(game_seed, id, "wheel_edition"), Edition::all_common());
                    if let (Some(target), Some(edition)) = (target, edition) {
                        if let Some(joker) = self.state.jokers.iter_mut().find(|j| j.id == target) {
                            joker.edition = edition;
                        }
                    }
                } else {
                    debug!("wheel of fortune missed");
                }
            }
            NegativeJoker { hand_size_penalty } => {
                let candidates: Vec<CardId> = self
                    .state
                    .jokers
                    .iter()
                    .filter(|j| j.edition != Edition::Negative)
                    .map(|j| j.id)
                    .collect();
                if let Some(target) = pick(&seed!(game_seed, id, "negative"), &candidates) {
                    if let Some(joker) = self.state.jokers.iter_mut().find(|j| j.id == target) {
                        joker.edition = Edition::Negative;
                    }
                }
                self.shrink_hand_size(hand_size_penalty);
            }

            LevelUp(hands) => {
                for hand in hands {
                    self.state.hands.level_up(*hand, 1);
                }
            }
            LevelUpAll => {
                for hand in HandId::all() {
                    self.state.hands.level_up(*hand, 1);
                }
            }

            DestroyHeldForMoney { count, money } => {
                let mut hand = self.state.gameplay.hand.clone();
                shuffle(&seed!(game_seed, id, "destroy"), &mut hand);
                for card in hand.into_iter().take(count) {
                    self.state.destroy_card(card);
                }
                self.state.add_money(money);
            }
            RandomizeHeldSuit => {
                if let Some(suit) = pick(&seed!(game_seed, id, "suit"), Suit::all()) {
                    self.for_each_in_hand(|card| card.def.suit = suit);
                }
            }
            RandomizeHeldRank { hand_size_penalty } => {
                if let Some(rank) = pick::<Rank>(&seed!(game_seed, id, "rank"), Rank::all()) {
                    self.for_each_in_hand(|card| card.def.rank = rank);
                }
                self.shrink_hand_size(hand_size_penalty);
            }
        }
    }

    /// 依手牌位置：左邊的牌變成右邊那張的複製（保留自己的 id）
    fn copy_right_onto_left(&mut self) {
        let gameplay = &self.state.gameplay;
        let mut ordered: Vec<CardId> = gameplay
            .hand
            .iter()
            .copied()
            .filter(|id| gameplay.selected.contains(id))
            .collect();
        if ordered.len() != 2 {
            ordered = gameplay.selected.clone();
        }
        let (Some(&left), Some(&right)) = (ordered.first(), ordered.last()) else {
            return;
        };
        let Some(source) = self.state.card(right).cloned() else {
            return;
        };
        if let Some(card) = self.state.card_mut(left) {
            *card = PlayingCardState { id: left, ..source };
        }
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::blinds::BlindType;
    use crate::game::cards::{CardDef, Enhancement, Seal};
    use crate::game::config::GameConfig;
    use crate::game::consumables::{CelestialId, ConsumableState, SpectralId, TarotId};
    use crate::game::joker::JokerId;
    use crate::service::commands::Command;
    use crate::service::engine::Engine;
    use crate::service::state::GameState;

    /// Blind 中持有一張消耗品，並選中手牌前 `select` 張
    fn holding(seed: &str, consumable: Consumable, select: usize) -> (Engine, CardId) {
        let mut engine = Engine::new(seed, &GameConfig::default()).unwrap();
        engine.apply(Command::SmallBlindSelected).unwrap();
        let mut state = engine.state().clone();
        let id = state.ids.next_id();
        state.consumables.push(ConsumableState::new(id, consumable));
        let mut engine = Engine::from_state(state);
        for card in engine.state().gameplay.hand.clone().into_iter().take(select) {
            engine.apply(Command::CardSelected { id: card }).unwrap();
        }
        (engine, id)
    }

    fn selected_cards(engine: &Engine) -> Vec<PlayingCardState> {
        engine.state().cards(&engine.state().gameplay.selected)
    }

    fn use_it(engine: &mut Engine, consumable: Consumable, id: CardId) -> Result<(), EngineError> {
        engine
            .apply(Command::use_consumable(consumable.consumable_type(), id))
            .map(|_| ())
    }

    #[test]
    fn test_enhance_selected() {
        let tarot = Consumable::Tarot(TarotId::TheMagician);
        let (mut engine, id) = holding("magician", tarot, 2);
        let outcome = engine.apply(Command::TarotCardUsed { id }).unwrap();
        assert_eq!(outcome.events(), vec![GameEvent::TarotUsed]);
        assert!(selected_cards(&engine).iter().all(|c| c.enhancement == Enhancement::Lucky));
        assert!(engine.state().consumables.is_empty());
    }

    #[test]
    fn test_selection_bounds() {
        let tarot = Consumable::Tarot(TarotId::TheMagician);
        let (mut engine, id) = holding("bounds", tarot, 3);
        assert_eq!(
            use_it(&mut engine, tarot, id).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::InvalidSelection { min: 1, max: 2, selected: 3 })
        );
        let (mut engine, id) = holding("bounds", tarot, 0);
        assert!(use_it(&mut engine, tarot, id).is_err());
    }

    #[test]
    fn test_wrong_command_kind() {
        let planet = Consumable::Celestial(CelestialId::Pluto);
        let (mut engine, id) = holding("kind", planet, 0);
        assert_eq!(
            engine.apply(Command::TarotCardUsed { id }).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::WrongItemKind(id))
        );
        assert_eq!(
            engine.apply(Command::CelestialCardUsed { id: 9999 }).unwrap_err(),
            EngineError::not_found(EntityKind::Consumable, 9999)
        );
    }

    #[test]
    fn test_celestial_levels_up() {
        let planet = Consumable::Celestial(CelestialId::for_hand(HandId::Flush));
        let (mut engine, id) = holding("planet", planet, 0);
        let outcome = engine.apply(Command::CelestialCardUsed { id }).unwrap();
        assert_eq!(outcome.events(), vec![GameEvent::CelestialUsed]);
        assert_eq!(engine.state().hands.level(HandId::Flush), 1);
        assert_eq!(engine.state().hands.level(HandId::Pair), 0);
    }

    #[test]
    fn test_black_hole_levels_everything() {
        let spectral = Consumable::Spectral(SpectralId::BlackHole);
        let (mut engine, id) = holding("hole", spectral, 0);
        use_it(&mut engine, spectral, id).unwrap();
        assert!(HandId::all().iter().all(|h| engine.state().hands.level(*h) == 1));
    }

    #[test]
    fn test_strength_and_suits() {
        let (mut engine, id) = holding("strength", Consumable::Tarot(TarotId::Strength), 1);
        let before = selected_cards(&engine)[0].rank();
        engine.apply(Command::TarotCardUsed { id }).unwrap();
        assert_eq!(selected_cards(&engine)[0].rank(), before.next());

        let (mut engine, id) = holding("star", Consumable::Tarot(TarotId::TheStar), 3);
        engine.apply(Command::TarotCardUsed { id }).unwrap();
        assert!(selected_cards(&engine).iter().all(|c| c.suit() == Suit::Diamonds));
    }

    #[test]
    fn test_hanged_man_destroys() {
        let (mut engine, id) = holding("hanged", Consumable::Tarot(TarotId::TheHangedMan), 2);
        let doomed = engine.state().gameplay.selected.clone();
        engine.apply(Command::TarotCardUsed { id }).unwrap();
        let state = engine.state();
        assert_eq!(state.deck.len(), 50);
        assert!(doomed.iter().all(|c| state.card(*c).is_none()));
        assert!(state.gameplay.selected.is_empty());
        assert_eq!(state.gameplay.hand.len(), 6);
    }

    #[test]
    fn test_death_copies_right_onto_left() {
        let (engine, id) = holding("death", Consumable::Tarot(TarotId::Death), 0);
        let mut state = engine.state().clone();
        let hand = state.gameplay.hand.clone();
        let (left, right) = (hand[1], hand[4]);
        state.card_mut(left).unwrap().def = CardDef::new(Rank::Two, Suit::Clubs);
        let target = state.card_mut(right).unwrap();
        target.def = CardDef::new(Rank::Ace, Suit::Hearts);
        target.seal = Seal::Gold;
        // 選擇順序與手牌位置相反
        state.gameplay.selected = vec![right, left];
        let mut engine = Engine::from_state(state);

        engine.apply(Command::TarotCardUsed { id }).unwrap();
        let copied = engine.state().card(left).unwrap();
        assert_eq!(copied.id, left);
        assert_eq!(copied.def, CardDef::new(Rank::Ace, Suit::Hearts));
        assert_eq!(copied.seal, Seal::Gold);
        assert_eq!(engine.state().card(right).unwrap().def, CardDef::new(Rank::Ace, Suit::Hearts));
    }

    #[test]
    fn test_hermit_doubles_money_with_cap() {
        let (engine, id) = holding("hermit", Consumable::Tarot(TarotId::TheHermit), 0);
        let mut state = engine.state().clone();
        state.money = 30;
        let mut engine = Engine::from_state(state);
        engine.apply(Command::TarotCardUsed { id }).unwrap();
        assert_eq!(engine.state().money, 50);
    }

    #[test]
    fn test_temperance_pays_sell_values() {
        let (engine, id) = holding("temperance", Consumable::Tarot(TarotId::Temperance), 0);
        let mut state = engine.state().clone();
        state.jokers.push(JokerState::new(800, JokerId::Bull));
        state.jokers.push(JokerState::new(801, JokerId::Joker));
        let expected = state.money + state.jokers.iter().map(|j| j.sell_value).sum::<i64>();
        let mut engine = Engine::from_state(state);
        engine.apply(Command::TarotCardUsed { id }).unwrap();
        assert_eq!(engine.state().money, expected);
    }

    #[test]
    fn test_emperor_uses_freed_slot() {
        let (mut engine, id) = holding("emperor", Consumable::Tarot(TarotId::TheEmperor), 0);
        engine.apply(Command::TarotCardUsed { id }).unwrap();
        let state = engine.state();
        assert_eq!(state.consumables.len(), 2);
        assert!(state
            .consumables
            .iter()
            .all(|c| c.consumable.consumable_type() == ConsumableType::Tarot));
    }

    #[test]
    fn test_seal_spectral() {
        let spectral = Consumable::Spectral(SpectralId::DejaVu);
        let (mut engine, id) = holding("dejavu", spectral, 1);
        use_it(&mut engine, spectral, id).unwrap();
        assert_eq!(selected_cards(&engine)[0].seal, Seal::Red);
    }

    #[test]
    fn test_aura_gives_edition() {
        let spectral = Consumable::Spectral(SpectralId::Aura);
        let (mut engine, id) = holding("aura", spectral, 1);
        use_it(&mut engine, spectral, id).unwrap();
        assert!(Edition::all_common().contains(&selected_cards(&engine)[0].edition));
    }

    #[test]
    fn test_cryptid_duplicates_into_hand() {
        let spectral = Consumable::Spectral(SpectralId::Cryptid);
        let (mut engine, id) = holding("cryptid", spectral, 1);
        let source = selected_cards(&engine)[0].clone();
        use_it(&mut engine, spectral, id).unwrap();
        let state = engine.state();
        assert_eq!(state.deck.len(), 54);
        assert_eq!(state.gameplay.hand.len(), 10);
        let copies: Vec<_> = state.deck.iter().filter(|c| c.def == source.def).collect();
        assert_eq!(copies.len(), 3);
    }

    #[test]
    fn test_immolate() {
        let spectral = Consumable::Spectral(SpectralId::Immolate);
        let (mut engine, id) = holding("immolate", spectral, 0);
        let money = engine.state().money;
        use_it(&mut engine, spectral, id).unwrap();
        let state = engine.state();
        assert_eq!(state.deck.len(), 47);
        assert_eq!(state.gameplay.hand.len(), 3);
        assert_eq!(state.money, money + 20);
    }

    #[test]
    fn test_held_card_spectrals_need_a_blind() {
        let mut state = GameState::new("shop", &GameConfig::default());
        state.stage = Stage::Shop;
        state.current_blind = Some(BlindType::Small);
        state.consumables.push(ConsumableState::new(900, Consumable::Spectral(SpectralId::Sigil)));
        let mut engine = Engine::from_state(state);
        assert_eq!(
            engine.apply(Command::SpectralCardUsed { id: 900 }).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::WrongStage(Stage::Shop))
        );
    }

    #[test]
    fn test_sigil_and_ouija() {
        let spectral = Consumable::Spectral(SpectralId::Sigil);
        let (mut engine, id) = holding("sigil", spectral, 0);
        use_it(&mut engine, spectral, id).unwrap();
        let held = engine.state().cards(&engine.state().gameplay.hand);
        assert!(held.iter().all(|c| c.suit() == held[0].suit()));

        let spectral = Consumable::Spectral(SpectralId::Ouija);
        let (mut engine, id) = holding("ouija", spectral, 0);
        use_it(&mut engine, spectral, id).unwrap();
        let held = engine.state().cards(&engine.state().gameplay.hand);
        assert!(held.iter().all(|c| c.rank() == held[0].rank()));
        assert_eq!(engine.state().rules.hand_size, 7);
    }

    #[test]
    fn test_wraith_creates_rare_and_resets_money() {
        let spectral = Consumable::Spectral(SpectralId::Wraith);
        let (mut engine, id) = holding("wraith", spectral, 0);
        let outcome = engine.apply(Command::SpectralCardUsed { id }).unwrap();
        let state = engine.state();
        assert_eq!(state.money, 0);
        assert_eq!(state.jokers.len(), 1);
        assert_eq!(state.jokers[0].joker.rarity(), crate::game::joker_def::Rarity::Rare);
        assert_eq!(outcome.events(), vec![GameEvent::JokerAdded, GameEvent::SpectralUsed]);
    }

    #[test]
    fn test_wraith_keeps_money_at_positive_floor() {
        let spectral = Consumable::Spectral(SpectralId::Wraith);
        let (engine, id) = holding("wraith_floor", spectral, 0);
        let mut state = engine.state().clone();
        state.rules.money_floor = 5;
        state.money = 10;
        let mut engine = Engine::from_state(state);
        engine.apply(Command::SpectralCardUsed { id }).unwrap();
        assert_eq!(engine.state().money, 5);
    }

    #[test]
    fn test_joker_spectrals_need_a_joker() {
        let spectral = Consumable::Spectral(SpectralId::Ectoplasm);
        let (mut engine, id) = holding("ecto", spectral, 0);
        assert_eq!(
            use_it(&mut engine, spectral, id).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::NoEligibleJoker)
        );

        let mut state = engine.state().clone();
        state.jokers.push(JokerState::new(800, JokerId::Joker));
        let mut engine = Engine::from_state(state);
        use_it(&mut engine, spectral, id).unwrap();
        assert_eq!(engine.state().jokers[0].edition, Edition::Negative);
        assert_eq!(engine.state().rules.hand_size, 7);
    }

    #[test]
    fn test_judgement_needs_joker_slot() {
        let (engine, id) = holding("judgement", Consumable::Tarot(TarotId::Judgement), 0);
        let mut state = engine.state().clone();
        state.rules.joker_slots = 0;
        let mut engine = Engine::from_state(state);
        assert_eq!(
            engine.apply(Command::TarotCardUsed { id }).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::JokerSlotsFull)
        );
    }

    #[test]
    fn test_sell_consumable() {
        let (mut engine, id) = holding("sell", Consumable::Spectral(SpectralId::Aura), 0);
        let money = engine.state().money;
        engine.apply(Command::ConsumableSold { id }).unwrap();
        assert_eq!(engine.state().money, money + 2);
        assert!(engine.state().consumables.is_empty());
    }
}
