//! 計分管線
//!
//! ```text
//! HandScoringStart → (CardScored)* → HandScoringDone
//!
//! Start : 判定牌型 → 基礎分數 = 牌型基礎 + 等級 × 每級增量 → 分派
//! Card  : 佇列最前的牌；Red 封印執行兩次
//!         chips += 點數 + 增強 + 版本
//!         mult  += 增強 + 版本 + Lucky
//!         mult  ×= Glass × Polychrome
//!         Gold 封印 / Lucky 給錢 → 分派 CardScored
//! Done  : 未計分的牌離開手牌 → Steel 持牌 ×1.5 → 分派 → 累加分數 → 結算
//! ```

use tracing::debug;

use crate::game::blinds::Stage;
use crate::game::cards::{Enhancement, PlayingCardState, Seal};
use crate::game::constants::{
    GLASS_BREAK_ODDS, GLASS_X_MULT, GOLD_SEAL_MONEY, LUCKY_MONEY_BONUS, LUCKY_MONEY_ODDS, LUCKY_MULT_BONUS,
    LUCKY_MULT_ODDS, STEEL_X_MULT,
};
use crate::game::effects::GameEvent;
use crate::game::hand_types::Score;
use crate::game::rng::roll_chance;
use crate::game::scoring::evaluate_hand;
use crate::seed;

use super::engine::{Draft, EventFrame};
use super::error::{EngineError, EntityKind, NotApplicable};
use super::state::HandScoring;

// ============================================================================
// 單張牌計分
// ============================================================================

/// 單張牌一次計分的貢獻
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardContribution {
    pub chips: i64,
    pub mult: f64,
    pub x_mult: f64,
    pub money: i64,
}

impl CardContribution {
    /// 先加法後乘法
    pub fn apply(&self, score: &mut Score) {
        score.chips += self.chips;
        score.mult += self.mult;
        score.mult *= self.x_mult;
    }
}

/// 計算單張牌的貢獻
///
/// Lucky 的兩個機率各自以 `(遊戲種子, 牌 id, 用途, 已出手數)` 為種子，
/// 機率乘以 `probability`。
pub fn score_card(card: &PlayingCardState, game_seed: &str, hands_played: u32, probability: f64) -> CardContribution {
    let edition = card.edition;
    let mut contribution = CardContribution {
        chips: card.base_chips() + card.enhancement_chips() + edition.chips(),
        mult: card.enhancement_mult() + edition.mult(),
        x_mult: 1.0,
        money: 0,
    };

    match card.enhancement {
        Enhancement::Lucky => {
            if roll_chance(&seed!(game_seed, card.id, "lucky_mult", hands_played), LUCKY_MULT_ODDS, probability) {
                contribution.mult += LUCKY_MULT_BONUS;
            }
            if roll_chance(&seed!(game_seed, card.id, "lucky_money", hands_played), LUCKY_MONEY_ODDS, probability) {
                contribution.money += LUCKY_MONEY_BONUS;
            }
        }
        Enhancement::Glass => contribution.x_mult *= GLASS_X_MULT,
        _ => {}
    }
    contribution.x_mult *= edition.x_mult();

    if card.seal == Seal::Gold {
        contribution.money += GOLD_SEAL_MONEY;
    }
    contribution
}

/// Glass 牌計分後是否破碎
pub fn glass_shatters(card: &PlayingCardState, game_seed: &str, hands_played: u32, probability: f64) -> bool {
    card.enhancement == Enhancement::Glass
        && roll_chance(&seed!(game_seed, card.id, "glass", hands_played), GLASS_BREAK_ODDS, probability)
}

// ============================================================================
// 管線
// ============================================================================

impl Draft<'_> {
    fn scoring_frame(&self, scoring: &HandScoring) -> EventFrame {
        EventFrame {
            hand: Some(scoring.hand),
            played: self.state.cards(&scoring.played),
            scored: self.state.cards(&scoring.scored),
            held: self.state.held_cards(),
            ..EventFrame::default()
        }
    }

    fn is_debuffed(&self, card: &PlayingCardState) -> bool {
        self.state
            .active_boss()
            .is_some_and(|boss| boss.debuffs(card, self.state.rules.all_cards_are_faces))
    }

    pub(crate) fn start_scoring(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Blind)?;
        let gameplay = &self.state.gameplay;
        if gameplay.scoring.is_some() {
            return Err(NotApplicable::ScoringInProgress.into());
        }
        if gameplay.selected.is_empty() {
            return Err(NotApplicable::NothingSelected.into());
        }
        if gameplay.remaining_hands == 0 {
            return Err(NotApplicable::NoHandsLeft.into());
        }
        if self.state.active_boss().is_some_and(|b| b.requires_five_cards()) && gameplay.selected.len() != 5 {
            return Err(NotApplicable::MustPlayExactly(5).into());
        }

        let selected = gameplay.selected.clone();
        let played = self.state.cards(&selected);
        let evaluation = evaluate_hand(&played, &self.state.rules);
        let hand = evaluation.hand;

        let state = &mut self.state;
        state.hands.record_played(hand);
        state.hands_played += 1;
        state.gameplay.remaining_hands -= 1;
        state.gameplay.last_hand = Some(hand);

        let scoring = HandScoring {
            hand,
            played: selected,
            scored: evaluation.scoring.iter().map(|c| c.id).collect(),
            queue: evaluation.scoring.iter().map(|c| c.id).collect(),
            score: Score::from_hand(&state.hands.score_for(hand)),
        };
        debug!(
            hand = hand.name(),
            level = state.hands.level(hand),
            chips = scoring.score.chips,
            mult = scoring.score.mult,
            scoring = scoring.scored.len(),
            "hand scoring started"
        );

        let mut score = scoring.score;
        let frame = self.scoring_frame(&scoring);
        self.dispatch_scored(GameEvent::HandScoringStart, &frame, &mut score);
        self.state.gameplay.scoring = Some(HandScoring { score, ..scoring });
        Ok(())
    }

    pub(crate) fn score_next_card(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Blind)?;
        let scoring = self
            .state
            .gameplay
            .scoring
            .as_mut()
            .ok_or(NotApplicable::NoScoringInProgress)?;
        let id = scoring.queue.pop_front().ok_or(NotApplicable::NothingLeftToScore)?;
        let snapshot = scoring.clone();
        let mut score = snapshot.score;

        let card = self
            .state
            .card(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Card, id))?;
        let debuffed = self.is_debuffed(&card);
        let probability = self.state.rules.probability_multiplier;

        if debuffed {
            debug!(card = %card, "debuffed card scores nothing");
        } else {
            let executions = if card.seal == Seal::Red { 2 } else { 1 };
            let frame = EventFrame { card: Some(card.clone()), ..self.scoring_frame(&snapshot) };
            for _ in 0..executions {
                let contribution = score_card(&card, &self.state.seed, self.state.hands_played, probability);
                contribution.apply(&mut score);
                self.state.add_money(contribution.money);
                self.dispatch_scored(GameEvent::CardScored, &frame, &mut score);
            }
        }

        let gameplay = &mut self.state.gameplay;
        gameplay.hand.retain(|c| *c != id);
        gameplay.selected.retain(|c| *c != id);
        gameplay.played.push(id);
        if let Some(scoring) = gameplay.scoring.as_mut() {
            scoring.score = score;
        }

        if !debuffed && glass_shatters(&card, &self.state.seed, self.state.hands_played, probability) {
            debug!(card = %card, "glass card shattered");
            self.state.destroy_card(id);
        }
        Ok(())
    }

    pub(crate) fn finish_scoring(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Blind)?;
        let scoring = self
            .state
            .gameplay
            .scoring
            .take()
            .ok_or(NotApplicable::NoScoringInProgress)?;
        if !scoring.queue.is_empty() {
            return Err(NotApplicable::CardsLeftToScore(scoring.queue.len()).into());
        }

        // 未計分的牌也離開手牌
        let gameplay = &mut self.state.gameplay;
        let rest = std::mem::take(&mut gameplay.selected);
        gameplay.hand.retain(|id| !rest.contains(id));
        gameplay.played.extend(rest);

        let mut score = scoring.score;
        let frame = self.scoring_frame(&scoring);
        for card in frame.held.iter().filter(|c| c.enhancement == Enhancement::Steel) {
            if !self.is_debuffed(card) {
                score.mult *= STEEL_X_MULT;
            }
        }
        self.dispatch_scored(GameEvent::HandScoringDone, &frame, &mut score);

        let total = score.total();
        let gameplay = &mut self.state.gameplay;
        gameplay.score += total;
        gameplay.last_hand_score = total;
        debug!(
            hand = scoring.hand.name(),
            chips = score.chips,
            mult = score.mult,
            total,
            blind_score = gameplay.score,
            "hand scored"
        );
        self.resolve_hand()
    }
}

// ============================================================================
// 單元測試
// ============================================================================
