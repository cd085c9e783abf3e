//! Service-layer integration tests (blind → shop → next round flows)

#[cfg(test)]
mod tests {
    use crate::game::blinds::{BlindStatus, BlindType, GameEnd, Stage};
    use crate::game::config::GameConfig;
    use crate::game::effects::{Effect, EffectAction, EffectSource, EventDispatcher, GameEvent};
    use crate::game::shop::BuyableItem;
    use crate::game::tags::TagId;
    use crate::service::{apply, Command, Engine, EngineError, GameState, NotApplicable, Outcome};

    /// 每手牌 ×1000，保證擊敗任何 Blind
    fn strong_engine(seed: &str, config: &GameConfig) -> Engine {
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(
            EffectSource::Custom(1),
            Effect::on(GameEvent::HandScoringDone, EffectAction::MultiplyMult(1000.0)),
        );
        Engine::new(seed, config).unwrap().with_dispatcher(dispatcher)
    }

    /// 選手牌前 `count` 張並完整計分
    fn play_first(engine: &mut Engine, count: usize) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        let hand: Vec<_> = engine.state().gameplay.hand.iter().copied().take(count).collect();
        for id in hand {
            outcomes.push(engine.apply(Command::CardSelected { id }).unwrap());
        }
        outcomes.push(engine.apply(Command::HandScoringStart).unwrap());
        while engine.state().gameplay.scoring.as_ref().is_some_and(|s| !s.queue.is_empty()) {
            outcomes.push(engine.apply(Command::CardScored).unwrap());
        }
        outcomes.push(engine.apply(Command::HandScoringDone).unwrap());
        outcomes
    }

    /// 擊敗 Boss 後若未獲勝，回合前進且 Blind 重建
    fn beat_blind(engine: &mut Engine, kind: BlindType) {
        let round = engine.state().round;
        engine.apply(Command::select_blind(kind)).unwrap();
        play_first(engine, 5);
        let state = engine.state();
        if kind == BlindType::Boss && state.stage != Stage::End(GameEnd::Win) {
            assert_eq!(state.round, round + 1);
            assert_eq!(state.blinds.next_pending(), Some(BlindType::Small));
            assert_eq!(state.blinds.get(BlindType::Boss).status, BlindStatus::NotStarted);
        } else {
            assert_eq!(state.round, round);
            assert_eq!(state.blinds.get(kind).status, BlindStatus::Completed, "{kind:?}");
        }
    }

    #[test]
    fn test_blind_to_shop_and_back() {
        let mut engine = strong_engine("flow", &GameConfig::default());
        beat_blind(&mut engine, BlindType::Small);

        let state = engine.state();
        assert_eq!(state.stage, Stage::Shop);
        // $4 起始 + $3 Small Blind + 3 手剩餘出牌；$4 的利息為 0
        assert_eq!(state.money, 10);
        assert!(state.gameplay.hand.is_empty());

        engine.apply(Command::ShopOpen).unwrap();
        let shop = engine.state().shop.clone().unwrap();
        if let Some(item) = shop.items.iter().find(|i| i.price <= 10) {
            engine.apply(Command::ShopBuyCard { id: item.id() }).unwrap();
            assert_eq!(engine.state().money, 10 - item.price);
            match &item.item {
                BuyableItem::Joker(j) => assert!(engine.state().joker(j.id).is_some()),
                BuyableItem::Consumable(c) => assert!(engine.state().consumable(c.id).is_some()),
                BuyableItem::PlayingCard(c) => assert_eq!(engine.state().deck.len(), 53, "{c}"),
            }
        }
        engine.apply(Command::ShopClose).unwrap();
        assert_eq!(engine.state().stage, Stage::PreBlind);

        assert_eq!(
            engine.apply(Command::SmallBlindSelected).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::BlindNotNext(BlindType::Small))
        );
        engine.apply(Command::BigBlindSelected).unwrap();
        assert_eq!(engine.state().gameplay.hand.len(), 8);
        assert_eq!(engine.state().gameplay.score, 0);
    }

    #[test]
    fn test_boss_advances_round() {
        let mut engine = strong_engine("rounds", &GameConfig::default());
        for kind in BlindType::all() {
            beat_blind(&mut engine, *kind);
            if *kind != BlindType::Boss {
                engine.apply(Command::ShopClose).unwrap();
            }
        }

        let state = engine.state();
        assert_eq!(state.stage, Stage::Shop);
        assert_eq!(state.round, 2);
        assert_eq!(state.blinds.round, 2);
        assert_eq!(state.blinds.next_pending(), Some(BlindType::Small));
        assert_eq!(state.hands_played, 3);

        engine.apply(Command::ShopClose).unwrap();
        engine.apply(Command::SmallBlindSelected).unwrap();
        assert_eq!(engine.state().blinds.small.target, 800);
    }

    #[test]
    fn test_final_boss_wins_the_game() {
        let mut config = GameConfig::default();
        config.rules.winning_round = Some(1);
        let mut engine = strong_engine("win", &config);
        for kind in BlindType::all() {
            beat_blind(&mut engine, *kind);
            if *kind != BlindType::Boss {
                engine.apply(Command::ShopClose).unwrap();
            }
        }
        assert_eq!(engine.state().stage, Stage::End(GameEnd::Win));
        assert_eq!(
            engine.apply(Command::ShopOpen).unwrap_err(),
            EngineError::NotApplicable(NotApplicable::WrongStage(Stage::End(GameEnd::Win)))
        );
    }

    #[test]
    fn test_running_out_of_hands_loses() {
        let mut engine = Engine::new("lose", &GameConfig::default()).unwrap();
        engine.apply(Command::SmallBlindSelected).unwrap();
        for _ in 0..4 {
            play_first(&mut engine, 1);
        }
        let state = engine.state();
        assert_eq!(state.stage, Stage::End(GameEnd::Lose));
        assert!(state.gameplay.score < state.blinds.small.target);
        assert!(engine.clone().apply(Command::HandDealt).is_err());
    }

    #[test]
    fn test_skip_then_shop() {
        let mut engine = strong_engine("skip", &GameConfig::default());
        let tag = engine.state().blinds.small.skip_tag.unwrap();
        let outcome = engine.apply(Command::BlindSkipped).unwrap();
        assert_eq!(outcome.events(), vec![GameEvent::BlindSkipped]);
        assert_eq!(engine.state().blinds_skipped, 1);

        beat_blind(&mut engine, BlindType::Big);
        assert_eq!(engine.state().tags.len(), 1);

        // 除了 Investment（只在擊敗 Boss 時兌現），其他 Tag 都在開店時用掉
        engine.apply(Command::ShopOpen).unwrap();
        let left: Vec<TagId> = engine.state().tags.iter().map(|t| t.tag).collect();
        if tag == TagId::InvestmentTag {
            assert_eq!(left, vec![tag]);
        } else {
            assert!(left.is_empty(), "{tag:?} left unredeemed");
        }
    }

    #[test]
    fn test_replay_reproduces_a_played_blind() {
        let config = GameConfig::default();
        let mut engine = Engine::new("replay", &config).unwrap();
        engine.apply(Command::SmallBlindSelected).unwrap();
        let hand = engine.state().gameplay.hand.clone();
        engine.apply(Command::CardSelected { id: hand[0] }).unwrap();
        engine.apply(Command::CardSelected { id: hand[1] }).unwrap();
        engine.apply(Command::DiscardSelectedCards).unwrap();
        play_first(&mut engine, 3);
        play_first(&mut engine, 2);

        // 命令紀錄可以 JSON 傳輸後重播
        let json = serde_json::to_string(engine.commands()).unwrap();
        let commands: Vec<Command> = serde_json::from_str(&json).unwrap();
        let replayed = Engine::replay(GameState::new("replay", &config), &commands).unwrap();
        assert_eq!(replayed.state(), engine.state());
        assert_eq!(replayed.commands(), engine.commands());
    }

    #[test]
    fn test_undo_through_a_hand() {
        let mut engine = Engine::new("undo", &GameConfig::default()).unwrap();
        engine.apply(Command::SmallBlindSelected).unwrap();
        let before = engine.snapshot();
        let steps = play_first(&mut engine, 2).len();
        assert_ne!(*engine.state(), *before);
        for _ in 0..steps {
            engine.undo().unwrap();
        }
        assert_eq!(*engine.state(), *before);
        engine.undo().unwrap();
        assert_eq!(engine.state().stage, Stage::PreBlind);
        assert_eq!(engine.undo().unwrap_err(), EngineError::NothingToUndo);
    }

    #[test]
    fn test_free_apply_matches_engine() {
        let state = GameState::new("pure", &GameConfig::default());
        let (next, outcome) = apply(&state, &Command::SmallBlindSelected).unwrap();
        assert_eq!(state.stage, Stage::PreBlind);
        assert_eq!(next.stage, Stage::Blind);
        assert_eq!(outcome.events(), vec![GameEvent::BlindSelected, GameEvent::HandDealt]);

        let mut engine = Engine::from_state(state);
        engine.apply(Command::SmallBlindSelected).unwrap();
        assert_eq!(*engine.state(), next);
    }

    #[test]
    fn test_command_stream_from_json() {
        let mut engine = strong_engine("json", &GameConfig::default());
        engine
            .apply(serde_json::from_str(r#"{"type":"SMALL_BLIND_SELECTED"}"#).unwrap())
            .unwrap();
        let first = engine.state().gameplay.hand[0];
        let cmd: Command = serde_json::from_str(&format!(r#"{{"type":"CARD_SELECTED","id":{first}}}"#)).unwrap();
        engine.apply(cmd).unwrap();
        assert_eq!(engine.state().gameplay.selected, vec![first]);
        engine
            .apply(serde_json::from_str(r#"{"type":"JOKER_ADDED","joker":"Joker","edition":"Foil"}"#).unwrap())
            .unwrap();
        assert_eq!(engine.state().jokers.len(), 1);
    }
}
