//! Joker 系統
//!
//! `JokerId` 是靜態定義的鍵，`JokerState` 是擁有中的實體。效果一律來自
//! `JOKER_DEFS`，實體只保存 id、版本、售價與累加器。

use serde::{Deserialize, Serialize};

use super::cards::{CardId, Edition};
use super::effects::{Effect, EffectAction, EffectSource, GameEvent, RegisteredEffect};
use super::joker_def::{JokerDef, Rarity, JOKER_DEFS};

// ============================================================================
// Joker ID 系統
// ============================================================================

/// Joker 總數
pub const JOKER_COUNT: usize = 40;

/// Joker 唯一識別碼
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JokerId {
    Joker = 0,           // +4 Mult
    GreedyJoker = 1,     // 方塊計分 +3 Mult
    LustyJoker = 2,      // 紅心計分 +3 Mult
    WrathfulJoker = 3,   // 黑桃計分 +3 Mult
    GluttonousJoker = 4, // 梅花計分 +3 Mult
    JollyJoker = 5,      // +8 Mult (Pair)
    ZanyJoker = 6,       // +12 Mult (Three of a Kind)
    MadJoker = 7,        // +10 Mult (Two Pair)
    CrazyJoker = 8,      // +12 Mult (Straight)
    DrollJoker = 9,      // +10 Mult (Flush)
    SlyJoker = 10,       // +50 Chips (Pair)
    WilyJoker = 11,      // +100 Chips (Three of a Kind)
    CleverJoker = 12,    // +80 Chips (Two Pair)
    DeviousJoker = 13,   // +100 Chips (Straight)
    CraftyJoker = 14,    // +80 Chips (Flush)
    HalfJoker = 15,      // +20 Mult if <=3 cards
    Banner = 16,         // +30 Chips per remaining discard
    MysticSummit = 17,   // +15 Mult if 0 discards left
    AbstractJoker = 18,  // +3 Mult per Joker
    FourFingers = 19,    // 順子/同花只需 4 張
    ScaryFace = 20,      // 人頭牌 +30 Chips
    SmileyFace = 21,     // 人頭牌 +5 Mult
    EvenSteven = 22,     // 偶數牌 +4 Mult
    OddTodd = 23,        // 奇數牌 +31 Chips
    Scholar = 24,        // Ace +20 Chips +4 Mult
    Fibonacci = 25,      // A/2/3/5/8 +8 Mult
    GoldenJoker = 26,    // 擊敗 Blind +$4
    Bull = 27,           // 每 $1 +2 Chips
    Cartomancer = 28,    // 選擇 Blind 時產生 Tarot
    Acrobat = 29,        // 最後一手 X3 Mult
    Cavendish = 30,      // X3 Mult
    Pareidolia = 31,     // 所有牌視為人頭牌
    Showman = 32,        // 商店可出現重複 Joker
    OopsAll6s = 33,      // 所有機率加倍
    RedCard = 34,        // 每跳過一個 Blind +3 Mult
    TheDuo = 35,         // X2 Mult (Pair)
    TheTrio = 36,        // X3 Mult (Three of a Kind)
    TheFamily = 37,      // X4 Mult (Four of a Kind)
    TheOrder = 38,       // X3 Mult (Straight)
    TheTribe = 39,       // X2 Mult (Flush)
}

impl JokerId {
    pub fn all() -> &'static [JokerId] {
        use JokerId::*;
        &[
            Joker, GreedyJoker, LustyJoker, WrathfulJoker, GluttonousJoker, JollyJoker,
            ZanyJoker, MadJoker, CrazyJoker, DrollJoker, SlyJoker, WilyJoker, CleverJoker,
            DeviousJoker, CraftyJoker, HalfJoker, Banner, MysticSummit, AbstractJoker,
            FourFingers, ScaryFace, SmileyFace, EvenSteven, OddTodd, Scholar, Fibonacci,
            GoldenJoker, Bull, Cartomancer, Acrobat, Cavendish, Pareidolia, Showman,
            OopsAll6s, RedCard, TheDuo, TheTrio, TheFamily, TheOrder, TheTribe,
        ]
    }

    pub fn to_index(&self) -> usize {
        *self as usize
    }

    pub fn def(&self) -> &'static JokerDef {
        &JOKER_DEFS[self.to_index()]
    }

    pub fn name(&self) -> &'static str {
        self.def().name
    }

    pub fn rarity(&self) -> Rarity {
        self.def().rarity
    }

    pub fn price(&self) -> i64 {
        self.def().price
    }

    /// 指定稀有度的所有 Joker
    pub fn by_rarity(rarity: Rarity) -> Vec<JokerId> {
        Self::all().iter().copied().filter(|j| j.rarity() == rarity).collect()
    }
}

// ============================================================================
// 版本效果
// ============================================================================

const FOIL: &[Effect] = &[Effect::on(GameEvent::HandScoringDone, EffectAction::AddChips(50))];
const HOLOGRAPHIC: &[Effect] = &[Effect::on(GameEvent::HandScoringDone, EffectAction::AddMult(10.0))];
const POLYCHROME: &[Effect] = &[Effect::on(GameEvent::HandScoringDone, EffectAction::MultiplyMult(1.5))];

/// Joker 版本的計分效果（Negative 只影響欄位數）
pub fn edition_effects(edition: Edition) -> &'static [Effect] {
    match edition {
        Edition::Foil => FOIL,
        Edition::Holographic => HOLOGRAPHIC,
        Edition::Polychrome => POLYCHROME,
        Edition::Normal | Edition::Negative => &[],
    }
}

/// 版本的額外售價
pub fn edition_price(edition: Edition) -> i64 {
    match edition {
        Edition::Normal => 0,
        Edition::Foil => 2,
        Edition::Holographic => 3,
        Edition::Polychrome | Edition::Negative => 5,
    }
}

// ============================================================================
// Joker 實體
// ============================================================================

/// 擁有中的 Joker
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JokerState {
    pub id: CardId,
    pub joker: JokerId,
    #[serde(default)]
    pub edition: Edition,
    pub sell_value: i64,
    /// 累加器（Red Card 等成長型 Joker）
    #[serde(default)]
    pub bonus_mult: f64,
}

impl JokerState {
    pub fn new(id: CardId, joker: JokerId) -> Self {
        Self::with_edition(id, joker, Edition::Normal)
    }

    pub fn with_edition(id: CardId, joker: JokerId, edition: Edition) -> Self {
        let price = joker.price() + edition_price(edition);
        Self {
            id,
            joker,
            edition,
            sell_value: (price / 2).max(1),
            bonus_mult: 0.0,
        }
    }

    pub fn source(&self) -> EffectSource {
        EffectSource::Joker { id: self.id, joker: self.joker }
    }

    /// 此 Joker 註冊的效果：自身效果在前，版本效果緊接其後
    pub fn effects(&self) -> impl Iterator<Item = RegisteredEffect> + '_ {
        let own = self.source();
        let edition = EffectSource::JokerEdition { id: self.id, edition: self.edition };
        self.joker
            .def()
            .effects
            .iter()
            .map(move |e| RegisteredEffect::new(own, *e))
            .chain(
                edition_effects(self.edition)
                    .iter()
                    .map(move |e| RegisteredEffect::new(edition, *e)),
            )
    }
}

/// 佔用的 Joker 欄位數（Negative 不佔欄位）
pub fn occupied_slots(jokers: &[JokerState]) -> usize {
    jokers.iter().filter(|j| j.edition != Edition::Negative).count()
}

// ============================================================================
// 單元測試
// ============================================================================
