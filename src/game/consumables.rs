//! 消耗品系統
//!
//! 包含三種類型的消耗品：
//! - Tarot: 修改卡牌或產生物品
//! - Celestial: 升級牌型
//! - Spectral: 特殊效果
//!
//! 每張消耗品的效果以 `ConsumableEffect` 資料描述，實際套用由
//! `service::consumables` 執行。

use serde::{Deserialize, Serialize};

use super::cards::{CardId, Enhancement, Seal, Suit};
use super::hand_types::HandId;
use super::joker_def::Rarity;
use super::rng::random_int;

/// Tarot 卡數量
pub const TAROT_COUNT: usize = 21;
/// Celestial 卡數量
pub const CELESTIAL_COUNT: usize = 12;
/// Spectral 卡數量
pub const SPECTRAL_COUNT: usize = 12;

/// 消耗品類型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumableType {
    Tarot,
    Celestial,
    Spectral,
}

// ============================================================================
// 效果資料
// ============================================================================

/// 消耗品效果
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConsumableEffect {
    /// 選中的牌變為此增強
    Enhance(Enhancement),
    /// 選中的牌變為此花色
    ChangeSuit(Suit),
    /// 選中的牌點數 +1
    IncreaseRank,
    /// 銷毀選中的牌
    DestroySelected,
    /// 左邊的牌變成右邊的複製
    CopyRightOntoLeft,
    /// 金錢翻倍（最多 +cap）
    DoubleMoney { cap: i64 },
    /// 獲得 Joker 總售價（最多 cap）
    JokerSellValue { cap: i64 },
    CreateTarots(usize),
    CreateCelestials(usize),
    /// 1/odds 機率給隨機無版本 Joker 加上版本
    JokerEditionChance { odds: u32 },
    /// 產生隨機 Joker；`None` 依商店稀有度權重
    CreateJoker { rarity: Option<Rarity>, reset_money: bool },
    LevelUp(&'static [HandId]),
    LevelUpAll,
    ApplySeal(Seal),
    /// 選中的牌獲得隨機版本
    RandomEdition,
    /// 銷毀隨機手牌並獲得金錢
    DestroyHeldForMoney { count: usize, money: i64 },
    /// 複製選中的牌
    DuplicateSelected(usize),
    /// 所有手牌轉為同一隨機花色
    RandomizeHeldSuit,
    /// 所有手牌轉為同一隨機點數，手牌上限減少
    RandomizeHeldRank { hand_size_penalty: usize },
    /// 隨機 Joker 變為 Negative，手牌上限減少
    NegativeJoker { hand_size_penalty: usize },
}

// ============================================================================
// Tarot
// ============================================================================

/// Tarot 卡 ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TarotId {
    TheMagician,
    TheHighPriestess,
    TheEmpress,
    TheEmperor,
    TheHierophant,
    TheLovers,
    TheChariot,
    Justice,
    TheHermit,
    TheWheelOfFortune,
    Strength,
    TheHangedMan,
    Death,
    Temperance,
    TheDevil,
    TheTower,
    TheStar,
    TheMoon,
    TheSun,
    Judgement,
    TheWorld,
}

impl TarotId {
    pub fn all() -> &'static [TarotId] {
        &[
            TarotId::TheMagician,
            TarotId::TheHighPriestess,
            TarotId::TheEmpress,
            TarotId::TheEmperor,
            TarotId::TheHierophant,
            TarotId::TheLovers,
            TarotId::TheChariot,
            TarotId::Justice,
            TarotId::TheHermit,
            TarotId::TheWheelOfFortune,
            TarotId::Strength,
            TarotId::TheHangedMan,
            TarotId::Death,
            TarotId::Temperance,
            TarotId::TheDevil,
            TarotId::TheTower,
            TarotId::TheStar,
            TarotId::TheMoon,
            TarotId::TheSun,
            TarotId::Judgement,
            TarotId::TheWorld,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            TarotId::TheMagician => "The Magician",
            TarotId::TheHighPriestess => "The High Priestess",
            TarotId::TheEmpress => "The Empress",
            TarotId::TheEmperor => "The Emperor",
            TarotId::TheHierophant => "The Hierophant",
            TarotId::TheLovers => "The Lovers",
            TarotId::TheChariot => "The Chariot",
            TarotId::Justice => "Justice",
            TarotId::TheHermit => "The Hermit",
            TarotId::TheWheelOfFortune => "The Wheel of Fortune",
            TarotId::Strength => "Strength",
            TarotId::TheHangedMan => "The Hanged Man",
            TarotId::Death => "Death",
            TarotId::Temperance => "Temperance",
            TarotId::TheDevil => "The Devil",
            TarotId::TheTower => "The Tower",
            TarotId::TheStar => "The Star",
            TarotId::TheMoon => "The Moon",
            TarotId::TheSun => "The Sun",
            TarotId::Judgement => "Judgement",
            TarotId::TheWorld => "The World",
        }
    }

    /// 需要選擇的牌數量範圍（0 = 不需要選牌）
    pub fn selection_range(&self) -> (usize, usize) {
        match self {
            TarotId::TheMagician | TarotId::TheEmpress | TarotId::TheHierophant => (1, 2),
            TarotId::TheLovers | TarotId::TheChariot | TarotId::Justice
            | TarotId::TheDevil | TarotId::TheTower => (1, 1),
            TarotId::TheStar | TarotId::TheMoon | TarotId::TheSun | TarotId::TheWorld => (1, 3),
            TarotId::Strength | TarotId::TheHangedMan => (1, 2),
            TarotId::Death => (2, 2),
            _ => (0, 0),
        }
    }

    pub fn effect(&self) -> ConsumableEffect {
        use ConsumableEffect::*;
        match self {
            TarotId::TheMagician => Enhance(Enhancement::Lucky),
            TarotId::TheHighPriestess => CreateCelestials(2),
            TarotId::TheEmpress => Enhance(Enhancement::Mult),
            TarotId::TheEmperor => CreateTarots(2),
            TarotId::TheHierophant => Enhance(Enhancement::Bonus),
            TarotId::TheLovers => Enhance(Enhancement::Wild),
            TarotId::TheChariot => Enhance(Enhancement::Steel),
            TarotId::Justice => Enhance(Enhancement::Glass),
            TarotId::TheHermit => DoubleMoney { cap: 20 },
            TarotId::TheWheelOfFortune => JokerEditionChance { odds: 4 },
            TarotId::Strength => IncreaseRank,
            TarotId::TheHangedMan => DestroySelected,
            TarotId::Death => CopyRightOntoLeft,
            TarotId::Temperance => JokerSellValue { cap: 50 },
            TarotId::TheDevil => Enhance(Enhancement::Gold),
            TarotId::TheTower => Enhance(Enhancement::Stone),
            TarotId::TheStar => ChangeSuit(Suit::Diamonds),
            TarotId::TheMoon => ChangeSuit(Suit::Clubs),
            TarotId::TheSun => ChangeSuit(Suit::Hearts),
            TarotId::Judgement => CreateJoker { rarity: None, reset_money: false },
            TarotId::TheWorld => ChangeSuit(Suit::Spades),
        }
    }

    /// 依種子隨機選擇
    pub fn roll(seed: &str) -> Self {
        pick(seed, Self::all())
    }
}

// ============================================================================
// Celestial
// ============================================================================

/// Celestial 卡 ID（對應牌型升級）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CelestialId {
    Pluto,
    Mercury,
    Uranus,
    Venus,
    Saturn,
    Jupiter,
    Earth,
    Mars,
    Neptune,
    PlanetX,
    Ceres,
    Eris,
}

impl CelestialId {
    pub fn all() -> &'static [CelestialId] {
        &[
            CelestialId::Pluto,
            CelestialId::Mercury,
            CelestialId::Uranus,
            CelestialId::Venus,
            CelestialId::Saturn,
            CelestialId::Jupiter,
            CelestialId::Earth,
            CelestialId::Mars,
            CelestialId::Neptune,
            CelestialId::PlanetX,
            CelestialId::Ceres,
            CelestialId::Eris,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CelestialId::Pluto => "Pluto",
            CelestialId::Mercury => "Mercury",
            CelestialId::Uranus => "Uranus",
            CelestialId::Venus => "Venus",
            CelestialId::Saturn => "Saturn",
            CelestialId::Jupiter => "Jupiter",
            CelestialId::Earth => "Earth",
            CelestialId::Mars => "Mars",
            CelestialId::Neptune => "Neptune",
            CelestialId::PlanetX => "Planet X",
            CelestialId::Ceres => "Ceres",
            CelestialId::Eris => "Eris",
        }
    }

    /// 升級的牌型（Neptune 同時升級 Royal Flush）
    pub fn hands(&self) -> &'static [HandId] {
        match self {
            CelestialId::Pluto => &[HandId::HighCard],
            CelestialId::Mercury => &[HandId::Pair],
            CelestialId::Uranus => &[HandId::TwoPair],
            CelestialId::Venus => &[HandId::ThreeKind],
            CelestialId::Saturn => &[HandId::Straight],
            CelestialId::Jupiter => &[HandId::Flush],
            CelestialId::Earth => &[HandId::FullHouse],
            CelestialId::Mars => &[HandId::FourKind],
            CelestialId::Neptune => &[HandId::StraightFlush, HandId::RoyalFlush],
            CelestialId::PlanetX => &[HandId::FiveKind],
            CelestialId::Ceres => &[HandId::FlushHouse],
            CelestialId::Eris => &[HandId::FlushFive],
        }
    }

    /// 對應牌型的 Celestial
    pub fn for_hand(hand: HandId) -> CelestialId {
        match hand {
            HandId::HighCard => CelestialId::Pluto,
            HandId::Pair => CelestialId::Mercury,
            HandId::TwoPair => CelestialId::Uranus,
            HandId::ThreeKind => CelestialId::Venus,
            HandId::Straight => CelestialId::Saturn,
            HandId::Flush => CelestialId::Jupiter,
            HandId::FullHouse => CelestialId::Earth,
            HandId::FourKind => CelestialId::Mars,
            HandId::StraightFlush | HandId::RoyalFlush => CelestialId::Neptune,
            HandId::FiveKind => CelestialId::PlanetX,
            HandId::FlushHouse => CelestialId::Ceres,
            HandId::FlushFive => CelestialId::Eris,
        }
    }

    /// 秘密牌型的 Celestial 在牌型被打出前不會出現
    pub fn is_secret(&self) -> bool {
        self.hands().iter().all(|h| h.is_secret_by_default())
    }

    pub fn roll(seed: &str, candidates: &[CelestialId]) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(pick(seed, candidates))
    }
}

// ============================================================================
// Spectral
// ============================================================================

/// Spectral 卡 ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectralId {
    Talisman,
    DejaVu,
    Trance,
    Medium,
    Aura,
    Immolate,
    BlackHole,
    Cryptid,
    Wraith,
    Sigil,
    Ouija,
    Ectoplasm,
}

impl SpectralId {
    pub fn all() -> &'static [SpectralId] {
        &[
            SpectralId::Talisman,
            SpectralId::DejaVu,
            SpectralId::Trance,
            SpectralId::Medium,
            SpectralId::Aura,
            SpectralId::Immolate,
            SpectralId::BlackHole,
            SpectralId::Cryptid,
            SpectralId::Wraith,
            SpectralId::Sigil,
            SpectralId::Ouija,
            SpectralId::Ectoplasm,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpectralId::Talisman => "Talisman",
            SpectralId::DejaVu => "Deja Vu",
            SpectralId::Trance => "Trance",
            SpectralId::Medium => "Medium",
            SpectralId::Aura => "Aura",
            SpectralId::Immolate => "Immolate",
            SpectralId::BlackHole => "Black Hole",
            SpectralId::Cryptid => "Cryptid",
            SpectralId::Wraith => "Wraith",
            SpectralId::Sigil => "Sigil",
            SpectralId::Ouija => "Ouija",
            SpectralId::Ectoplasm => "Ectoplasm",
        }
    }

    pub fn selection_range(&self) -> (usize, usize) {
        match self {
            SpectralId::Talisman | SpectralId::DejaVu | SpectralId::Trance
            | SpectralId::Medium | SpectralId::Aura | SpectralId::Cryptid => (1, 1),
            _ => (0, 0),
        }
    }

    pub fn effect(&self) -> ConsumableEffect {
        use ConsumableEffect::*;
        match self {
            SpectralId::Talisman => ApplySeal(Seal::Gold),
            SpectralId::DejaVu => ApplySeal(Seal::Red),
            SpectralId::Trance => ApplySeal(Seal::Blue),
            SpectralId::Medium => ApplySeal(Seal::Purple),
            SpectralId::Aura => RandomEdition,
            SpectralId::Immolate => DestroyHeldForMoney { count: 5, money: 20 },
            SpectralId::BlackHole => LevelUpAll,
            SpectralId::Cryptid => DuplicateSelected(2),
            SpectralId::Wraith => CreateJoker { rarity: Some(Rarity::Rare), reset_money: true },
            SpectralId::Sigil => RandomizeHeldSuit,
            SpectralId::Ouija => RandomizeHeldRank { hand_size_penalty: 1 },
            SpectralId::Ectoplasm => NegativeJoker { hand_size_penalty: 1 },
        }
    }

    pub fn roll(seed: &str) -> Self {
        pick(seed, Self::all())
    }
}

fn pick<T: Copy>(seed: &str, items: &[T]) -> T {
    let index = random_int(seed, 0, items.len() as i64 - 1);
    items[index as usize]
}

// ============================================================================
// 消耗品
// ============================================================================

/// 消耗品（封閉的和型別）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Consumable {
    Tarot(TarotId),
    Celestial(CelestialId),
    Spectral(SpectralId),
}

impl Consumable {
    pub fn consumable_type(&self) -> ConsumableType {
        match self {
            Consumable::Tarot(_) => ConsumableType::Tarot,
            Consumable::Celestial(_) => ConsumableType::Celestial,
            Consumable::Spectral(_) => ConsumableType::Spectral,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Consumable::Tarot(t) => t.name(),
            Consumable::Celestial(c) => c.name(),
            Consumable::Spectral(s) => s.name(),
        }
    }

    pub fn price(&self) -> i64 {
        match self {
            Consumable::Tarot(_) | Consumable::Celestial(_) => 3,
            Consumable::Spectral(_) => 4,
        }
    }

    pub fn sell_value(&self) -> i64 {
        (self.price() / 2).max(1)
    }

    pub fn selection_range(&self) -> (usize, usize) {
        match self {
            Consumable::Tarot(t) => t.selection_range(),
            Consumable::Celestial(_) => (0, 0),
            Consumable::Spectral(s) => s.selection_range(),
        }
    }

    pub fn effect(&self) -> ConsumableEffect {
        match self {
            Consumable::Tarot(t) => t.effect(),
            Consumable::Celestial(c) => ConsumableEffect::LevelUp(c.hands()),
            Consumable::Spectral(s) => s.effect(),
        }
    }

    /// 選中張數是否符合此消耗品的需求
    pub fn accepts_selection(&self, selected: usize) -> bool {
        let (min, max) = self.selection_range();
        (min..=max).contains(&selected)
    }
}

/// 擁有中的消耗品
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumableState {
    pub id: CardId,
    pub consumable: Consumable,
}

impl ConsumableState {
    pub fn new(id: CardId, consumable: Consumable) -> Self {
        Self { id, consumable }
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        assert_eq!(TarotId::all().len(), TAROT_COUNT);
        assert_eq!(CelestialId::all().len(), CELESTIAL_COUNT);
        assert_eq!(SpectralId::all().len(), SPECTRAL_COUNT);
    }

    #[test]
    fn test_every_hand_has_a_celestial() {
        for hand in HandId::all() {
            let celestial = CelestialId::for_hand(*hand);
            assert!(celestial.hands().contains(hand));
        }
    }

    #[test]
    fn test_secret_celestials() {
        assert!(CelestialId::Eris.is_secret());
        assert!(CelestialId::PlanetX.is_secret());
        assert!(!CelestialId::Neptune.is_secret());
        assert!(!CelestialId::Pluto.is_secret());
    }

    #[test]
    fn test_selection_ranges() {
        let death = Consumable::Tarot(TarotId::Death);
        assert!(!death.accepts_selection(1));
        assert!(death.accepts_selection(2));

        let hermit = Consumable::Tarot(TarotId::TheHermit);
        assert!(hermit.accepts_selection(0));
        assert!(!hermit.accepts_selection(1));

        let sun = Consumable::Tarot(TarotId::TheSun);
        assert!(sun.accepts_selection(3));
        assert!(!sun.accepts_selection(4));

        let aura = Consumable::Spectral(SpectralId::Aura);
        assert!(aura.accepts_selection(1));
        assert!(!aura.accepts_selection(0));
    }

    #[test]
    fn test_celestial_effect_levels_its_hands() {
        let jupiter = Consumable::Celestial(CelestialId::Jupiter);
        assert_eq!(jupiter.effect(), ConsumableEffect::LevelUp(&[HandId::Flush]));
        assert_eq!(jupiter.consumable_type(), ConsumableType::Celestial);
    }

    #[test]
    fn test_roll_is_deterministic() {
        assert_eq!(TarotId::roll("seed_1_tarot"), TarotId::roll("seed_1_tarot"));
        assert_eq!(SpectralId::roll("s"), SpectralId::roll("s"));
        assert_eq!(CelestialId::roll("s", &[]), None);
        assert_eq!(CelestialId::roll("s", &[CelestialId::Mars]), Some(CelestialId::Mars));
    }

    #[test]
    fn test_prices() {
        assert_eq!(Consumable::Tarot(TarotId::Strength).price(), 3);
        assert_eq!(Consumable::Spectral(SpectralId::Ouija).price(), 4);
        assert_eq!(Consumable::Spectral(SpectralId::Ouija).sell_value(), 2);
    }
}
