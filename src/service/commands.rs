//! 命令目錄
//!
//! 外部唯一的變更入口。JSON 形式為 `{ "type": "CARD_SELECTED", "id": 3 }`。

use serde::{Deserialize, Serialize};

use crate::game::blinds::BlindType;
use crate::game::cards::{CardId, Edition};
use crate::game::consumables::ConsumableType;
use crate::game::effects::{DispatchReport, EffectSource, GameEvent};
use crate::game::joker::JokerId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    // Blind
    SmallBlindSelected,
    BigBlindSelected,
    BossBlindSelected,
    /// 跳過下一個待選的 Blind
    BlindSkipped,

    // 出牌
    HandDealt,
    CardSelected { id: CardId },
    CardDeselected { id: CardId },
    DiscardSelectedCards,
    HandScoringStart,
    CardScored,
    HandScoringDone,

    // 商店
    ShopOpen,
    ShopBuyCard { id: CardId },
    ShopBuyVoucher { id: CardId },
    ShopOpenPack { id: CardId },
    ShopSelectJokerFromPack { id: CardId },
    ShopSelectConsumableFromPack { id: CardId },
    ShopSelectPlayingCardFromPack { id: CardId },
    ShopSkipPack,
    ShopReroll,
    ShopClose,

    // 消耗品（目標為目前選中的牌）
    TarotCardUsed { id: CardId },
    CelestialCardUsed { id: CardId },
    SpectralCardUsed { id: CardId },
    ConsumableSold { id: CardId },

    // Joker
    JokerAdded {
        joker: JokerId,
        #[serde(default)]
        edition: Edition,
    },
    JokerSold { id: CardId },
}

impl Command {
    /// 選擇 Blind 的命令
    pub fn select_blind(kind: BlindType) -> Self {
        match kind {
            BlindType::Small => Command::SmallBlindSelected,
            BlindType::Big => Command::BigBlindSelected,
            BlindType::Boss => Command::BossBlindSelected,
        }
    }

    /// 使用消耗品的命令
    pub fn use_consumable(kind: ConsumableType, id: CardId) -> Self {
        match kind {
            ConsumableType::Tarot => Command::TarotCardUsed { id },
            ConsumableType::Celestial => Command::CelestialCardUsed { id },
            ConsumableType::Spectral => Command::SpectralCardUsed { id },
        }
    }
}

/// 一個命令套用後的分派紀錄（依分派順序）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    pub reports: Vec<DispatchReport>,
}

impl Outcome {
    /// 某事件的分派紀錄
    pub fn report(&self, event: GameEvent) -> Option<&DispatchReport> {
        self.reports.iter().find(|r| r.event == event)
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.reports.iter().map(|r| r.event).collect()
    }

    /// 此來源在任何分派中是否觸發
    pub fn fired_for(&self, source: &EffectSource) -> bool {
        self.reports.iter().any(|r| r.fired_for(source))
    }

    pub fn has_failures(&self) -> bool {
        self.reports.iter().any(|r| !r.failures.is_empty())
    }
}
