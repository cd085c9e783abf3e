//! 遊戲常量定義

// ============================================================================
// 遊戲規則常量
// ============================================================================

pub const HAND_SIZE: usize = 8;          // 手牌數量
pub const MAX_SELECTED: usize = 5;       // 最多選擇 5 張打出
pub const JOKER_SLOTS: usize = 5;        // Joker 欄位數
pub const CONSUMABLE_SLOTS: usize = 2;   // 消耗品欄位數
pub const PLAYS_PER_BLIND: u32 = 4;      // 每 Blind 出牌次數
pub const DISCARDS_PER_BLIND: u32 = 3;   // 每 Blind 棄牌次數
pub const STARTING_MONEY: i64 = 4;       // 起始金幣
pub const MONEY_FLOOR: i64 = 0;          // 金幣下限
pub const MAX_INTEREST: i64 = 5;         // 最大利息
pub const INTEREST_STEP: i64 = 5;        // 每 $5 得 $1 利息
pub const MONEY_PER_REMAINING_HAND: i64 = 1;  // 每剩餘出牌次數獎勵
pub const FINAL_ROUND: u32 = 8;          // 擊敗此回合 Boss 即獲勝
pub const MIN_STRAIGHT_FLUSH_CARDS: usize = 5;
pub const UNDO_DEPTH: usize = 256;      // 引擎保留的可復原命令數

// ============================================================================
// 商店常量
// ============================================================================

pub const SHOP_CARD_COUNT: usize = 2;    // 商店卡牌數量
pub const SHOP_PACK_COUNT: usize = 2;    // 商店卡包槽位
pub const REROLL_BASE_COST: i64 = 5;     // 重擲基礎費用

// ============================================================================
// 計分常量
// ============================================================================

pub const LUCKY_MULT_ODDS: u32 = 5;      // Lucky: 1/5 機率 +20 Mult
pub const LUCKY_MONEY_ODDS: u32 = 15;    // Lucky: 1/15 機率 +$20
pub const LUCKY_MULT_BONUS: f64 = 20.0;
pub const LUCKY_MONEY_BONUS: i64 = 20;
pub const GLASS_BREAK_ODDS: u32 = 4;     // Glass: 1/4 機率破碎
pub const GOLD_SEAL_MONEY: i64 = 3;
pub const GOLD_CARD_MONEY: i64 = 3;
pub const STEEL_X_MULT: f64 = 1.5;
pub const GLASS_X_MULT: f64 = 2.0;
