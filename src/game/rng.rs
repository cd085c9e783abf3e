//! 確定性隨機數系統
//!
//! 所有隨機性都是種子字串的純函數：
//!
//! ```text
//! 種子字串 ──hash_seed──▶ u32 ──Mulberry32──▶ [0,1) 序列
//! ```
//!
//! 種子字串由有序的上下文片段（遊戲種子、回合、重擲次數、用途標籤…）以 `_`
//! 串接而成；片段順序即定義了隨機流，呼叫端必須保持一致。
//! 沒有任何全域可變狀態，相同種子字串在任何行程中都得到相同結果。

use std::fmt::Display;

use rand::{RngCore, SeedableRng};

// ============================================================================
// 種子字串
// ============================================================================

/// 以 `_` 串接種子片段
pub fn seed_string(parts: &[&dyn Display]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push('_');
        }
        out.push_str(&part.to_string());
    }
    out
}

/// 串接任意 `Display` 片段為種子字串
///
/// ```rust,ignore
/// let s = seed!(game_seed, round, "shop");
/// ```
#[macro_export]
macro_rules! seed {
    ($($part:expr),+ $(,)?) => {
        $crate::game::rng::seed_string(&[$(&$part as &dyn ::std::fmt::Display),+])
    };
}

/// 字串雜湊（對 UTF-16 編碼單位做 `h = h * 31 + c`，32 位元環繞）
///
/// 與順序相關：`"ab"` 與 `"ba"` 雜湊不同。
pub fn hash_seed(seed: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in seed.encode_utf16() {
        h = (h << 5).wrapping_sub(h).wrapping_add(unit as i32);
    }
    h as u32
}

// ============================================================================
// Mulberry32 產生器
// ============================================================================

/// 小型快速 32 位元產生器，狀態只有一個 u32
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// 由種子字串建立
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(hash_seed(seed))
    }

    pub fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// [0, 1) 均勻浮點數
    pub fn next_float(&mut self) -> f64 {
        self.next_raw() as f64 / 4_294_967_296.0
    }

    /// [min, max] 均勻整數（含兩端）
    ///
    /// # Panics
    ///
    /// `min > max` 時 panic。
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        assert!(min <= max, "next_int: empty range {min}..={max}");
        let span = (max as i128 - min as i128 + 1) as f64;
        let offset = (self.next_float() * span).floor() as i128;
        (min as i128 + offset).min(max as i128) as i64
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.next_raw() as u64;
        let lo = self.next_raw() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for SeededRng {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

// ============================================================================
// 種子參數化的無副作用操作
// ============================================================================

/// [0, 1) 均勻浮點數
pub fn random_float(seed: &str) -> f64 {
    SeededRng::from_seed_str(seed).next_float()
}

/// [min, max] 均勻整數
///
/// # Panics
///
/// `min > max` 時 panic。
pub fn random_int(seed: &str, min: i64, max: i64) -> i64 {
    SeededRng::from_seed_str(seed).next_int(min, max)
}

/// 同一隨機流上連續抽出 `count` 個 [min, max] 整數
///
/// # Panics
///
/// `count > 0` 且 `min > max` 時 panic。
pub fn random_ints(seed: &str, count: usize, min: i64, max: i64) -> Vec<i64> {
    let mut rng = SeededRng::from_seed_str(seed);
    (0..count).map(|_| rng.next_int(min, max)).collect()
}

fn usable_weight(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}

/// 加權選擇
///
/// 權重可為小數；零、負數與非有限值的選項被排除。
/// 沒有可選項時回傳 `None`。
pub fn weighted_choice<K: Clone>(seed: &str, options: &[(K, f64)]) -> Option<K> {
    let total: f64 = options
        .iter()
        .filter(|(_, w)| usable_weight(*w))
        .map(|(_, w)| *w)
        .sum();
    if total <= 0.0 {
        return None;
    }

    let target = random_float(seed) * total;
    let mut cumulative = 0.0;
    let mut last = None;
    for (key, weight) in options.iter().filter(|(_, w)| usable_weight(*w)) {
        cumulative += *weight;
        if target < cumulative {
            return Some(key.clone());
        }
        last = Some(key);
    }
    // 浮點誤差時落在最後一個有效選項
    last.cloned()
}

/// 每個選項的加權分數 `u^(1/w)`，分數越高越優先
///
/// 被排除的選項（權重 ≤ 0）不出現在結果中。
pub fn weighted_scores<K: Clone>(seed: &str, options: &[(K, f64)]) -> Vec<(K, f64)> {
    let mut rng = SeededRng::from_seed_str(seed);
    options
        .iter()
        .filter(|(_, w)| usable_weight(*w))
        .map(|(key, weight)| (key.clone(), rng.next_float().powf(1.0 / weight)))
        .collect()
}

/// 由種子產生 v4 格式的偽 UUID
pub fn seeded_uuid(seed: &str) -> String {
    let mut rng = SeededRng::from_seed_str(seed);
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// 「1/odds」機率檢定，機率乘以 `multiplier`
pub fn roll_chance(seed: &str, odds: u32, multiplier: f64) -> bool {
    if odds == 0 {
        return true;
    }
    random_float(seed) < multiplier / odds as f64
}

/// 以種子洗牌（Fisher-Yates，由尾端往前，每步 `next_int(0, i)`）
pub fn shuffle<T>(seed: &str, items: &mut [T]) {
    let mut rng = SeededRng::from_seed_str(seed);
    for i in (1..items.len()).rev() {
        let j = rng.next_int(0, i as i64) as usize;
        items.swap(i, j);
    }
}

// ============================================================================
// 單元測試
// ============================================================================
