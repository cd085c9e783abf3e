//! 牌型判定引擎
//!
//! 每個牌型有一個檢查函數，回傳 `Some(計分牌)` 或 `None`；所有成立的牌型中
//! 取優先級最高者。Stone 牌不參與判定，但一律附加在計分牌之後。
//!
//! 已知的不對稱：對子/三條/兩對的候選組以點數**遞增**排序（最小的組勝出），
//! 高牌則以點數**遞減**排序。

use std::collections::BTreeMap;

use super::cards::{PlayingCardState, Rank, Suit};
use super::hand_types::HandId;
use super::rules::StaticRules;

/// 判定結果
#[derive(Clone, Debug, PartialEq)]
pub struct HandEvaluation {
    pub hand: HandId,
    /// 實際計分的牌（含附加的 Stone 牌）
    pub scoring: Vec<PlayingCardState>,
}

type Cards<'a> = Vec<&'a PlayingCardState>;

fn ranked(cards: &[PlayingCardState]) -> Cards<'_> {
    cards.iter().filter(|c| c.counts_for_hand()).collect()
}

/// 依點數分組（點數遞增，組內保持原順序）
fn rank_groups<'a>(cards: &[&'a PlayingCardState]) -> BTreeMap<Rank, Cards<'a>> {
    let mut groups: BTreeMap<Rank, Cards<'a>> = BTreeMap::new();
    for card in cards {
        groups.entry(card.rank()).or_default().push(*card);
    }
    groups
}

/// 遞增順序中第一個至少 `size` 張且點數不在 `exclude` 內的組
fn first_group<'a>(
    groups: &BTreeMap<Rank, Cards<'a>>,
    size: usize,
    exclude: Option<Rank>,
) -> Option<(Rank, Cards<'a>)> {
    groups
        .iter()
        .find(|(rank, cards)| cards.len() >= size && Some(**rank) != exclude)
        .map(|(rank, cards)| (*rank, cards[..size].to_vec()))
}

fn owned(cards: Cards<'_>) -> Vec<PlayingCardState> {
    cards.into_iter().cloned().collect()
}

/// 點數遞減，同點數以花色順序決勝
fn by_rank_desc<'a>(cards: &[&'a PlayingCardState]) -> Cards<'a> {
    let mut sorted = cards.to_vec();
    sorted.sort_by(|a, b| b.rank().cmp(&a.rank()).then(a.suit().cmp(&b.suit())));
    sorted
}

// ============================================================================
// 各牌型檢查
// ============================================================================

/// 高牌：點數最大的單張
pub fn check_hand_for_high_card(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let ranked = ranked(cards);
    by_rank_desc(&ranked).first().map(|c| vec![(*c).clone()])
}

pub fn check_hand_for_pair(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let groups = rank_groups(&ranked(cards));
    first_group(&groups, 2, None).map(|(_, g)| owned(g))
}

pub fn check_hand_for_two_pair(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let groups = rank_groups(&ranked(cards));
    let (low_rank, low) = first_group(&groups, 2, None)?;
    let (_, high) = groups
        .iter()
        .filter(|(rank, g)| **rank > low_rank && g.len() >= 2)
        .map(|(rank, g)| (*rank, g[..2].to_vec()))
        .next()?;
    Some(owned(low.into_iter().chain(high).collect()))
}

pub fn check_hand_for_three_of_a_kind(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let groups = rank_groups(&ranked(cards));
    first_group(&groups, 3, None).map(|(_, g)| owned(g))
}

pub fn check_hand_for_four_of_a_kind(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let groups = rank_groups(&ranked(cards));
    first_group(&groups, 4, None).map(|(_, g)| owned(g))
}

pub fn check_hand_for_full_house(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let groups = rank_groups(&ranked(cards));
    let (three_rank, three) = first_group(&groups, 3, None)?;
    let (_, two) = first_group(&groups, 2, Some(three_rank))?;
    Some(owned(three.into_iter().chain(two).collect()))
}

/// 同花：與點數最大的牌同花色的牌至少 N 張（Wild 牌匹配任何花色）
pub fn check_hand_for_flush(
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    let sorted = by_rank_desc(&ranked(cards));
    let first = sorted.first()?;

    // 最大牌是 Wild 時，以第一張非 Wild 牌的花色為準
    let reference: Option<Suit> = sorted
        .iter()
        .find(|c| c.enhancement != super::cards::Enhancement::Wild)
        .map(|c| c.suit());
    let suit = reference.unwrap_or(first.suit());

    let matching: Cards<'_> = sorted.into_iter().filter(|c| c.matches_suit(suit)).collect();
    if matching.len() >= rules.min_straight_flush_cards {
        Some(owned(matching))
    } else {
        None
    }
}

/// 順子：找出最高的連續點數序列，結果以點數遞增排列
///
/// Ace 同時可作為最小（A-2-3-4-5）與最大（10-J-Q-K-A）。
pub fn check_hand_for_straight(
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    let needed = rules.min_straight_flush_cards.max(1);

    // 每個點數值對應一張代表牌：花色順序最前者
    let mut by_value: BTreeMap<u8, &PlayingCardState> = BTreeMap::new();
    for card in ranked(cards) {
        let value = card.rank().value();
        let slot = by_value.entry(value).or_insert(card);
        if card.suit() < slot.suit() {
            *slot = card;
        }
    }
    if let Some(ace) = by_value.get(&Rank::Ace.value()).copied() {
        by_value.insert(1, ace);
    }

    let present = |v: u8| by_value.contains_key(&v);
    let top = Rank::Ace.value();
    if (needed as u8) > top {
        return None;
    }

    for start in (1..=top + 1 - needed as u8).rev() {
        let window = start..start + needed as u8;
        if !window.clone().all(present) {
            continue;
        }

        // 往下延伸到序列的最低點
        let mut low = start;
        while low > 1 && present(low - 1) {
            low -= 1;
        }
        let high = start + needed as u8 - 1;
        let uses_high_ace = high == top;

        let run: Vec<PlayingCardState> = (low..=high)
            .filter(|&v| !(v == 1 && uses_high_ace))
            .filter_map(|v| by_value.get(&v).map(|c| (*c).clone()))
            .collect();
        return Some(run);
    }
    None
}

fn union(first: Vec<PlayingCardState>, second: Vec<PlayingCardState>) -> Vec<PlayingCardState> {
    let mut out = first;
    for card in second {
        if !out.iter().any(|c| c.id == card.id) {
            out.push(card);
        }
    }
    out
}

pub fn check_hand_for_straight_flush(
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    let straight = check_hand_for_straight(cards, rules)?;
    let flush = check_hand_for_flush(cards, rules)?;
    Some(union(straight, flush))
}

/// 皇家同花順：以 Ace 為頂的同花順
pub fn check_hand_for_royal_flush(
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    let straight = check_hand_for_straight(cards, rules)?;
    if straight.last().map(|c| c.rank()) != Some(Rank::Ace) {
        return None;
    }
    let flush = check_hand_for_flush(cards, rules)?;
    Some(union(straight, flush))
}

/// 五條：恰好 5 張同點數
pub fn check_hand_for_five_of_a_kind(cards: &[PlayingCardState]) -> Option<Vec<PlayingCardState>> {
    let ranked = ranked(cards);
    if ranked.len() != 5 {
        return None;
    }
    let rank = ranked[0].rank();
    if ranked.iter().all(|c| c.rank() == rank) {
        Some(owned(ranked))
    } else {
        None
    }
}

/// 同花葫蘆：恰好 5 張，葫蘆且同花
pub fn check_hand_for_flush_house(
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    if ranked(cards).len() != 5 {
        return None;
    }
    let house = check_hand_for_full_house(cards)?;
    let five = StaticRules { min_straight_flush_cards: 5, ..rules.clone() };
    check_hand_for_flush(cards, &five)?;
    Some(house)
}

/// 同花五條：恰好 5 張同點數同花色
pub fn check_hand_for_flush_five(
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    let five = check_hand_for_five_of_a_kind(cards)?;
    let all_five = StaticRules { min_straight_flush_cards: 5, ..rules.clone() };
    check_hand_for_flush(cards, &all_five)?;
    Some(five)
}

/// 單一牌型檢查
pub fn check_hand(
    hand: HandId,
    cards: &[PlayingCardState],
    rules: &StaticRules,
) -> Option<Vec<PlayingCardState>> {
    match hand {
        HandId::HighCard => check_hand_for_high_card(cards),
        HandId::Pair => check_hand_for_pair(cards),
        HandId::TwoPair => check_hand_for_two_pair(cards),
        HandId::ThreeKind => check_hand_for_three_of_a_kind(cards),
        HandId::Straight => check_hand_for_straight(cards, rules),
        HandId::Flush => check_hand_for_flush(cards, rules),
        HandId::FullHouse => check_hand_for_full_house(cards),
        HandId::FourKind => check_hand_for_four_of_a_kind(cards),
        HandId::StraightFlush => check_hand_for_straight_flush(cards, rules),
        HandId::RoyalFlush => check_hand_for_royal_flush(cards, rules),
        HandId::FlushHouse => check_hand_for_flush_house(cards, rules),
        HandId::FiveKind => check_hand_for_five_of_a_kind(cards),
        HandId::FlushFive => check_hand_for_flush_five(cards, rules),
    }
}

/// 手牌是否包含某牌型（Jolly Joker 等「包含對子」類條件用）
pub fn contains_hand(hand: HandId, cards: &[PlayingCardState], rules: &StaticRules) -> bool {
    check_hand(hand, cards, rules).is_some()
}

/// 判定手牌的最佳牌型與計分牌
pub fn evaluate_hand(cards: &[PlayingCardState], rules: &StaticRules) -> HandEvaluation {
    let best = HandId::all()
        .iter()
        .rev()
        .find_map(|&hand| check_hand(hand, cards, rules).map(|scoring| (hand, scoring)));

    let (hand, mut scoring) = best.unwrap_or((HandId::HighCard, Vec::new()));
    scoring.extend(cards.iter().filter(|c| !c.counts_for_hand()).cloned());
    HandEvaluation { hand, scoring }
}

// ============================================================================
// 單元測試
// ============================================================================
