//! 商店與卡包
//!
//! ```text
//! Shop ──ShopOpen──▶ 兌現保證 Tag → Coupon / D6 → 補滿隨機商品 → Voucher → 分派 ShopOpened
//!   ├─ ShopBuyCard / ShopBuyVoucher
//!   ├─ ShopOpenPack ──▶ ShopSelect*FromPack ... ──▶ 選完或 ShopSkipPack
//!   ├─ ShopReroll（D6 的免費次數優先）
//!   └─ ShopClose ──▶ PreBlind
//! ```

use tracing::{debug, info};

use crate::game::blinds::Stage;
use crate::game::cards::{CardId, Edition};
use crate::game::effects::GameEvent;
use crate::game::joker::{JokerId, JokerState};
use crate::game::packs::PackState;
use crate::game::shop::{
    free_pack, generate_items, generate_pack_contents, generate_packs, roll_joker, BuyableItem, ShopItem, ShopState,
    VoucherOffer,
};
use crate::game::tags::{Guarantee, ShopModifier, TagState};
use crate::game::vouchers::{VoucherId, VoucherState, VOUCHER_PRICE};
use crate::seed;

use super::engine::{Draft, EventFrame};
use super::error::{EngineError, EntityKind, NotApplicable};

/// 卡包選擇命令所指定的物品種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ItemKind {
    Joker,
    Consumable,
    PlayingCard,
}

impl ItemKind {
    fn of(item: &BuyableItem) -> Self {
        match item {
            BuyableItem::Joker(_) => ItemKind::Joker,
            BuyableItem::Consumable(_) => ItemKind::Consumable,
            BuyableItem::PlayingCard(_) => ItemKind::PlayingCard,
        }
    }
}

impl Draft<'_> {
    fn shop(&self) -> Result<&ShopState, EngineError> {
        self.expect_stage(Stage::Shop)?;
        Ok(self.state.shop.as_ref().ok_or(NotApplicable::ShopNotOpen)?)
    }

    fn shop_mut(&mut self) -> Result<&mut ShopState, EngineError> {
        self.expect_stage(Stage::Shop)?;
        Ok(self.state.shop.as_mut().ok_or(NotApplicable::ShopNotOpen)?)
    }

    /// 商店已開且沒有開啟中的卡包
    fn browsing_shop(&self) -> Result<&ShopState, EngineError> {
        let shop = self.shop()?;
        if shop.open_pack.is_some() {
            return Err(NotApplicable::PackAlreadyOpen.into());
        }
        Ok(shop)
    }

    fn pay(&mut self, price: i64) -> Result<(), EngineError> {
        let available = self.state.spendable();
        if price > available {
            return Err(NotApplicable::InsufficientFunds { price, available }.into());
        }
        self.state.money -= price;
        Ok(())
    }

    /// 移除並回傳符合條件的 Tag
    fn redeem_tags(&mut self, mut wanted: impl FnMut(&TagState) -> bool) -> Vec<TagState> {
        let (redeemed, kept): (Vec<TagState>, Vec<TagState>) =
            std::mem::take(&mut self.state.tags).into_iter().partition(|t| wanted(t));
        self.state.tags = kept;
        for tag in &redeemed {
            debug!(tag = tag.tag.name(), "tag redeemed");
        }
        redeemed
    }

    // ------------------------------------------------------------------------
    // 放置物品
    // ------------------------------------------------------------------------

    fn check_room_for(&self, item: &BuyableItem) -> Result<(), NotApplicable> {
        match item {
            BuyableItem::Joker(joker) if joker.edition != Edition::Negative && !self.state.has_free_joker_slot() => {
                Err(NotApplicable::JokerSlotsFull)
            }
            BuyableItem::Consumable(_) if !self.state.has_free_consumable_slot() => {
                Err(NotApplicable::ConsumableSlotsFull)
            }
            _ => Ok(()),
        }
    }

    /// 物品進入對應的欄位；Joker 加入時分派 JokerAdded
    fn place_item(&mut self, item: BuyableItem) {
        match item {
            BuyableItem::Joker(joker) => {
                let id = joker.id;
                self.state.jokers.push(joker);
                self.dispatch(GameEvent::JokerAdded, &EventFrame::subject(id));
            }
            BuyableItem::Consumable(consumable) => self.state.consumables.push(consumable),
            BuyableItem::PlayingCard(card) => self.state.deck.push(card),
        }
    }

    // ------------------------------------------------------------------------
    // 商店
    // ------------------------------------------------------------------------

    pub(crate) fn open_shop(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Shop)?;
        if self.state.shop.is_some() {
            return Err(NotApplicable::ShopAlreadyOpen.into());
        }

        let mut shop = ShopState::default();
        self.place_guarantees(&mut shop);

        let coupon = !self
            .redeem_tags(|t| t.tag.shop_modifier() == Some(ShopModifier::Coupon))
            .is_empty();
        let free_rerolls = self
            .redeem_tags(|t| t.tag.shop_modifier() == Some(ShopModifier::FreeReroll))
            .len();
        shop.free_rerolls = free_rerolls as u32;

        let (ctx, ids) = self.state.shop_parts();
        let count = ctx.rules.shop_card_count.saturating_sub(shop.items.len());
        shop.items.extend(generate_items(&ctx, 0, count, ids));
        shop.packs.extend(generate_packs(&ctx, ids));
        if coupon {
            shop.items.iter_mut().for_each(|item| item.price = 0);
            shop.packs.iter_mut().for_each(|pack| pack.price = 0);
        }

        let owned = self.state.owned_vouchers();
        let offer = VoucherId::roll(&seed!(self.state.seed, self.state.round, "voucher"), &owned);
        shop.voucher = offer.map(|voucher| VoucherOffer {
            id: self.state.ids.next_id(),
            voucher,
            price: self.state.rules.discounted(VOUCHER_PRICE),
        });

        info!(
            round = self.state.round,
            items = shop.items.len(),
            packs = shop.packs.len(),
            voucher = shop.voucher.as_ref().map(|v| v.voucher.name()),
            "shop opened"
        );
        self.state.shop = Some(shop);
        self.dispatch(GameEvent::ShopOpened, &EventFrame::default());
        Ok(())
    }

    /// 保證 Tag 的免費物品先佔商店欄位；放不下時 Tag 保留到下次
    fn place_guarantees(&mut self, shop: &mut ShopState) {
        let tags: Vec<TagState> = self.state.tags.clone();
        for tag in tags {
            let Some(guarantee) = tag.tag.guarantee() else {
                continue;
            };
            let (ctx, ids) = self.state.shop_parts();
            let placed = match guarantee {
                Guarantee::FreeJoker(rarity) => {
                    if shop.items.len() >= ctx.rules.shop_card_count {
                        false
                    } else if let Some(joker) = roll_joker(&ctx.seed(&[&tag.id, &"tag"]), rarity, &ctx) {
                        let item = BuyableItem::Joker(JokerState::new(ids.next_id(), joker));
                        shop.items.push(ShopItem { item, price: 0 });
                        true
                    } else {
                        false
                    }
                }
                Guarantee::FreePack(pack_type, rarity) => {
                    shop.packs.push(free_pack(pack_type, rarity, ids));
                    true
                }
            };
            if placed {
                self.redeem_tags(|t| t.id == tag.id);
            } else {
                debug!(tag = tag.tag.name(), "guaranteed item deferred");
            }
        }
    }

    pub(crate) fn buy_card(&mut self, id: CardId) -> Result<(), EngineError> {
        let shop = self.browsing_shop()?;
        let offer = shop
            .find_item(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::ShopItem, id))?;
        let price = offer.price;
        self.check_room_for(&offer.item)?;
        self.pay(price)?;

        let item = self
            .shop_mut()?
            .take_item(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::ShopItem, id))?;
        info!(item = %item.item.name(), price, money = self.state.money, "bought item");
        self.place_item(item.item);
        Ok(())
    }

    pub(crate) fn buy_voucher(&mut self, id: CardId) -> Result<(), EngineError> {
        let shop = self.browsing_shop()?;
        let offer = shop
            .voucher
            .as_ref()
            .filter(|v| v.id == id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(EntityKind::Voucher, id))?;
        self.pay(offer.price)?;

        self.shop_mut()?.voucher = None;
        offer.voucher.modifier().apply(&mut self.state.rules);
        self.state.vouchers.push(VoucherState::new(offer.id, offer.voucher));
        info!(voucher = offer.voucher.name(), price = offer.price, "bought voucher");
        Ok(())
    }

    pub(crate) fn reroll_shop(&mut self) -> Result<(), EngineError> {
        let shop = self.browsing_shop()?;
        let free = shop.free_rerolls > 0;
        let cost = if free { 0 } else { self.state.rules.reroll_cost(shop.reroll_count) };
        self.pay(cost)?;

        let shop = self.shop_mut()?;
        if free {
            shop.free_rerolls -= 1;
        }
        shop.reroll_count += 1;
        let reroll_count = shop.reroll_count;

        let (ctx, ids) = self.state.shop_parts();
        let items = generate_items(&ctx, reroll_count, ctx.rules.shop_card_count, ids);
        debug!(reroll_count, cost, "shop rerolled");
        self.shop_mut()?.items = items;
        self.dispatch(GameEvent::ShopRerolled, &EventFrame::default());
        Ok(())
    }

    pub(crate) fn close_shop(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Shop)?;
        self.state.shop = None;
        self.state.stage = Stage::PreBlind;
        info!(round = self.state.round, money = self.state.money, "shop closed");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // 卡包
    // ------------------------------------------------------------------------

    pub(crate) fn open_pack(&mut self, id: CardId) -> Result<(), EngineError> {
        let shop = self.browsing_shop()?;
        let price = shop
            .packs
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.price)
            .ok_or_else(|| EngineError::not_found(EntityKind::Pack, id))?;
        self.pay(price)?;

        let pack = self
            .shop_mut()?
            .take_pack(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::Pack, id))?;
        let (ctx, ids) = self.state.shop_parts();
        let items = generate_pack_contents(&ctx, &pack, ids);
        info!(pack = %pack.name(), price, items = items.len(), "opened pack");
        self.shop_mut()?.open_pack = Some(PackState::new(&pack, items));
        self.dispatch(GameEvent::PackOpened, &EventFrame::default());
        Ok(())
    }

    pub(crate) fn select_from_pack(&mut self, id: CardId, kind: ItemKind) -> Result<(), EngineError> {
        let pack = self.shop()?.open_pack.as_ref().ok_or(NotApplicable::NoOpenPack)?;
        let item = pack
            .find(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::PackItem, id))?;
        if ItemKind::of(&item.item) != kind {
            return Err(NotApplicable::WrongItemKind(id).into());
        }
        self.check_room_for(&item.item)?;

        let shop = self.shop_mut()?;
        let pack = shop.open_pack.as_mut().ok_or(NotApplicable::NoOpenPack)?;
        let item = pack
            .take(id)
            .ok_or_else(|| EngineError::not_found(EntityKind::PackItem, id))?;
        if pack.is_done() {
            shop.open_pack = None;
        }
        debug!(item = %item.name(), "selected from pack");
        self.place_item(item);
        Ok(())
    }

    pub(crate) fn skip_pack(&mut self) -> Result<(), EngineError> {
        let shop = self.shop_mut()?;
        let pack = shop.open_pack.take().ok_or(NotApplicable::NoOpenPack)?;
        debug!(pack = pack.id, left = pack.items.len(), "skipped pack");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Joker
    // ------------------------------------------------------------------------

    pub(crate) fn add_joker(&mut self, joker: JokerId, edition: Edition) -> Result<(), EngineError> {
        if self.state.gameplay.scoring.is_some() {
            return Err(NotApplicable::ScoringInProgress.into());
        }
        let id = self.state.ids.next_id();
        let item = BuyableItem::Joker(JokerState::with_edition(id, joker, edition));
        self.check_room_for(&item)?;
        debug!(joker = joker.name(), ?edition, "joker added");
        self.place_item(item);
        Ok(())
    }

    /// 賣出前先分派 JokerSold，讓 Joker 撤銷自己的規則
    pub(crate) fn sell_joker(&mut self, id: CardId) -> Result<(), EngineError> {
        if self.state.gameplay.scoring.is_some() {
            return Err(NotApplicable::ScoringInProgress.into());
        }
        let sell_value = self
            .state
            .joker(id)
            .map(|j| j.sell_value)
            .ok_or_else(|| EngineError::not_found(EntityKind::Joker, id))?;
        self.dispatch(GameEvent::JokerSold, &EventFrame::subject(id));
        self.state.jokers.retain(|j| j.id != id);
        self.state.add_money(sell_value);
        info!(joker = id, sell_value, money = self.state.money, "joker sold");
        Ok(())
    }
}

// ============================================================================
// 單元測試
// ============================================================================
