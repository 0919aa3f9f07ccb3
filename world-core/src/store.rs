use parking_lot::RwLock;

use crate::{
    error::StoreError,
    item::MAX_ADENA,
    object::ObjectId,
};

/// Max store title length; longer titles are clipped, not rejected
/// (spec.md §4.8).
pub const STORE_TITLE_MAX_LEN: usize = 29;

fn clip_title(title: &str) -> String {
    title.chars().take(STORE_TITLE_MAX_LEN).collect()
}

/// A single listed offer: `count` units of `item_id` at `price` adena
/// each (spec.md §4.8).
#[derive(Clone, Copy, Debug)]
pub struct StoreOffer {
    pub item_id: ObjectId,
    pub count: u32,
    pub price: i64,
}

struct StoreState {
    title: String,
    offers: Vec<StoreOffer>,
    open: bool,
}

/// A player-run private store / buy-sell stall (spec.md §4.8). `packaged`
/// stores sell all their offers in a single transaction or not at all;
/// ordinary stores allow partial fills per offer.
pub struct PrivateStore {
    pub owner: ObjectId,
    pub packaged: bool,
    state: RwLock<StoreState>,
}

impl PrivateStore {
    pub fn new(owner: ObjectId, title: &str, packaged: bool) -> Self {
        Self {
            owner,
            packaged,
            state: RwLock::new(StoreState {
                title: clip_title(title),
                offers: Vec::new(),
                open: true,
            }),
        }
    }

    pub fn title(&self) -> String {
        self.state.read().title.clone()
    }

    pub fn set_title(&self, title: &str) {
        self.state.write().title = clip_title(title);
    }

    pub fn is_open(&self) -> bool {
        self.state.read().open
    }

    pub fn close(&self) {
        self.state.write().open = false;
    }

    fn validate_offer(count: u32, price: i64) -> Result<(), StoreError> {
        if count == 0 {
            return Err(StoreError::NonPositiveCount);
        }
        if price < 0 {
            return Err(StoreError::NegativePrice);
        }
        let total = (count as i64).checked_mul(price).ok_or(StoreError::PriceOverflow)?;
        if total > MAX_ADENA {
            return Err(StoreError::PriceOverflow);
        }
        Ok(())
    }

    pub fn add_item(&self, item_id: ObjectId, count: u32, price: i64) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.open {
            return Err(StoreError::Locked);
        }
        Self::validate_offer(count, price)?;
        state.offers.push(StoreOffer { item_id, count, price });
        Ok(())
    }

    /// Subtracts `sold` from the listed offer's count, removing the offer
    /// entirely once it reaches zero (spec.md §4.8's `UpdateItemCount`).
    pub fn update_item_count(&self, item_id: ObjectId, sold: u32) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if !state.open {
            return Err(StoreError::Locked);
        }
        let index = state
            .offers
            .iter()
            .position(|offer| offer.item_id == item_id)
            .ok_or(StoreError::OfferNotFound(item_id))?;
        let remaining = state.offers[index].count.saturating_sub(sold);
        if remaining == 0 {
            state.offers.remove(index);
        } else {
            state.offers[index].count = remaining;
        }
        Ok(())
    }

    /// Removes every offer and reopens the store (spec.md §4.8's `Clear`:
    /// "also unlocks").
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.offers.clear();
        state.open = true;
    }

    pub fn remove_item(&self, item_id: ObjectId) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let before = state.offers.len();
        state.offers.retain(|offer| offer.item_id != item_id);
        if state.offers.len() == before {
            return Err(StoreError::OfferNotFound(item_id));
        }
        Ok(())
    }

    pub fn offers(&self) -> Vec<StoreOffer> {
        self.state.read().offers.clone()
    }

    /// Validates a proposed partial sale against the packaged-store rule:
    /// a packaged store must sell every offer in full, or not at all
    /// (spec.md §4.8).
    pub fn validate_sale(&self, sold_item_id: ObjectId, sold_count: u32) -> Result<(), StoreError> {
        let state = self.state.read();
        let offer = state
            .offers
            .iter()
            .find(|offer| offer.item_id == sold_item_id)
            .ok_or(StoreError::OfferNotFound(sold_item_id))?;
        if self.packaged && sold_count != offer.count {
            return Err(StoreError::PartialPackageSale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_beyond_max_len_is_clipped_not_rejected() {
        let long_title = "x".repeat(100);
        let store = PrivateStore::new(ObjectId(1), &long_title, false);
        assert_eq!(store.title().chars().count(), STORE_TITLE_MAX_LEN);
    }

    #[test]
    fn add_item_rejects_invalid_counts_and_prices() {
        let store = PrivateStore::new(ObjectId(1), "Shop", false);
        assert_eq!(
            store.add_item(ObjectId(500), 0, 10),
            Err(StoreError::NonPositiveCount)
        );
        assert_eq!(
            store.add_item(ObjectId(500), 1, -1),
            Err(StoreError::NegativePrice)
        );
        assert_eq!(
            store.add_item(ObjectId(500), u32::MAX, i64::MAX / 2),
            Err(StoreError::PriceOverflow)
        );
    }

    #[test]
    fn packaged_store_rejects_partial_sale() {
        let store = PrivateStore::new(ObjectId(1), "Package Deal", true);
        store.add_item(ObjectId(500), 10, 100).unwrap();
        assert_eq!(
            store.validate_sale(ObjectId(500), 5),
            Err(StoreError::PartialPackageSale)
        );
        store.validate_sale(ObjectId(500), 10).unwrap();
    }

    #[test]
    fn ordinary_store_allows_partial_sale() {
        let store = PrivateStore::new(ObjectId(1), "Bazaar", false);
        store.add_item(ObjectId(500), 10, 100).unwrap();
        store.validate_sale(ObjectId(500), 3).unwrap();
    }

    #[test]
    fn closed_store_rejects_mutation() {
        let store = PrivateStore::new(ObjectId(1), "Shop", false);
        store.close();
        assert_eq!(
            store.add_item(ObjectId(500), 1, 1),
            Err(StoreError::Locked)
        );
    }
}
