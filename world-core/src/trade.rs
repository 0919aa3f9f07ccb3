use parking_lot::RwLock;

use crate::{error::TradeError, object::ObjectId};

/// One side's offered items, keyed by item object id with the count the
/// offering side wants to trade (spec.md §4.8).
#[derive(Clone, Debug, Default)]
struct TradeSide {
    items: Vec<(ObjectId, u32)>,
    confirmed: bool,
}

impl TradeSide {
    fn has_item(&self, item_id: ObjectId) -> bool {
        self.items.iter().any(|(id, _)| *id == item_id)
    }
}

/// A two-party direct trade session (spec.md §4.8). `owner` initiates;
/// `partner` receives the request. Both sides must lock in (`Lock`) and
/// confirm before the trade can be consummated by the caller's
/// transaction layer; this module only tracks the offer state and
/// confirmation handshake, not inventory movement itself.
pub struct P2PTradeList {
    pub owner: ObjectId,
    pub partner: ObjectId,
    locked: RwLock<bool>,
    owner_side: RwLock<TradeSide>,
    partner_side: RwLock<TradeSide>,
}

impl P2PTradeList {
    pub fn new(owner: ObjectId, partner: ObjectId) -> Self {
        Self {
            owner,
            partner,
            locked: RwLock::new(false),
            owner_side: RwLock::new(TradeSide::default()),
            partner_side: RwLock::new(TradeSide::default()),
        }
    }

    fn side_for(&self, who: ObjectId) -> Option<&RwLock<TradeSide>> {
        if who == self.owner {
            Some(&self.owner_side)
        } else if who == self.partner {
            Some(&self.partner_side)
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        *self.locked.read()
    }

    /// Freezes both sides' offers against further edits (spec.md §4.8
    /// invariant: once locked, `AddItem` fails for either side).
    pub fn lock(&self) {
        *self.locked.write() = true;
    }

    pub fn add_item(&self, who: ObjectId, item_id: ObjectId, count: u32) -> Result<(), TradeError> {
        if self.is_locked() {
            return Err(TradeError::Locked);
        }
        if count == 0 {
            return Err(TradeError::CountExceedsStack);
        }
        let side_lock = self.side_for(who).ok_or(TradeError::ItemNotInInventory(item_id))?;
        let mut side = side_lock.write();
        if side.confirmed {
            return Err(TradeError::AlreadyConfirmed);
        }
        if side.has_item(item_id) {
            return Err(TradeError::DuplicateItem(item_id));
        }
        side.items.push((item_id, count));
        Ok(())
    }

    pub fn remove_item(&self, who: ObjectId, item_id: ObjectId) -> Result<(), TradeError> {
        if self.is_locked() {
            return Err(TradeError::Locked);
        }
        let side_lock = self.side_for(who).ok_or(TradeError::ItemNotInInventory(item_id))?;
        let mut side = side_lock.write();
        let before = side.items.len();
        side.items.retain(|(id, _)| *id != item_id);
        if side.items.len() == before {
            return Err(TradeError::ItemNotInInventory(item_id));
        }
        Ok(())
    }

    pub fn offered_items(&self, who: ObjectId) -> Vec<(ObjectId, u32)> {
        self.side_for(who)
            .map(|side| side.read().items.clone())
            .unwrap_or_default()
    }

    /// `Confirm()` (spec.md §4.8): a side may only confirm once, and only
    /// after the trade is locked.
    pub fn confirm(&self, who: ObjectId) -> Result<(), TradeError> {
        if !self.is_locked() {
            return Err(TradeError::Locked);
        }
        let side_lock = self.side_for(who).ok_or(TradeError::NoPendingRequest)?;
        let mut side = side_lock.write();
        if side.confirmed {
            return Err(TradeError::AlreadyConfirmed);
        }
        side.confirmed = true;
        Ok(())
    }

    pub fn both_confirmed(&self) -> bool {
        self.owner_side.read().confirmed && self.partner_side.read().confirmed
    }
}

/// Tracks an in-flight `OnTransactionRequest` so the receiving side can be
/// asked to accept/decline within a fixed window before it silently
/// expires (spec.md §4.8).
pub struct TradeRequest {
    pub requester: ObjectId,
    pub target: ObjectId,
    requested_at_secs: i64,
    expiry_secs: i64,
}

impl TradeRequest {
    pub fn new(requester: ObjectId, target: ObjectId, requested_at_secs: i64, expiry_secs: i64) -> Self {
        Self {
            requester,
            target,
            requested_at_secs,
            expiry_secs,
        }
    }

    pub fn is_expired(&self, now_secs: i64) -> bool {
        now_secs - self.requested_at_secs >= self.expiry_secs
    }
}
