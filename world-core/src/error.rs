use thiserror::Error;

use crate::object::ObjectId;

/// Failures from the inventory state machine (spec.md §4.5, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryError {
    #[error("duplicate item id {0:?}")]
    DuplicateItemId(ObjectId),

    #[error("item {0:?} not found in inventory")]
    ItemNotFound(ObjectId),

    #[error("paperdoll slot {0} is out of range")]
    InvalidSlot(i32),

    #[error("item {0:?} is currently equipped and cannot be deposited or removed directly")]
    ItemEquipped(ObjectId),

    #[error("split amount must be in (0, count]")]
    InvalidSplitAmount,

    #[error("no adena stack to modify")]
    NoAdenaStack,

    #[error("insufficient adena")]
    InsufficientAdena,
}

/// Failures from `Party`/`PartyManager` operations (spec.md §4.7, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyError {
    #[error("party is full")]
    PartyFull,

    #[error("object {0:?} is already a party member")]
    AlreadyMember(ObjectId),

    #[error("object {0:?} is not a party member")]
    NotMember(ObjectId),

    #[error("party {0} not found")]
    PartyNotFound(u32),
}

/// Failures from `P2PTradeList` and private-store (`TradeList`) operations
/// (spec.md §4.8, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeError {
    #[error("trade list is locked")]
    Locked,

    #[error("trade has already been confirmed by this side")]
    AlreadyConfirmed,

    #[error("item {0:?} is not present in the owner's inventory")]
    ItemNotInInventory(ObjectId),

    #[error("item {0:?} has already been added to this trade")]
    DuplicateItem(ObjectId),

    #[error("requested count exceeds the item's stack size")]
    CountExceedsStack,

    #[error("trade request has expired")]
    RequestExpired,

    #[error("no pending trade request")]
    NoPendingRequest,
}

/// Failures from `PrivateStore`/`TradeList` offer management (spec.md §4.8, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("store is locked")]
    Locked,

    #[error("count must be greater than zero")]
    NonPositiveCount,

    #[error("price must not be negative")]
    NegativePrice,

    #[error("count * price overflows the adena cap")]
    PriceOverflow,

    #[error("item {0:?} is not listed in this store")]
    OfferNotFound(ObjectId),

    #[error("package store sale must be all-or-nothing")]
    PartialPackageSale,
}

/// Failures from subclass slot management (spec.md §4.6, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubclassError {
    #[error("subclass index must be in [1,3]")]
    InvalidIndex(u8),

    #[error("subclass slot {0} is already occupied")]
    SlotOccupied(u8),

    #[error("subclass slot {0} is empty")]
    SlotEmpty(u8),

    #[error("player already holds the maximum of 3 subclasses")]
    CapReached,

    #[error("player and all existing subclasses must be at least level 75")]
    LevelGateFailed,

    #[error("proposed class is not a valid subclass for this base class/race")]
    RejectedByValidator,

    #[error("a subclass operation is already in progress")]
    OperationInProgress,
}

/// Failures surfaced directly from `Player` operations that aren't better
/// homed in one of the subsystem error enums above (spec.md §4.6, §7).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerError {
    #[error("level must be in [1,80]")]
    InvalidLevel(i32),

    #[error("active class index must be in [0,3]")]
    InvalidClassIndex(u8),

    #[error("logout is blocked: {0}")]
    LogoutBlocked(&'static str),

    #[error(transparent)]
    Subclass(#[from] SubclassError),
}
