use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use crate::object::WorldObject;

/// A 32-bit word mutated only through CAS-style bit operations, shared by
/// the CC flag set and the zone membership set (spec.md §4.2, §9).
#[derive(Default)]
pub struct AtomicBitfield(AtomicU32);

impl AtomicBitfield {
    pub fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn set(&self, bit: u32) {
        self.0.fetch_or(1 << bit, Ordering::AcqRel);
    }

    pub fn clear(&self, bit: u32) {
        self.0.fetch_and(!(1 << bit), Ordering::AcqRel);
    }

    pub fn is_set(&self, bit: u32) -> bool {
        self.0.load(Ordering::Acquire) & (1 << bit) != 0
    }

    pub fn any_set(&self, mask: u32) -> bool {
        self.0.load(Ordering::Acquire) & mask != 0
    }

    pub fn bits(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn clear_all(&self) {
        self.0.store(0, Ordering::Release);
    }
}

pub const CC_STUN: u32 = 0;
pub const CC_ROOT: u32 = 1;
pub const CC_SLEEP: u32 = 2;
pub const CC_PARALYSIS: u32 = 3;
pub const CC_FEAR: u32 = 4;

const CC_IMMOBILIZED_MASK: u32 =
    (1 << CC_STUN) | (1 << CC_ROOT) | (1 << CC_SLEEP) | (1 << CC_PARALYSIS);
const CC_DISABLED_MASK: u32 = (1 << CC_STUN) | (1 << CC_SLEEP) | (1 << CC_PARALYSIS);

/// Zone flag indices 0-21 (spec.md §3/§6). The exact bit assignment is not
/// pinned by a reference implementation; see DESIGN.md for the open
/// question this resolves.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum ZoneFlag {
    Peace = 0,
    Pvp = 1,
    Siege = 2,
    ClanWar = 3,
    Jail = 4,
    Dungeon = 5,
    Arena = 6,
    Town = 7,
    Castle = 8,
    Agit = 9,
    Water = 10,
    Swamp = 11,
    Snowfield = 12,
    NoRestart = 13,
    NoEscape = 14,
    NoItemDrop = 15,
    NoExpLoss = 16,
    NoSummonFriendly = 17,
    NoRecovery = 18,
    Motd = 19,
    Instance = 20,
    Sanctuary = 21,
}

/// Current/max resource pool shared by HP, MP, and CP (spec.md §3, §4.2).
/// `current` is kept atomic since it is read on every damage/heal tick off
/// the entity lock (spec.md §5); `max` changes far less often but is
/// mutated in lockstep with `current` via a CAS retry loop so the two
/// never observe a torn intermediate state.
pub struct ResourcePool {
    current: AtomicI32,
    max: AtomicI32,
}

impl ResourcePool {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self {
            current: AtomicI32::new(max),
            max: AtomicI32::new(max),
        }
    }

    pub fn current(&self) -> i32 {
        self.current.load(Ordering::Acquire)
    }

    pub fn max(&self) -> i32 {
        self.max.load(Ordering::Acquire)
    }

    /// Clamp `current` into `[0, max]`.
    pub fn set_current(&self, value: i32) {
        let max = self.max.load(Ordering::Acquire);
        let clamped = value.clamp(0, max);
        self.current.store(clamped, Ordering::Release);
    }

    /// Replace `max`, clamped to `>= 1`, clipping `current` down if it now
    /// exceeds the new max.
    pub fn set_max(&self, new_max: i32) {
        let new_max = new_max.max(1);
        self.max.store(new_max, Ordering::Release);
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current <= new_max {
                break;
            }
            if self
                .current
                .compare_exchange_weak(current, new_max, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Saturating subtract, clamped at zero (`ReduceCurrentHP` in spec.md §4.2).
    pub fn reduce(&self, amount: i32) {
        loop {
            let current = self.current.load(Ordering::Acquire);
            let next = current.saturating_sub(amount).max(0);
            if self
                .current
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }

    /// Saturating add, clamped at `max`.
    pub fn restore(&self, amount: i32) {
        loop {
            let current = self.current.load(Ordering::Acquire);
            let max = self.max.load(Ordering::Acquire);
            let next = current.saturating_add(amount).min(max);
            if self
                .current
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current() <= 0
    }
}

/// HP/MP/CP pools, CC/zone bitfields, cast flag, and the death latch
/// shared by every living entity (spec.md §3, §4.2).
pub struct Character {
    pub world_object: WorldObject,
    level: AtomicI32,
    pub hp: ResourcePool,
    pub mp: ResourcePool,
    pub cp: ResourcePool,
    cc_flags: AtomicBitfield,
    zone_flags: AtomicBitfield,
    casting: AtomicBool,
    has_died: AtomicBool,
}

impl Character {
    pub fn new(world_object: WorldObject, level: i32, max_hp: i32, max_mp: i32, max_cp: i32) -> Self {
        Self {
            world_object,
            level: AtomicI32::new(level),
            hp: ResourcePool::new(max_hp),
            mp: ResourcePool::new(max_mp),
            cp: ResourcePool::new(max_cp),
            cc_flags: AtomicBitfield::new(),
            zone_flags: AtomicBitfield::new(),
            casting: AtomicBool::new(false),
            has_died: AtomicBool::new(false),
        }
    }

    pub fn level(&self) -> i32 {
        self.level.load(Ordering::Acquire)
    }

    pub fn set_level(&self, level: i32) {
        self.level.store(level, Ordering::Release);
    }

    pub fn is_casting(&self) -> bool {
        self.casting.load(Ordering::Acquire)
    }

    pub fn set_casting(&self, casting: bool) {
        self.casting.store(casting, Ordering::Release);
    }

    pub fn set_cc(&self, bit: u32, active: bool) {
        if active {
            self.cc_flags.set(bit);
        } else {
            self.cc_flags.clear(bit);
        }
    }

    pub fn has_cc(&self, bit: u32) -> bool {
        self.cc_flags.is_set(bit)
    }

    pub fn is_immobilized(&self) -> bool {
        self.cc_flags.any_set(CC_IMMOBILIZED_MASK)
    }

    pub fn is_disabled(&self) -> bool {
        self.cc_flags.any_set(CC_DISABLED_MASK)
    }

    pub fn clear_cc(&self) {
        self.cc_flags.clear_all();
    }

    pub fn set_zone(&self, flag: ZoneFlag, active: bool) {
        if active {
            self.zone_flags.set(flag as u32);
        } else {
            self.zone_flags.clear(flag as u32);
        }
    }

    pub fn is_in_zone(&self, flag: ZoneFlag) -> bool {
        self.zone_flags.is_set(flag as u32)
    }

    /// Single-shot death latch: returns true exactly once per life. The
    /// `killer` parameter is the caller's concern to record/attribute; the
    /// latch itself only decides whether this call is the one that "wins".
    pub fn do_die(&self) -> bool {
        self.has_died
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_dead(&self) -> bool {
        self.has_died.load(Ordering::Acquire)
    }

    /// Re-arms the death latch on respawn.
    pub fn reset_death_once(&self) {
        self.has_died.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{ObjectId, WorldObjectData};
    use crate::spatial::Location;
    use std::sync::Weak;

    fn make_character(max_hp: i32) -> Character {
        let world_object = WorldObject::new(
            ObjectId(1),
            "Test".to_string(),
            Location::default(),
            WorldObjectData::Player(Weak::new()),
        );
        Character::new(world_object, 1, max_hp, 100, 50)
    }

    #[test]
    fn resource_pool_clamps_into_range() {
        let character = make_character(100);
        character.hp.set_current(150);
        assert_eq!(character.hp.current(), 100);
        character.hp.set_current(-10);
        assert_eq!(character.hp.current(), 0);
    }

    #[test]
    fn reduce_current_hp_saturates_at_zero() {
        let character = make_character(100);
        character.hp.reduce(1000);
        assert_eq!(character.hp.current(), 0);
        assert!(character.hp.is_empty());
    }

    #[test]
    fn set_max_clips_current_down() {
        let character = make_character(100);
        assert_eq!(character.hp.current(), 100);
        character.hp.set_max(50);
        assert_eq!(character.hp.current(), 50);
        assert_eq!(character.hp.max(), 50);
    }

    #[test]
    fn death_latch_fires_once_until_reset() {
        let character = make_character(100);
        assert!(character.do_die());
        assert!(!character.do_die());
        character.reset_death_once();
        assert!(character.do_die());
    }

    #[test]
    fn immobilized_and_disabled_composites() {
        let character = make_character(100);
        assert!(!character.is_immobilized());
        character.set_cc(CC_ROOT, true);
        assert!(character.is_immobilized());
        assert!(!character.is_disabled());
        character.set_cc(CC_ROOT, false);
        character.set_cc(CC_STUN, true);
        assert!(character.is_immobilized());
        assert!(character.is_disabled());
    }

    #[test]
    fn zone_flags_are_independent_bits() {
        let character = make_character(100);
        character.set_zone(ZoneFlag::Town, true);
        character.set_zone(ZoneFlag::Pvp, true);
        assert!(character.is_in_zone(ZoneFlag::Town));
        assert!(character.is_in_zone(ZoneFlag::Pvp));
        character.set_zone(ZoneFlag::Town, false);
        assert!(!character.is_in_zone(ZoneFlag::Town));
        assert!(character.is_in_zone(ZoneFlag::Pvp));
    }
}
