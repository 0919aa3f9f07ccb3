use parking_lot::Mutex;

use crate::{error::SubclassError, templates::{ExpTable, SubclassValidator}};

/// Level gate both the player and every existing subclass must clear
/// before a new subclass may be added (spec.md §4.6).
pub const SUBCLASS_LEVEL_GATE: i32 = 75;

/// Starting level for a freshly added subclass (spec.md §4.6).
pub const SUBCLASS_STARTING_LEVEL: i32 = 40;

/// Maximum number of subclass slots, excluding the base class at index 0
/// (spec.md §4.6).
pub const MAX_SUBCLASSES: usize = 3;

/// Saved level/xp/sp for one class slot, captured whenever that slot is
/// not the active one (spec.md §4.6's `SetActiveClass`).
#[derive(Copy, Clone, Debug)]
pub struct SubclassSlot {
    pub class_id: u32,
    pub level: i32,
    pub xp: i64,
    pub sp: i64,
}

impl SubclassSlot {
    fn new_at_level(class_id: u32, level: i32, xp: i64) -> Self {
        Self { class_id, level, xp, sp: 0 }
    }
}

struct SubclassInner {
    /// Index 0 is always the base class; indices 1-3 are subclasses.
    slots: [Option<SubclassSlot>; MAX_SUBCLASSES + 1],
    active_index: u8,
}

/// The player's subclass slots, serialized on their own mutex distinct
/// from `playerMu` (spec.md §4.6, §5's lock-ordering rule: subclass mutex
/// is acquired before `playerMu`).
pub struct SubclassManager {
    inner: Mutex<SubclassInner>,
}

impl SubclassManager {
    pub fn new(base_class_id: u32, base_level: i32, base_xp: i64) -> Self {
        let mut slots: [Option<SubclassSlot>; MAX_SUBCLASSES + 1] = [None, None, None, None];
        slots[0] = Some(SubclassSlot::new_at_level(base_class_id, base_level, base_xp));
        Self {
            inner: Mutex::new(SubclassInner {
                slots,
                active_index: 0,
            }),
        }
    }

    pub fn active_index(&self) -> u8 {
        self.inner.lock().active_index
    }

    pub fn active_class_id(&self) -> u32 {
        let inner = self.inner.lock();
        inner.slots[inner.active_index as usize]
            .expect("active slot always populated")
            .class_id
    }

    pub fn subclass_count(&self) -> usize {
        self.inner.lock().slots[1..].iter().filter(|slot| slot.is_some()).count()
    }

    /// Non-blocking probe used by `Player::can_logout` to detect an
    /// in-flight subclass operation without waiting on it.
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_none()
    }

    pub fn add_subclass(
        &self,
        class_id: u32,
        index: u8,
        base_class_id: u32,
        race_id: u32,
        player_level: i32,
        validator: &dyn SubclassValidator,
        exp_table: &dyn ExpTable,
    ) -> Result<(), SubclassError> {
        if !(1..=MAX_SUBCLASSES as u8).contains(&index) {
            return Err(SubclassError::InvalidIndex(index));
        }
        let mut inner = self.inner.lock();
        if inner.slots[index as usize].is_some() {
            return Err(SubclassError::SlotOccupied(index));
        }
        let occupied = inner.slots[1..].iter().filter(|slot| slot.is_some()).count();
        if occupied >= MAX_SUBCLASSES {
            return Err(SubclassError::CapReached);
        }
        if player_level < SUBCLASS_LEVEL_GATE
            || inner.slots.iter().flatten().any(|slot| slot.level < SUBCLASS_LEVEL_GATE)
        {
            return Err(SubclassError::LevelGateFailed);
        }
        let existing_ids: Vec<u32> = inner.slots.iter().flatten().map(|slot| slot.class_id).collect();
        if !validator.is_valid_subclass(class_id, base_class_id, race_id, &existing_ids) {
            return Err(SubclassError::RejectedByValidator);
        }
        let starting_xp = exp_table.exp_for_level(SUBCLASS_STARTING_LEVEL);
        inner.slots[index as usize] = Some(SubclassSlot::new_at_level(class_id, SUBCLASS_STARTING_LEVEL, starting_xp));
        Ok(())
    }

    /// Saves the currently active slot's live level/xp/sp, then makes
    /// `new_index` active and returns its saved level/xp/sp so the caller
    /// can re-arm its `Character`/xp fields (spec.md §4.6's
    /// `SetActiveClass`).
    pub fn set_active_class(
        &self,
        new_index: u8,
        current_level: i32,
        current_xp: i64,
        current_sp: i64,
    ) -> Result<SubclassSlot, SubclassError> {
        if new_index as usize > MAX_SUBCLASSES {
            return Err(SubclassError::InvalidIndex(new_index));
        }
        let mut inner = self.inner.lock();
        if inner.slots[new_index as usize].is_none() {
            return Err(SubclassError::SlotEmpty(new_index));
        }
        let active_index = inner.active_index as usize;
        if let Some(active_slot) = inner.slots[active_index].as_mut() {
            active_slot.level = current_level;
            active_slot.xp = current_xp;
            active_slot.sp = current_sp;
        }
        inner.active_index = new_index;
        Ok(inner.slots[new_index as usize].expect("checked present above"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysValid;
    impl SubclassValidator for AlwaysValid {
        fn is_valid_subclass(&self, _class_id: u32, _base_class_id: u32, _race_id: u32, _existing_ids: &[u32]) -> bool {
            true
        }
    }

    struct AlwaysReject;
    impl SubclassValidator for AlwaysReject {
        fn is_valid_subclass(&self, _class_id: u32, _base_class_id: u32, _race_id: u32, _existing_ids: &[u32]) -> bool {
            false
        }
    }

    struct FlatExpTable;
    impl ExpTable for FlatExpTable {
        fn exp_for_level(&self, level: i32) -> i64 {
            level as i64 * 1000
        }
    }

    #[test]
    fn add_subclass_enforces_level_gate() {
        let manager = SubclassManager::new(1, 70, 70_000);
        let result = manager.add_subclass(2, 1, 1, 1, 70, &AlwaysValid, &FlatExpTable);
        assert_eq!(result, Err(SubclassError::LevelGateFailed));
    }

    #[test]
    fn scenario_add_then_switch_preserves_per_slot_progress() {
        let manager = SubclassManager::new(1, 76, 76_000);
        manager.add_subclass(2, 1, 1, 1, 76, &AlwaysValid, &FlatExpTable).unwrap();
        assert_eq!(manager.subclass_count(), 1);

        let loaded = manager.set_active_class(1, 76, 76_000, 500).unwrap();
        assert_eq!(loaded.class_id, 2);
        assert_eq!(loaded.level, SUBCLASS_STARTING_LEVEL);

        let back_to_base = manager.set_active_class(0, 41, 41_000, 10).unwrap();
        assert_eq!(back_to_base.class_id, 1);
        assert_eq!(back_to_base.level, 76);
        assert_eq!(back_to_base.sp, 500);
    }

    #[test]
    fn validator_rejection_is_surfaced() {
        let manager = SubclassManager::new(1, 80, 80_000);
        assert_eq!(
            manager.add_subclass(2, 1, 1, 1, 80, &AlwaysReject, &FlatExpTable),
            Err(SubclassError::RejectedByValidator)
        );
    }

    #[test]
    fn all_three_subclass_slots_can_be_filled() {
        let manager = SubclassManager::new(1, 80, 80_000);
        manager.add_subclass(2, 1, 1, 1, 80, &AlwaysValid, &FlatExpTable).unwrap();
        manager.add_subclass(3, 2, 1, 1, 80, &AlwaysValid, &FlatExpTable).unwrap();
        manager.add_subclass(4, 3, 1, 1, 80, &AlwaysValid, &FlatExpTable).unwrap();
        assert_eq!(manager.subclass_count(), MAX_SUBCLASSES);
        assert_eq!(
            manager.add_subclass(5, 1, 1, 1, 80, &AlwaysValid, &FlatExpTable),
            Err(SubclassError::SlotOccupied(1))
        );
    }
}
