use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{
    error::InventoryError,
    item::{ADENA_TEMPLATE_ID, EquipmentSlot, Item, ItemLocation, MAX_ADENA, PAPERDOLL_SLOT_COUNT},
    object::ObjectId,
};

struct InventoryState {
    items: HashMap<ObjectId, Item>,
    paperdoll: [Option<ObjectId>; PAPERDOLL_SLOT_COUNT],
    warehouse: HashMap<ObjectId, Item>,
    unequipped_count: usize,
}

impl InventoryState {
    fn new() -> Self {
        Self {
            items: HashMap::new(),
            paperdoll: [None; PAPERDOLL_SLOT_COUNT],
            warehouse: HashMap::new(),
            unequipped_count: 0,
        }
    }

    fn unequip_slot(&mut self, slot: EquipmentSlot) {
        if let Some(id) = self.paperdoll[slot.index()].take() {
            if let Some(item) = self.items.get_mut(&id) {
                item.location = ItemLocation::Inventory;
                item.slot = -1;
                self.unequipped_count += 1;
            }
        }
    }
}

/// Owner's items-by-id map, 17-slot paperdoll, and warehouse-by-id map
/// under a single read/write lock (spec.md §3, §4.5, §5).
pub struct Inventory {
    pub owner_id: ObjectId,
    state: RwLock<InventoryState>,
}

impl Inventory {
    pub fn new(owner_id: ObjectId) -> Self {
        Self {
            owner_id,
            state: RwLock::new(InventoryState::new()),
        }
    }

    pub fn unequipped_count(&self) -> usize {
        self.state.read().unequipped_count
    }

    pub fn item_count(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn equipped_count(&self) -> usize {
        let state = self.state.read();
        state.items.len() - state.unequipped_count
    }

    pub fn get_item(&self, id: ObjectId) -> Option<Item> {
        self.state.read().items.get(&id).cloned()
    }

    pub fn get_warehouse_item(&self, id: ObjectId) -> Option<Item> {
        self.state.read().warehouse.get(&id).cloned()
    }

    /// All items currently held, equipped or not (spec.md §4.11's
    /// persistence boundary).
    pub fn all_items(&self) -> Vec<Item> {
        self.state.read().items.values().cloned().collect()
    }

    pub fn all_warehouse_items(&self) -> Vec<Item> {
        self.state.read().warehouse.values().cloned().collect()
    }

    pub fn get_equipped(&self, slot: EquipmentSlot) -> Option<Item> {
        let state = self.state.read();
        state.paperdoll[slot.index()].and_then(|id| state.items.get(&id).cloned())
    }

    pub fn add_item(&self, mut item: Item) -> Result<(), InventoryError> {
        let mut state = self.state.write();
        if state.items.contains_key(&item.object_id) {
            return Err(InventoryError::DuplicateItemId(item.object_id));
        }
        item.location = ItemLocation::Inventory;
        item.slot = -1;
        state.items.insert(item.object_id, item);
        state.unequipped_count += 1;
        Ok(())
    }

    pub fn remove_item(&self, id: ObjectId) -> Option<Item> {
        let mut state = self.state.write();
        let mut item = state.items.remove(&id)?;
        if item.is_equipped() {
            let slot = item.slot as usize;
            state.paperdoll[slot] = None;
        } else {
            state.unequipped_count -= 1;
        }
        item.location = ItemLocation::Void;
        item.slot = -1;
        Some(item)
    }

    /// `EquipItem` from spec.md §4.5. Returns the item displaced from
    /// `slot` itself, if any; a paired slot displaced by a two-handed
    /// weapon or full-body armor is silently returned to the inventory.
    pub fn equip_item(&self, id: ObjectId, slot: EquipmentSlot) -> Result<Option<Item>, InventoryError> {
        let mut state = self.state.write();

        let is_two_handed;
        let is_full_armor;
        {
            let item = state
                .items
                .get(&id)
                .ok_or(InventoryError::ItemNotFound(id))?;
            if item.is_equipped() {
                return Err(InventoryError::ItemEquipped(id));
            }
            is_two_handed = item.is_two_handed();
            is_full_armor = item.is_full_armor();
        }

        if let Some(paired) = slot.paired_displacement() {
            let triggers_pair = match slot {
                EquipmentSlot::RHand => is_two_handed,
                EquipmentSlot::Chest => is_full_armor,
                _ => false,
            };
            if triggers_pair {
                state.unequip_slot(paired);
            }
        }

        let displaced = state.paperdoll[slot.index()].take();
        if let Some(displaced_id) = displaced {
            if let Some(displaced_item) = state.items.get_mut(&displaced_id) {
                displaced_item.location = ItemLocation::Inventory;
                displaced_item.slot = -1;
                state.unequipped_count += 1;
            }
        }

        let item = state.items.get_mut(&id).expect("checked present above");
        item.location = ItemLocation::Paperdoll;
        item.slot = slot.index() as i32;
        state.paperdoll[slot.index()] = Some(id);
        state.unequipped_count -= 1;

        Ok(displaced.and_then(|displaced_id| {
            if displaced_id == id {
                None
            } else {
                state.items.get(&displaced_id).cloned()
            }
        }))
    }

    pub fn unequip_item(&self, slot: EquipmentSlot) -> Option<Item> {
        let mut state = self.state.write();
        let id = state.paperdoll[slot.index()].take()?;
        let item = state.items.get_mut(&id)?;
        item.location = ItemLocation::Inventory;
        item.slot = -1;
        let result = item.clone();
        state.unequipped_count += 1;
        Some(result)
    }

    /// Pair-slot-aware equip finder: fills the first empty slot of a
    /// paired set (earrings, rings), replacing the right-hand side if
    /// both are occupied (spec.md §4.5).
    pub fn find_paired_slot(&self, left: EquipmentSlot, right: EquipmentSlot) -> EquipmentSlot {
        let state = self.state.read();
        if state.paperdoll[left.index()].is_none() {
            left
        } else if state.paperdoll[right.index()].is_none() {
            right
        } else {
            right
        }
    }

    fn find_warehouse_stack_mut<'a>(
        state: &'a mut InventoryState,
        template_id: u32,
    ) -> Option<&'a mut Item> {
        state
            .warehouse
            .values_mut()
            .find(|item| item.template_id == template_id)
    }

    fn find_inventory_stack_mut<'a>(
        state: &'a mut InventoryState,
        template_id: u32,
    ) -> Option<&'a mut Item> {
        state
            .items
            .values_mut()
            .find(|item| item.template_id == template_id && !item.is_equipped())
    }

    pub fn deposit_to_warehouse_split(
        &self,
        src_id: ObjectId,
        n: u32,
        new_id: ObjectId,
    ) -> Result<(), InventoryError> {
        let mut state = self.state.write();
        let (template_id, owner_id, count) = {
            let item = state
                .items
                .get(&src_id)
                .ok_or(InventoryError::ItemNotFound(src_id))?;
            if item.is_equipped() {
                return Err(InventoryError::ItemEquipped(src_id));
            }
            (item.template_id, item.owner_id, item.count)
        };
        if n == 0 || n > count {
            return Err(InventoryError::InvalidSplitAmount);
        }

        if n == count {
            let mut moved = state.items.remove(&src_id).expect("checked present above");
            state.unequipped_count -= 1;
            if let Some(stack) = Self::find_warehouse_stack_mut(&mut state, template_id) {
                stack.count += n;
            } else {
                moved.location = ItemLocation::Warehouse;
                moved.slot = -1;
                state.warehouse.insert(moved.object_id, moved);
            }
        } else {
            state.items.get_mut(&src_id).unwrap().count -= n;
            if let Some(stack) = Self::find_warehouse_stack_mut(&mut state, template_id) {
                stack.count += n;
            } else {
                let mut new_item = Item::new(new_id, template_id, owner_id, n);
                new_item.location = ItemLocation::Warehouse;
                state.warehouse.insert(new_id, new_item);
            }
        }
        Ok(())
    }

    pub fn withdraw_from_warehouse(
        &self,
        src_id: ObjectId,
        n: u32,
        new_id: ObjectId,
    ) -> Result<(), InventoryError> {
        let mut state = self.state.write();
        let (template_id, owner_id, count) = {
            let item = state
                .warehouse
                .get(&src_id)
                .ok_or(InventoryError::ItemNotFound(src_id))?;
            (item.template_id, item.owner_id, item.count)
        };
        if n == 0 || n > count {
            return Err(InventoryError::InvalidSplitAmount);
        }

        if n == count {
            let mut moved = state.warehouse.remove(&src_id).expect("checked present above");
            if let Some(stack) = Self::find_inventory_stack_mut(&mut state, template_id) {
                stack.count += n;
            } else {
                moved.location = ItemLocation::Inventory;
                moved.slot = -1;
                state.items.insert(moved.object_id, moved);
                state.unequipped_count += 1;
            }
        } else {
            state.warehouse.get_mut(&src_id).unwrap().count -= n;
            if let Some(stack) = Self::find_inventory_stack_mut(&mut state, template_id) {
                stack.count += n;
            } else {
                let new_item = Item::new(new_id, template_id, owner_id, n);
                state.items.insert(new_id, new_item);
                state.unequipped_count += 1;
            }
        }
        Ok(())
    }

    /// Rebuilds the inventory wholesale from previously snapshotted items,
    /// trusting each `Item`'s own `location`/`slot` fields to reconstruct
    /// the paperdoll and unequipped-count cache (spec.md §4.11's
    /// persistence boundary; used by `EntitySnapshot::apply_snapshot`).
    pub fn restore(&self, items: Vec<Item>, warehouse: Vec<Item>) {
        let mut state = self.state.write();
        state.paperdoll = [None; PAPERDOLL_SLOT_COUNT];
        state.unequipped_count = 0;
        state.items.clear();
        for item in items {
            if item.is_equipped() {
                state.paperdoll[item.slot as usize] = Some(item.object_id);
            } else {
                state.unequipped_count += 1;
            }
            state.items.insert(item.object_id, item);
        }
        state.warehouse = warehouse.into_iter().map(|item| (item.object_id, item)).collect();
    }

    pub fn add_warehouse_item(&self, mut item: Item) -> Result<(), InventoryError> {
        let mut state = self.state.write();
        if state.warehouse.contains_key(&item.object_id) {
            return Err(InventoryError::DuplicateItemId(item.object_id));
        }
        item.location = ItemLocation::Warehouse;
        item.slot = -1;
        state.warehouse.insert(item.object_id, item);
        Ok(())
    }

    pub fn get_adena(&self) -> u32 {
        let state = self.state.read();
        state
            .items
            .values()
            .find(|item| item.is_adena())
            .map(|item| item.count)
            .unwrap_or(0)
    }

    pub fn add_adena(&self, amount: u32) -> Result<(), InventoryError> {
        let mut state = self.state.write();
        let item = state
            .items
            .values_mut()
            .find(|item| item.is_adena())
            .ok_or(InventoryError::NoAdenaStack)?;
        let new_total = (item.count as i64 + amount as i64).min(MAX_ADENA);
        item.count = new_total as u32;
        Ok(())
    }

    pub fn remove_adena(&self, amount: u32) -> Result<(), InventoryError> {
        let mut state = self.state.write();
        let item = state
            .items
            .values_mut()
            .find(|item| item.is_adena())
            .ok_or(InventoryError::NoAdenaStack)?;
        if item.count < amount {
            return Err(InventoryError::InsufficientAdena);
        }
        item.count -= amount;
        Ok(())
    }

    pub fn count_items_by_id(&self, template_id: u32) -> u32 {
        self.state
            .read()
            .items
            .values()
            .filter(|item| item.template_id == template_id)
            .map(|item| item.count)
            .sum()
    }

    /// Consumes full stacks before partial ones, stopping once `n` total
    /// quantity has been removed; returns the amount actually removed
    /// (spec.md §4.5).
    pub fn remove_items_by_id(&self, template_id: u32, n: u32) -> u32 {
        let mut state = self.state.write();
        let mut candidate_ids: Vec<ObjectId> = state
            .items
            .values()
            .filter(|item| item.template_id == template_id && !item.is_equipped())
            .map(|item| item.object_id)
            .collect();
        candidate_ids.sort();

        let mut remaining = n;
        let mut removed_total = 0u32;
        for id in candidate_ids {
            if remaining == 0 {
                break;
            }
            let count = state.items.get(&id).map(|item| item.count).unwrap_or(0);
            if count <= remaining {
                state.items.remove(&id);
                state.unequipped_count -= 1;
                removed_total += count;
                remaining -= count;
            } else {
                state.items.get_mut(&id).unwrap().count -= remaining;
                removed_total += remaining;
                remaining = 0;
            }
        }
        removed_total
    }

    fn is_sellable_or_depositable(item: &Item) -> bool {
        !item.is_equipped() && !item.is_adena() && item.tradeable
    }

    pub fn sellable_items(&self) -> Vec<ObjectId> {
        self.state
            .read()
            .items
            .values()
            .filter(|item| Self::is_sellable_or_depositable(item) && item.sellable)
            .map(|item| item.object_id)
            .collect()
    }

    pub fn depositable_items(&self) -> Vec<ObjectId> {
        self.state
            .read()
            .items
            .values()
            .filter(|item| Self::is_sellable_or_depositable(item))
            .map(|item| item.object_id)
            .collect()
    }

    /// Testable property 1/2/3 from spec.md §8: verifies the paperdoll and
    /// unequipped-count invariants all hold simultaneously.
    #[cfg(test)]
    fn check_invariants(&self) {
        let state = self.state.read();
        let equipped = state.items.values().filter(|item| item.is_equipped()).count();
        assert_eq!(state.unequipped_count, state.items.len() - equipped);
        for (slot_index, occupant) in state.paperdoll.iter().enumerate() {
            if let Some(id) = occupant {
                let item = state.items.get(id).expect("paperdoll references live item");
                assert_eq!(item.slot, slot_index as i32);
                assert!(item.is_equipped());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::BODY_PART_L_R_HAND;

    fn weapon(id: u32, owner: ObjectId) -> Item {
        Item::new(ObjectId(id), 1000, owner, 1).with_body_part_mask(BODY_PART_L_R_HAND)
    }

    #[test]
    fn add_then_equip_then_unequip_round_trips() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(Item::new(ObjectId(50001), 1000, ObjectId(1), 1)).unwrap();
        let displaced = inv.equip_item(ObjectId(50001), EquipmentSlot::RHand).unwrap();
        assert!(displaced.is_none());
        assert_eq!(inv.unequipped_count(), 0);
        inv.check_invariants();

        let unequipped = inv.unequip_item(EquipmentSlot::RHand).unwrap();
        assert_eq!(unequipped.slot, -1);
        assert_eq!(unequipped.location, ItemLocation::Inventory);
        assert_eq!(inv.unequipped_count(), 1);
        inv.check_invariants();
    }

    #[test]
    fn scenario_equip_displaces_previous_occupant() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(Item::new(ObjectId(50001), 1000, ObjectId(1), 1)).unwrap();
        inv.add_item(Item::new(ObjectId(50002), 1000, ObjectId(1), 1)).unwrap();

        let first = inv.equip_item(ObjectId(50001), EquipmentSlot::RHand).unwrap();
        assert!(first.is_none());

        let displaced = inv.equip_item(ObjectId(50002), EquipmentSlot::RHand).unwrap();
        assert_eq!(displaced.unwrap().object_id, ObjectId(50001));
        assert_eq!(
            inv.get_equipped(EquipmentSlot::RHand).unwrap().object_id,
            ObjectId(50002)
        );
        inv.check_invariants();
    }

    #[test]
    fn two_handed_equip_leaves_l_hand_empty() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(weapon(50001, ObjectId(1))).unwrap();
        inv.add_item(Item::new(ObjectId(50002), 2000, ObjectId(1), 1)).unwrap();
        inv.equip_item(ObjectId(50002), EquipmentSlot::LHand).unwrap();
        inv.equip_item(ObjectId(50001), EquipmentSlot::RHand).unwrap();
        assert!(inv.get_equipped(EquipmentSlot::LHand).is_none());
        assert_eq!(
            inv.get_equipped(EquipmentSlot::RHand).unwrap().object_id,
            ObjectId(50001)
        );
        inv.check_invariants();
    }

    #[test]
    fn scenario_warehouse_split_merges_into_single_stack() {
        let inv = Inventory::new(ObjectId(1));
        let mut existing_stack = Item::new(ObjectId(60001), 100, ObjectId(1), 100);
        existing_stack.location = ItemLocation::Warehouse;
        inv.add_warehouse_item(existing_stack).unwrap();

        inv.add_item(Item::new(ObjectId(50001), 100, ObjectId(1), 300)).unwrap();
        inv.deposit_to_warehouse_split(ObjectId(50001), 200, ObjectId(70001)).unwrap();

        assert_eq!(inv.get_item(ObjectId(50001)).unwrap().count, 100);
        assert_eq!(inv.get_warehouse_item(ObjectId(60001)).unwrap().count, 300);
        assert!(inv.get_warehouse_item(ObjectId(70001)).is_none());
    }

    #[test]
    fn deposit_then_withdraw_restores_count() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(Item::new(ObjectId(50001), 100, ObjectId(1), 300)).unwrap();
        inv.deposit_to_warehouse_split(ObjectId(50001), 200, ObjectId(70001)).unwrap();
        let warehouse_id = inv
            .state
            .read()
            .warehouse
            .values()
            .find(|item| item.template_id == 100)
            .unwrap()
            .object_id;
        inv.withdraw_from_warehouse(warehouse_id, 200, ObjectId(80001)).unwrap();
        assert_eq!(inv.count_items_by_id(100), 300);
    }

    #[test]
    fn cannot_deposit_or_remove_equipped_item() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(Item::new(ObjectId(50001), 100, ObjectId(1), 1)).unwrap();
        inv.equip_item(ObjectId(50001), EquipmentSlot::Head).unwrap();
        assert_eq!(
            inv.deposit_to_warehouse_split(ObjectId(50001), 1, ObjectId(99)),
            Err(InventoryError::ItemEquipped(ObjectId(50001)))
        );
    }

    #[test]
    fn adena_helpers_respect_insufficiency() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(Item::new(ObjectId(50001), ADENA_TEMPLATE_ID, ObjectId(1), 100)).unwrap();
        assert_eq!(inv.get_adena(), 100);
        inv.add_adena(50).unwrap();
        assert_eq!(inv.get_adena(), 150);
        assert_eq!(inv.remove_adena(1000), Err(InventoryError::InsufficientAdena));
        inv.remove_adena(150).unwrap();
        assert_eq!(inv.get_adena(), 0);
    }

    #[test]
    fn remove_items_by_id_consumes_full_stacks_before_partial() {
        let inv = Inventory::new(ObjectId(1));
        inv.add_item(Item::new(ObjectId(1), 500, ObjectId(1), 10)).unwrap();
        inv.add_item(Item::new(ObjectId(2), 500, ObjectId(1), 10)).unwrap();
        let removed = inv.remove_items_by_id(500, 15);
        assert_eq!(removed, 15);
        assert_eq!(inv.count_items_by_id(500), 5);
    }
}
