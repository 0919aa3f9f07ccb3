use serde::{de::DeserializeOwned, Serialize};

use crate::{inventory::Inventory, item::Item, object::ObjectId, party::Party};

/// Produces and restores a serde-serialisable snapshot of an object's
/// persisted fields, so a collaborator can save/load it around sessions
/// without the core depending on any storage format or I/O crate
/// (spec.md §1's persistence-driver Non-goal; SPEC_FULL.md §4.11,
/// grounded on `rose-offline-server`'s `storage::account`/`storage::character`).
pub trait EntitySnapshot {
    type Snapshot: Serialize + DeserializeOwned;

    fn to_snapshot(&self) -> Self::Snapshot;
    fn apply_snapshot(&self, snapshot: Self::Snapshot);
}

#[derive(Clone, Debug, Serialize, serde::Deserialize)]
pub struct InventorySnapshot {
    pub items: Vec<Item>,
    pub warehouse: Vec<Item>,
}

impl EntitySnapshot for Inventory {
    type Snapshot = InventorySnapshot;

    fn to_snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            items: self.all_items(),
            warehouse: self.all_warehouse_items(),
        }
    }

    fn apply_snapshot(&self, snapshot: InventorySnapshot) {
        self.restore(snapshot.items, snapshot.warehouse);
    }
}

#[derive(Clone, Debug, Serialize, serde::Deserialize)]
pub struct PartySnapshot {
    pub leader: ObjectId,
    pub members: Vec<ObjectId>,
}

impl EntitySnapshot for Party {
    type Snapshot = PartySnapshot;

    fn to_snapshot(&self) -> PartySnapshot {
        PartySnapshot {
            leader: self.leader(),
            members: self.members(),
        }
    }

    /// Re-adds every saved member, then restores the saved leader. Members
    /// already present (e.g. the party's own creator) are skipped rather
    /// than treated as an error.
    fn apply_snapshot(&self, snapshot: PartySnapshot) {
        for member in &snapshot.members {
            if !self.is_member(*member) {
                let _ = self.add_member(*member);
            }
        }
        let _ = self.set_leader(snapshot.leader);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    #[test]
    fn inventory_snapshot_round_trips() {
        let inventory = Inventory::new(ObjectId(1));
        inventory.add_item(Item::new(ObjectId(50001), 100, ObjectId(1), 5)).unwrap();

        let snapshot = inventory.to_snapshot();
        let serialized = serde_json::to_string(&snapshot).unwrap();
        let restored_snapshot: InventorySnapshot = serde_json::from_str(&serialized).unwrap();

        let restored = Inventory::new(ObjectId(1));
        restored.apply_snapshot(restored_snapshot);
        assert_eq!(restored.count_items_by_id(100), 5);
    }

    #[test]
    fn party_snapshot_round_trips() {
        let config = WorldConfig::default();
        let party = Party::new(1, ObjectId(1), &config);
        party.add_member(ObjectId(2)).unwrap();
        let snapshot = party.to_snapshot();

        let restored = Party::new(1, ObjectId(2), &config);
        restored.apply_snapshot(snapshot);
        assert!(restored.is_member(ObjectId(1)));
        assert_eq!(restored.leader(), ObjectId(1));
    }
}
