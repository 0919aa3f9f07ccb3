use serde::{Deserialize, Serialize};

use crate::object::{ObjectId, WorldObject};

/// Item template id reserved for adena (spec.md §4.5, §6).
pub const ADENA_TEMPLATE_ID: u32 = 57;

/// Max adena a single stack (or trade/store total) may hold (spec.md §6).
pub const MAX_ADENA: i64 = 2_147_483_647;

/// Canonical paperdoll slot order (spec.md §4.5). `EquipmentSlot as usize`
/// is the paperdoll array index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(usize)]
pub enum EquipmentSlot {
    Underwear = 0,
    LEar = 1,
    REar = 2,
    Neck = 3,
    LFinger = 4,
    RFinger = 5,
    Head = 6,
    RHand = 7,
    LHand = 8,
    Gloves = 9,
    Chest = 10,
    Legs = 11,
    Feet = 12,
    Cloak = 13,
    Face = 14,
    Hair = 15,
    Hair2 = 16,
}

/// Total paperdoll slot count (spec.md §6).
pub const PAPERDOLL_SLOT_COUNT: usize = 17;

impl EquipmentSlot {
    pub const ALL: [EquipmentSlot; PAPERDOLL_SLOT_COUNT] = [
        EquipmentSlot::Underwear,
        EquipmentSlot::LEar,
        EquipmentSlot::REar,
        EquipmentSlot::Neck,
        EquipmentSlot::LFinger,
        EquipmentSlot::RFinger,
        EquipmentSlot::Head,
        EquipmentSlot::RHand,
        EquipmentSlot::LHand,
        EquipmentSlot::Gloves,
        EquipmentSlot::Chest,
        EquipmentSlot::Legs,
        EquipmentSlot::Feet,
        EquipmentSlot::Cloak,
        EquipmentSlot::Face,
        EquipmentSlot::Hair,
        EquipmentSlot::Hair2,
    ];

    pub fn from_index(index: usize) -> Option<EquipmentSlot> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Does outfitting this slot with a two-handed weapon / full-body
    /// armor also displace a second slot (spec.md §4.5)?
    pub fn paired_displacement(self) -> Option<EquipmentSlot> {
        match self {
            EquipmentSlot::RHand => Some(EquipmentSlot::LHand),
            EquipmentSlot::Chest => Some(EquipmentSlot::Legs),
            _ => None,
        }
    }
}

/// Body-part bitmask values used in item packets (spec.md §6).
pub const BODY_PART_UNDERWEAR: u32 = 0x0001;
pub const BODY_PART_R_EAR: u32 = 0x0002;
pub const BODY_PART_L_EAR: u32 = 0x0004;
pub const BODY_PART_NECK: u32 = 0x0008;
pub const BODY_PART_R_FINGER: u32 = 0x0010;
pub const BODY_PART_L_FINGER: u32 = 0x0020;
pub const BODY_PART_HEAD: u32 = 0x0040;
pub const BODY_PART_R_HAND: u32 = 0x0080;
pub const BODY_PART_L_HAND: u32 = 0x0100;
pub const BODY_PART_GLOVES: u32 = 0x0200;
pub const BODY_PART_CHEST: u32 = 0x0400;
pub const BODY_PART_LEGS: u32 = 0x0800;
pub const BODY_PART_FEET: u32 = 0x1000;
pub const BODY_PART_BACK: u32 = 0x2000;
pub const BODY_PART_L_R_HAND: u32 = 0x4000;
pub const BODY_PART_FULL_ARMOR: u32 = 0x8000;
pub const BODY_PART_HAIR: u32 = 0x0001_0000;
pub const BODY_PART_ALL_DRESS: u32 = 0x0002_0000;
pub const BODY_PART_HAIR2: u32 = 0x0004_0000;
pub const BODY_PART_HAIR_ALL: u32 = 0x0008_0000;

/// Where an `Item` instance currently lives (spec.md §3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemLocation {
    Inventory,
    Paperdoll,
    Warehouse,
    Void,
}

/// A single item instance (spec.md §3). `slot` is only meaningful when
/// `location == Paperdoll`, in which case it holds the `EquipmentSlot`
/// index; otherwise it is `-1`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub object_id: ObjectId,
    pub template_id: u32,
    pub owner_id: ObjectId,
    pub location: ItemLocation,
    pub slot: i32,
    pub count: u32,
    pub enchant: u16,
    pub shot_charges: u32,
    pub augmentation_id: Option<u32>,
    /// Body-part bitmask copied from the item's template at creation
    /// (spec.md §6); used by `Inventory::equip_item` to tell a
    /// two-handed weapon or full-body armor from an ordinary single-slot
    /// item without the inventory needing a template lookup of its own.
    pub body_part_mask: u32,
    pub sellable: bool,
    pub tradeable: bool,
}

impl Item {
    pub fn new(object_id: ObjectId, template_id: u32, owner_id: ObjectId, count: u32) -> Self {
        Self {
            object_id,
            template_id,
            owner_id,
            location: ItemLocation::Inventory,
            slot: -1,
            count,
            enchant: 0,
            shot_charges: 0,
            augmentation_id: None,
            body_part_mask: 0,
            sellable: true,
            tradeable: true,
        }
    }

    pub fn with_body_part_mask(mut self, mask: u32) -> Self {
        self.body_part_mask = mask;
        self
    }

    pub fn is_two_handed(&self) -> bool {
        self.body_part_mask & BODY_PART_L_R_HAND != 0
    }

    pub fn is_full_armor(&self) -> bool {
        self.body_part_mask & BODY_PART_FULL_ARMOR != 0
    }

    pub fn is_equipped(&self) -> bool {
        self.location == ItemLocation::Paperdoll && self.slot >= 0
    }

    pub fn is_adena(&self) -> bool {
        self.template_id == ADENA_TEMPLATE_ID
    }

    pub fn set_enchant(&mut self, enchant: u16) {
        self.enchant = enchant;
    }
}

/// An item dropped in the world, awaiting pickup (spec.md §2's
/// `DroppedItem` visibility-dispatch kind).
pub struct DroppedItem {
    pub world_object: WorldObject,
    pub item: Item,
}

impl DroppedItem {
    /// Always `false`: the source left PvP drop-protection an
    /// unimplemented stub hook (spec.md §9 Open Questions).
    pub fn is_protected(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equipment_slot_round_trips_through_index() {
        for slot in EquipmentSlot::ALL {
            assert_eq!(EquipmentSlot::from_index(slot.index()), Some(slot));
        }
    }

    #[test]
    fn two_handed_and_full_armor_displace_their_pair() {
        assert_eq!(
            EquipmentSlot::RHand.paired_displacement(),
            Some(EquipmentSlot::LHand)
        );
        assert_eq!(
            EquipmentSlot::Chest.paired_displacement(),
            Some(EquipmentSlot::Legs)
        );
        assert_eq!(EquipmentSlot::Head.paired_displacement(), None);
    }

    #[test]
    fn enchant_is_stored_as_given() {
        let mut item = Item::new(ObjectId(1), 1, ObjectId(2), 1);
        item.set_enchant(65_535);
        assert_eq!(item.enchant, 65_535);
    }
}
