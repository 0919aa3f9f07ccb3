use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::{
    item::DroppedItem,
    npc::{GrandBoss, Monster, Npc, RaidBoss},
    player::Player,
    spatial::Location,
    summon::{Pet, Summon},
};

/// Shard-unique 32-bit object identity (spec.md §6). By convention items
/// live in `[0x0000_0001, 0x0FFF_FFFF]`; creatures and players occupy the
/// remaining range.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Upper bound (inclusive) of the item id partition (spec.md §6).
pub const MAX_ITEM_OBJECT_ID: u32 = 0x0FFF_FFFF;

impl ObjectId {
    pub fn is_item_range(self) -> bool {
        self.0 >= 1 && self.0 <= MAX_ITEM_OBJECT_ID
    }
}

/// Monotonic object id generator; one instance is shared by the whole
/// world (spec.md §9 "monotonic id generator" note).
#[derive(Debug, Default)]
pub struct ObjectIdGenerator {
    next: std::sync::atomic::AtomicU32,
}

impl ObjectIdGenerator {
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: std::sync::atomic::AtomicU32::new(first),
        }
    }

    pub fn next_id(&self) -> ObjectId {
        ObjectId(self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
    }
}

/// The polymorphism escape hatch from spec.md §4.1: a back-reference from
/// the shared `WorldObject` identity to the concrete, most-derived entity
/// that embeds it, so visibility consumers can dispatch on kind without a
/// virtual-call chain. Built with `Weak` handles since the concrete
/// entity is always the owner of its embedded `WorldObject`, never the
/// other way around.
#[derive(Clone)]
pub enum WorldObjectData {
    Player(Weak<Player>),
    Npc(Weak<Npc>),
    Monster(Weak<Monster>),
    RaidBoss(Weak<RaidBoss>),
    GrandBoss(Weak<GrandBoss>),
    Summon(Weak<Summon>),
    Pet(Weak<Pet>),
    DroppedItem(Weak<DroppedItem>),
}

impl WorldObjectData {
    pub fn kind_name(&self) -> &'static str {
        match self {
            WorldObjectData::Player(_) => "Player",
            WorldObjectData::Npc(_) => "Npc",
            WorldObjectData::Monster(_) => "Monster",
            WorldObjectData::RaidBoss(_) => "RaidBoss",
            WorldObjectData::GrandBoss(_) => "GrandBoss",
            WorldObjectData::Summon(_) => "Summon",
            WorldObjectData::Pet(_) => "Pet",
            WorldObjectData::DroppedItem(_) => "DroppedItem",
        }
    }

    pub fn as_player(&self) -> Option<Arc<Player>> {
        match self {
            WorldObjectData::Player(weak) => weak.upgrade(),
            _ => None,
        }
    }

    pub fn as_monster(&self) -> Option<Arc<Monster>> {
        match self {
            WorldObjectData::Monster(weak) => weak.upgrade(),
            _ => None,
        }
    }

    pub fn as_raid_boss(&self) -> Option<Arc<RaidBoss>> {
        match self {
            WorldObjectData::RaidBoss(weak) => weak.upgrade(),
            _ => None,
        }
    }

    pub fn as_grand_boss(&self) -> Option<Arc<GrandBoss>> {
        match self {
            WorldObjectData::GrandBoss(weak) => weak.upgrade(),
            _ => None,
        }
    }

    pub fn as_pet(&self) -> Option<Arc<Pet>> {
        match self {
            WorldObjectData::Pet(weak) => weak.upgrade(),
            _ => None,
        }
    }
}

struct WorldObjectState {
    name: String,
    location: Location,
}

/// Identity base embedded by every concrete entity (spec.md §4.1). Name
/// and location are guarded by their own lock; `id` and `data` are set
/// once at construction and never change afterwards.
pub struct WorldObject {
    id: ObjectId,
    state: RwLock<WorldObjectState>,
    data: WorldObjectData,
}

impl WorldObject {
    /// `data` must already reference the entity that owns this
    /// `WorldObject` — construct the owner with `Arc::new_cyclic` and
    /// pass the resulting `Weak` in, which is how every concrete kind's
    /// constructor binds the back-reference to itself.
    pub fn new(id: ObjectId, name: String, location: Location, data: WorldObjectData) -> Self {
        Self {
            id,
            state: RwLock::new(WorldObjectState { name, location }),
            data,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn data(&self) -> &WorldObjectData {
        &self.data
    }

    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    pub fn set_name(&self, name: String) {
        self.state.write().name = name;
    }

    pub fn location(&self) -> Location {
        self.state.read().location
    }

    pub fn set_location(&self, location: Location) {
        self.state.write().location = location;
    }

    pub fn x(&self) -> i32 {
        self.location().x
    }

    pub fn y(&self) -> i32 {
        self.location().y
    }

    pub fn z(&self) -> i32 {
        self.location().z
    }

    pub fn heading(&self) -> u16 {
        self.location().heading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_generator_is_monotonic_and_unique() {
        let generator = ObjectIdGenerator::starting_at(1);
        let a = generator.next_id();
        let b = generator.next_id();
        let c = generator.next_id();
        assert_eq!(a, ObjectId(1));
        assert_eq!(b, ObjectId(2));
        assert_eq!(c, ObjectId(3));
    }

    #[test]
    fn item_range_partition() {
        assert!(ObjectId(1).is_item_range());
        assert!(ObjectId(MAX_ITEM_OBJECT_ID).is_item_range());
        assert!(!ObjectId(MAX_ITEM_OBJECT_ID + 1).is_item_range());
        assert!(!ObjectId(0).is_item_range());
    }

    #[test]
    fn location_mutators_are_visible_through_the_lock() {
        let object = WorldObject::new(
            ObjectId(1),
            "Test".to_string(),
            Location::default(),
            WorldObjectData::Player(Weak::new()),
        );
        object.set_location(Location::new(10, 20, 30, 400));
        assert_eq!(object.x(), 10);
        assert_eq!(object.heading(), 400);
    }
}
