use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::{
    aggro::AggroList,
    character::Character,
    object::{ObjectId, WorldObject, WorldObjectData},
    spatial::Location,
};

/// AI intention state, exact string form pinned by spec.md §4.3.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intention {
    Idle,
    Active,
    Attack,
    Cast,
    MoveTo,
    Follow,
    Unknown,
}

impl Intention {
    /// Stable discriminant for atomic storage (spec.md §4.4's
    /// Summon intention field); order matches the variant list above.
    pub fn to_u8(self) -> u8 {
        match self {
            Intention::Idle => 0,
            Intention::Active => 1,
            Intention::Attack => 2,
            Intention::Cast => 3,
            Intention::MoveTo => 4,
            Intention::Follow => 5,
            Intention::Unknown => 6,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Intention::Idle,
            1 => Intention::Active,
            2 => Intention::Attack,
            3 => Intention::Cast,
            4 => Intention::MoveTo,
            5 => Intention::Follow,
            _ => Intention::Unknown,
        }
    }
}

impl fmt::Display for Intention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intention::Idle => "IDLE",
            Intention::Active => "ACTIVE",
            Intention::Attack => "ATTACK",
            Intention::Cast => "CAST",
            Intention::MoveTo => "MOVE_TO",
            Intention::Follow => "FOLLOW",
            Intention::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A non-aggressive, non-combat-capable world NPC (spec.md §4.3): quest
/// givers, merchants, and the like.
pub struct Npc {
    pub character: Character,
    pub template_id: u32,
    intention: RwLock<Intention>,
}

impl Npc {
    pub fn new(id: ObjectId, name: String, location: Location, template_id: u32, level: i32, max_hp: i32) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Npc>| {
            let world_object = WorldObject::new(id, name, location, WorldObjectData::Npc(weak.clone()));
            Self {
                character: Character::new(world_object, level, max_hp, 0, 0),
                template_id,
                intention: RwLock::new(Intention::Idle),
            }
        })
    }

    pub fn intention(&self) -> Intention {
        *self.intention.read()
    }

    pub fn set_intention(&self, intention: Intention) {
        *self.intention.write() = intention;
    }
}

/// A hostile, combat-capable NPC with an aggro list (spec.md §4.3, §4.4).
/// `aggro_range > 0` means it engages players on sight rather than waiting
/// to be attacked.
pub struct Monster {
    pub character: Character,
    pub template_id: u32,
    pub aggro_range: i32,
    pub aggro: AggroList,
    intention: RwLock<Intention>,
}

impl Monster {
    pub fn new(
        id: ObjectId,
        name: String,
        location: Location,
        template_id: u32,
        level: i32,
        max_hp: i32,
        aggro_range: i32,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Monster>| {
            let world_object = WorldObject::new(id, name, location, WorldObjectData::Monster(weak.clone()));
            Self {
                character: Character::new(world_object, level, max_hp, 0, 0),
                template_id,
                aggro_range,
                aggro: AggroList::new(),
                intention: RwLock::new(Intention::Idle),
            }
        })
    }

    pub fn is_aggressive(&self) -> bool {
        self.aggro_range > 0
    }

    pub fn intention(&self) -> Intention {
        *self.intention.read()
    }

    pub fn set_intention(&self, intention: Intention) {
        *self.intention.write() = intention;
    }
}

/// A raid-tier monster: same combat/aggro machinery as `Monster`, plus the
/// raid-specific bookkeeping the spec leaves for the encounter layer to
/// attach (spec.md §4.3's composition-over-inheritance note).
pub struct RaidBoss {
    pub monster: Monster,
}

impl RaidBoss {
    pub fn new(
        id: ObjectId,
        name: String,
        location: Location,
        template_id: u32,
        level: i32,
        max_hp: i32,
        aggro_range: i32,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<RaidBoss>| {
            let world_object = WorldObject::new(id, name, location, WorldObjectData::RaidBoss(weak.clone()));
            Self {
                monster: Monster {
                    character: Character::new(world_object, level, max_hp, 0, 0),
                    template_id,
                    aggro_range,
                    aggro: AggroList::new(),
                    intention: RwLock::new(Intention::Idle),
                },
            }
        })
    }
}

/// The single per-world grand boss (spec.md §4.3): identical shape to
/// `RaidBoss`, kept as its own kind since visibility/announce behavior is
/// world-wide rather than zone-local.
pub struct GrandBoss {
    pub monster: Monster,
}

impl GrandBoss {
    pub fn new(
        id: ObjectId,
        name: String,
        location: Location,
        template_id: u32,
        level: i32,
        max_hp: i32,
        aggro_range: i32,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<GrandBoss>| {
            let world_object = WorldObject::new(id, name, location, WorldObjectData::GrandBoss(weak.clone()));
            Self {
                monster: Monster {
                    character: Character::new(world_object, level, max_hp, 0, 0),
                    template_id,
                    aggro_range,
                    aggro: AggroList::new(),
                    intention: RwLock::new(Intention::Idle),
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intention_string_form_is_exact() {
        assert_eq!(Intention::Idle.to_string(), "IDLE");
        assert_eq!(Intention::Active.to_string(), "ACTIVE");
        assert_eq!(Intention::Attack.to_string(), "ATTACK");
        assert_eq!(Intention::Cast.to_string(), "CAST");
        assert_eq!(Intention::MoveTo.to_string(), "MOVE_TO");
        assert_eq!(Intention::Follow.to_string(), "FOLLOW");
        assert_eq!(Intention::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn aggro_range_determines_aggression() {
        let monster = Monster::new(ObjectId(1), "Wolf".into(), Location::default(), 100, 5, 500, 8);
        assert!(monster.is_aggressive());
        let passive = Monster::new(ObjectId(2), "Deer".into(), Location::default(), 101, 3, 200, 0);
        assert!(!passive.is_aggressive());
    }

    #[test]
    fn intention_round_trips() {
        let npc = Npc::new(ObjectId(3), "Merchant".into(), Location::default(), 200, 1, 1000);
        assert_eq!(npc.intention(), Intention::Idle);
        npc.set_intention(Intention::Follow);
        assert_eq!(npc.intention(), Intention::Follow);
    }
}
