use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    config::WorldConfig,
    item::DroppedItem,
    npc::{GrandBoss, Monster, Npc, RaidBoss},
    object::{ObjectId, ObjectIdGenerator},
    party::PartyManager,
    player::Player,
    region::{RegionCoord, WorldRegionIndex},
    summon::{Pet, Summon},
    visibility::{assemble_visibility, VisibilityCache},
};

/// The top-level registry tying together the id generator, the region
/// index, and one concurrent table per entity kind (spec.md §2, §9). Each
/// table is its own `DashMap` rather than one shared lock, matching the
/// "prefer sharded maps for very hot tables" guidance in spec.md §5.
pub struct World {
    pub config: WorldConfig,
    pub ids: ObjectIdGenerator,
    pub regions: WorldRegionIndex,
    pub parties: PartyManager,
    players: DashMap<ObjectId, Arc<Player>>,
    npcs: DashMap<ObjectId, Arc<Npc>>,
    monsters: DashMap<ObjectId, Arc<Monster>>,
    raid_bosses: DashMap<ObjectId, Arc<RaidBoss>>,
    grand_bosses: DashMap<ObjectId, Arc<GrandBoss>>,
    summons: DashMap<ObjectId, Arc<Summon>>,
    pets: DashMap<ObjectId, Arc<Pet>>,
    dropped_items: DashMap<ObjectId, Arc<DroppedItem>>,
}

macro_rules! table_accessors {
    ($insert:ident, $get:ident, $remove:ident, $table:ident, $ty:ty) => {
        pub fn $insert(&self, entity: Arc<$ty>) {
            self.$table.insert(entity.world_object_id(), entity);
        }

        pub fn $get(&self, id: ObjectId) -> Option<Arc<$ty>> {
            self.$table.get(&id).map(|entry| entry.clone())
        }

        pub fn $remove(&self, id: ObjectId) -> Option<Arc<$ty>> {
            self.$table.remove(&id).map(|(_, entity)| entity)
        }
    };
}

/// Extracts the embedded `WorldObject`'s id; implemented once per entity
/// kind so the table-accessor macro stays generic.
pub trait HasWorldObjectId {
    fn world_object_id(&self) -> ObjectId;
}

impl HasWorldObjectId for Player {
    fn world_object_id(&self) -> ObjectId {
        self.character.world_object.id()
    }
}
impl HasWorldObjectId for Npc {
    fn world_object_id(&self) -> ObjectId {
        self.character.world_object.id()
    }
}
impl HasWorldObjectId for Monster {
    fn world_object_id(&self) -> ObjectId {
        self.character.world_object.id()
    }
}
impl HasWorldObjectId for RaidBoss {
    fn world_object_id(&self) -> ObjectId {
        self.monster.character.world_object.id()
    }
}
impl HasWorldObjectId for GrandBoss {
    fn world_object_id(&self) -> ObjectId {
        self.monster.character.world_object.id()
    }
}
impl HasWorldObjectId for Summon {
    fn world_object_id(&self) -> ObjectId {
        self.character.world_object.id()
    }
}
impl HasWorldObjectId for Pet {
    fn world_object_id(&self) -> ObjectId {
        self.summon.character.world_object.id()
    }
}
impl HasWorldObjectId for DroppedItem {
    fn world_object_id(&self) -> ObjectId {
        self.world_object.id()
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        Self {
            ids: ObjectIdGenerator::starting_at(crate::object::MAX_ITEM_OBJECT_ID + 1),
            regions: WorldRegionIndex::new(),
            parties: PartyManager::new(config.clone()),
            config,
            players: DashMap::new(),
            npcs: DashMap::new(),
            monsters: DashMap::new(),
            raid_bosses: DashMap::new(),
            grand_bosses: DashMap::new(),
            summons: DashMap::new(),
            pets: DashMap::new(),
            dropped_items: DashMap::new(),
        }
    }

    table_accessors!(add_player, player, remove_player, players, Player);
    table_accessors!(add_npc, npc, remove_npc, npcs, Npc);
    table_accessors!(add_monster, monster, remove_monster, monsters, Monster);
    table_accessors!(add_raid_boss, raid_boss, remove_raid_boss, raid_bosses, RaidBoss);
    table_accessors!(add_grand_boss, grand_boss, remove_grand_boss, grand_bosses, GrandBoss);
    table_accessors!(add_summon, summon, remove_summon, summons, Summon);
    table_accessors!(add_pet, pet, remove_pet, pets, Pet);
    table_accessors!(add_dropped_item, dropped_item, remove_dropped_item, dropped_items, DroppedItem);

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn region_of(&self, x: i32, y: i32) -> RegionCoord {
        RegionCoord::from_world_xy(x, y, self.config.region_size)
    }

    /// Assembles and publishes a fresh `VisibilityCache` for `player_id`,
    /// skipping the update when the fingerprint is unchanged and the
    /// previous snapshot isn't stale (spec.md §4.9).
    pub fn refresh_visibility(&self, player_id: ObjectId, now_millis: u64) -> Option<Arc<VisibilityCache>> {
        let player = self.player(player_id)?;
        let location = player.character.world_object.location();
        let region = self.region_of(location.x, location.y);

        if let Some(existing) = player.visibility.load() {
            let unchanged_fingerprint = existing.region_fingerprint() == self.regions.fingerprint_9(region);
            if unchanged_fingerprint && !existing.is_stale(now_millis, self.config.visibility_stale_after_ms) {
                return Some(existing);
            }
        }

        let cache = assemble_visibility(&self.regions, region, 2, now_millis);
        player.visibility.publish(cache);
        player.visibility.load()
    }
}
