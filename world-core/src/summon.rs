use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::{
    character::Character,
    inventory::Inventory,
    npc::Intention,
    object::{ObjectId, WorldObject, WorldObjectData},
    spatial::Location,
};

/// Snapshot of a summon's non-pool combat stats, replaced wholesale by
/// `UpdateStats` (spec.md §4.4). `maxHP`/`maxMP` live on the embedded
/// `Character`'s resource pools instead, since those already carry the
/// clip-current-to-max behaviour `UpdateStats` also requires.
#[derive(Clone, Copy, Debug, Default)]
pub struct CombatStats {
    pub p_atk: i32,
    pub p_def: i32,
    pub m_atk: i32,
    pub m_def: i32,
}

/// A player-summoned combat servitor, time-limited by its owner's summon
/// duration item (spec.md §4.3's composition-over-inheritance note).
pub struct Summon {
    pub character: Character,
    pub owner_id: ObjectId,
    pub template_id: u32,
    stats: RwLock<CombatStats>,
    follow: AtomicBool,
    target_id: AtomicU32,
    intention: AtomicU8,
    decayed: AtomicBool,
}

impl Summon {
    pub fn new(
        id: ObjectId,
        name: String,
        location: Location,
        owner_id: ObjectId,
        template_id: u32,
        level: i32,
        max_hp: i32,
        max_mp: i32,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Summon>| {
            let world_object = WorldObject::new(id, name, location, WorldObjectData::Summon(weak.clone()));
            Self {
                character: Character::new(world_object, level, max_hp, max_mp, 0),
                owner_id,
                template_id,
                stats: RwLock::new(CombatStats::default()),
                follow: AtomicBool::new(true),
                target_id: AtomicU32::new(0),
                intention: AtomicU8::new(Intention::Idle.to_u8()),
                decayed: AtomicBool::new(false),
            }
        })
    }

    pub fn is_decayed(&self) -> bool {
        self.decayed.load(Ordering::Acquire)
    }

    pub fn decay(&self) {
        self.decayed.store(true, Ordering::Release);
    }

    pub fn stats(&self) -> CombatStats {
        *self.stats.read()
    }

    /// Replaces combat stats and clips current HP/MP to the new max
    /// (`UpdateStats` in spec.md §4.4).
    pub fn update_stats(&self, max_hp: i32, max_mp: i32, p_atk: i32, p_def: i32, m_atk: i32, m_def: i32) {
        *self.stats.write() = CombatStats { p_atk, p_def, m_atk, m_def };
        self.character.hp.set_max(max_hp);
        self.character.mp.set_max(max_mp);
    }

    pub fn is_following(&self) -> bool {
        self.follow.load(Ordering::Acquire)
    }

    pub fn set_following(&self, follow: bool) {
        self.follow.store(follow, Ordering::Release);
    }

    /// `0` means no target.
    pub fn target_id(&self) -> Option<ObjectId> {
        match self.target_id.load(Ordering::Acquire) {
            0 => None,
            id => Some(ObjectId(id)),
        }
    }

    pub fn set_target_id(&self, target: Option<ObjectId>) {
        self.target_id.store(target.map_or(0, |id| id.0), Ordering::Release);
    }

    pub fn intention(&self) -> Intention {
        Intention::from_u8(self.intention.load(Ordering::Acquire))
    }

    pub fn set_intention(&self, intention: Intention) {
        self.intention.store(intention.to_u8(), Ordering::Release);
    }
}

/// Default feed interval in seconds between hunger ticks (spec.md §4.3).
pub const PET_FEED_TICK_SECS: i64 = 60;

/// A persistent, levelling player pet with a hunger meter (spec.md §4.3).
/// `feed` is `current/max` out of a scale the collaborator defines; this
/// module only enforces the monotonic decay/feed/experience mechanics.
pub struct Pet {
    pub summon: Summon,
    pub control_item_id: ObjectId,
    pub max_level: i32,
    pub inventory: Inventory,
    feed_current: AtomicI32,
    feed_max: AtomicI32,
    feed_rate: AtomicI32,
    experience: AtomicI64,
    last_fed_at_secs: AtomicI64,
}

impl Pet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ObjectId,
        name: String,
        location: Location,
        owner_id: ObjectId,
        template_id: u32,
        level: i32,
        max_hp: i32,
        max_mp: i32,
        control_item_id: ObjectId,
        max_level: i32,
        feed_max: i32,
        feed_rate: i32,
    ) -> Arc<Self> {
        let feed_max = feed_max.max(1);
        Arc::new_cyclic(|weak: &Weak<Pet>| {
            let summon_object = WorldObject::new(id, name, location, WorldObjectData::Pet(weak.clone()));
            Self {
                summon: Summon {
                    character: Character::new(summon_object, level, max_hp, max_mp, 0),
                    owner_id,
                    template_id,
                    stats: RwLock::new(CombatStats::default()),
                    follow: AtomicBool::new(true),
                    target_id: AtomicU32::new(0),
                    intention: AtomicU8::new(Intention::Idle.to_u8()),
                    decayed: AtomicBool::new(false),
                },
                control_item_id,
                max_level,
                inventory: Inventory::new(id),
                feed_current: AtomicI32::new(feed_max),
                feed_max: AtomicI32::new(feed_max),
                feed_rate: AtomicI32::new(feed_rate.max(1)),
                experience: AtomicI64::new(0),
                last_fed_at_secs: AtomicI64::new(0),
            }
        })
    }

    pub fn fed_percentage(&self) -> f32 {
        let max = self.feed_max.load(Ordering::Acquire).max(1) as f32;
        let current = self.feed_current.load(Ordering::Acquire) as f32;
        (current / max * 100.0).clamp(0.0, 100.0)
    }

    pub fn feed_rate(&self) -> i32 {
        self.feed_rate.load(Ordering::Acquire)
    }

    /// Subtracts the pet's stored `feedRate`, clamped to 0, and returns
    /// `true` once fed reaches zero, the hungry signal (`ConsumeFeed` in
    /// spec.md §4.4).
    pub fn consume_feed(&self) -> bool {
        let rate = self.feed_rate();
        loop {
            let current = self.feed_current.load(Ordering::Acquire);
            let next = (current - rate).max(0);
            if self
                .feed_current
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break next == 0;
            }
        }
    }

    /// Replaces feed capacity and rate, clipping current fed down to the
    /// new max (`UpdateFeedStats` in spec.md §4.4).
    pub fn update_feed_stats(&self, max_fed: i32, feed_rate: i32) {
        let max_fed = max_fed.max(1);
        self.feed_max.store(max_fed, Ordering::Release);
        self.feed_rate.store(feed_rate.max(1), Ordering::Release);
        loop {
            let current = self.feed_current.load(Ordering::Acquire);
            if current <= max_fed {
                break;
            }
            if self
                .feed_current
                .compare_exchange_weak(current, max_fed, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }

    pub fn last_fed_at_secs(&self) -> i64 {
        self.last_fed_at_secs.load(Ordering::Acquire)
    }

    pub fn mark_fed_now(&self, now_secs: i64) {
        self.last_fed_at_secs.store(now_secs, Ordering::Release);
    }

    /// Clamps at zero (spec.md §4.4's `AddExperience`); level gates are
    /// a collaborator's concern.
    pub fn add_experience(&self, amount: i64) {
        loop {
            let current = self.experience.load(Ordering::Acquire);
            let next = (current + amount).max(0);
            if self
                .experience
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }
    }

    pub fn experience(&self) -> i64 {
        self.experience.load(Ordering::Acquire)
    }

    pub fn is_starving(&self) -> bool {
        self.fed_percentage() <= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_pet() -> Arc<Pet> {
        Pet::new(
            ObjectId(1),
            "Wolf Cub".into(),
            Location::default(),
            ObjectId(2),
            500,
            1,
            100,
            50,
            ObjectId(90001),
            80,
            100,
            10,
        )
    }

    #[test]
    fn fed_percentage_starts_full() {
        let pet = make_pet();
        assert_eq!(pet.fed_percentage(), 100.0);
    }

    #[test]
    fn consume_feed_subtracts_rate_and_signals_hungry_at_zero() {
        let pet = make_pet();
        for _ in 0..9 {
            assert!(!pet.consume_feed());
        }
        assert!(pet.consume_feed());
        assert_eq!(pet.fed_percentage(), 0.0);
        assert!(pet.is_starving());
        assert!(pet.consume_feed());
    }

    #[test]
    fn update_feed_stats_replaces_capacity_and_clips_current() {
        let pet = make_pet();
        pet.update_feed_stats(40, 5);
        assert_eq!(pet.fed_percentage(), 100.0);
        assert_eq!(pet.feed_rate(), 5);
        pet.consume_feed();
        assert_eq!(pet.fed_percentage(), ((40 - 5) as f32 / 40.0 * 100.0));
    }

    #[test]
    fn experience_accumulates_and_clamps_at_zero() {
        let pet = make_pet();
        pet.add_experience(100);
        pet.add_experience(50);
        assert_eq!(pet.experience(), 150);
        pet.add_experience(-500);
        assert_eq!(pet.experience(), 0);
    }

    #[test]
    fn decay_is_observable() {
        let pet = make_pet();
        assert!(!pet.summon.is_decayed());
        pet.summon.decay();
        assert!(pet.summon.is_decayed());
    }

    #[test]
    fn update_stats_replaces_snapshot_and_clips_current_hp() {
        let pet = make_pet();
        pet.summon.character.hp.set_current(100);
        pet.summon.update_stats(60, 40, 10, 20, 30, 40);
        let stats = pet.summon.stats();
        assert_eq!((stats.p_atk, stats.p_def, stats.m_atk, stats.m_def), (10, 20, 30, 40));
        assert_eq!(pet.summon.character.hp.current(), 60);
    }

    #[test]
    fn follow_target_and_intention_round_trip() {
        let pet = make_pet();
        assert!(pet.summon.is_following());
        pet.summon.set_following(false);
        assert!(!pet.summon.is_following());

        assert_eq!(pet.summon.target_id(), None);
        pet.summon.set_target_id(Some(ObjectId(777)));
        assert_eq!(pet.summon.target_id(), Some(ObjectId(777)));

        assert_eq!(pet.summon.intention(), Intention::Idle);
        pet.summon.set_intention(Intention::Attack);
        assert_eq!(pet.summon.intention(), Intention::Attack);
    }
}
