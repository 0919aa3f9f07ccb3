use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;

use crate::object::ObjectId;

/// Per-attacker hate/damage accumulators (spec.md §4.4). Stored behind
/// atomics so concurrent damage events from several attackers never tear
/// a single entry, matching the "no single world lock" requirement for
/// hot per-monster state (spec.md §5).
#[derive(Default)]
struct AggroEntry {
    hate: AtomicI64,
    damage: AtomicI64,
}

/// A monster's hate table: one entry per attacker, keyed by `ObjectId`
/// (spec.md §4.4). `GetMostHated` breaks ties by lowest attacker id so the
/// result is deterministic under concurrent updates.
pub struct AggroList {
    entries: DashMap<ObjectId, AggroEntry>,
}

impl AggroList {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// `(damage * 100) / max(npcLevel, 1) + 7` (spec.md §4.4).
    pub fn hate_for_damage(damage: i64, npc_level: i32) -> i64 {
        (damage * 100) / (npc_level.max(1) as i64) + 7
    }

    pub fn add_hate(&self, attacker: ObjectId, hate: i64) {
        self.entries
            .entry(attacker)
            .or_default()
            .hate
            .fetch_add(hate, Ordering::AcqRel);
    }

    pub fn add_damage(&self, attacker: ObjectId, damage: i64) {
        self.entries
            .entry(attacker)
            .or_default()
            .damage
            .fetch_add(damage, Ordering::AcqRel);
    }

    /// Convenience combining `AddDamage` with the standard hate formula
    /// (spec.md §4.4).
    pub fn add_damage_and_hate(&self, attacker: ObjectId, damage: i64, npc_level: i32) {
        self.add_damage(attacker, damage);
        self.add_hate(attacker, Self::hate_for_damage(damage, npc_level));
    }

    pub fn hate_of(&self, attacker: ObjectId) -> i64 {
        self.entries
            .get(&attacker)
            .map(|entry| entry.hate.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn damage_of(&self, attacker: ObjectId) -> i64 {
        self.entries
            .get(&attacker)
            .map(|entry| entry.damage.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    pub fn remove(&self, attacker: ObjectId) {
        self.entries.remove(&attacker);
    }

    /// `GetMostHated()` (spec.md §4.4, §8 literal scenario 2). Ties break
    /// on the lowest `ObjectId`.
    pub fn get_most_hated(&self) -> Option<ObjectId> {
        let mut best: Option<(ObjectId, i64)> = None;
        for entry in self.entries.iter() {
            let id = *entry.key();
            let hate = entry.hate.load(Ordering::Acquire);
            best = Some(match best {
                None => (id, hate),
                Some((best_id, best_hate)) => {
                    if hate > best_hate || (hate == best_hate && id < best_id) {
                        (id, hate)
                    } else {
                        (best_id, best_hate)
                    }
                }
            });
        }
        best.map(|(id, _)| id)
    }
}

impl Default for AggroList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_most_hated_tracks_additions_and_removal() {
        let aggro = AggroList::new();
        aggro.add_hate(ObjectId(1001), 50);
        aggro.add_hate(ObjectId(1002), 100);
        aggro.add_hate(ObjectId(1003), 30);
        assert_eq!(aggro.get_most_hated(), Some(ObjectId(1002)));

        aggro.remove(ObjectId(1002));
        assert_eq!(aggro.get_most_hated(), Some(ObjectId(1001)));
    }

    #[test]
    fn ties_break_on_lowest_object_id() {
        let aggro = AggroList::new();
        aggro.add_hate(ObjectId(20), 10);
        aggro.add_hate(ObjectId(10), 10);
        assert_eq!(aggro.get_most_hated(), Some(ObjectId(10)));
    }

    #[test]
    fn empty_list_has_no_most_hated() {
        let aggro = AggroList::new();
        assert!(aggro.is_empty());
        assert_eq!(aggro.get_most_hated(), None);
    }

    #[test]
    fn hate_formula_matches_spec() {
        assert_eq!(AggroList::hate_for_damage(100, 10), 107);
        assert_eq!(AggroList::hate_for_damage(50, 0), 57);
    }
}
