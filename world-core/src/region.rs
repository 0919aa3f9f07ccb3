use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::object::ObjectId;

/// Coarse grid cell coordinate; side length is `WorldConfig::region_size`
/// (spec.md SPEC_FULL.md §4.10).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord(pub i32, pub i32);

impl RegionCoord {
    pub fn from_world_xy(x: i32, y: i32, region_size: i32) -> Self {
        let region_size = region_size.max(1);
        Self(x.div_euclid(region_size), y.div_euclid(region_size))
    }

    /// The 3x3 block of regions centred on this one, in a fixed order so
    /// the fingerprint XOR and neighbour queries are deterministic.
    pub fn neighbours_9(self) -> [RegionCoord; 9] {
        let RegionCoord(cx, cy) = self;
        [
            RegionCoord(cx - 1, cy - 1),
            RegionCoord(cx, cy - 1),
            RegionCoord(cx + 1, cy - 1),
            RegionCoord(cx - 1, cy),
            RegionCoord(cx, cy),
            RegionCoord(cx + 1, cy),
            RegionCoord(cx - 1, cy + 1),
            RegionCoord(cx, cy + 1),
            RegionCoord(cx + 1, cy + 1),
        ]
    }

    /// The ring of regions at Chebyshev distance `radius` from this one
    /// (used to widen the medium/far buckets past the immediate 3x3).
    pub fn ring(self, radius: i32) -> Vec<RegionCoord> {
        if radius <= 0 {
            return vec![self];
        }
        let RegionCoord(cx, cy) = self;
        let mut ring = Vec::new();
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx.abs().max(dy.abs()) == radius {
                    ring.push(RegionCoord(cx + dx, cy + dy));
                }
            }
        }
        ring
    }
}

struct RegionCell {
    members: RwLock<Vec<ObjectId>>,
    version: AtomicU64,
}

impl RegionCell {
    fn new() -> Self {
        Self {
            members: RwLock::new(Vec::new()),
            version: AtomicU64::new(0),
        }
    }
}

/// Sharded concurrent membership index, one lock per region rather than
/// one lock for the whole grid (spec.md §5's "prefer sharded maps for very
/// hot tables", SPEC_FULL.md §4.10).
pub struct WorldRegionIndex {
    cells: DashMap<RegionCoord, RegionCell>,
}

impl WorldRegionIndex {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    pub fn enter(&self, region: RegionCoord, id: ObjectId) {
        let cell = self.cells.entry(region).or_insert_with(RegionCell::new);
        let mut members = cell.members.write();
        if !members.contains(&id) {
            members.push(id);
            cell.version.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn leave(&self, region: RegionCoord, id: ObjectId) {
        if let Some(cell) = self.cells.get(&region) {
            let mut members = cell.members.write();
            let before = members.len();
            members.retain(|member| *member != id);
            if members.len() != before {
                cell.version.fetch_add(1, Ordering::AcqRel);
            }
        }
    }

    pub fn move_region(&self, from: RegionCoord, to: RegionCoord, id: ObjectId) {
        if from == to {
            return;
        }
        self.leave(from, id);
        self.enter(to, id);
    }

    pub fn objects_in(&self, region: RegionCoord) -> Vec<ObjectId> {
        self.cells
            .get(&region)
            .map(|cell| cell.members.read().clone())
            .unwrap_or_default()
    }

    pub fn objects_in_9(&self, centre: RegionCoord) -> Vec<ObjectId> {
        let mut objects = Vec::new();
        for region in centre.neighbours_9() {
            objects.extend(self.objects_in(region));
        }
        objects
    }

    pub fn objects_in_ring(&self, centre: RegionCoord, radius: i32) -> Vec<ObjectId> {
        let mut objects = Vec::new();
        for region in centre.ring(radius) {
            objects.extend(self.objects_in(region));
        }
        objects
    }

    pub fn region_version(&self, region: RegionCoord) -> u64 {
        self.cells
            .get(&region)
            .map(|cell| cell.version.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// XOR of the nine surrounding regions' versions, consumed by
    /// `VisibilityCache::region_fingerprint` (SPEC_FULL.md §4.10).
    pub fn fingerprint_9(&self, centre: RegionCoord) -> u64 {
        centre
            .neighbours_9()
            .iter()
            .fold(0u64, |acc, region| acc ^ self.region_version(*region))
    }
}

impl Default for WorldRegionIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_leave_and_move_update_membership() {
        let index = WorldRegionIndex::new();
        let a = RegionCoord(0, 0);
        let b = RegionCoord(1, 0);
        index.enter(a, ObjectId(1));
        assert_eq!(index.objects_in(a), vec![ObjectId(1)]);

        index.move_region(a, b, ObjectId(1));
        assert!(index.objects_in(a).is_empty());
        assert_eq!(index.objects_in(b), vec![ObjectId(1)]);
    }

    #[test]
    fn objects_in_9_covers_the_surrounding_block() {
        let index = WorldRegionIndex::new();
        index.enter(RegionCoord(0, 0), ObjectId(1));
        index.enter(RegionCoord(1, 1), ObjectId(2));
        index.enter(RegionCoord(5, 5), ObjectId(3));

        let nearby = index.objects_in_9(RegionCoord(0, 0));
        assert!(nearby.contains(&ObjectId(1)));
        assert!(nearby.contains(&ObjectId(2)));
        assert!(!nearby.contains(&ObjectId(3)));
    }

    #[test]
    fn fingerprint_changes_on_membership_change() {
        let index = WorldRegionIndex::new();
        let centre = RegionCoord(0, 0);
        let before = index.fingerprint_9(centre);
        index.enter(centre, ObjectId(1));
        let after = index.fingerprint_9(centre);
        assert_ne!(before, after);
    }

    #[test]
    fn from_world_xy_buckets_by_region_size() {
        assert_eq!(RegionCoord::from_world_xy(0, 0, 64), RegionCoord(0, 0));
        assert_eq!(RegionCoord::from_world_xy(63, 64, 64), RegionCoord(0, 1));
        assert_eq!(RegionCoord::from_world_xy(-1, 0, 64), RegionCoord(-1, 0));
    }
}
