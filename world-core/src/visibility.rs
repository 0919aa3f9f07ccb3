use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::{
    object::ObjectId,
    region::{RegionCoord, WorldRegionIndex},
};

/// A snapshot of what a player can see, in three range buckets, as
/// produced by an external visibility manager roughly every 100ms
/// (spec.md §4.9). Construction takes ownership of the three slices; no
/// defensive copy is made.
pub struct VisibilityCache {
    near: Vec<ObjectId>,
    medium: Vec<ObjectId>,
    far: Vec<ObjectId>,
    region_x: i32,
    region_y: i32,
    region_fingerprint: u64,
    last_update_millis: u64,
}

impl VisibilityCache {
    pub fn new(
        near: Vec<ObjectId>,
        medium: Vec<ObjectId>,
        far: Vec<ObjectId>,
        region_x: i32,
        region_y: i32,
        region_fingerprint: u64,
        now_millis: u64,
    ) -> Self {
        Self {
            near,
            medium,
            far,
            region_x,
            region_y,
            region_fingerprint,
            last_update_millis: now_millis,
        }
    }

    /// Freshly allocated concatenation of all three buckets (spec.md §4.9).
    pub fn objects(&self) -> Vec<ObjectId> {
        let mut all = Vec::with_capacity(self.near.len() + self.medium.len() + self.far.len());
        all.extend_from_slice(&self.near);
        all.extend_from_slice(&self.medium);
        all.extend_from_slice(&self.far);
        all
    }

    pub fn near_objects(&self) -> &[ObjectId] {
        &self.near
    }

    pub fn medium_objects(&self) -> &[ObjectId] {
        &self.medium
    }

    pub fn far_objects(&self) -> &[ObjectId] {
        &self.far
    }

    pub fn is_stale(&self, now_millis: u64, max_age_millis: u64) -> bool {
        now_millis.saturating_sub(self.last_update_millis) > max_age_millis
    }

    pub fn is_valid_for_region(&self, region_x: i32, region_y: i32) -> bool {
        self.region_x == region_x && self.region_y == region_y
    }

    pub fn region_fingerprint(&self) -> u64 {
        self.region_fingerprint
    }
}

/// Assembles a `VisibilityCache`'s three buckets from the world region
/// index: near is the player's own region, medium is the surrounding 3x3
/// block, far is everything in the next ring out (SPEC_FULL.md §4.10,
/// the core-side half of spec.md §4.9's "external visibility manager").
pub fn assemble_visibility(
    region_index: &WorldRegionIndex,
    origin_region: RegionCoord,
    far_radius: i32,
    now_millis: u64,
) -> VisibilityCache {
    let near = region_index.objects_in(origin_region);
    let medium: Vec<ObjectId> = region_index
        .objects_in_9(origin_region)
        .into_iter()
        .filter(|id| !near.contains(id))
        .collect();
    let far = region_index.objects_in_ring(origin_region, far_radius);
    let fingerprint = region_index.fingerprint_9(origin_region);
    VisibilityCache::new(
        near,
        medium,
        far,
        origin_region.0,
        origin_region.1,
        fingerprint,
        now_millis,
    )
}

/// Lock-free publish/consume cell for a player's current `VisibilityCache`
/// (spec.md §4.9, §5: "VisibilityCache publication is a single atomic
/// pointer store; readers never block producers").
pub struct PlayerVisibilityCache {
    cell: ArcSwapOption<VisibilityCache>,
}

impl PlayerVisibilityCache {
    pub fn new() -> Self {
        Self {
            cell: ArcSwapOption::empty(),
        }
    }

    pub fn publish(&self, cache: VisibilityCache) {
        self.cell.store(Some(Arc::new(cache)));
    }

    pub fn load(&self) -> Option<Arc<VisibilityCache>> {
        self.cell.load_full()
    }

    /// Forces a fresh query on the next read.
    pub fn invalidate(&self) {
        self.cell.store(None);
    }
}

impl Default for PlayerVisibilityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_concatenates_all_three_buckets() {
        let cache = VisibilityCache::new(
            vec![ObjectId(1)],
            vec![ObjectId(2)],
            vec![ObjectId(3)],
            0,
            0,
            0,
            1_000,
        );
        assert_eq!(cache.objects(), vec![ObjectId(1), ObjectId(2), ObjectId(3)]);
    }

    #[test]
    fn is_stale_compares_against_max_age() {
        let cache = VisibilityCache::new(vec![], vec![], vec![], 0, 0, 0, 1_000);
        assert!(!cache.is_stale(1_050, 100));
        assert!(cache.is_stale(1_200, 100));
    }

    #[test]
    fn is_valid_for_region_checks_both_coordinates() {
        let cache = VisibilityCache::new(vec![], vec![], vec![], 3, -2, 0, 0);
        assert!(cache.is_valid_for_region(3, -2));
        assert!(!cache.is_valid_for_region(3, 2));
    }

    #[test]
    fn assemble_visibility_partitions_near_and_medium() {
        let index = WorldRegionIndex::new();
        let origin = RegionCoord(0, 0);
        index.enter(origin, ObjectId(1));
        index.enter(RegionCoord(1, 0), ObjectId(2));
        index.enter(RegionCoord(10, 10), ObjectId(3));

        let cache = assemble_visibility(&index, origin, 12, 5_000);
        assert_eq!(cache.near_objects(), &[ObjectId(1)]);
        assert_eq!(cache.medium_objects(), &[ObjectId(2)]);
        assert!(cache.far_objects().contains(&ObjectId(3)));
    }

    #[test]
    fn publish_and_invalidate_round_trip() {
        let player_cache = PlayerVisibilityCache::new();
        assert!(player_cache.load().is_none());

        let cache = VisibilityCache::new(vec![], vec![], vec![], 0, 0, 0, 0);
        player_cache.publish(cache);
        assert!(player_cache.load().is_some());

        player_cache.invalidate();
        assert!(player_cache.load().is_none());
    }
}
