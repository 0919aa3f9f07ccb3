use serde::{Deserialize, Serialize};

/// A point in the world plus facing, carried by value (spec.md §3, §4.1).
///
/// All mutators return a new `Location` rather than mutating the
/// receiver; `WorldObject` is responsible for actually publishing a new
/// value behind its lock.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub heading: u16,
}

impl Location {
    pub fn new(x: i32, y: i32, z: i32, heading: u16) -> Self {
        Self { x, y, z, heading }
    }

    /// Squared 3D distance, avoiding the square root spec.md §4.1 calls out.
    pub fn distance_squared(&self, other: &Location) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dy * dy + dz * dz
    }

    /// Squared 3D distance to a raw coordinate triple, used by
    /// `Party::members_in_range` which is given x/y/z rather than a
    /// second `Location`.
    pub fn distance_squared_to_point(&self, x: i32, y: i32, z: i32) -> i64 {
        self.distance_squared(&Location::new(x, y, z, 0))
    }

    pub fn with_heading(&self, heading: u16) -> Location {
        Location { heading, ..*self }
    }

    pub fn with_coordinates(&self, x: i32, y: i32, z: i32) -> Location {
        Location { x, y, z, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_squared_is_symmetric_and_avoids_sqrt() {
        let a = Location::new(0, 0, 0, 0);
        let b = Location::new(3, 4, 0, 0);
        assert_eq!(a.distance_squared(&b), 25);
        assert_eq!(b.distance_squared(&a), 25);
    }

    #[test]
    fn with_heading_does_not_mutate_receiver() {
        let original = Location::new(1, 2, 3, 10);
        let moved = original.with_heading(200);
        assert_eq!(original.heading, 10);
        assert_eq!(moved.heading, 200);
        assert_eq!(moved.x, 1);
    }

    #[test]
    fn with_coordinates_does_not_mutate_receiver() {
        let original = Location::new(1, 2, 3, 10);
        let moved = original.with_coordinates(9, 9, 9);
        assert_eq!(original.x, 1);
        assert_eq!(moved.heading, 10);
        assert_eq!(moved.x, 9);
    }
}
