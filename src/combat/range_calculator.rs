// Range and distance checks for combat and aggro

use crate::utility::{distance_squared, distance_truncated, GridPos2};

/// Attack reach: truncated Euclidean distance within `range`.
/// Diagonal neighbours (distance ~1.41) count as range 1.
pub fn is_in_attack_range(attacker: GridPos2, target: GridPos2, range: i32) -> bool {
    distance_truncated(attacker, target) <= range
}

/// Strictly inside a circle of `radius` cells (aggro detection)
pub fn is_within_radius(source: GridPos2, target: GridPos2, radius: i32) -> bool {
    let r = radius.max(0) as i64;
    distance_squared(source, target) < r * r
}

/// Farther than `limit` cells (chasers give up past this)
pub fn is_beyond(source: GridPos2, target: GridPos2, limit: i32) -> bool {
    let l = limit.max(0) as i64;
    distance_squared(source, target) > l * l
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attack_range_includes_diagonal() {
        let origin = GridPos2::new(0, 0);
        assert!(is_in_attack_range(origin, GridPos2::new(1, 0), 1));
        assert!(is_in_attack_range(origin, GridPos2::new(1, 1), 1));
        assert!(!is_in_attack_range(origin, GridPos2::new(2, 0), 1));
    }

    #[test]
    fn test_radius_is_exclusive() {
        let origin = GridPos2::new(0, 0);
        assert!(is_within_radius(origin, GridPos2::new(2, 2), 3));
        assert!(!is_within_radius(origin, GridPos2::new(3, 0), 3));
        assert!(!is_within_radius(origin, origin, 0));
    }

    #[test]
    fn test_give_up_distance() {
        let origin = GridPos2::new(0, 0);
        assert!(!is_beyond(origin, GridPos2::new(5, 0), 5));
        assert!(is_beyond(origin, GridPos2::new(4, 4), 5));
    }
}
