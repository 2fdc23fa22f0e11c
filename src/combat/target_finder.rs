// Target acquisition for enemy aggro

use super::range_calculator::is_within_radius;
use crate::storage::{ObjectKey, ObjectStore, SpatialIndex};
use crate::utility::distance_squared;
use crate::world::object::Object;

/// Find the closest entity accepted by `filter` strictly within `radius`
/// cells of `source` on the same floor. Only chunks the radius can reach
/// are scanned. Returns None if no valid targets found.
pub fn find_closest_entity<F>(
    source: ObjectKey,
    store: &ObjectStore,
    index: &SpatialIndex,
    radius: i32,
    mut filter: F,
) -> Option<ObjectKey>
where
    F: FnMut(&Object) -> bool,
{
    let source_pos = store.get(source)?.position;
    if radius <= 0 {
        return None;
    }

    let center = index.chunk_coord_of(source_pos);
    let chunk_radius = radius / index.chunk_size() + 1;
    let mut closest: Option<(ObjectKey, i64)> = None;

    for chunk_index in index.chunks_around(center, chunk_radius, chunk_radius) {
        let Some(chunk) = index.chunk(chunk_index) else {
            continue;
        };
        for &key in chunk.objects() {
            // Skip self
            if key == source {
                continue;
            }
            let Some(candidate) = store.get(key) else {
                continue;
            };
            if candidate.as_entity().is_none() || candidate.position.z != source_pos.z {
                continue;
            }
            if !is_within_radius(source_pos.xy(), candidate.position.xy(), radius) {
                continue;
            }
            if !filter(candidate) {
                continue;
            }

            let distance = distance_squared(source_pos.xy(), candidate.position.xy());
            match closest {
                Some((_, best)) if distance >= best => {}
                _ => closest = Some((key, distance)),
            }
        }
    }

    closest.map(|(key, _)| key)
}

/// Closest living entity hostile to `source` within `radius`
pub fn find_closest_hostile(
    source: ObjectKey,
    store: &ObjectStore,
    index: &SpatialIndex,
    radius: i32,
) -> Option<ObjectKey> {
    let source_kind = store.get(source)?.as_entity()?.kind;
    find_closest_entity(source, store, index, radius, |candidate| {
        candidate
            .as_entity()
            .is_some_and(|entity| entity.stats.is_alive() && source_kind.is_hostile_to(entity.kind))
    })
}
