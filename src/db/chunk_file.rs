/// Fixed-layout chunk file
///
/// Layout, all integers little-endian with fixed width (bincode legacy
/// config):
///
/// ```text
/// u16            chunk count
/// ChunkRecord    x count, in chunk pool order
///   [i32; 3]       chunk coordinate
///   u16            object count
///   ObjectRecord   x CHUNK_MAX_OBJECTS (unused slots zeroed)
///     i32 id, u16 tag, i32 layer, u32 texture id, bool collidable,
///     [i32; 3] position, [i32; PAYLOAD_LEN] variant payload
/// ```
///
/// Only what the chunks reference is stored. Carried items, AI targets and
/// timers are runtime state and start fresh after a load.

use bincode::{Decode, Encode};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::PersistError;
use crate::config::map::CHUNK_MAX_OBJECTS;
use crate::npc::entity::{EntityData, EntityKind, EntityState, EntityStats};
use crate::storage::{Chunk, ObjectStore};
use crate::utility::{ChunkCoord, GridPos2, GridPosition, Stopwatch};
use crate::world::object::{
    EffectData, InteractiveData, InteractiveKind, ItemData, Object, ObjectKind, ObjectTag, ProjectileData,
};
use crate::world::World;

/// Flat integer payload carried by every object record
pub const PAYLOAD_LEN: usize = 20;

/// One serialized object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct ObjectRecord {
    pub id: i32,
    pub tag: u16,
    pub layer: i32,
    pub texture_id: u32,
    pub collidable: bool,
    pub position: [i32; 3],
    pub payload: [i32; PAYLOAD_LEN],
}

impl ObjectRecord {
    pub const EMPTY: ObjectRecord = ObjectRecord {
        id: 0,
        tag: 0,
        layer: 0,
        texture_id: 0,
        collidable: false,
        position: [0; 3],
        payload: [0; PAYLOAD_LEN],
    };

    pub fn from_object(object: &Object) -> Self {
        let p = object.position;
        Self {
            id: object.id,
            tag: object.tag() as u16,
            layer: object.layer,
            texture_id: object.texture_id,
            collidable: object.collidable,
            position: [p.x, p.y, p.z],
            payload: encode_payload(&object.kind),
        }
    }

    /// Rebuild the object. Runtime state (timers, target, inventory) is reset.
    pub fn to_object(&self) -> Result<Object, PersistError> {
        let tag = ObjectTag::from_u16(self.tag).ok_or(PersistError::InvalidRecord {
            id: self.id,
            field: "tag",
            value: self.tag as i32,
        })?;
        let [x, y, z] = self.position;
        let position = GridPosition::new(x, y, z);

        let mut object = Object::new(self.id, position, decode_payload(self.id, tag, &self.payload)?);
        object.layer = self.layer;
        object.texture_id = self.texture_id;
        object.collidable = self.collidable;
        Ok(object)
    }
}

/// One serialized chunk
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ChunkRecord {
    pub coord: [i32; 3],
    pub object_count: u16,
    pub objects: [ObjectRecord; CHUNK_MAX_OBJECTS],
}

impl ChunkRecord {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord: [coord.x, coord.y, coord.z],
            object_count: 0,
            objects: [ObjectRecord::EMPTY; CHUNK_MAX_OBJECTS],
        }
    }

    pub fn from_chunk(chunk: &Chunk, store: &ObjectStore) -> Result<Self, PersistError> {
        let mut record = Self::new(chunk.coord());
        let objects: Vec<&Object> = chunk.objects().iter().filter_map(|&key| store.get(key)).collect();
        if objects.len() > CHUNK_MAX_OBJECTS {
            return Err(PersistError::RecordOverflow {
                coord: record.coord,
                count: objects.len(),
                capacity: CHUNK_MAX_OBJECTS,
            });
        }
        for (slot, object) in record.objects.iter_mut().zip(&objects) {
            *slot = ObjectRecord::from_object(object);
        }
        record.object_count = objects.len() as u16;
        Ok(record)
    }

    pub fn coord(&self) -> ChunkCoord {
        let [x, y, z] = self.coord;
        ChunkCoord::new(x, y, z)
    }

    /// The populated records
    pub fn objects(&self) -> &[ObjectRecord] {
        let count = (self.object_count as usize).min(CHUNK_MAX_OBJECTS);
        &self.objects[..count]
    }
}

// ============================================================================
// PAYLOAD
// ============================================================================

fn encode_payload(kind: &ObjectKind) -> [i32; PAYLOAD_LEN] {
    let mut payload = [0; PAYLOAD_LEN];
    let values: Vec<i32> = match kind {
        ObjectKind::Tile => Vec::new(),
        ObjectKind::Entity(entity) => {
            let s = &entity.stats;
            vec![
                entity.kind as i32,
                entity.state as i32,
                entity.patrol_radius,
                entity.chase_radius,
                entity.origin.x,
                entity.origin.y,
                s.health,
                s.experience,
                s.level,
                s.speed,
                s.damage,
                s.attack_speed,
                s.range,
                s.armor,
                s.strength,
                s.dexterity,
                s.vitality,
                s.energy,
            ]
        }
        ObjectKind::Projectile(projectile) => vec![
            projectile.direction.x,
            projectile.direction.y,
            projectile.step_delay_ms as i32,
            projectile.range,
            projectile.travelled,
            projectile.damage,
        ],
        ObjectKind::Effect(effect) => vec![effect.effect_type, effect.duration_ms as i32],
        ObjectKind::Interactive(interactive) => vec![interactive.kind as i32, interactive.is_open as i32],
        ObjectKind::Item(item) => vec![item.item_id],
    };
    payload[..values.len()].copy_from_slice(&values);
    payload
}

fn decode_payload(id: i32, tag: ObjectTag, p: &[i32; PAYLOAD_LEN]) -> Result<ObjectKind, PersistError> {
    let invalid = |field: &'static str, value: i32| PersistError::InvalidRecord { id, field, value };
    let enum_value = |value: i32| u16::try_from(value).ok();

    let kind = match tag {
        ObjectTag::Tile => ObjectKind::Tile,
        ObjectTag::Entity => {
            let kind = enum_value(p[0])
                .and_then(EntityKind::from_u16)
                .ok_or_else(|| invalid("entity kind", p[0]))?;
            let state = enum_value(p[1])
                .and_then(EntityState::from_u16)
                .ok_or_else(|| invalid("entity state", p[1]))?;
            let stats = EntityStats {
                health: p[6],
                experience: p[7],
                level: p[8],
                speed: p[9],
                damage: p[10],
                attack_speed: p[11],
                range: p[12],
                armor: p[13],
                strength: p[14],
                dexterity: p[15],
                vitality: p[16],
                energy: p[17],
            };
            let mut entity = EntityData::new(kind, stats);
            entity.state = state;
            entity.patrol_radius = p[2];
            entity.chase_radius = p[3];
            entity.reset_runtime(GridPos2::new(p[4], p[5]));
            ObjectKind::Entity(entity)
        }
        ObjectTag::Projectile => ObjectKind::Projectile(ProjectileData {
            direction: GridPos2::new(p[0], p[1]),
            step_delay_ms: p[2].max(0) as u32,
            range: p[3],
            travelled: p[4],
            damage: p[5],
            step_timer: Stopwatch::new(),
        }),
        ObjectTag::Effect => ObjectKind::Effect(EffectData {
            effect_type: p[0],
            duration_ms: p[1].max(0) as u32,
            timer: Stopwatch::new(),
        }),
        ObjectTag::Interactive => {
            let kind = enum_value(p[0])
                .and_then(InteractiveKind::from_u16)
                .ok_or_else(|| invalid("interactive kind", p[0]))?;
            ObjectKind::Interactive(InteractiveData {
                kind,
                is_open: p[1] != 0,
            })
        }
        ObjectTag::Item => ObjectKind::Item(ItemData { item_id: p[0] }),
    };
    Ok(kind)
}

// ============================================================================
// FILE IO
// ============================================================================

/// Snapshot every chunk of the pool, in pool order
pub fn chunk_records(world: &World) -> Result<Vec<ChunkRecord>, PersistError> {
    world
        .index()
        .chunks()
        .iter()
        .map(|chunk| ChunkRecord::from_chunk(chunk, world.objects()))
        .collect()
}

/// Write `world`'s chunks to `path`. Returns the number of chunks written.
pub fn save_chunks(world: &World, path: impl AsRef<Path>) -> Result<usize, PersistError> {
    let path = path.as_ref();
    let records = chunk_records(world)?;
    let count = u16::try_from(records.len()).map_err(|_| PersistError::TooManyChunks {
        count: records.len(),
        capacity: u16::MAX as usize,
    })?;

    let mut writer = BufWriter::new(File::create(path)?);
    bincode::encode_into_std_write(count, &mut writer, bincode::config::legacy())?;
    for record in &records {
        bincode::encode_into_std_write(record, &mut writer, bincode::config::legacy())?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), chunks = records.len(), "saved chunks");
    Ok(records.len())
}

/// Decode a chunk file image. More chunks than `max_chunks` is an error.
pub fn decode_chunks(bytes: &[u8], max_chunks: usize) -> Result<Vec<ChunkRecord>, PersistError> {
    let (count, mut offset): (u16, usize) = bincode::decode_from_slice(bytes, bincode::config::legacy())?;
    let count = count as usize;
    if count > max_chunks {
        tracing::error!(count, max_chunks, "chunk file exceeds chunk pool");
        return Err(PersistError::TooManyChunks {
            count,
            capacity: max_chunks,
        });
    }

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let (record, read): (ChunkRecord, usize) =
            bincode::decode_from_slice(&bytes[offset..], bincode::config::legacy())?;
        offset += read;
        records.push(record);
    }
    Ok(records)
}

/// Replace the world's contents with `records`, keeping chunk order and ids.
///
/// Every record is converted before the world is touched, so a bad record
/// leaves the current contents in place.
pub fn restore_chunks(world: &mut World, records: &[ChunkRecord]) -> Result<usize, PersistError> {
    let max_chunks = world.index().max_chunks();
    if records.len() > max_chunks {
        return Err(PersistError::TooManyChunks {
            count: records.len(),
            capacity: max_chunks,
        });
    }
    let chunks = records
        .iter()
        .map(|record| {
            let objects = record
                .objects()
                .iter()
                .map(ObjectRecord::to_object)
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, PersistError>((record.coord(), objects))
        })
        .collect::<Result<Vec<_>, _>>()?;

    world.clear();
    let mut restored = 0;
    for (coord, objects) in chunks {
        world.index.ensure_chunk(coord)?;
        for object in objects {
            world.insert_object(object)?;
            restored += 1;
        }
    }
    Ok(restored)
}

/// Load chunks written by [`save_chunks`] into `world`, replacing its
/// contents. Returns the number of chunks loaded.
pub fn load_chunks(world: &mut World, path: impl AsRef<Path>) -> Result<usize, PersistError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let records = decode_chunks(&bytes, world.index().max_chunks())?;
    let objects = restore_chunks(world, &records)?;
    tracing::info!(path = %path.display(), chunks = records.len(), objects, "loaded chunks");
    Ok(records.len())
}
