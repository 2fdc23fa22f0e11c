// Player control: movement, interaction, inventory

use crate::error::WorldError;
use crate::events::WorldEvent;
use crate::input::{InputState, Keys};
use crate::storage::ObjectKey;
use crate::utility::{manhattan, GridPos2, GridPosition};
use crate::world::object::{InteractiveKind, ObjectKind};
use crate::world::World;

impl World {
    /// Per-tick player update: death check, movement, interact key
    pub(crate) fn update_player(&mut self, key: ObjectKey, input: &InputState) {
        let now = self.now_ms();
        let Some(object) = self.objects.get(key) else {
            return;
        };
        let (id, position) = (object.id, object.position);
        let Some(entity) = object.as_entity() else {
            return;
        };

        if !entity.stats.is_alive() {
            if !self.game_over {
                self.game_over = true;
                tracing::info!(id, "player died, game over");
                self.emit(WorldEvent::PlayerDied { id });
            }
            return;
        }
        let can_move = entity.movement_timer.is_zero(now);

        // Orthogonal steps only: a diagonal has length² 2
        let (x, y) = input.axis();
        if x * x + y * y <= 1 && (x != 0 || y != 0) && can_move {
            let step = GridPos2::new(x, y);
            if !self.is_blocked(position.offset(step)) {
                self.step_entity(key, step);
            }
        }

        if input.is_pressed(Keys::INTERACT) {
            self.interact(key);
        }
    }

    /// Toggle interactive objects around `key`.
    ///
    /// Doors and chests in the four neighbouring cells open or close. Stairs
    /// under the entity take it one floor up or down when the landing cell
    /// is free. Returns the number of objects toggled.
    pub fn interact(&mut self, key: ObjectKey) -> usize {
        let Some(position) = self.objects.get(key).map(|o| o.position) else {
            return 0;
        };

        let mut toggled = 0;
        for neighbor in position.xy().neighbors4() {
            let cell = GridPosition::from_xy(neighbor, position.z);
            for candidate in self.query_objects_at(cell).iter() {
                let Some(object) = self.objects.get_mut(candidate) else {
                    continue;
                };
                let id = object.id;
                let Some(interactive) = object.as_interactive_mut() else {
                    continue;
                };
                if !matches!(interactive.kind, InteractiveKind::Door | InteractiveKind::Chest) {
                    continue;
                }
                interactive.is_open = !interactive.is_open;
                let (kind, is_open) = (interactive.kind, interactive.is_open);
                if kind == InteractiveKind::Door {
                    object.collidable = !is_open;
                }
                toggled += 1;
                self.emit(WorldEvent::InteractiveToggled { id, is_open });
            }
        }

        let stairs = self.query_objects_at(position).iter().find_map(|candidate| {
            match self.objects.get(candidate).map(|o| &o.kind) {
                Some(ObjectKind::Interactive(data)) => match data.kind {
                    InteractiveKind::StairsUp => Some(1),
                    InteractiveKind::StairsDown => Some(-1),
                    _ => None,
                },
                _ => None,
            }
        });
        if let Some(dz) = stairs {
            if self.change_floor(key, dz) {
                toggled += 1;
            }
        }
        toggled
    }

    /// Move an entity `dz` floors, following it with the view when it is
    /// the player
    fn change_floor(&mut self, key: ObjectKey, dz: i32) -> bool {
        let Some(object) = self.objects.get(key) else {
            return false;
        };
        let (id, position) = (object.id, object.position);
        let landing = position.with_z(position.z + dz);
        if self.is_blocked(landing) {
            tracing::debug!(id, %landing, "stairs landing blocked");
            return false;
        }

        if let Some(object) = self.objects.get_mut(key) {
            object.position = landing;
        }
        self.rebucket_object(key);
        if self.player == Some(key) {
            self.current_z = landing.z;
        }
        self.emit(WorldEvent::FloorChanged { id, z: landing.z });
        true
    }

    /// Move an item from the map into the player's first free slot
    pub fn pick_up_item(&mut self, item: ObjectKey) -> Result<usize, WorldError> {
        let player = self.player.ok_or(WorldError::NoPlayer)?;
        let player_pos = self
            .objects
            .get(player)
            .map(|o| o.position)
            .ok_or(WorldError::NoPlayer)?;

        let object = self.objects.get(item).ok_or(WorldError::ObjectNotFound)?;
        let item_id = object.id;
        if !matches!(object.kind, ObjectKind::Item(_)) {
            return Err(WorldError::WrongVariant {
                id: item_id,
                expected: "an item",
            });
        }
        if object.chunk().is_none() {
            return Err(WorldError::NotInChunk { id: item_id });
        }
        self.check_reach(player_pos, object.position)?;

        let slot = self
            .objects
            .get(player)
            .and_then(|o| o.as_entity())
            .and_then(|entity| entity.first_free_slot())
            .ok_or(WorldError::InventoryFull)?;

        if let Some(object) = self.objects.get_mut(item) {
            self.index.remove(item, object);
        }
        if let Some(entity) = self.objects.get_mut(player).and_then(|o| o.as_entity_mut()) {
            entity.items[slot] = Some(item);
        }
        tracing::info!(item_id, slot, "item picked up");
        self.emit(WorldEvent::ItemPickedUp { item_id, slot });
        Ok(slot)
    }

    /// Put the item in `slot` back on the map at `position`
    pub fn drop_item(&mut self, slot: usize, position: GridPosition) -> Result<ObjectKey, WorldError> {
        let player = self.player.ok_or(WorldError::NoPlayer)?;
        let player_object = self.objects.get(player).ok_or(WorldError::NoPlayer)?;
        let player_pos = player_object.position;
        let item = player_object
            .as_entity()
            .and_then(|entity| entity.items.get(slot).copied().flatten())
            .ok_or(WorldError::EmptySlot(slot))?;
        self.check_reach(player_pos, position)?;
        if self.is_blocked(position) {
            return Err(WorldError::Blocked);
        }

        // Carried items are invisible to the id scan, so their old id may be taken
        let item_id = self.next_object_id();
        let object = self.objects.get_mut(item).ok_or(WorldError::ObjectNotFound)?;
        object.position = position;
        self.index.insert(item, object)?;
        object.id = item_id;

        if let Some(entity) = self.objects.get_mut(player).and_then(|o| o.as_entity_mut()) {
            entity.items[slot] = None;
        }
        tracing::info!(item_id, %position, "item dropped");
        self.emit(WorldEvent::ItemDropped { item_id, position });
        Ok(item)
    }

    fn check_reach(&self, from: GridPosition, to: GridPosition) -> Result<(), WorldError> {
        let limit = self.config.item_pickup_range;
        let distance = manhattan(from.xy(), to.xy());
        if from.z != to.z || distance > limit {
            return Err(WorldError::OutOfReach { distance, limit });
        }
        Ok(())
    }
}
