// Enemy AI: patrol, chase, go back
//
// One state step per tick. Movement only happens when the movement
// stopwatch has run out, attacks only when the attack stopwatch has.

use rand::Rng;

use crate::combat::range_calculator::{is_beyond, is_in_attack_range};
use crate::combat::target_finder::find_closest_hostile;
use crate::npc::entity::EntityState;
use crate::storage::ObjectKey;
use crate::utility::{is_in_grid_radius, GridPos2, GridPosition};
use crate::world::World;

/// What the enemy update needs from its own entity, copied out so the
/// world can be borrowed mutably afterwards
#[derive(Debug, Clone, Copy)]
struct EnemyView {
    position: GridPosition,
    state: EntityState,
    origin: GridPos2,
    target: Option<ObjectKey>,
    patrol_radius: i32,
    chase_radius: i32,
    range: i32,
    alive: bool,
    can_move: bool,
    can_attack: bool,
}

impl World {
    fn enemy_view(&self, key: ObjectKey) -> Option<EnemyView> {
        let now = self.now_ms();
        let object = self.objects.get(key)?;
        let entity = object.as_entity()?;
        Some(EnemyView {
            position: object.position,
            state: entity.state,
            origin: entity.origin,
            target: entity.target,
            patrol_radius: entity.patrol_radius,
            chase_radius: entity.chase_radius,
            range: entity.stats.range,
            alive: entity.stats.is_alive(),
            can_move: entity.movement_timer.is_zero(now),
            can_attack: entity.attack_timer.is_zero(now),
        })
    }

    fn set_target(&mut self, key: ObjectKey, target: Option<ObjectKey>) {
        if let Some(entity) = self.objects.get_mut(key).and_then(|o| o.as_entity_mut()) {
            entity.target = target;
        }
    }

    /// Step `key` toward `goal` unless the next cell is blocked
    fn step_toward(&mut self, key: ObjectKey, position: GridPosition, goal: GridPos2) -> bool {
        let step = self.path_step(position, goal);
        if step.is_zero() || self.is_blocked(position.offset(step)) {
            return false;
        }
        self.step_entity(key, step);
        true
    }

    /// Run one state-machine step for an enemy
    pub(crate) fn update_enemy(&mut self, key: ObjectKey) {
        let Some(view) = self.enemy_view(key) else {
            return;
        };
        if !view.alive {
            self.schedule_despawn(key);
            return;
        }

        match view.state {
            EntityState::Patrolling => self.patrol(key, &view),
            EntityState::Chasing => self.chase(key, &view),
            EntityState::GoingBack => self.go_back(key, &view),
        }
    }

    fn patrol(&mut self, key: ObjectKey, view: &EnemyView) {
        if let Some(target) = find_closest_hostile(key, &self.objects, &self.index, view.chase_radius) {
            self.set_target(key, Some(target));
            self.transition(key, EntityState::Chasing);
            return;
        }
        if !view.can_move {
            return;
        }

        let radius = view.patrol_radius.max(0);
        let dx = self.rng.random_range(-radius..=radius);
        let dy = self.rng.random_range(-radius..=radius);
        let goal = view.position.xy().offset(GridPos2::new(dx, dy));

        let step = self.path_step(view.position, goal);
        if step.is_zero() || self.is_blocked(view.position.offset(step)) {
            return;
        }
        // A wander goal outside the home circle sends the enemy home instead
        if !is_in_grid_radius(view.origin, goal, view.patrol_radius) {
            self.transition(key, EntityState::GoingBack);
            return;
        }
        self.step_entity(key, step);
    }

    fn chase(&mut self, key: ObjectKey, view: &EnemyView) {
        let target = view
            .target
            .and_then(|target| self.objects.get(target).map(|object| (target, object.position)));
        let Some((target, target_pos)) = target else {
            // No target, or it was despawned since
            self.set_target(key, None);
            self.transition(key, EntityState::Patrolling);
            return;
        };

        let here = view.position.xy();
        if target_pos.z == view.position.z && is_in_attack_range(here, target_pos.xy(), view.range) {
            if view.can_attack {
                self.resolve_attack(key, target);
            }
            return;
        }

        if target_pos.z != view.position.z || is_beyond(here, target_pos.xy(), self.config.give_up_distance) {
            self.set_target(key, None);
            self.transition(key, EntityState::Patrolling);
            return;
        }
        if !is_in_grid_radius(view.origin, here, view.patrol_radius + self.config.patrol_margin) {
            self.set_target(key, None);
            self.transition(key, EntityState::GoingBack);
            return;
        }
        if view.can_move {
            self.step_toward(key, view.position, target_pos.xy());
        }
    }

    fn go_back(&mut self, key: ObjectKey, view: &EnemyView) {
        if view.position.xy() == view.origin {
            self.transition(key, EntityState::Patrolling);
            return;
        }
        if view.can_move && !self.step_toward(key, view.position, view.origin) {
            debug_log!("enemy {:?} cannot step home from {}", key, view.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::events::WorldEvent;
    use crate::input::InputState;
    use crate::npc::entity::EntityState;
    use crate::storage::ObjectKey;
    use crate::utility::{GridPos2, GridPosition};
    use crate::world::prefabs::names;
    use crate::world::test_support::{floor, test_world};
    use crate::world::World;

    fn state_of(world: &World, key: ObjectKey) -> EntityState {
        world.object(key).unwrap().as_entity().unwrap().state
    }

    #[test]
    fn test_patrolling_enemy_aggroes_on_player_in_chase_radius() {
        let mut world = test_world();
        floor(&mut world, (0, 0), (6, 6));
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(1, 1, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(3, 1, 0)).unwrap();

        world.update_enemy(rat);

        let entity = world.object(rat).unwrap().as_entity().unwrap();
        assert_eq!(entity.state, EntityState::Chasing);
        assert_eq!(entity.target, Some(player));
    }

    #[test]
    fn test_player_outside_chase_radius_is_ignored() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        // Exactly on the radius: aggro needs strictly inside
        world.spawn(names::PLAYER, GridPosition::new(3, 0, 0)).unwrap();
        world.object_mut(rat).unwrap().as_entity_mut().unwrap().patrol_radius = 0;

        world.update_enemy(rat);
        assert_eq!(state_of(&world, rat), EntityState::Patrolling);
    }

    #[test]
    fn test_chasing_enemy_kill_credit() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(2, 2, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(3, 2, 0)).unwrap();
        {
            let entity = world.object_mut(player).unwrap().as_entity_mut().unwrap();
            entity.stats.health = 4;
            entity.stats.experience = 25;
        }
        {
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
        }
        while world.pop_event().is_some() {}

        world.update_enemy(rat);

        let entity = world.object(rat).unwrap().as_entity().unwrap();
        assert_eq!(entity.state, EntityState::Patrolling);
        assert!(entity.target.is_none());
        assert_eq!(entity.stats.experience, 35);
        assert_eq!(world.object(player).unwrap().as_entity().unwrap().stats.health, 0);

        let events: Vec<_> = std::iter::from_fn(|| world.pop_event()).collect();
        assert!(events.contains(&WorldEvent::EntityDied { id: 1, killer_id: Some(0) }));
    }

    #[test]
    fn test_dead_player_ends_the_game() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(2, 2, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(3, 2, 0)).unwrap();
        world.object_mut(player).unwrap().as_entity_mut().unwrap().stats.health = 1;

        // Aggro, then the attack lands on the following tick
        world.tick(16, &InputState::new());
        assert_eq!(state_of(&world, rat), EntityState::Chasing);
        world.tick(16, &InputState::new());
        world.tick(16, &InputState::new());
        assert!(world.is_game_over());
    }

    #[test]
    fn test_movement_cadence_gates_position() {
        let mut world = test_world();
        floor(&mut world, (0, 0), (8, 8));
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(4, 4, 0)).unwrap();
        {
            let now = world.now_ms();
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::GoingBack;
            entity.origin = GridPos2::new(1, 4);
            entity.movement_timer.start(now, 500);
        }

        for _ in 0..4 {
            world.tick(100, &InputState::new());
            assert_eq!(world.object(rat).unwrap().position, GridPosition::new(4, 4, 0));
        }

        // Timer runs out at 500 ms: one step home
        world.tick(100, &InputState::new());
        assert_eq!(world.object(rat).unwrap().position, GridPosition::new(3, 4, 0));
    }

    #[test]
    fn test_chasing_enemy_gated_by_timer_in_every_state() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(2, 0, 0)).unwrap();
        {
            let now = world.now_ms();
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
            entity.movement_timer.start(now, 10_000);
        }
        world.update_enemy(rat);
        assert_eq!(world.object(rat).unwrap().position, GridPosition::new(0, 0, 0));
        assert_eq!(state_of(&world, rat), EntityState::Chasing);
    }

    #[test]
    fn test_chaser_steps_toward_target() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(2, 0, 0)).unwrap();
        {
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
        }
        world.update_enemy(rat);
        assert_eq!(world.object(rat).unwrap().position, GridPosition::new(1, 0, 0));
    }

    #[test]
    fn test_chaser_gives_up_far_target() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(6, 0, 0)).unwrap();
        {
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
        }
        world.update_enemy(rat);
        let entity = world.object(rat).unwrap().as_entity().unwrap();
        assert_eq!(entity.state, EntityState::Patrolling);
        assert!(entity.target.is_none());
    }

    #[test]
    fn test_chaser_outside_patrol_margin_goes_back() {
        let mut world = test_world();
        // Origin (0,0), patrol radius 4 + margin 2: (7,0) is outside
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(7, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(9, 0, 0)).unwrap();
        {
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.origin = GridPos2::new(0, 0);
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
        }
        world.update_enemy(rat);
        let entity = world.object(rat).unwrap().as_entity().unwrap();
        assert_eq!(entity.state, EntityState::GoingBack);
        assert!(entity.target.is_none());
    }

    #[test]
    fn test_stale_target_returns_to_patrol() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(2, 0, 0)).unwrap();
        {
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
        }
        world.despawn(player).unwrap();
        // Reuse the slot so a raw index would alias the new object
        world.spawn(names::ENEMY_RAT, GridPosition::new(2, 0, 0)).unwrap();

        world.update_enemy(rat);
        let entity = world.object(rat).unwrap().as_entity().unwrap();
        assert_eq!(entity.state, EntityState::Patrolling);
        assert!(entity.target.is_none());
    }

    #[test]
    fn test_going_back_arrives_home() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(3, 3, 0)).unwrap();
        world.object_mut(rat).unwrap().as_entity_mut().unwrap().state = EntityState::GoingBack;

        world.update_enemy(rat);
        assert_eq!(state_of(&world, rat), EntityState::Patrolling);
    }

    #[test]
    fn test_dead_enemy_is_despawned() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        world.object_mut(rat).unwrap().as_entity_mut().unwrap().stats.health = 0;

        let report = world.tick(16, &InputState::new());
        assert_eq!(report.despawned, 1);
        assert!(world.object(rat).is_none());
    }

    #[test]
    fn test_patrol_goal_outside_home_turns_back_without_moving() {
        let mut world = test_world();
        floor(&mut world, (0, 0), (12, 12));
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(6, 6, 0)).unwrap();
        world.object_mut(rat).unwrap().as_entity_mut().unwrap().origin = GridPos2::new(100, 100);

        // A zero roll leaves the rat patrolling, so allow a few ticks
        for _ in 0..20 {
            world.tick(1000, &InputState::new());
            assert_eq!(world.object(rat).unwrap().position, GridPosition::new(6, 6, 0));
            if state_of(&world, rat) != EntityState::Patrolling {
                break;
            }
        }
        assert_eq!(state_of(&world, rat), EntityState::GoingBack);
    }

    #[test]
    fn test_patrol_stays_near_origin() {
        let mut world = test_world();
        floor(&mut world, (0, 0), (12, 12));
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(6, 6, 0)).unwrap();

        for _ in 0..200 {
            world.tick(250, &InputState::new());
            let pos = world.object(rat).unwrap().position.xy();
            // Patrol radius 4; one extra step can happen before turning back
            let dx = (pos.x - 6).abs();
            let dy = (pos.y - 6).abs();
            assert!(dx * dx + dy * dy <= 36, "rat wandered to {pos}");
        }
    }
}
