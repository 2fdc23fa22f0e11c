// Attack resolution and projectile flight

use crate::error::WorldError;
use crate::events::WorldEvent;
use crate::npc::entity::{attack_delay_ms, EntityState, EntityStats};
use crate::storage::ObjectKey;
use crate::utility::{GridPos2, GridPosition};
use crate::world::object::ObjectKind;
use crate::world::World;

/// Result of one hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// Target survived with `remaining_health`
    Hit { damage: i32, remaining_health: i32 },
    /// Target dropped to 0; its experience goes to the attacker
    Killed { experience: i32 },
}

/// Apply `damage` to `target`.
///
/// A blow that would take health to or below zero sets it to exactly 0 and
/// reports the target's experience as the reward.
pub fn strike(target: &mut EntityStats, damage: i32) -> AttackOutcome {
    if target.health <= damage || target.health <= 0 {
        target.health = 0;
        return AttackOutcome::Killed {
            experience: target.experience,
        };
    }
    target.health -= damage;
    AttackOutcome::Hit {
        damage,
        remaining_health: target.health,
    }
}

impl World {
    /// Melee attack from `attacker` on `target`.
    ///
    /// On a kill the attacker gains the target's experience, drops the
    /// target and goes back to patrolling. Otherwise its attack countdown
    /// restarts. Returns None when either handle is stale.
    pub(crate) fn resolve_attack(&mut self, attacker: ObjectKey, target: ObjectKey) -> Option<AttackOutcome> {
        let now = self.now_ms();
        let (attacker_id, damage) = {
            let object = self.objects.get(attacker)?;
            (object.id, object.as_entity()?.stats.damage)
        };
        let (target_id, outcome) = {
            let object = self.objects.get_mut(target)?;
            let id = object.id;
            (id, strike(&mut object.as_entity_mut()?.stats, damage))
        };

        match outcome {
            AttackOutcome::Hit { damage, remaining_health } => {
                if let Some(entity) = self.objects.get_mut(attacker).and_then(|o| o.as_entity_mut()) {
                    let delay = attack_delay_ms(entity.stats.attack_speed, entity.stats.dexterity);
                    entity.attack_timer.start(now, delay);
                }
                self.emit(WorldEvent::DamageDealt {
                    attacker_id,
                    target_id,
                    damage,
                    remaining_health,
                });
            }
            AttackOutcome::Killed { experience } => {
                let total = match self.objects.get_mut(attacker).and_then(|o| o.as_entity_mut()) {
                    Some(entity) => {
                        entity.stats.experience += experience;
                        entity.target = None;
                        entity.stats.experience
                    }
                    None => 0,
                };
                self.transition(attacker, EntityState::Patrolling);
                tracing::info!(attacker_id, target_id, experience, "entity killed");
                self.emit(WorldEvent::EntityDied {
                    id: target_id,
                    killer_id: Some(attacker_id),
                });
                self.emit(WorldEvent::ExperienceGained {
                    id: attacker_id,
                    amount: experience,
                    total,
                });
            }
        }
        Some(outcome)
    }

    /// Spawn a projectile prefab heading in `direction` (one of the four
    /// axis-aligned unit steps)
    pub fn spawn_projectile(
        &mut self,
        prefab: &str,
        position: GridPosition,
        direction: GridPos2,
    ) -> Result<ObjectKey, WorldError> {
        let key = self.spawn(prefab, position)?;
        let id = self.objects.get(key).map_or(-1, |o| o.id);
        match self.objects.get_mut(key).map(|o| &mut o.kind) {
            Some(ObjectKind::Projectile(projectile)) => {
                projectile.direction = direction;
                Ok(key)
            }
            _ => {
                self.despawn(key)?;
                Err(WorldError::WrongVariant {
                    id,
                    expected: "a projectile",
                })
            }
        }
    }

    /// Advance a projectile one cell per step delay. It damages the first
    /// living entity it runs into, and expires on walls or at its range.
    pub(crate) fn update_projectile(&mut self, key: ObjectKey) {
        let now = self.now_ms();
        let Some(object) = self.objects.get(key) else {
            return;
        };
        let (id, position) = (object.id, object.position);
        let ObjectKind::Projectile(projectile) = &object.kind else {
            return;
        };
        let (direction, damage) = (projectile.direction, projectile.damage);

        if direction.is_zero() || projectile.travelled >= projectile.range {
            self.schedule_despawn(key);
            return;
        }
        if !projectile.step_timer.is_zero(now) {
            return;
        }

        let next = position.offset(direction);
        let victim = self.query_objects_at(next).iter().find(|&candidate| {
            self.objects
                .get(candidate)
                .is_some_and(|o| o.is_living_entity())
        });

        if let Some(victim) = victim {
            let outcome = self
                .objects
                .get_mut(victim)
                .and_then(|o| {
                    let victim_id = o.id;
                    o.as_entity_mut().map(|e| (victim_id, strike(&mut e.stats, damage)))
                });
            match outcome {
                Some((victim_id, AttackOutcome::Hit { damage, remaining_health })) => {
                    self.emit(WorldEvent::DamageDealt {
                        attacker_id: id,
                        target_id: victim_id,
                        damage,
                        remaining_health,
                    });
                }
                Some((victim_id, AttackOutcome::Killed { .. })) => {
                    self.emit(WorldEvent::EntityDied {
                        id: victim_id,
                        killer_id: Some(id),
                    });
                }
                None => {}
            }
            self.schedule_despawn(key);
            return;
        }

        if self.is_blocked(next) {
            self.schedule_despawn(key);
            return;
        }

        if let Some(object) = self.objects.get_mut(key) {
            object.position = next;
            if let ObjectKind::Projectile(projectile) = &mut object.kind {
                projectile.travelled += 1;
                projectile.step_timer.start(now, projectile.step_delay_ms as u64);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputState;
    use crate::world::prefabs::names;
    use crate::world::test_support::test_world;

    #[test]
    fn test_strike_kill_rule() {
        let mut stats = EntityStats { health: 10, experience: 7, ..Default::default() };
        assert_eq!(
            strike(&mut stats, 4),
            AttackOutcome::Hit { damage: 4, remaining_health: 6 }
        );
        // Damage equal to remaining health kills
        assert_eq!(strike(&mut stats, 6), AttackOutcome::Killed { experience: 7 });
        assert_eq!(stats.health, 0);
    }

    #[test]
    fn test_resolve_attack_grants_experience_on_kill() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(1, 0, 0)).unwrap();
        world.object_mut(player).unwrap().as_entity_mut().unwrap().stats.health = 5;
        world.object_mut(player).unwrap().as_entity_mut().unwrap().stats.experience = 3;
        {
            let entity = world.object_mut(rat).unwrap().as_entity_mut().unwrap();
            entity.state = EntityState::Chasing;
            entity.target = Some(player);
        }

        assert_eq!(
            world.resolve_attack(rat, player),
            Some(AttackOutcome::Killed { experience: 3 })
        );
        let rat_entity = world.object(rat).unwrap().as_entity().unwrap();
        assert_eq!(rat_entity.stats.experience, 13);
        assert_eq!(rat_entity.state, EntityState::Patrolling);
        assert!(rat_entity.target.is_none());
        assert_eq!(world.object(player).unwrap().as_entity().unwrap().stats.health, 0);
    }

    #[test]
    fn test_resolve_attack_starts_cooldown_on_hit() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(0, 0, 0)).unwrap();
        let player = world.spawn(names::PLAYER, GridPosition::new(1, 0, 0)).unwrap();

        assert_eq!(
            world.resolve_attack(rat, player),
            Some(AttackOutcome::Hit { damage: 5, remaining_health: 95 })
        );
        let timer = world.object(rat).unwrap().as_entity().unwrap().attack_timer;
        assert!(!timer.is_zero(world.now_ms()));
        assert_eq!(timer.remaining(world.now_ms()), 1500);
    }

    #[test]
    fn test_projectile_hits_entity_and_expires() {
        let mut world = test_world();
        let rat = world.spawn(names::ENEMY_RAT, GridPosition::new(3, 0, 0)).unwrap();
        // Keep the rat on its cell
        world.object_mut(rat).unwrap().as_entity_mut().unwrap().patrol_radius = 0;
        let arrow = world
            .spawn_projectile(names::ARROW, GridPosition::new(0, 0, 0), GridPos2::new(1, 0))
            .unwrap();

        // Steps every 100 ms: (1,0), (2,0), then hits the rat at (3,0)
        for _ in 0..4 {
            world.tick(100, &InputState::new());
        }
        assert!(world.object(arrow).is_none());
        assert_eq!(world.object(rat).unwrap().as_entity().unwrap().stats.health, 42);
    }

    #[test]
    fn test_projectile_stops_at_wall_and_range() {
        let mut world = test_world();
        world.spawn(names::WALL_TILE, GridPosition::new(2, 0, 0)).unwrap();
        let blocked = world
            .spawn_projectile(names::ARROW, GridPosition::new(0, 0, 0), GridPos2::new(1, 0))
            .unwrap();
        let free = world
            .spawn_projectile(names::ARROW, GridPosition::new(0, 5, 0), GridPos2::new(1, 0))
            .unwrap();

        for _ in 0..3 {
            world.tick(100, &InputState::new());
        }
        assert!(world.object(blocked).is_none());
        assert!(world.object(free).is_some());

        for _ in 0..6 {
            world.tick(100, &InputState::new());
        }
        assert!(world.object(free).is_none());
    }

    #[test]
    fn test_spawn_projectile_rejects_other_prefabs() {
        let mut world = test_world();
        let result = world.spawn_projectile(names::EMPTY_TILE, GridPosition::new(0, 0, 0), GridPos2::new(1, 0));
        assert!(matches!(result, Err(WorldError::WrongVariant { .. })));
        assert_eq!(world.objects().len(), 0);
    }
}
