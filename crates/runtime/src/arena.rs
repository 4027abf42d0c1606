//! Shared stand-in for engine geometry.
//!
//! Every entity that can block a ray is a sphere [`Body`]. The authority's
//! spawns register bodies here and its despawns remove them, so probes on any
//! replica see the same world. Weapons and projectiles are spawned without a
//! body.
use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU32, Ordering};

use glam::Vec3;
use survival_core::{EntityId, ProbeHit, SpatialProbe, SpawnError, SpawnKind, SpawnService, Transform};
use tracing::{debug, trace};

use crate::events::{Event, EventBus, LifecycleEvent};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub center: Vec3,
    pub radius: f32,
}

impl Body {
    /// Distance along `direction` (unit length) from `origin` to the first
    /// point of the sphere, or zero when `origin` is already inside.
    fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let to_center = self.center - origin;
        let along = to_center.dot(direction);
        let miss_sq = to_center.length_squared() - along * along;
        let radius_sq = self.radius * self.radius;
        if miss_sq > radius_sq {
            return None;
        }
        let half_chord = (radius_sq - miss_sq).sqrt();
        let near = along - half_chord;
        let far = along + half_chord;
        if far < 0.0 {
            return None;
        }
        Some(near.max(0.0))
    }
}

pub struct Arena {
    bodies: RwLock<BTreeMap<EntityId, Body>>,
    next: AtomicU32,
    events: Option<EventBus>,
}

impl Arena {
    pub const CHARACTER_RADIUS: f32 = 40.0;
    pub const CONTAINER_RADIUS: f32 = 60.0;
    pub const PICKUP_RADIUS: f32 = 25.0;

    pub fn new(first_id: u32) -> Self {
        Self {
            bodies: RwLock::new(BTreeMap::new()),
            next: AtomicU32::new(first_id),
            events: None,
        }
    }

    /// Publishes spawn and destroy lifecycle events on `bus`.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn radius_of(kind: SpawnKind) -> Option<f32> {
        match kind {
            SpawnKind::Character => Some(Self::CHARACTER_RADIUS),
            SpawnKind::LootContainer => Some(Self::CONTAINER_RADIUS),
            SpawnKind::Pickup => Some(Self::PICKUP_RADIUS),
            SpawnKind::Weapon | SpawnKind::Projectile => None,
        }
    }

    pub fn body(&self, entity: EntityId) -> Option<Body> {
        self.bodies.read().ok()?.get(&entity).copied()
    }

    pub fn len(&self) -> usize {
        self.bodies.read().map_or(0, |bodies| bodies.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert(&self, entity: EntityId, body: Body) {
        if let Ok(mut bodies) = self.bodies.write() {
            bodies.insert(entity, body);
        }
    }

    /// Moves an existing body. Unknown entities are ignored.
    pub fn place(&self, entity: EntityId, center: Vec3) {
        if let Ok(mut bodies) = self.bodies.write()
            && let Some(body) = bodies.get_mut(&entity)
        {
            body.center = center;
        }
    }

    fn publish(&self, event: LifecycleEvent) {
        if let Some(bus) = &self.events {
            bus.publish(Event::Lifecycle(event));
        }
    }
}

impl SpatialProbe for Arena {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<ProbeHit> {
        let direction = direction.try_normalize()?;
        let bodies = self.bodies.read().ok()?;
        bodies
            .iter()
            .filter(|(entity, _)| Some(**entity) != ignore)
            .filter_map(|(entity, body)| {
                let distance = body.intersect(origin, direction)?;
                (distance <= max_distance).then_some(ProbeHit {
                    entity: *entity,
                    point: origin + direction * distance,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

impl SpawnService for Arena {
    fn spawn(&self, kind: SpawnKind, at: Transform) -> Result<EntityId, SpawnError> {
        let entity = EntityId(self.next.fetch_add(1, Ordering::Relaxed));
        if let Some(radius) = Self::radius_of(kind) {
            self.insert(
                entity,
                Body {
                    center: at.location,
                    radius,
                },
            );
        }
        trace!(target: "runtime::arena", %entity, %kind, location = ?at.location, "spawned");
        self.publish(LifecycleEvent::Spawned {
            entity,
            kind: kind.to_string(),
        });
        Ok(entity)
    }

    fn destroy(&self, entity: EntityId) {
        let removed = self
            .bodies
            .write()
            .is_ok_and(|mut bodies| bodies.remove(&entity).is_some());
        debug!(target: "runtime::arena", %entity, removed, "destroyed");
        self.publish(LifecycleEvent::Destroyed { entity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with(bodies: &[(u32, Vec3, f32)]) -> Arena {
        let arena = Arena::new(100);
        for &(id, center, radius) in bodies {
            arena.insert(EntityId(id), Body { center, radius });
        }
        arena
    }

    #[test]
    fn probe_returns_nearest_body_in_reach() {
        let arena = arena_with(&[
            (1, Vec3::new(500.0, 0.0, 0.0), 50.0),
            (2, Vec3::new(200.0, 10.0, 0.0), 50.0),
            (3, Vec3::new(0.0, 300.0, 0.0), 50.0),
        ]);

        let hit = arena.probe(Vec3::ZERO, Vec3::X, 1000.0, None).unwrap();
        assert_eq!(hit.entity, EntityId(2));
        assert!(hit.distance > 140.0 && hit.distance < 160.0, "{}", hit.distance);

        assert!(arena.probe(Vec3::ZERO, Vec3::X, 100.0, None).is_none());
        assert_eq!(
            arena.probe(Vec3::ZERO, Vec3::X, 1000.0, Some(EntityId(2))).map(|h| h.entity),
            Some(EntityId(1))
        );
    }

    #[test]
    fn probe_ignores_bodies_behind_the_origin() {
        let arena = arena_with(&[(1, Vec3::new(-200.0, 0.0, 0.0), 50.0)]);
        assert!(arena.probe(Vec3::ZERO, Vec3::X, 1000.0, None).is_none());
    }

    #[test]
    fn spawned_weapons_have_no_body() {
        let arena = Arena::new(10);
        let character = arena.spawn(SpawnKind::Character, Transform::IDENTITY).unwrap();
        let weapon = arena.spawn(SpawnKind::Weapon, Transform::IDENTITY).unwrap();

        assert_eq!(character, EntityId(10));
        assert!(arena.body(character).is_some());
        assert!(arena.body(weapon).is_none());

        arena.destroy(character);
        assert!(arena.is_empty());
    }
}
