//! Ghost (sensor) lifecycle container
//!
//! Watches the `SpawnPosition + ShapeInfo + Ghost` archetype. A parented
//! ghost treats its `SpawnPosition` as a parent-local offset and follows the
//! parent's rigid body every step; an unparented ghost sits where it was
//! spawned.

use crate::components::{Ghost, ShapeInfo, SpawnPosition};
use crate::containers::BodyContainer;
use crate::engine::PhysicsEngine;
use crate::listener::PhysicsObjectListener;
use crate::objects::{GhostObject, ParentLink};
use crate::shapes::ShapeRegistry;
use crate::space::SpaceError;
use hecs::{Entity, World};
use rapier3d::prelude::ColliderHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

pub struct GhostContainer {
    objects: HashMap<Entity, GhostObject>,
    by_collider: HashMap<ColliderHandle, Entity>,
}

impl GhostContainer {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            by_collider: HashMap::new(),
        }
    }

    /// Reconcile the live ghost set against the store.
    ///
    /// `bodies` must already be synced for this cycle so a parented ghost
    /// whose parent was created in the same cycle starts in place.
    pub fn sync(
        &mut self,
        world: &World,
        engine: &mut PhysicsEngine,
        shapes: &ShapeRegistry,
        bodies: &BodyContainer,
        listeners: &[Arc<dyn PhysicsObjectListener>],
    ) -> Result<(), SpaceError> {
        let mut to_create = Vec::new();
        for (entity, (spawn, shape, ghost)) in world
            .query::<(&SpawnPosition, &ShapeInfo, &Ghost)>()
            .iter()
        {
            if !self.objects.contains_key(&entity) {
                to_create.push((entity, *spawn, *shape, *ghost));
            }
        }

        for (entity, spawn, shape_info, ghost) in to_create {
            let shape = shapes
                .get(shape_info.shape_id)
                .map_err(|source| SpaceError::ObjectCreation { entity, source })?;

            let parent = ghost.parent_entity().map(|parent| ParentLink {
                entity: parent,
                local_offset: spawn.location,
                local_rotation: spawn.orientation,
            });
            // a parented ghost starts composed with its parent's current
            // pose; a parent that has not materialized yet leaves it at the
            // raw offset until the first update after the parent appears
            let (location, rotation) = match parent
                .as_ref()
                .and_then(|link| bodies.get(link.entity))
            {
                Some(parent_body) => {
                    let (parent_location, parent_rotation) = engine.pose(parent_body.body);
                    (
                        parent_location + parent_rotation * spawn.location,
                        parent_rotation * spawn.orientation,
                    )
                }
                None => (spawn.location, spawn.orientation),
            };
            let collider = engine.add_ghost(location, rotation, ghost.collision_mask, shape);

            let object = GhostObject::new(entity, collider, ghost.collision_mask, parent);
            let view = object.view(engine);
            let parented = object.parent.is_some();
            self.by_collider.insert(collider, entity);
            self.objects.insert(entity, object);
            debug!(?entity, parented, "created ghost");

            for listener in listeners {
                listener.object_added(&view);
            }
            if !parented {
                for listener in listeners {
                    listener.object_updated(&view);
                }
            }
        }

        let disqualified: Vec<Entity> = self
            .objects
            .keys()
            .filter(|entity| {
                !world
                    .satisfies::<(&SpawnPosition, &ShapeInfo, &Ghost)>(**entity)
                    .unwrap_or(false)
            })
            .copied()
            .collect();
        for entity in disqualified {
            self.remove_object(entity, engine, listeners);
        }

        Ok(())
    }

    /// Recompute every parented ghost's pose from its parent's current pose
    /// and publish an update. The parent is looked up by entity id each call,
    /// so a parent destroyed and recreated under the same id is tracked; a
    /// missing parent freezes the ghost where it is.
    pub fn update_parented(
        &self,
        bodies: &BodyContainer,
        engine: &mut PhysicsEngine,
        listeners: &[Arc<dyn PhysicsObjectListener>],
    ) {
        for object in self.objects.values() {
            let Some(link) = object.parent else {
                continue;
            };
            let Some(parent) = bodies.get(link.entity) else {
                trace!(ghost = ?object.entity, parent = ?link.entity, "ghost parent missing");
                continue;
            };

            let (parent_location, parent_rotation) = engine.pose(parent.body);
            let location = parent_location + parent_rotation * link.local_offset;
            let rotation = parent_rotation * link.local_rotation;
            engine.set_collider_pose(object.collider, location, rotation);

            let view = object.view(engine);
            for listener in listeners {
                listener.object_updated(&view);
            }
        }
    }

    /// Destroy one entity's ghost and notify listeners
    pub fn remove_object(
        &mut self,
        entity: Entity,
        engine: &mut PhysicsEngine,
        listeners: &[Arc<dyn PhysicsObjectListener>],
    ) {
        let Some(object) = self.objects.remove(&entity) else {
            return;
        };
        let view = object.view(engine);
        self.by_collider.remove(&object.collider);
        engine.remove_ghost(object.collider);
        debug!(?entity, "removed ghost");

        for listener in listeners {
            listener.object_removed(&view);
        }
    }

    /// Destroy every tracked ghost (space teardown)
    pub fn clear(
        &mut self,
        engine: &mut PhysicsEngine,
        listeners: &[Arc<dyn PhysicsObjectListener>],
    ) {
        let entities: Vec<Entity> = self.objects.keys().copied().collect();
        for entity in entities {
            self.remove_object(entity, engine, listeners);
        }
    }

    pub fn get(&self, entity: Entity) -> Option<&GhostObject> {
        self.objects.get(&entity)
    }

    pub fn entity_of_collider(&self, collider: ColliderHandle) -> Option<Entity> {
        self.by_collider.get(&collider).copied()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for GhostContainer {
    fn default() -> Self {
        Self::new()
    }
}
