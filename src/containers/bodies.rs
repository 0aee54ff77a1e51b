//! Rigid-body lifecycle container
//!
//! Watches the `SpawnPosition + ShapeInfo + Mass` archetype and keeps exactly
//! one engine rigid body alive per matching entity.

use crate::components::{Mass, ShapeInfo, SpawnPosition};
use crate::engine::PhysicsEngine;
use crate::listener::PhysicsObjectListener;
use crate::objects::RigidBodyObject;
use crate::shapes::ShapeRegistry;
use crate::space::SpaceError;
use hecs::{Entity, World};
use rapier3d::prelude::ColliderHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct BodyContainer {
    objects: HashMap<Entity, RigidBodyObject>,
    by_collider: HashMap<ColliderHandle, Entity>,
    /// Last placement pushed into the engine for each static body, so edits
    /// to `SpawnPosition` can be detected as kinematic repositioning
    static_poses: HashMap<Entity, SpawnPosition>,
}

impl BodyContainer {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            by_collider: HashMap::new(),
            static_poses: HashMap::new(),
        }
    }

    /// Reconcile the live body set against the store.
    ///
    /// A missing shape aborts the sync with an error: an entity that should
    /// have a physics representation but silently doesn't is a configuration
    /// bug, not something to paper over.
    pub fn sync(
        &mut self,
        world: &World,
        engine: &mut PhysicsEngine,
        shapes: &ShapeRegistry,
        listeners: &[Arc<dyn PhysicsObjectListener>],
    ) -> Result<(), SpaceError> {
        // collect first, then mutate; hecs queries hold a world borrow
        let mut to_create = Vec::new();
        for (entity, (spawn, shape, mass)) in world
            .query::<(&SpawnPosition, &ShapeInfo, &Mass)>()
            .iter()
        {
            if !self.objects.contains_key(&entity) {
                to_create.push((entity, *spawn, *shape, *mass));
            }
        }

        for (entity, spawn, shape_info, mass) in to_create {
            let shape = shapes
                .get(shape_info.shape_id)
                .map_err(|source| SpaceError::ObjectCreation { entity, source })?;
            let (body, collider) =
                engine.add_body(spawn.location, spawn.orientation, mass.mass, shape);

            let object = RigidBodyObject::new(entity, mass, body, collider);
            let view = object.view(engine);
            self.by_collider.insert(collider, entity);
            self.objects.insert(entity, object);
            debug!(?entity, mass = mass.mass, "created rigid body");

            for listener in listeners {
                listener.object_added(&view);
            }
            if mass.is_static() {
                // it will never move on its own; publish its pose once
                self.static_poses.insert(entity, spawn);
                for listener in listeners {
                    listener.object_updated(&view);
                }
            }
        }

        // kinematic repositioning of static bodies
        let mut repositioned = Vec::new();
        for (entity, recorded) in &self.static_poses {
            if let Ok(current) = world.get::<&SpawnPosition>(*entity) {
                if *current != *recorded {
                    repositioned.push((*entity, *current));
                }
            }
        }
        for (entity, spawn) in repositioned {
            if let Some(object) = self.objects.get(&entity) {
                engine.set_pose(object.body, spawn.location, spawn.orientation);
                let view = object.view(engine);
                for listener in listeners {
                    listener.object_updated(&view);
                }
            }
            self.static_poses.insert(entity, spawn);
        }

        let disqualified: Vec<Entity> = self
            .objects
            .keys()
            .filter(|entity| {
                !world
                    .satisfies::<(&SpawnPosition, &ShapeInfo, &Mass)>(**entity)
                    .unwrap_or(false)
            })
            .copied()
            .collect();
        for entity in disqualified {
            self.remove_object(entity, engine, listeners);
        }

        Ok(())
    }

    /// Destroy one entity's body: terminate its driver, pull it out of the
    /// engine, notify listeners.
    pub fn remove_object(
        &mut self,
        entity: Entity,
        engine: &mut PhysicsEngine,
        listeners: &[Arc<dyn PhysicsObjectListener>],
    ) {
        let Some(mut object) = self.objects.remove(&entity) else {
            return;
        };
        object.set_control_driver(engine, None);

        let view = object.view(engine);
        self.by_collider.remove(&object.collider);
        self.static_poses.remove(&entity);
        engine.remove_body(object.body);
        debug!(?entity, "removed rigid body");

        for listener in listeners {
            listener.object_removed(&view);
        }
    }

    /// Destroy every tracked body (space teardown)
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

    pub fn get(&self, entity: Entity) -> Option<&RigidBodyObject> {
        self.objects.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut RigidBodyObject> {
        self.objects.get_mut(&entity)
    }

    pub fn entity_of_collider(&self, collider: ColliderHandle) -> Option<Entity> {
        self.by_collider.get(&collider).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RigidBodyObject> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidBodyObject> {
        self.objects.values_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for BodyContainer {
    fn default() -> Self {
        Self::new()
    }
}
