//! Per-frame orchestrator
//!
//! [`PhysicsSpace`] owns the engine, both containers, the setup queue, and
//! the listener lists, and runs the fixed update order: container sync,
//! deferred setup, impulse application, driver updates, engine step,
//! collision dispatch, pose publication. The whole cycle belongs to one
//! dedicated simulation thread; `update` refuses to run anywhere else
//! because the engine's object graph is not safe for concurrent mutation.

use crate::collision::ContactEvent;
use crate::components::Impulse;
use crate::config::PhysicsConfig;
use crate::containers::{BodyContainer, GhostContainer};
use crate::driver::ControlDriver;
use crate::engine::PhysicsEngine;
use crate::listener::{CollisionFilter, CollisionListener, ListenerList, PhysicsObjectListener};
use crate::objects::{BodyAccess, GhostAccess, ObjectAccess, ObjectView};
use crate::setup::{SetupAction, SetupQueue};
use crate::shapes::{ShapeError, ShapeRegistry};
use glam::Vec3;
use hecs::{Entity, World};
use rapier3d::prelude::ColliderHandle;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

/// Orchestrator-level failures. All of them indicate configuration or
/// integration bugs rather than runtime conditions worth retrying.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// An entity qualified for a physics object but its collision shape
    /// could not be resolved
    #[error("cannot create physics object for entity {entity:?}")]
    ObjectCreation {
        entity: Entity,
        #[source]
        source: ShapeError,
    },
}

/// The stateful bridge between a hecs [`World`] and the physics engine.
pub struct PhysicsSpace {
    config: PhysicsConfig,
    engine: PhysicsEngine,
    shapes: Arc<ShapeRegistry>,
    bodies: BodyContainer,
    ghosts: GhostContainer,
    setup: SetupQueue,
    object_listeners: ListenerList<dyn PhysicsObjectListener>,
    collision_listeners: ListenerList<dyn CollisionListener>,
    filter: Option<Box<dyn CollisionFilter>>,
    sim_thread: Option<ThreadId>,
    running: bool,
}

impl PhysicsSpace {
    pub fn new(config: PhysicsConfig) -> Self {
        let engine = PhysicsEngine::new(config.gravity);
        let setup = SetupQueue::new(config.max_setup_retries, config.max_pending_setups);
        Self {
            config,
            engine,
            shapes: Arc::new(ShapeRegistry::new()),
            bodies: BodyContainer::new(),
            ghosts: GhostContainer::new(),
            setup,
            object_listeners: ListenerList::new(),
            collision_listeners: ListenerList::new(),
            filter: None,
            sim_thread: None,
            running: false,
        }
    }

    /// Bind the space to the calling thread. Every subsequent `update` and
    /// `stop` must come from this thread.
    pub fn initialize(&mut self) {
        self.sim_thread = Some(thread::current().id());
        info!("physics space initialized");
    }

    /// Begin running; `update` is a no-op before this
    pub fn start(&mut self) {
        self.assert_simulation_thread();
        self.running = true;
        debug!("physics space started");
    }

    /// Tear down every tracked object (with removal notifications and driver
    /// termination) and stop running.
    pub fn stop(&mut self) {
        self.assert_simulation_thread();
        let listeners = self.object_listeners.snapshot();
        self.bodies.clear(&mut self.engine, &listeners);
        self.ghosts.clear(&mut self.engine, &listeners);
        self.running = false;
        info!("physics space stopped");
    }

    /// Run one full update cycle with `dt` seconds of wall time.
    ///
    /// # Panics
    ///
    /// Panics when called before `initialize` or from a different thread
    /// than the one that called it.
    pub fn update(&mut self, world: &mut World, dt: f32) -> Result<(), SpaceError> {
        self.assert_simulation_thread();
        if !self.running {
            trace!("physics space not running, skipping update");
            return Ok(());
        }

        let scaled = dt * self.config.time_scale;
        let object_listeners = self.object_listeners.snapshot();
        let collision_listeners = self.collision_listeners.snapshot();

        for listener in object_listeners.iter() {
            listener.start_frame(scaled);
        }

        let sync_result = {
            let Self {
                engine,
                shapes,
                bodies,
                ghosts,
                ..
            } = self;
            match bodies.sync(world, engine, shapes, &object_listeners) {
                Ok(()) => ghosts.sync(world, engine, shapes, bodies, &object_listeners),
                Err(error) => Err(error),
            }
        };
        // frame notifications stay paired even when the cycle aborts
        if let Err(error) = sync_result {
            for listener in object_listeners.iter() {
                listener.end_frame();
            }
            return Err(error);
        }

        // after sync, so commands see objects created this cycle
        self.drain_setup_queue();
        self.apply_impulses(world);

        if scaled > 0.0 {
            self.step_simulation(scaled, &object_listeners, &collision_listeners);
        }

        for listener in object_listeners.iter() {
            listener.end_frame();
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Update-cycle internals
    // -----------------------------------------------------------------

    fn drain_setup_queue(&mut self) {
        let mut pending = self.setup.take_pending();
        if pending.is_empty() {
            return;
        }
        trace!(count = pending.len(), "draining setup queue");

        let Self {
            engine,
            bodies,
            ghosts,
            setup,
            ..
        } = self;
        while let Some(command) = pending.pop_front() {
            if let Some(object) = bodies.get_mut(command.entity) {
                match command.action {
                    SetupAction::Run(setup_fn) => {
                        let mut access = ObjectAccess::RigidBody(BodyAccess::new(
                            object.entity,
                            object.mass,
                            object.body,
                            engine,
                        ));
                        setup_fn(&mut access);
                    }
                    SetupAction::SetDriver(driver) => {
                        object.set_control_driver(engine, driver);
                    }
                }
            } else if let Some(object) = ghosts.get(command.entity) {
                match command.action {
                    SetupAction::Run(setup_fn) => {
                        let mut access = ObjectAccess::Ghost(GhostAccess::new(
                            object.entity,
                            object.collider,
                            engine,
                        ));
                        setup_fn(&mut access);
                    }
                    SetupAction::SetDriver(_) => {
                        warn!(
                            entity = ?command.entity,
                            "control drivers attach to rigid bodies, not ghosts; dropping"
                        );
                    }
                }
            } else {
                setup.retry(command);
            }
        }
    }

    /// Push every pending `Impulse` into the engine, then delete the
    /// component whether or not a body was found. The component is visible
    /// for at most one cycle.
    fn apply_impulses(&mut self, world: &mut World) {
        let mut impulses = Vec::new();
        for (entity, impulse) in world.query::<&Impulse>().iter() {
            impulses.push((entity, *impulse));
        }

        for (entity, impulse) in impulses {
            if let Some(object) = self.bodies.get(entity) {
                if let Some(velocity) = impulse.linear_velocity {
                    self.engine.set_linear_velocity(object.body, velocity);
                }
                if let Some(velocity) = impulse.angular_velocity {
                    self.engine.set_angular_velocity(object.body, velocity);
                }
            } else {
                // the entity may simply not have finished initializing
                debug!(?entity, "impulse for entity without a body, skipping");
            }
            let _ = world.remove_one::<Impulse>(entity);
        }
    }

    fn step_simulation(
        &mut self,
        dt: f32,
        object_listeners: &[Arc<dyn PhysicsObjectListener>],
        collision_listeners: &[Arc<dyn CollisionListener>],
    ) {
        let Self {
            engine,
            bodies,
            ghosts,
            filter,
            ..
        } = self;

        // all driver updates run before the engine advances
        for object in bodies.iter_mut() {
            let crate::objects::RigidBodyObject {
                entity,
                mass,
                body,
                driver,
                ..
            } = object;
            if let Some(driver) = driver.as_mut() {
                driver.update(dt, &mut BodyAccess::new(*entity, *mass, *body, engine));
            }
        }

        engine.step(dt);

        // this step's collision events, delivered before anyone's next update
        let events = engine.collect_contacts();
        for event in events {
            let view_a = resolve_view(bodies, ghosts, engine, event.collider_a);
            let view_b = resolve_view(bodies, ghosts, engine, event.collider_b);
            if view_a.is_none() && view_b.is_none() {
                continue;
            }
            if let Some(filter) = filter.as_ref() {
                if !filter.allow(view_a.as_ref(), view_b.as_ref(), &event) {
                    continue;
                }
            }
            for listener in collision_listeners {
                listener.collision(view_a.as_ref(), view_b.as_ref(), &event);
            }
            deliver_to_driver(bodies, event.collider_a, view_b.as_ref(), &event);
            deliver_to_driver(bodies, event.collider_b, view_a.as_ref(), &event);
        }

        // publish poses for everything the solver may have moved, then
        // snapshot velocities for next step's contact energies
        for object in bodies.iter_mut() {
            if object.mass.is_static() {
                continue;
            }
            let view = object.view(engine);
            for listener in object_listeners {
                listener.object_updated(&view);
            }
            object.last_velocity = engine.linear_velocity(object.body);
        }

        ghosts.update_parented(bodies, engine, object_listeners);

        // kinematic drivers move their body without the solver noticing
        for object in bodies.iter() {
            if object.mass.is_static() && object.has_driver() {
                let view = object.view(engine);
                for listener in object_listeners {
                    listener.object_updated(&view);
                }
            }
        }
    }

    fn assert_simulation_thread(&self) {
        match self.sim_thread {
            Some(owner) if owner == thread::current().id() => {}
            Some(_) => panic!(
                "PhysicsSpace methods must run on the thread that called initialize()"
            ),
            None => panic!("PhysicsSpace used before initialize()"),
        }
    }

    // -----------------------------------------------------------------
    // Public surface
    // -----------------------------------------------------------------

    /// Run `setup` against `entity`'s physics object once it exists.
    /// Callable from any thread.
    pub fn setup_object(
        &self,
        entity: Entity,
        setup: impl FnOnce(&mut ObjectAccess<'_>) + Send + 'static,
    ) {
        self.setup.setup_object(entity, setup);
    }

    /// Attach (or clear, with `None`) a control driver once the entity's
    /// rigid body exists. Callable from any thread.
    pub fn set_control_driver(&self, entity: Entity, driver: Option<Box<dyn ControlDriver>>) {
        self.setup.set_control_driver(entity, driver);
    }

    /// Cloneable queue handle for enqueueing setup work from other threads
    pub fn setup_handle(&self) -> SetupQueue {
        self.setup.clone()
    }

    /// The shared shape registry; safe to populate from loader threads
    pub fn shapes(&self) -> Arc<ShapeRegistry> {
        self.shapes.clone()
    }

    pub fn add_physics_listener(&self, listener: Arc<dyn PhysicsObjectListener>) {
        self.object_listeners.add(listener);
    }

    pub fn remove_physics_listener(&self, listener: &Arc<dyn PhysicsObjectListener>) {
        self.object_listeners.remove(listener);
    }

    pub fn add_collision_listener(&self, listener: Arc<dyn CollisionListener>) {
        self.collision_listeners.add(listener);
    }

    pub fn remove_collision_listener(&self, listener: &Arc<dyn CollisionListener>) {
        self.collision_listeners.remove(listener);
    }

    /// Install or clear the collision filter consulted before dispatch
    pub fn set_collision_filter(&mut self, filter: Option<Box<dyn CollisionFilter>>) {
        self.filter = filter;
    }

    /// Change gravity for subsequent steps
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
        self.engine.set_gravity(gravity);
    }

    /// Snapshot of the entity's tracked physics object, if any
    pub fn object_view(&self, entity: Entity) -> Option<ObjectView> {
        if let Some(object) = self.bodies.get(entity) {
            return Some(object.view(&self.engine));
        }
        self.ghosts.get(entity).map(|ghost| ghost.view(&self.engine))
    }

    /// Current (post-step) linear velocity of the entity's rigid body
    pub fn linear_velocity(&self, entity: Entity) -> Option<Vec3> {
        self.bodies
            .get(entity)
            .map(|object| self.engine.linear_velocity(object.body))
    }

    /// True if the entity currently owns a body or ghost
    pub fn contains(&self, entity: Entity) -> bool {
        self.bodies.get(entity).is_some() || self.ghosts.get(entity).is_some()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn ghost_count(&self) -> usize {
        self.ghosts.len()
    }

    /// Cast a ray against everything currently simulated
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Option<(Entity, f32)> {
        let (collider, toi) = self.engine.raycast(origin, direction, max_distance, true)?;
        let entity = self
            .bodies
            .entity_of_collider(collider)
            .or_else(|| self.ghosts.entity_of_collider(collider))?;
        Some((entity, toi))
    }
}

/// Resolve an engine collider back to whichever tracked object owns it
fn resolve_view(
    bodies: &BodyContainer,
    ghosts: &GhostContainer,
    engine: &PhysicsEngine,
    collider: ColliderHandle,
) -> Option<ObjectView> {
    if let Some(entity) = bodies.entity_of_collider(collider) {
        return bodies.get(entity).map(|object| object.view(engine));
    }
    ghosts
        .entity_of_collider(collider)
        .and_then(|entity| ghosts.get(entity))
        .map(|object| object.view(engine))
}

/// Hand a collision event to the driver on one side, if there is one
fn deliver_to_driver(
    bodies: &mut BodyContainer,
    collider: ColliderHandle,
    other: Option<&ObjectView>,
    event: &ContactEvent,
) {
    let Some(entity) = bodies.entity_of_collider(collider) else {
        return;
    };
    if let Some(object) = bodies.get_mut(entity) {
        if let Some(driver) = object.driver.as_mut() {
            driver.add_collision(other, event);
        }
    }
}
