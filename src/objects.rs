//! Entity-bound physics object wrappers
//!
//! Two variants exist: a rigid body (dynamic or static, optionally carrying a
//! control driver) and a ghost (free-standing sensor, optionally rigidly
//! parented to a body). Listeners and drivers see objects through
//! [`ObjectView`] snapshots; setup commands and drivers mutate them through
//! the [`BodyAccess`]/[`GhostAccess`] seams, which bundle the engine handle
//! with the borrow they need.

use crate::components::Mass;
use crate::driver::ControlDriver;
use crate::engine::PhysicsEngine;
use glam::{Quat, Vec3};
use hecs::Entity;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};
use tracing::debug;

/// A rigid body owned by the body container.
pub struct RigidBodyObject {
    /// Owning entity
    pub entity: Entity,
    /// Mass and type classification recorded at creation
    pub mass: Mass,
    /// Engine body handle
    pub body: RigidBodyHandle,
    /// Engine collider handle (one per body)
    pub collider: ColliderHandle,
    /// Linear velocity snapshot from the start of the current step, used for
    /// contact-energy computation
    pub last_velocity: Vec3,
    pub(crate) driver: Option<Box<dyn ControlDriver>>,
}

impl RigidBodyObject {
    pub(crate) fn new(
        entity: Entity,
        mass: Mass,
        body: RigidBodyHandle,
        collider: ColliderHandle,
    ) -> Self {
        Self {
            entity,
            mass,
            body,
            collider,
            last_velocity: Vec3::ZERO,
            driver: None,
        }
    }

    /// True if a control driver is currently attached
    pub fn has_driver(&self) -> bool {
        self.driver.is_some()
    }

    /// Attach, replace, or clear the control driver.
    ///
    /// A replaced driver is terminated before the new one is initialized;
    /// the two never overlap.
    pub fn set_control_driver(
        &mut self,
        engine: &mut PhysicsEngine,
        driver: Option<Box<dyn ControlDriver>>,
    ) {
        if let Some(mut old) = self.driver.take() {
            debug!(entity = ?self.entity, "terminating control driver");
            old.terminate(&mut BodyAccess::new(self.entity, self.mass, self.body, engine));
        }
        if let Some(mut new) = driver {
            debug!(entity = ?self.entity, "initializing control driver");
            new.initialize(&mut BodyAccess::new(self.entity, self.mass, self.body, engine));
            self.driver = Some(new);
        }
    }

    /// Snapshot the object for listeners
    pub fn view(&self, engine: &PhysicsEngine) -> ObjectView {
        let (location, rotation) = engine.pose(self.body);
        ObjectView {
            entity: self.entity,
            kind: ObjectKind::RigidBody {
                mass: self.mass.mass,
                type_tag: self.mass.type_tag,
                last_velocity: self.last_velocity,
            },
            location,
            rotation,
        }
    }
}

/// Fixed parent-local attachment of a ghost to a rigid body.
///
/// Only the parent's entity id is kept; the body is looked up in the body
/// container every frame, so a parent destroyed and recreated under the same
/// id is tracked seamlessly.
#[derive(Debug, Clone, Copy)]
pub struct ParentLink {
    /// Entity whose rigid body this ghost follows
    pub entity: Entity,
    /// Parent-local translation offset
    pub local_offset: Vec3,
    /// Parent-local rotation offset
    pub local_rotation: Quat,
}

/// A sensor volume owned by the ghost container.
pub struct GhostObject {
    /// Owning entity
    pub entity: Entity,
    /// Engine collider handle (free-standing sensor)
    pub collider: ColliderHandle,
    /// Collision-group membership recorded at creation
    pub collision_mask: u32,
    /// Rigid attachment to a parent body, if any
    pub parent: Option<ParentLink>,
}

impl GhostObject {
    pub(crate) fn new(
        entity: Entity,
        collider: ColliderHandle,
        collision_mask: u32,
        parent: Option<ParentLink>,
    ) -> Self {
        Self {
            entity,
            collider,
            collision_mask,
            parent,
        }
    }

    /// Snapshot the object for listeners
    pub fn view(&self, engine: &PhysicsEngine) -> ObjectView {
        let (location, rotation) = engine.collider_pose(self.collider);
        ObjectView {
            entity: self.entity,
            kind: ObjectKind::Ghost {
                collision_mask: self.collision_mask,
            },
            location,
            rotation,
        }
    }
}

/// Which variant an [`ObjectView`] snapshots, with its per-variant payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    RigidBody {
        mass: f32,
        type_tag: u32,
        /// Velocity snapshot from the start of the current step
        last_velocity: Vec3,
    },
    Ghost {
        collision_mask: u32,
    },
}

/// Immutable snapshot of a tracked object, handed to listeners and drivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectView {
    pub entity: Entity,
    pub kind: ObjectKind,
    pub location: Vec3,
    pub rotation: Quat,
}

impl ObjectView {
    /// The object's `Mass::type_tag`, or zero for ghosts
    pub fn type_tag(&self) -> u32 {
        match self.kind {
            ObjectKind::RigidBody { type_tag, .. } => type_tag,
            ObjectKind::Ghost { .. } => 0,
        }
    }

    /// True for the sensor variant
    pub fn is_ghost(&self) -> bool {
        matches!(self.kind, ObjectKind::Ghost { .. })
    }

    /// Start-of-step velocity snapshot for rigid bodies, `None` for ghosts
    pub fn last_velocity(&self) -> Option<Vec3> {
        match self.kind {
            ObjectKind::RigidBody { last_velocity, .. } => Some(last_velocity),
            ObjectKind::Ghost { .. } => None,
        }
    }
}

/// Mutable access to one rigid body, scoped to a driver or setup callback.
pub struct BodyAccess<'a> {
    entity: Entity,
    mass: Mass,
    handle: RigidBodyHandle,
    engine: &'a mut PhysicsEngine,
}

impl<'a> BodyAccess<'a> {
    pub(crate) fn new(
        entity: Entity,
        mass: Mass,
        handle: RigidBodyHandle,
        engine: &'a mut PhysicsEngine,
    ) -> Self {
        Self {
            entity,
            mass,
            handle,
            engine,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn mass(&self) -> Mass {
        self.mass
    }

    pub fn location(&self) -> Vec3 {
        self.engine.location(self.handle)
    }

    pub fn set_location(&mut self, location: Vec3) {
        let rotation = self.rotation();
        self.engine.set_pose(self.handle, location, rotation);
    }

    pub fn rotation(&self) -> Quat {
        self.engine.rotation(self.handle)
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        let location = self.location();
        self.engine.set_pose(self.handle, location, rotation);
    }

    pub fn linear_velocity(&self) -> Vec3 {
        self.engine.linear_velocity(self.handle)
    }

    pub fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.engine.set_linear_velocity(self.handle, velocity);
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.engine.angular_velocity(self.handle)
    }

    pub fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.engine.set_angular_velocity(self.handle, velocity);
    }

    pub fn apply_central_force(&mut self, force: Vec3) {
        self.engine.apply_central_force(self.handle, force);
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.engine.apply_impulse(self.handle, impulse);
    }

    pub fn apply_torque_impulse(&mut self, impulse: Vec3) {
        self.engine.apply_torque_impulse(self.handle, impulse);
    }

    /// Hand the body's pose authorship to the caller (or back to the solver).
    /// Drivers that author their body's pose directly call this from
    /// `initialize`.
    pub fn set_kinematic(&mut self, kinematic: bool) {
        self.engine.set_kinematic(self.handle, kinematic);
    }
}

/// Mutable access to one ghost, scoped to a setup callback.
pub struct GhostAccess<'a> {
    entity: Entity,
    collider: ColliderHandle,
    engine: &'a mut PhysicsEngine,
}

impl<'a> GhostAccess<'a> {
    pub(crate) fn new(
        entity: Entity,
        collider: ColliderHandle,
        engine: &'a mut PhysicsEngine,
    ) -> Self {
        Self {
            entity,
            collider,
            engine,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn location(&self) -> Vec3 {
        self.engine.collider_pose(self.collider).0
    }

    pub fn rotation(&self) -> Quat {
        self.engine.collider_pose(self.collider).1
    }

    /// Reposition the ghost. Parented ghosts must not be posed from outside;
    /// their pose is recomputed from the parent every step.
    pub fn set_pose(&mut self, location: Vec3, rotation: Quat) {
        self.engine.set_collider_pose(self.collider, location, rotation);
    }
}

/// The object handed to a deferred setup callback once its entity resolves.
pub enum ObjectAccess<'a> {
    RigidBody(BodyAccess<'a>),
    Ghost(GhostAccess<'a>),
}

impl<'a> ObjectAccess<'a> {
    pub fn entity(&self) -> Entity {
        match self {
            ObjectAccess::RigidBody(body) => body.entity(),
            ObjectAccess::Ghost(ghost) => ghost.entity(),
        }
    }

    pub fn as_rigid_body(&mut self) -> Option<&mut BodyAccess<'a>> {
        match self {
            ObjectAccess::RigidBody(body) => Some(body),
            ObjectAccess::Ghost(_) => None,
        }
    }

    pub fn as_ghost(&mut self) -> Option<&mut GhostAccess<'a>> {
        match self {
            ObjectAccess::Ghost(ghost) => Some(ghost),
            ObjectAccess::RigidBody(_) => None,
        }
    }
}
