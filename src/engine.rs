//! Rapier-backed physics engine service
//!
//! This module owns every rapier structure needed to step the simulation and
//! presents the narrow surface the rest of the crate consumes: add/remove
//! objects, step, per-object pose/velocity/force access, and per-step contact
//! collection. Nothing outside this module touches rapier types other than
//! [`SharedShape`] and the opaque handles.

use crate::collision::ContactEvent;
use glam::{Quat, Vec3};
use rapier3d::math::{Isometry, Real, Vector};
use rapier3d::na;
use rapier3d::prelude::*;
use tracing::debug;

/// Convert a glam vector into a rapier vector
fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

/// Convert a rapier vector into a glam vector
fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Build a rapier isometry from a glam location and orientation
fn to_isometry(location: Vec3, rotation: Quat) -> Isometry<Real> {
    Isometry::from_parts(
        to_vector(location).into(),
        na::Unit::new_normalize(na::Quaternion::new(
            rotation.w, rotation.x, rotation.y, rotation.z,
        )),
    )
}

/// Split a rapier isometry into a glam location and orientation
fn from_isometry(iso: &Isometry<Real>) -> (Vec3, Quat) {
    let t = iso.translation.vector;
    let r = iso.rotation;
    (
        Vec3::new(t.x, t.y, t.z),
        Quat::from_xyzw(r.i, r.j, r.k, r.w),
    )
}

/// The opaque rigid-body simulation consumed by the orchestration layer.
pub struct PhysicsEngine {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl PhysicsEngine {
    /// Create an engine with the given gravity
    pub fn new(gravity: Vec3) -> Self {
        debug!(?gravity, "initializing physics engine");
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Replace the gravity vector
    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = to_vector(gravity);
        debug!(?gravity, "physics gravity changed");
    }

    /// Insert a rigid body with one collider; zero mass yields a fixed body.
    ///
    /// The collider carries no density, so a dynamic body's mass properties
    /// come entirely from `mass` spread over the shape.
    pub fn add_body(
        &mut self,
        location: Vec3,
        rotation: Quat,
        mass: f32,
        shape: SharedShape,
    ) -> (RigidBodyHandle, ColliderHandle) {
        let builder = if mass == 0.0 {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic()
        };
        let body = self
            .bodies
            .insert(builder.position(to_isometry(location, rotation)));

        let mut collider = ColliderBuilder::new(shape).density(0.0);
        if mass > 0.0 {
            collider = collider.mass(mass);
        }
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);

        (body, collider)
    }

    /// Remove a rigid body and its attached colliders
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
    }

    /// Insert a free-standing sensor collider (a ghost volume).
    ///
    /// `collision_mask` becomes the sensor's group membership; it overlaps
    /// every kind of body, including fixed and kinematic ones.
    pub fn add_ghost(
        &mut self,
        location: Vec3,
        rotation: Quat,
        collision_mask: u32,
        shape: SharedShape,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::new(shape)
            .sensor(true)
            .position(to_isometry(location, rotation))
            .collision_groups(InteractionGroups::new(
                Group::from_bits_truncate(collision_mask),
                Group::ALL,
            ))
            .active_collision_types(ActiveCollisionTypes::all());
        self.colliders.insert(collider)
    }

    /// Remove a free-standing collider
    pub fn remove_ghost(&mut self, handle: ColliderHandle) {
        self.colliders.remove(
            handle,
            &mut self.island_manager,
            &mut self.bodies,
            false,
        );
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.query_pipeline.update(&self.bodies, &self.colliders);
    }

    /// Collect this step's touching pairs as raw collision events.
    ///
    /// One event per active contact pair (the deepest point), plus one per
    /// sensor overlap. The event normal points from side B toward side A.
    pub fn collect_contacts(&self) -> Vec<ContactEvent> {
        let mut events = Vec::new();

        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let Some((manifold, point)) = pair.find_deepest_contact() else {
                continue;
            };
            let (Some(first), Some(second)) = (
                self.colliders.get(pair.collider1),
                self.colliders.get(pair.collider2),
            ) else {
                continue;
            };

            let world_a = first.position() * point.local_p1;
            let world_b = second.position() * point.local_p2;
            // rapier's manifold normal points out of the first shape; flip it
            // to match the B-toward-A convention of ContactEvent.
            let normal = -from_vector(&manifold.data.normal);

            events.push(ContactEvent {
                collider_a: pair.collider1,
                collider_b: pair.collider2,
                position_a: Vec3::new(world_a.x, world_a.y, world_a.z),
                position_b: Vec3::new(world_b.x, world_b.y, world_b.z),
                normal,
                distance: point.dist,
            });
        }

        for (collider_a, collider_b, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let Some(first) = self.colliders.get(collider_a) else {
                continue;
            };
            let (location, _) = from_isometry(first.position());
            events.push(ContactEvent {
                collider_a,
                collider_b,
                position_a: location,
                position_b: location,
                normal: Vec3::ZERO,
                distance: 0.0,
            });
        }

        events
    }

    // -----------------------------------------------------------------
    // Per-body access
    // -----------------------------------------------------------------

    /// World-space location of a body, or zero if the handle is stale
    pub fn location(&self, handle: RigidBodyHandle) -> Vec3 {
        self.bodies
            .get(handle)
            .map(|rb| from_isometry(rb.position()).0)
            .unwrap_or_default()
    }

    /// World-space rotation of a body
    pub fn rotation(&self, handle: RigidBodyHandle) -> Quat {
        self.bodies
            .get(handle)
            .map(|rb| from_isometry(rb.position()).1)
            .unwrap_or(Quat::IDENTITY)
    }

    /// World-space pose of a body
    pub fn pose(&self, handle: RigidBodyHandle) -> (Vec3, Quat) {
        self.bodies
            .get(handle)
            .map(|rb| from_isometry(rb.position()))
            .unwrap_or((Vec3::ZERO, Quat::IDENTITY))
    }

    /// Teleport a body to a new pose
    pub fn set_pose(&mut self, handle: RigidBodyHandle, location: Vec3, rotation: Quat) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.set_position(to_isometry(location, rotation), true);
        }
    }

    /// Linear velocity of a body
    pub fn linear_velocity(&self, handle: RigidBodyHandle) -> Vec3 {
        self.bodies
            .get(handle)
            .map(|rb| from_vector(rb.linvel()))
            .unwrap_or_default()
    }

    /// Overwrite a body's linear velocity
    pub fn set_linear_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.set_linvel(to_vector(velocity), true);
        }
    }

    /// Angular velocity of a body
    pub fn angular_velocity(&self, handle: RigidBodyHandle) -> Vec3 {
        self.bodies
            .get(handle)
            .map(|rb| from_vector(rb.angvel()))
            .unwrap_or_default()
    }

    /// Overwrite a body's angular velocity
    pub fn set_angular_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.set_angvel(to_vector(velocity), true);
        }
    }

    /// Accumulate a continuous central force for the next step
    pub fn apply_central_force(&mut self, handle: RigidBodyHandle, force: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.add_force(to_vector(force), true);
        }
    }

    /// Apply an instantaneous impulse at the center of mass
    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.apply_impulse(to_vector(impulse), true);
        }
    }

    /// Apply an instantaneous angular impulse
    pub fn apply_torque_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec3) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            rb.apply_torque_impulse(to_vector(impulse), true);
        }
    }

    /// Switch a body between solver-driven and externally-authored motion
    pub fn set_kinematic(&mut self, handle: RigidBodyHandle, kinematic: bool) {
        if let Some(rb) = self.bodies.get_mut(handle) {
            let body_type = if kinematic {
                RigidBodyType::KinematicPositionBased
            } else {
                RigidBodyType::Dynamic
            };
            rb.set_body_type(body_type, true);
        }
    }

    // -----------------------------------------------------------------
    // Free-standing collider access
    // -----------------------------------------------------------------

    /// World-space pose of a collider
    pub fn collider_pose(&self, handle: ColliderHandle) -> (Vec3, Quat) {
        self.colliders
            .get(handle)
            .map(|c| from_isometry(c.position()))
            .unwrap_or((Vec3::ZERO, Quat::IDENTITY))
    }

    /// Move a free-standing collider to a new pose
    pub fn set_collider_pose(&mut self, handle: ColliderHandle, location: Vec3, rotation: Quat) {
        if let Some(c) = self.colliders.get_mut(handle) {
            c.set_position(to_isometry(location, rotation));
        }
    }

    /// Cast a ray against everything currently in the engine
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        solid: bool,
    ) -> Option<(ColliderHandle, f32)> {
        let ray = Ray::new(point![origin.x, origin.y, origin.z], to_vector(direction));
        self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            solid,
            QueryFilter::default(),
        )
    }
}
