//! Raw collision events and the published contact record
//!
//! The engine wrapper materializes one [`ContactEvent`] per touching pair per
//! step. The dispatcher in [`space`](crate::space) resolves both sides back
//! to tracked objects and fans the event out; consumers that want a
//! store-friendly record build a [`Contact`], which carries the
//! closing-speed energy derived from each rigid body's start-of-step
//! velocity snapshot.

use crate::objects::ObjectView;
use glam::Vec3;
use hecs::Entity;
use rapier3d::prelude::ColliderHandle;

/// One raw collision callback from the engine.
///
/// By convention `normal` points from side B toward side A. `distance` is
/// the separation at the deepest contact point (negative when penetrating);
/// sensor overlaps report a zero normal and distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    /// Engine collider on side A
    pub collider_a: ColliderHandle,
    /// Engine collider on side B
    pub collider_b: ColliderHandle,
    /// World-space contact point on side A
    pub position_a: Vec3,
    /// World-space contact point on side B
    pub position_b: Vec3,
    /// World-space contact normal, pointing from B toward A
    pub normal: Vec3,
    /// Separation at the contact point, negative when penetrating
    pub distance: f32,
}

/// Immutable record of one collision, suitable for writing back to the store.
///
/// Either entity side may be absent when the event involved geometry this
/// layer does not track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Tracked entity on side A, if any
    pub entity_a: Option<Entity>,
    /// Side A's `Mass::type_tag` (zero for ghosts and untracked geometry)
    pub type_a: u32,
    /// Tracked entity on side B, if any
    pub entity_b: Option<Entity>,
    /// Side B's `Mass::type_tag` (zero for ghosts and untracked geometry)
    pub type_b: u32,
    /// `type_a | type_b`, for cheap interest filtering
    pub type_mask: u32,
    /// World-space contact position (side A's point)
    pub position: Vec3,
    /// World-space normal, pointing from B toward A
    pub normal: Vec3,
    /// Signed closing-speed proxy, see [`contact_energy`]
    pub energy: f32,
}

impl Contact {
    /// Build a contact record from the resolved sides of a raw event
    pub fn new(a: Option<&ObjectView>, b: Option<&ObjectView>, event: &ContactEvent) -> Self {
        let type_a = a.map(ObjectView::type_tag).unwrap_or(0);
        let type_b = b.map(ObjectView::type_tag).unwrap_or(0);
        Self {
            entity_a: a.map(|view| view.entity),
            type_a,
            entity_b: b.map(|view| view.entity),
            type_b,
            type_mask: type_a | type_b,
            position: event.position_a,
            normal: event.normal,
            energy: contact_energy(a, b, event.normal),
        }
    }
}

/// Closing-speed energy of a contact.
///
/// With `normal` pointing from B toward A this is `-n·v_a + n·v_b`, using
/// each rigid body's velocity snapshot taken at the start of the step. The
/// result is symmetric in which side the callback labelled A. Ghost
/// involvement yields zero; an untracked side contributes zero velocity.
pub fn contact_energy(a: Option<&ObjectView>, b: Option<&ObjectView>, normal: Vec3) -> f32 {
    if a.is_some_and(ObjectView::is_ghost) || b.is_some_and(ObjectView::is_ghost) {
        return 0.0;
    }
    let velocity_a = a.and_then(ObjectView::last_velocity).unwrap_or(Vec3::ZERO);
    let velocity_b = b.and_then(ObjectView::last_velocity).unwrap_or(Vec3::ZERO);
    -normal.dot(velocity_a) + normal.dot(velocity_b)
}
