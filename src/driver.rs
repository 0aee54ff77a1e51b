//! The control driver contract
//!
//! A control driver is per-entity behavior (character controller, scripted
//! platform, wandering AI) bound to exactly one rigid body. The orchestrator
//! guarantees the call ordering documented on each method; behaviors
//! themselves live outside this crate.

use crate::collision::ContactEvent;
use crate::objects::{BodyAccess, ObjectView};

/// Per-step behavior hook for one rigid body.
///
/// Lifecycle: exactly one `initialize` before any other call, exactly one
/// `terminate` when detached or when the body is destroyed, never two
/// `initialize` calls without a `terminate` in between. Within a step, every
/// `add_collision` for the previous engine step is delivered before `update`.
pub trait ControlDriver: Send {
    /// Called once when the driver is attached to its body.
    ///
    /// Drivers that author their body's pose directly typically call
    /// [`BodyAccess::set_kinematic`] here; that is the driver's choice, not
    /// something the orchestrator enforces.
    fn initialize(&mut self, _body: &mut BodyAccess<'_>) {}

    /// Called once per collision event touching this driver's body, before
    /// this step's `update`. `other` is the resolved far side, absent for
    /// untracked geometry. The usual idiom is to accumulate here and
    /// consume-and-reset in `update`.
    fn add_collision(&mut self, _other: Option<&ObjectView>, _event: &ContactEvent) {}

    /// Called exactly once per step, before the engine advances.
    fn update(&mut self, dt: f32, body: &mut BodyAccess<'_>);

    /// Called once when the driver is detached or its body is destroyed.
    fn terminate(&mut self, _body: &mut BodyAccess<'_>) {}
}
