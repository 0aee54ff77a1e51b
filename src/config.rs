//! Configuration types for the physics bridge

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`PhysicsSpace`].
///
/// [`PhysicsSpace`]: crate::space::PhysicsSpace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// World gravity applied by the engine
    pub gravity: Vec3,

    /// Multiplier applied to every delta passed to `update`; a scaled step of
    /// zero skips stepping entirely
    pub time_scale: f32,

    /// Attempts a deferred setup command gets before it is abandoned
    pub max_setup_retries: u32,

    /// Hard cap on distinct pending setup commands; enqueues beyond this are
    /// dropped with a warning
    pub max_pending_setups: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            time_scale: 1.0,
            max_setup_retries: 100,
            max_pending_setups: 4096,
        }
    }
}

impl PhysicsConfig {
    /// Configuration with a custom gravity vector
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            ..Default::default()
        }
    }
}
