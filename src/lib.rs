//! Entity-backed rigid body physics
//!
//! This crate keeps a [`hecs::World`] and a rapier physics simulation in
//! sync: entities that carry the right components get rigid bodies or
//! ghost colliders created for them, per-frame simulation results flow
//! back out through listeners, and control drivers let gameplay code steer
//! individual bodies from inside the update cycle.

pub mod collision;
pub mod components;
pub mod config;
pub mod containers;
pub mod driver;
pub mod engine;
pub mod listener;
pub mod objects;
pub mod setup;
pub mod shapes;
pub mod space;

// Re-export commonly used types
pub mod prelude {
    // Component types
    pub use crate::components::{Ghost, Impulse, Mass, ShapeInfo, SpawnPosition};

    // Math types
    pub use glam::{Quat, Vec3};

    // Entity store
    pub use hecs::{Entity, World};

    // Space types
    pub use crate::config::PhysicsConfig;
    pub use crate::space::{PhysicsSpace, SpaceError};

    // Object types
    pub use crate::objects::{BodyAccess, GhostAccess, ObjectAccess, ObjectKind, ObjectView};

    // Listener and driver seams
    pub use crate::driver::ControlDriver;
    pub use crate::listener::{CollisionFilter, CollisionListener, PhysicsObjectListener};

    // Collision types
    pub use crate::collision::{Contact, ContactEvent};

    // Shape registry
    pub use crate::shapes::{ShapeError, ShapeRegistry};

    pub use rapier3d;
}

/// Initialize logging for the physics space
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rapier3d=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
