//! Store-side components that drive physics object lifecycle
//!
//! An entity qualifies for a rigid body when it holds `SpawnPosition +
//! ShapeInfo + Mass`, and for a ghost (sensor) when it holds `SpawnPosition +
//! ShapeInfo + Ghost`. `Impulse` is a one-shot command consumed by the
//! orchestrator on the next update.

use glam::{Quat, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Authoritative placement for an entity's physics object.
///
/// For static bodies this stays authoritative for the object's whole life:
/// editing it repositions the body. For dynamic bodies it is only the initial
/// placement. For a parented ghost it is interpreted as a parent-local offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPosition {
    /// World-space location (parent-local for parented ghosts)
    pub location: Vec3,
    /// World-space orientation (parent-local for parented ghosts)
    pub orientation: Quat,
}

impl SpawnPosition {
    /// Create a placement with identity orientation
    pub fn new(location: Vec3) -> Self {
        Self {
            location,
            orientation: Quat::IDENTITY,
        }
    }

    /// Create a placement with an explicit orientation
    pub fn with_orientation(location: Vec3, orientation: Quat) -> Self {
        Self {
            location,
            orientation,
        }
    }
}

impl Default for SpawnPosition {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Indirect reference to a collision shape in the [`ShapeRegistry`].
///
/// [`ShapeRegistry`]: crate::shapes::ShapeRegistry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeInfo {
    /// Registry id, resolved lazily at object-creation time
    pub shape_id: u32,
}

impl ShapeInfo {
    pub fn new(shape_id: u32) -> Self {
        Self { shape_id }
    }
}

/// Mass and an opaque type classification for a rigid body.
///
/// `mass == 0` marks the body immovable (static). `type_tag` carries no
/// physics meaning in this layer; consumers use it to interpret contacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mass {
    /// Mass in kilograms; zero means static
    pub mass: f32,
    /// Opaque classification bitmask
    pub type_tag: u32,
}

impl Mass {
    pub fn new(mass: f32, type_tag: u32) -> Self {
        Self { mass, type_tag }
    }

    /// A zero-mass, immovable body
    pub fn fixed(type_tag: u32) -> Self {
        Self { mass: 0.0, type_tag }
    }

    /// True if the body never moves on its own
    pub fn is_static(&self) -> bool {
        self.mass == 0.0
    }
}

/// Marker component turning an entity into a non-colliding sensor volume.
///
/// If `parent` is set, the ghost is rigidly offset from that entity's rigid
/// body and tracks it every step; the offset is the `SpawnPosition` recorded
/// at creation, interpreted as parent-local. The parent is stored as raw
/// entity bits so the component stays serializable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ghost {
    /// Parent entity bits (`Entity::to_bits`), if any
    pub parent: Option<u64>,
    /// Collision-group membership bitmask for overlap filtering
    pub collision_mask: u32,
}

impl Ghost {
    /// A free-standing ghost with the given collision mask
    pub fn new(collision_mask: u32) -> Self {
        Self {
            parent: None,
            collision_mask,
        }
    }

    /// A ghost rigidly attached to `parent`'s rigid body
    pub fn parented(parent: Entity, collision_mask: u32) -> Self {
        Self {
            parent: Some(parent.to_bits().into()),
            collision_mask,
        }
    }

    /// Decode the parent reference, if any
    pub fn parent_entity(&self) -> Option<Entity> {
        self.parent.and_then(Entity::from_bits)
    }
}

impl Default for Ghost {
    fn default() -> Self {
        Self::new(u32::MAX)
    }
}

/// One-shot velocity command.
///
/// Visible to the orchestrator for at most one update cycle: it is removed
/// from the store after being read, whether or not a matching body was found.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Impulse {
    /// Linear velocity to push into the engine, if set
    pub linear_velocity: Option<Vec3>,
    /// Angular velocity to push into the engine, if set
    pub angular_velocity: Option<Vec3>,
}

impl Impulse {
    pub fn new(linear_velocity: Option<Vec3>, angular_velocity: Option<Vec3>) -> Self {
        Self {
            linear_velocity,
            angular_velocity,
        }
    }

    /// Linear-only impulse
    pub fn linear(velocity: Vec3) -> Self {
        Self::new(Some(velocity), None)
    }

    /// Angular-only impulse
    pub fn angular(velocity: Vec3) -> Self {
        Self::new(None, Some(velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_classification() {
        assert!(Mass::fixed(0b10).is_static());
        assert!(!Mass::new(4.0, 0b10).is_static());
        assert_eq!(Mass::fixed(0b10).type_tag, 0b10);
    }

    #[test]
    fn ghost_parent_round_trip() {
        let mut world = hecs::World::new();
        let parent = world.spawn(());

        let ghost = Ghost::parented(parent, 0xFF);
        assert_eq!(ghost.parent_entity(), Some(parent));
        assert_eq!(Ghost::new(0xFF).parent_entity(), None);
    }

    #[test]
    fn spawn_position_serialization() {
        let spawn = SpawnPosition::with_orientation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.5),
        );

        let json = serde_json::to_string(&spawn).unwrap();
        let back: SpawnPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(spawn, back);
    }

    #[test]
    fn impulse_constructors() {
        let linear = Impulse::linear(Vec3::X);
        assert_eq!(linear.linear_velocity, Some(Vec3::X));
        assert_eq!(linear.angular_velocity, None);

        let angular = Impulse::angular(Vec3::Y);
        assert_eq!(angular.linear_velocity, None);
        assert_eq!(angular.angular_velocity, Some(Vec3::Y));
    }
}
