//! Entity-backed object containers
//!
//! Each container reconciles the component store against its live map once
//! per update: entities that newly hold the container's archetype get a
//! physics object, entities that lost it get theirs destroyed, and (for
//! static bodies) placement edits are pushed back into the engine. The store
//! never learns about engine handles; the containers own the mapping.

pub mod bodies;
pub mod ghosts;

pub use bodies::BodyContainer;
pub use ghosts::GhostContainer;
