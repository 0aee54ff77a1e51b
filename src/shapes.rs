//! Registry mapping opaque shape ids to engine collision shapes
//!
//! Shapes are registered up front (often from an asset-loading thread) or
//! produced on demand by an injectable loader. A shape that cannot be
//! resolved is a configuration bug and surfaces as [`ShapeError::NotFound`].

use rapier3d::prelude::SharedShape;
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// Errors produced when resolving a collision shape
#[derive(Debug, Error)]
pub enum ShapeError {
    /// No shape registered under the id and no loader produced one
    #[error("no collision shape registered under id {0}")]
    NotFound(u32),
}

type ShapeLoader = dyn Fn(u32) -> Option<SharedShape> + Send + Sync;

/// Thread-safe shape id → collision shape map with lazy load-on-miss.
///
/// Registration and lookup may happen from any thread; loading is interleaved
/// with simulation startup, so the whole registry sits behind locks rather
/// than being owned by the simulation thread.
#[derive(Default)]
pub struct ShapeRegistry {
    shapes: RwLock<HashMap<u32, SharedShape>>,
    loader: RwLock<Option<Box<ShapeLoader>>>,
}

impl ShapeRegistry {
    /// Empty registry with no loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that resolves misses through `loader`
    pub fn with_loader(loader: impl Fn(u32) -> Option<SharedShape> + Send + Sync + 'static) -> Self {
        let registry = Self::new();
        registry.set_loader(loader);
        registry
    }

    /// Install or replace the load-on-miss function
    pub fn set_loader(&self, loader: impl Fn(u32) -> Option<SharedShape> + Send + Sync + 'static) {
        *self
            .loader
            .write()
            .expect("shape registry loader lock poisoned") = Some(Box::new(loader));
    }

    /// Store `shape` under `id`, overwriting any previous entry
    pub fn register(&self, id: u32, shape: SharedShape) {
        debug!(id, "registering collision shape");
        self.shapes
            .write()
            .expect("shape registry lock poisoned")
            .insert(id, shape);
    }

    /// Resolve `id`, consulting the loader on a miss and caching its result
    pub fn get(&self, id: u32) -> Result<SharedShape, ShapeError> {
        if let Some(shape) = self
            .shapes
            .read()
            .expect("shape registry lock poisoned")
            .get(&id)
        {
            return Ok(shape.clone());
        }

        let loaded = self
            .loader
            .read()
            .expect("shape registry loader lock poisoned")
            .as_ref()
            .and_then(|loader| loader(id));

        match loaded {
            Some(shape) => {
                debug!(id, "loaded collision shape on demand");
                self.shapes
                    .write()
                    .expect("shape registry lock poisoned")
                    .insert(id, shape.clone());
                Ok(shape)
            }
            None => Err(ShapeError::NotFound(id)),
        }
    }

    /// True if `id` is already cached (does not consult the loader)
    pub fn contains(&self, id: u32) -> bool {
        self.shapes
            .read()
            .expect("shape registry lock poisoned")
            .contains_key(&id)
    }
}
