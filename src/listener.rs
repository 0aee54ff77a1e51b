//! Listener and filter traits, plus the copy-on-write listener list
//!
//! Listener registration is rare (usually at startup) while iteration runs
//! every frame, so the list keeps an immutable `Arc` snapshot that mutation
//! replaces under a single coarse lock and readers clone without locking the
//! iteration itself.

use crate::collision::ContactEvent;
use crate::objects::ObjectView;
use std::sync::{Arc, Mutex};

/// Frame and object lifecycle notifications.
///
/// All methods take `&self`; stateful listeners use interior mutability.
pub trait PhysicsObjectListener: Send + Sync {
    /// An update cycle is starting; `time` is the scaled step for this frame
    fn start_frame(&self, _time: f32) {}
    /// The update cycle finished
    fn end_frame(&self) {}
    /// A physics object was created for an entity
    fn object_added(&self, _object: &ObjectView) {}
    /// An object's pose changed this step
    fn object_updated(&self, _object: &ObjectView) {}
    /// An entity's physics object was destroyed
    fn object_removed(&self, _object: &ObjectView) {}
}

/// Receives every collision event that survives the filter.
pub trait CollisionListener: Send + Sync {
    /// `a`/`b` are the resolved sides; either may be absent for untracked
    /// geometry (never both)
    fn collision(&self, a: Option<&ObjectView>, b: Option<&ObjectView>, event: &ContactEvent);
}

/// Decides which collision events reach listeners and drivers.
pub trait CollisionFilter: Send {
    /// Return `false` to suppress the event entirely
    fn allow(&self, a: Option<&ObjectView>, b: Option<&ObjectView>, event: &ContactEvent) -> bool;
}

/// Copy-on-write list of shared listeners.
pub struct ListenerList<T: ?Sized> {
    snapshot: Mutex<Arc<Vec<Arc<T>>>>,
}

impl<T: ?Sized> ListenerList<T> {
    pub fn new() -> Self {
        Self {
            snapshot: Mutex::new(Arc::new(Vec::new())),
        }
    }

    /// Append a listener; replaces the snapshot, never blocks iteration
    pub fn add(&self, listener: Arc<T>) {
        let mut guard = self.snapshot.lock().expect("listener list lock poisoned");
        let mut next = (**guard).clone();
        next.push(listener);
        *guard = Arc::new(next);
    }

    /// Remove a listener by identity (`Arc::ptr_eq`)
    pub fn remove(&self, listener: &Arc<T>) {
        let mut guard = self.snapshot.lock().expect("listener list lock poisoned");
        let mut next = (**guard).clone();
        next.retain(|existing| !Arc::ptr_eq(existing, listener));
        *guard = Arc::new(next);
    }

    /// Current immutable snapshot; iteration stays valid across mutation
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot
            .lock()
            .expect("listener list lock poisoned")
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

impl<T: ?Sized> Default for ListenerList<T> {
    fn default() -> Self {
        Self::new()
    }
}
