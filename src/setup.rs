//! Deferred, retry-based setup command queue
//!
//! Callers (from any thread) request "run this against entity X's physics
//! object once it exists". The orchestrator drains the queue once per update
//! after container sync; commands whose entity has not materialized are
//! retried next cycle and abandoned with a warning after
//! `max_retries` failed attempts. A hard depth cap bounds memory if a caller
//! floods the queue with entities that never appear.

use crate::driver::ControlDriver;
use crate::objects::ObjectAccess;
use hecs::Entity;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing::warn;

type SetupFn = Box<dyn FnOnce(&mut ObjectAccess<'_>) + Send>;

pub(crate) enum SetupAction {
    /// Arbitrary callback against the resolved object
    Run(SetupFn),
    /// Attach or clear a control driver (rigid bodies only)
    SetDriver(Option<Box<dyn ControlDriver>>),
}

pub(crate) struct SetupCommand {
    pub entity: Entity,
    pub attempts: u32,
    pub action: SetupAction,
}

struct Inner {
    pending: Mutex<VecDeque<SetupCommand>>,
    max_retries: u32,
    max_pending: usize,
}

/// Cloneable, thread-safe handle to the setup queue.
///
/// Enqueueing is safe from any thread; execution always happens on the
/// simulation thread when the orchestrator drains the queue.
#[derive(Clone)]
pub struct SetupQueue {
    inner: Arc<Inner>,
}

impl SetupQueue {
    pub(crate) fn new(max_retries: u32, max_pending: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(VecDeque::new()),
                max_retries,
                max_pending,
            }),
        }
    }

    /// Run `setup` against entity's physics object once it exists
    pub fn setup_object(
        &self,
        entity: Entity,
        setup: impl FnOnce(&mut ObjectAccess<'_>) + Send + 'static,
    ) {
        self.push(SetupCommand {
            entity,
            attempts: 0,
            action: SetupAction::Run(Box::new(setup)),
        });
    }

    /// Attach (or clear, with `None`) a control driver once the entity's
    /// rigid body exists
    pub fn set_control_driver(&self, entity: Entity, driver: Option<Box<dyn ControlDriver>>) {
        self.push(SetupCommand {
            entity,
            attempts: 0,
            action: SetupAction::SetDriver(driver),
        });
    }

    fn push(&self, command: SetupCommand) {
        let mut pending = self.lock();
        if pending.len() >= self.inner.max_pending {
            warn!(
                entity = ?command.entity,
                depth = pending.len(),
                "setup queue full, dropping command"
            );
            return;
        }
        pending.push_back(command);
    }

    /// Swap out everything currently pending for draining
    pub(crate) fn take_pending(&self) -> VecDeque<SetupCommand> {
        std::mem::take(&mut *self.lock())
    }

    /// Re-admit a command whose entity has not materialized yet, or abandon
    /// it once the retry cap is hit. Bypasses the depth cap: the command was
    /// already admitted once.
    pub(crate) fn retry(&self, mut command: SetupCommand) {
        command.attempts += 1;
        if command.attempts >= self.inner.max_retries {
            warn!(
                entity = ?command.entity,
                attempts = command.attempts,
                "abandoning setup command, entity never materialized"
            );
            return;
        }
        self.lock().push_back(command);
    }

    /// Number of commands waiting for their entity
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<SetupCommand>> {
        self.inner
            .pending
            .lock()
            .expect("setup queue lock poisoned")
    }
}
