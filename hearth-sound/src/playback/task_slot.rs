//! Cancel-on-replace task handle
//!
//! Each kind of deferred engine work (fade ticks, auto-stop countdown) owns
//! one slot. Scheduling into a slot aborts whatever it held before, and a
//! generation token lets a running task check it has not been superseded
//! before touching engine state.

use tokio::task::JoinHandle;

/// Token identifying one scheduling into a [`TaskSlot`]
pub type Generation = u64;

/// At most one outstanding task of a kind
#[derive(Debug, Default)]
pub struct TaskSlot {
    generation: Generation,
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current task (if any) and schedule a new one.
    ///
    /// `spawn` receives the new generation token and returns the task handle.
    pub fn replace<F>(&mut self, spawn: F) -> Generation
    where
        F: FnOnce(Generation) -> JoinHandle<()>,
    {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.handle = Some(spawn(self.generation));
        self.generation
    }

    /// Abort the current task. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// True while `token` names the pending task
    pub fn is_current(&self, token: Generation) -> bool {
        self.handle.is_some() && self.generation == token
    }

    /// Called by the task itself when it completes.
    ///
    /// Clears the slot without aborting, so the caller may keep running to
    /// its end. Returns false if the task was already superseded.
    pub fn finish(&mut self, token: Generation) -> bool {
        if self.is_current(token) {
            self.handle = None;
            true
        } else {
            false
        }
    }

    /// True if a task is pending
    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
