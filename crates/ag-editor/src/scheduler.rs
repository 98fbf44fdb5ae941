//! Deferred one-shot tasks.
//!
//! Some refreshes must not run re-entrantly from inside an event handler
//! (e.g. rebuilding an inspector while reacting to the selection change
//! that invalidated it). A `DeferredSlot` holds at most one pending
//! task: scheduling replaces whatever was pending, so a burst of changes
//! runs only the newest refresh, and a cancelled slot runs nothing. The
//! host loop takes the task once per idle tick.

/// Work items the editor defers to the next idle tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredTask {
    /// Rebuild the navigator rows from the model.
    RebuildNavigation,
    /// Resynchronize the canvas mirror from the model.
    SyncCanvas,
    /// Re-frame the canvas on its content.
    FitCanvas,
}

/// Single-slot deferred task: at most one pending, newest wins.
#[derive(Debug, Default)]
pub struct DeferredSlot {
    pending: Option<DeferredTask>,
}

impl DeferredSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task, replacing any task still pending.
    pub fn schedule(&mut self, task: DeferredTask) {
        self.pending = Some(task);
    }

    /// Drop the pending task, if any.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending task, leaving the slot empty.
    pub fn take(&mut self) -> Option<DeferredTask> {
        self.pending.take()
    }
}
