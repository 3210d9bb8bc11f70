#![forbid(unsafe_code)]

//! Single-slot pending-work cell and the deferred value built on it.
//!
//! High-rate input (pointer moves, keystrokes) must not fan out into one
//! callback per event. A [`FrameSlot`] holds at most one pending input:
//! writing overwrites whatever was pending, and only the write that armed
//! an empty slot asks the caller to schedule a drain. The drain then sees
//! the latest input only — intermediate states are skipped by construction,
//! and the final state always reflects the newest write.

/// A single-slot cell of pending input.
#[derive(Debug, Default)]
pub struct FrameSlot<T> {
    pending: Option<T>,
}

impl<T> FrameSlot<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Store `input`, overwriting any pending value.
    ///
    /// Returns `true` when the slot was empty — exactly one drain should be
    /// scheduled per arming; later writes before the drain just replace the
    /// payload.
    pub fn put(&mut self, input: T) -> bool {
        let was_empty = self.pending.is_none();
        self.pending = Some(input);
        was_empty
    }

    /// Drain the slot.
    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Drop any pending input without draining.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Whether a drain is outstanding.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

/// A value with a synchronous write side and a lazily settled read side.
///
/// Writes land in a [`FrameSlot`]; the committed value changes only when
/// [`Deferred::settle`] runs (scheduled for the next idle moment by the
/// caller). A newer write before the settle supersedes the pending one, so
/// this is a restartable, coalesced pipeline — not a debounce timer.
#[derive(Debug)]
pub struct Deferred<T> {
    committed: T,
    slot: FrameSlot<T>,
}

impl<T: PartialEq> Deferred<T> {
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            committed: initial,
            slot: FrameSlot::new(),
        }
    }

    /// Stage a new value. Returns `true` when a settle needs scheduling.
    pub fn set(&mut self, value: T) -> bool {
        self.slot.put(value)
    }

    /// Commit the latest staged value. Returns whether the committed value
    /// changed.
    pub fn settle(&mut self) -> bool {
        match self.slot.take() {
            Some(value) if value != self.committed => {
                self.committed = value;
                true
            }
            _ => false,
        }
    }

    /// The committed (settled) value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.committed
    }

    /// Whether a staged value awaits settling.
    #[must_use]
    pub fn pending(&self) -> bool {
        self.slot.is_armed()
    }
}
