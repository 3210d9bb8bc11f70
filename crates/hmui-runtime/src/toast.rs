#![forbid(unsafe_code)]

//! Single-slot transient message display.
//!
//! At most one toast is current at any instant. Showing a new one replaces
//! the current message outright — superseded messages are discarded, never
//! queued. Expiry is token-guarded: each show mints a fresh [`ToastId`],
//! and a dismiss only clears visibility when its captured id still matches
//! the displayed message. That check is what stops an earlier toast's
//! expiring timer from hiding a later toast that reused the slot.

use std::time::Duration;

/// How long a toast stays visible unless superseded.
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Unique identifier for one shown toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToastId(pub u64);

/// Message category, used for styling and logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Error,
}

/// The currently displayed (or just-hidden) message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToastMessage {
    pub id: ToastId,
    pub text: String,
    pub kind: ToastKind,
    pub visible: bool,
}

/// The single display slot.
#[derive(Debug, Default)]
pub struct ToastSlot {
    current: Option<ToastMessage>,
    next_id: u64,
}

impl ToastSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the displayed message and mint the id an expiry must present.
    pub fn show(&mut self, text: impl Into<String>, kind: ToastKind) -> ToastId {
        let id = ToastId(self.next_id);
        self.next_id += 1;
        self.current = Some(ToastMessage {
            id,
            text: text.into(),
            kind,
            visible: true,
        });
        id
    }

    /// Hide the toast `id` refers to — a no-op unless that exact message is
    /// still the one displayed. Returns whether visibility changed.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        match &mut self.current {
            Some(msg) if msg.id == id && msg.visible => {
                msg.visible = false;
                true
            }
            _ => false,
        }
    }

    /// The displayed message, if any (visible or not).
    #[must_use]
    pub fn current(&self) -> Option<&ToastMessage> {
        self.current.as_ref()
    }

    /// The displayed message, only while visible.
    #[must_use]
    pub fn visible(&self) -> Option<&ToastMessage> {
        self.current.as_ref().filter(|m| m.visible)
    }
}
