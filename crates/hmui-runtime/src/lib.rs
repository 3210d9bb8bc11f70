#![forbid(unsafe_code)]

//! Cooperative single-threaded runtime for the hmui control surface.
//!
//! Everything here is host-agnostic interaction machinery:
//!
//! - [`program`] — the `Model`/`Cmd` contract and a deterministic driving
//!   loop. Remote calls become queued task closures; their results re-enter
//!   `update` as messages when the loop pumps them.
//! - [`frame`] — the single-slot coalescing cell behind frame-rate-bounded
//!   work, and the idle-settled deferred value built on it.
//! - [`swipe`] — the gesture navigation state machine with rubber-band
//!   dampening.
//! - [`toast`] — the single-slot, token-guarded transient message display.
//! - [`paging`] — the monotonic pagination window.
//! - [`prefs`] — durable key-value preference storage (memory and atomic
//!   JSON file backends).
//! - [`locale`] — key→text tables with an explicit fallback language.

pub mod frame;
pub mod locale;
pub mod paging;
pub mod prefs;
pub mod program;
pub mod swipe;
pub mod toast;

pub use frame::{Deferred, FrameSlot};
pub use locale::{Catalog, FALLBACK_LANG};
pub use paging::PageWindow;
pub use prefs::{FilePrefs, MemoryPrefs, Prefs, PrefsBackend, PrefsError};
pub use program::{Cmd, Model, Runtime};
pub use swipe::{Motion, MoveAction, SwipeNav, SwipeOutcome};
pub use toast::{TOAST_DURATION, ToastId, ToastKind, ToastMessage, ToastSlot};
