#![forbid(unsafe_code)]

//! Swipe navigation between a fixed set of panels.
//!
//! State machine: Idle → Dragging → (commit | cancel) → Idle. Pointer moves
//! are classified per event — a vertically dominant move is ignored so page
//! scrolling coexists with horizontal swiping — and horizontal moves are
//! coalesced through a single-slot frame cell: at most one offset
//! recomputation per frame, with later moves overwriting the pending one.
//!
//! Two properties are load-bearing here:
//!
//! 1. Rubber-band dampening: dragging past the first or last panel divides
//!    the offset by three, so the edge resists instead of sliding.
//! 2. Dual-mode motion: the track follows the pointer 1:1 while dragging
//!    ([`Motion::Tracking`]) and eases only on release
//!    ([`Motion::Settling`]). Easing during the drag would break direct
//!    manipulation.

use crate::frame::FrameSlot;

/// Width assumed when the container cannot report one.
pub const FALLBACK_WIDTH: f64 = 80.0;
/// Fraction of the container width a drag must cover to commit.
pub const COMMIT_RATIO: f64 = 0.33;
/// Minimum commit distance in pixels.
pub const MIN_COMMIT_DISTANCE: f64 = 80.0;
/// Divisor applied to drags past the edge of the panel set.
pub const EDGE_DAMPING: f64 = 3.0;

/// Disposition of one pointer-move event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    /// Vertically dominant or no active drag: leave default scrolling alone.
    Ignored,
    /// First pending move: suppress default scroll and schedule one frame.
    Scheduled,
    /// Overwrote an already-pending move: suppress scroll, no new frame.
    Coalesced,
}

/// Outcome of releasing a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Navigation moved to the panel at this index.
    Committed(usize),
    /// Offset crossed no threshold; the active panel is unchanged.
    Cancelled,
}

/// How the visual track should move right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    /// Mid-drag: position follows the pointer directly, no easing.
    Tracking,
    /// Settled or settling: animate with easing.
    Settling,
}

#[derive(Debug, Clone, Copy)]
struct GestureSession {
    start_x: f64,
    start_y: f64,
}

/// Gesture-driven navigation controller for an ordered, non-empty panel set.
#[derive(Debug)]
pub struct SwipeNav {
    panel_count: usize,
    active: usize,
    offset: f64,
    session: Option<GestureSession>,
    pending: FrameSlot<f64>,
}

impl SwipeNav {
    /// Create a controller over `panel_count` panels (clamped to at least
    /// one), starting at the first.
    #[must_use]
    pub fn new(panel_count: usize) -> Self {
        Self {
            panel_count: panel_count.max(1),
            active: 0,
            offset: 0.0,
            session: None,
            pending: FrameSlot::new(),
        }
    }

    #[must_use]
    pub fn panel_count(&self) -> usize {
        self.panel_count
    }

    #[must_use]
    pub fn active(&self) -> usize {
        self.active
    }

    /// Current drag offset in pixels (post-dampening).
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[must_use]
    pub fn dragging(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn motion(&self) -> Motion {
        if self.session.is_some() {
            Motion::Tracking
        } else {
            Motion::Settling
        }
    }

    /// Track translation as a percentage of the full track width.
    #[must_use]
    pub fn translate_percent(&self) -> f64 {
        -(self.active as f64) * (100.0 / self.panel_count as f64)
    }

    /// Jump directly to a panel (nav-bar tap). Cancels any drag.
    pub fn set_active(&mut self, index: usize) {
        self.active = index.min(self.panel_count - 1);
        self.session = None;
        self.offset = 0.0;
        self.pending.clear();
    }

    /// Begin a gesture session at the given pointer position.
    ///
    /// Restarts any session already in progress and cancels its pending
    /// frame.
    pub fn on_start(&mut self, x: f64, y: f64) {
        self.session = Some(GestureSession {
            start_x: x,
            start_y: y,
        });
        self.offset = 0.0;
        self.pending.clear();
    }

    /// Feed a pointer move. See [`MoveAction`] for what the caller owes in
    /// return.
    pub fn on_move(&mut self, x: f64, y: f64) -> MoveAction {
        let Some(session) = self.session else {
            return MoveAction::Ignored;
        };
        let diff_x = x - session.start_x;
        let diff_y = y - session.start_y;
        if diff_y.abs() > diff_x.abs() {
            return MoveAction::Ignored;
        }
        if self.pending.put(diff_x) {
            MoveAction::Scheduled
        } else {
            MoveAction::Coalesced
        }
    }

    /// Drain the pending move and recompute the offset. Call once per
    /// scheduled frame. Returns whether the offset changed.
    pub fn on_frame(&mut self) -> bool {
        if self.session.is_none() {
            self.pending.clear();
            return false;
        }
        let Some(mut diff_x) = self.pending.take() else {
            return false;
        };
        let at_first = self.active == 0 && diff_x > 0.0;
        let at_last = self.active == self.panel_count - 1 && diff_x < 0.0;
        if at_first || at_last {
            diff_x /= EDGE_DAMPING;
        }
        self.offset = diff_x;
        true
    }

    /// Release the drag and decide commit or cancel.
    ///
    /// `container_width` falls back to [`FALLBACK_WIDTH`] when unknown or
    /// zero. Either outcome returns to Idle with a zero offset and no
    /// pending frame.
    pub fn on_end(&mut self, container_width: Option<f64>) -> SwipeOutcome {
        if self.session.take().is_none() {
            return SwipeOutcome::Cancelled;
        }
        self.pending.clear();
        let width = container_width
            .filter(|w| *w > 0.0)
            .unwrap_or(FALLBACK_WIDTH);
        let threshold = (width * COMMIT_RATIO).max(MIN_COMMIT_DISTANCE);
        let offset = self.offset;
        self.offset = 0.0;

        if offset < -threshold && self.active + 1 < self.panel_count {
            self.active += 1;
            SwipeOutcome::Committed(self.active)
        } else if offset > threshold && self.active > 0 {
            self.active -= 1;
            SwipeOutcome::Committed(self.active)
        } else {
            SwipeOutcome::Cancelled
        }
    }

    /// Abort the gesture (pointer left, system interruption): the cancel
    /// branch of [`SwipeNav::on_end`], unconditionally.
    pub fn on_cancel(&mut self) {
        self.session = None;
        self.pending.clear();
        self.offset = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a horizontal drag to `diff_x` and apply the frame.
    fn drag(nav: &mut SwipeNav, diff_x: f64) {
        nav.on_start(100.0, 100.0);
        assert_eq!(nav.on_move(100.0 + diff_x, 100.0), MoveAction::Scheduled);
        assert!(nav.on_frame());
    }

    #[test]
    fn release_past_threshold_commits_to_next() {
        let mut nav = SwipeNav::new(3);
        nav.set_active(1);
        drag(&mut nav, -150.0);
        // width 300 -> threshold 99
        assert_eq!(nav.on_end(Some(300.0)), SwipeOutcome::Committed(2));
        assert_eq!(nav.active(), 2);
        assert_eq!(nav.offset(), 0.0);
    }

    #[test]
    fn release_inside_threshold_cancels() {
        let mut nav = SwipeNav::new(3);
        nav.set_active(1);
        drag(&mut nav, -50.0);
        assert_eq!(nav.on_end(Some(300.0)), SwipeOutcome::Cancelled);
        assert_eq!(nav.active(), 1);
    }

    #[test]
    fn positive_drag_commits_to_previous() {
        let mut nav = SwipeNav::new(3);
        nav.set_active(1);
        drag(&mut nav, 150.0);
        assert_eq!(nav.on_end(Some(300.0)), SwipeOutcome::Committed(0));
    }

    #[test]
    fn edge_drag_is_dampened_and_never_commits_past_the_end() {
        let mut nav = SwipeNav::new(3);
        nav.set_active(2);
        // Past the last panel: a 150px pull reads as 50px.
        drag(&mut nav, -150.0);
        assert_eq!(nav.offset(), -50.0);
        assert_eq!(nav.on_end(Some(300.0)), SwipeOutcome::Cancelled);
        assert_eq!(nav.active(), 2);

        // Even a huge pull cannot commit forward from the last panel.
        drag(&mut nav, -900.0);
        assert_eq!(nav.on_end(Some(300.0)), SwipeOutcome::Cancelled);
        assert_eq!(nav.active(), 2);
    }

    #[test]
    fn first_panel_dampens_positive_drags_only() {
        let mut nav = SwipeNav::new(3);
        drag(&mut nav, 90.0);
        assert_eq!(nav.offset(), 30.0);
        nav.on_cancel();
        drag(&mut nav, -90.0);
        assert_eq!(nav.offset(), -90.0);
        nav.on_cancel();
    }

    #[test]
    fn vertical_moves_are_ignored() {
        let mut nav = SwipeNav::new(2);
        nav.on_start(100.0, 100.0);
        assert_eq!(nav.on_move(110.0, 180.0), MoveAction::Ignored);
        assert!(!nav.on_frame());
        assert_eq!(nav.offset(), 0.0);
    }

    #[test]
    fn moves_coalesce_to_the_latest_within_a_frame() {
        let mut nav = SwipeNav::new(2);
        nav.on_start(100.0, 100.0);
        assert_eq!(nav.on_move(60.0, 100.0), MoveAction::Scheduled);
        assert_eq!(nav.on_move(20.0, 100.0), MoveAction::Coalesced);
        assert!(nav.on_frame());
        assert_eq!(nav.offset(), -80.0);
        // One frame per arming: nothing left to apply.
        assert!(!nav.on_frame());
    }

    #[test]
    fn missing_width_falls_back_to_constant() {
        let mut nav = SwipeNav::new(2);
        drag(&mut nav, -81.0);
        // threshold = max(80 * 0.33, 80) = 80
        assert_eq!(nav.on_end(None), SwipeOutcome::Committed(1));
    }

    #[test]
    fn cancel_resets_without_changing_index() {
        let mut nav = SwipeNav::new(3);
        nav.set_active(1);
        drag(&mut nav, -200.0);
        nav.on_cancel();
        assert_eq!(nav.active(), 1);
        assert_eq!(nav.offset(), 0.0);
        assert!(!nav.dragging());
    }

    #[test]
    fn motion_tracks_while_dragging_and_settles_after() {
        let mut nav = SwipeNav::new(2);
        assert_eq!(nav.motion(), Motion::Settling);
        nav.on_start(0.0, 0.0);
        assert_eq!(nav.motion(), Motion::Tracking);
        nav.on_end(Some(300.0));
        assert_eq!(nav.motion(), Motion::Settling);
    }

    #[test]
    fn restart_cancels_stale_pending_frame() {
        let mut nav = SwipeNav::new(2);
        nav.on_start(100.0, 100.0);
        nav.on_move(40.0, 100.0);
        // New session begins before the frame fires.
        nav.on_start(200.0, 100.0);
        assert!(!nav.on_frame());
        assert_eq!(nav.offset(), 0.0);
    }

    #[test]
    fn translate_percent_reflects_active_index() {
        let mut nav = SwipeNav::new(4);
        assert_eq!(nav.translate_percent(), 0.0);
        nav.set_active(2);
        assert_eq!(nav.translate_percent(), -50.0);
    }
}
