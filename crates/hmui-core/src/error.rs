#![forbid(unsafe_code)]

//! Failure taxonomy for the control surface.
//!
//! Four kinds, none fatal:
//!
//! | Variant | Cause | Engine behavior |
//! |---------|-------|-----------------|
//! | `Load` | a store's fetch failed | prior value retained, loading flag cleared |
//! | `Save` | a persist call failed | compare-before-rollback or batch abort |
//! | `Validation` | locally detected invalid input | save never issued |
//! | `Policy` | mutation rejected by a standing invariant | remote call never issued |

use std::fmt;

use crate::service::ServiceError;

/// A failure surfaced to the user via the toast queue.
#[derive(Debug, Clone)]
pub enum ControlError {
    /// A store's fetch failed; the store keeps its prior value.
    Load(ServiceError),
    /// A mutation's persist call failed.
    Save(ServiceError),
    /// Invalid input caught before any remote round-trip.
    Validation(String),
    /// Mutation rejected locally by a standing invariant.
    Policy(String),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Load(e) => write!(f, "load failed: {e}"),
            ControlError::Save(e) => write!(f, "save failed: {e}"),
            ControlError::Validation(msg) => write!(f, "invalid input: {msg}"),
            ControlError::Policy(msg) => write!(f, "not permitted: {msg}"),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::Load(e) | ControlError::Save(e) => Some(e),
            ControlError::Validation(_) | ControlError::Policy(_) => None,
        }
    }
}
