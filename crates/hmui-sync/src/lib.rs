#![forbid(unsafe_code)]

//! Reconciling stores, baseline dirty tracking, and optimistic-mutation
//! bookkeeping.
//!
//! The synchronization layer is built on an `Arc`-shared structural tree
//! ([`value::Value`]): [`reconcile::reconcile`] merges a freshly fetched
//! value into the committed one while keeping every unchanged subtree as the
//! same `Arc`, so watchers keyed to a subtree only fire when that subtree
//! actually changed. [`store::Store`] owns one such value (typed and
//! structural views kept in lockstep), [`baseline`] captures load-time
//! snapshots and derives dirtiness from them, and [`mutation`] holds the
//! rollback and batch-write rules for optimistic writes.
//!
//! Everything here is single-threaded and domain-free; the application crate
//! wires stores to concrete types and to the runtime's task queue.

pub mod baseline;
pub mod mutation;
pub mod reconcile;
pub mod store;
pub mod value;

pub use baseline::{Baseline, KeyedBaseline};
pub use reconcile::reconcile;
pub use store::{Store, SyncError, WatchGuard};
pub use value::Value;
