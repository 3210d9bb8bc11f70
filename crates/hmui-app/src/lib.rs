#![forbid(unsafe_code)]

//! The hmui control surface: panels, message routing, and wiring.
//!
//! This crate assembles the engine crates into the application proper: a
//! swipeable panel set (status / config / modules / info) over reconciling
//! stores, with optimistic config toggles, per-module rule editing, deferred
//! search, and toast feedback. [`service::DemoService`] provides an
//! in-memory backend for the demo binary and the integration tests.

pub mod app;
pub mod cli;
pub mod panels;
pub mod service;

pub use app::{AppModel, Msg};
pub use panels::PanelId;
