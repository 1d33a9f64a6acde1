//! Patchbay Graph - per-rack DAG routing, sample-accurate scheduling, and
//! transport pattern expansion.
//!
//! This crate sits directly on top of [`patchbay_core`]'s [`Node`] and
//! [`Command`] vocabulary:
//!
//! - [`Graph`] - topology construction and level-scheduled block processing
//! - [`Scheduler`] - splits a block at event sample offsets and drives the
//!   graph one segment at a time
//! - [`transport::expand`] - deterministic pattern/step/lock expansion into
//!   an absolute-time command stream
//!
//! # no_std Support
//!
//! Mirrors [`patchbay_core`]'s feature gate: disable the default `std`
//! feature for embedded targets.
//!
//! [`Node`]: patchbay_core::Node
//! [`Command`]: patchbay_core::Command

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod edge;
pub mod graph;
pub mod mixer;
pub mod scheduler;
pub mod transport;

pub use edge::Edge;
pub use graph::Graph;
pub use mixer::{Mixer, MixerChannel};
pub use scheduler::Scheduler;
pub use transport::{Pattern, PatternLock, TempoPoint, TransportSpec};
