//! # Court Relay — Core
//!
//! Shared primitives for the relay: a clock abstraction, ID/fingerprint
//! generation, and the workspace's error enums. This crate has no framework
//! dependencies — it is the thing every other crate builds against.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{FrozenClock, RelayClock, SystemClock};
pub use error::{Error, Result};
