//! Versioned JSON document stores.
//!
//! `VersionedStore<T>` is the shared machinery (load, get, update, atomic
//! persist) parametrised over a payload type. `scout` and `matchday` each
//! wrap it with their concrete payload and any store-specific operations
//! (scout's `archive`, matchday's `parse_external`).

mod matchday;
mod scout;
mod versioned;

pub use matchday::{extract_from_html, MatchdayPayload, MatchdayStore};
pub use scout::{Player, ScoutPayload, ScoutStore};
pub use versioned::{StoreError, VersionedDocument, VersionedStore};
