//! Core deterministic primitives.
//!
//! State hashing shared by the scoring engine and the replay verifier.

pub mod hash;

pub use hash::{compute_state_hash, hash_with_domain, StateHash};
