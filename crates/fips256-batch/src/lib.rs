//! Multi-threaded SHA-256 over independent inputs.
//!
//! A single message is strictly sequential; parallelism comes from giving
//! each input its own hasher.

#![forbid(unsafe_code)]

pub mod parallel;
pub mod stream;

pub use parallel::{hash_all, hash_chunked, hash_sources, verify_all, VerifyReport};
pub use stream::hash_reader;
