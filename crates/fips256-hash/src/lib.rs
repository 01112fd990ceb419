//! SHA-256 (FIPS 180-4) implemented from scratch.
//!
//! The `sha2` crate is a dev-dependency only, used to cross-check output.

#![forbid(unsafe_code)]

pub mod compress;
pub mod consts;
pub mod sha256;

pub use consts::BLOCK_SIZE;
pub use fips256_core::{Digest, Error, Result, DIGEST_SIZE};
pub use sha256::{hash, hash_to_hex, Sha256};
