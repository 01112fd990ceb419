//! Core types shared by the fips256 crates.

#![forbid(unsafe_code)]

mod digest;
mod error;

pub use digest::{Digest, DIGEST_SIZE};
pub use error::Error;

pub type Result<T> = std::result::Result<T, Error>;
