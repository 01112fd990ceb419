//! Feed a reader through a hasher with a fixed-size read buffer.

#![forbid(unsafe_code)]

use std::io::{self, Read};

use fips256_core::{Digest, Error, Result};
use fips256_hash::Sha256;

/// Hash everything `reader` yields, reading `buffer_size` bytes at a time.
pub fn hash_reader<R: Read>(mut reader: R, buffer_size: usize) -> Result<Digest> {
    if buffer_size == 0 {
        return Err(Error::InvalidChunkSize);
    }

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; buffer_size];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => hasher.try_update(&buf[..n])?,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(hasher.finalize())
}
