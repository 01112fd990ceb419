//! Parallel hashing and verification.

#![forbid(unsafe_code)]

use std::io::Read;

use fips256_core::{Digest, Error, Result};
use fips256_hash::{hash, Sha256};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::stream::hash_reader;

/// Outcome of [`verify_all`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of inputs whose digest matched
    pub matched: usize,
    /// Indices (ascending) of inputs whose digest did not match
    pub mismatched: Vec<usize>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.mismatched.is_empty()
    }

    pub fn total(&self) -> usize {
        self.matched + self.mismatched.len()
    }
}

/// Hash every input on the rayon pool. Output order matches input order.
pub fn hash_all<T>(inputs: &[T]) -> Vec<Digest>
where
    T: AsRef<[u8]> + Sync,
{
    let total_bytes: usize = inputs.iter().map(|i| i.as_ref().len()).sum();
    debug!(inputs = inputs.len(), total_bytes, "hashing batch");

    inputs.par_iter().map(|input| hash(input)).collect()
}

/// Recompute each digest in parallel and compare against the expected one.
pub fn verify_all<T>(pairs: &[(T, Digest)]) -> VerifyReport
where
    T: AsRef<[u8]> + Sync,
{
    debug!(inputs = pairs.len(), "verifying batch");

    let mismatched: Vec<usize> = pairs
        .par_iter()
        .enumerate()
        .filter_map(|(idx, (data, expected))| (hash(data) != *expected).then_some(idx))
        .collect();

    if !mismatched.is_empty() {
        debug!(failed = mismatched.len(), "batch verification found mismatches");
    }

    VerifyReport {
        matched: pairs.len() - mismatched.len(),
        mismatched,
    }
}

/// Open and hash every source on the rayon pool, one hasher per source.
///
/// Results are in source order; a failure to open or read one source does
/// not affect the others.
pub fn hash_sources<S, R, F>(sources: &[S], buffer_size: usize, open: F) -> Vec<Result<Digest>>
where
    S: Sync,
    R: Read,
    F: Fn(&S) -> Result<R> + Sync + Send,
{
    debug!(sources = sources.len(), buffer_size, "hashing sources");

    sources
        .par_iter()
        .map(|source| open(source).and_then(|reader| hash_reader(reader, buffer_size)))
        .collect()
}

/// Stream `data` through one hasher in `chunk_size` pieces.
pub fn hash_chunked(data: &[u8], chunk_size: usize) -> Result<Digest> {
    if chunk_size == 0 {
        return Err(Error::InvalidChunkSize);
    }

    trace!(len = data.len(), chunk_size, "chunked hash");

    let mut hasher = Sha256::new();
    for chunk in data.chunks(chunk_size) {
        hasher.try_update(chunk)?;
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_all_preserves_order() {
        let inputs: Vec<Vec<u8>> = (0..100u32).map(|i| i.to_be_bytes().repeat(i as usize)).collect();
        let digests = hash_all(&inputs);

        assert_eq!(digests.len(), inputs.len());
        for (input, digest) in inputs.iter().zip(&digests) {
            assert_eq!(*digest, hash(input));
        }
    }

    #[test]
    fn test_hash_all_empty_batch() {
        let inputs: Vec<&[u8]> = Vec::new();
        assert!(hash_all(&inputs).is_empty());
    }

    #[test]
    fn test_hash_all_str_inputs() {
        let digests = hash_all(&["", "abc"]);
        assert_eq!(
            digests[0].to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            digests[1].to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_verify_all_reports_mismatches() {
        let mut pairs: Vec<(Vec<u8>, Digest)> = (0..20u8)
            .map(|i| {
                let data = vec![i; i as usize * 10];
                let digest = hash(&data);
                (data, digest)
            })
            .collect();
        pairs[3].1 = hash(b"tampered");
        pairs[17].0.push(0);

        let report = verify_all(&pairs);
        assert!(!report.is_ok());
        assert_eq!(report.mismatched, vec![3, 17]);
        assert_eq!(report.matched, 18);
        assert_eq!(report.total(), 20);
    }

    #[test]
    fn test_verify_all_ok() {
        let pairs = [("abc", hash("abc")), ("", hash(""))];
        let report = verify_all(&pairs);
        assert!(report.is_ok());
        assert_eq!(report.matched, 2);
    }

    #[test]
    fn test_hash_chunked_matches_one_shot() {
        let data: Vec<u8> = (0..5000u32).map(|i| (i * 31) as u8).collect();
        let expected = hash(&data);
        for chunk_size in [1usize, 3, 55, 56, 63, 64, 65, 4096, 10_000] {
            assert_eq!(
                hash_chunked(&data, chunk_size).unwrap(),
                expected,
                "chunk size {}",
                chunk_size
            );
        }
    }

    #[test]
    fn test_hash_sources_keeps_errors_in_place() {
        let sources: Vec<Option<&[u8]>> = vec![Some(&b"abc"[..]), None, Some(&b""[..])];
        let results = hash_sources(&sources, 16, |source| match source {
            Some(data) => Ok(*data),
            None => Err(Error::InvalidChunkSize),
        });

        assert_eq!(results.len(), 3);
        assert_eq!(*results[0].as_ref().unwrap(), hash(b"abc"));
        assert!(matches!(results[1], Err(Error::InvalidChunkSize)));
        assert_eq!(*results[2].as_ref().unwrap(), hash(b""));
    }

    #[test]
    fn test_hash_chunked_rejects_zero() {
        assert!(matches!(
            hash_chunked(b"abc", 0),
            Err(Error::InvalidChunkSize)
        ));
    }
}
