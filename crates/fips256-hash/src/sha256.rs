//! Incremental SHA-256 hasher (FIPS 180-4).
//!
//! Input may arrive in chunks of any size; the digest is identical to hashing
//! the concatenation in one call. A hasher yields exactly one digest per
//! epoch: `finalize` consumes it, `finalize_reset` starts a new epoch.

#![forbid(unsafe_code)]

use std::io;

use fips256_core::{Digest, Error, Result, DIGEST_SIZE};

use crate::compress::compress;
use crate::consts::{BLOCK_SIZE, IV, LENGTH_OFFSET};

/// Running SHA-256 computation.
#[derive(Clone, Debug)]
pub struct Sha256 {
    state: [u32; 8],
    buffer: [u8; BLOCK_SIZE],
    /// Bytes pending in `buffer`, always < BLOCK_SIZE between calls.
    buffer_len: usize,
    /// Bits of all blocks already compressed.
    bit_len: u64,
}

impl Default for Sha256 {
    fn default() -> Self {
        Self {
            state: IV,
            buffer: [0u8; BLOCK_SIZE],
            buffer_len: 0,
            bit_len: 0,
        }
    }
}

impl Sha256 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the initial state, discarding any pending input.
    pub fn reset(&mut self) {
        self.state = IV;
        self.buffer_len = 0;
        self.bit_len = 0;
    }

    /// Feed more input.
    ///
    /// # Panics
    ///
    /// Panics if the total message length would exceed 2^64 - 1 bits.
    /// Use [`Sha256::try_update`] to get an error instead.
    pub fn update(&mut self, data: impl AsRef<[u8]>) {
        if let Err(e) = self.try_update(data) {
            panic!("{}", e);
        }
    }

    /// Feed more input, failing with [`Error::MessageTooLong`] instead of
    /// overflowing the length counter. On error the hasher is unchanged.
    pub fn try_update(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        let mut data = data.as_ref();

        (self.buffer_len as u64)
            .checked_add(data.len() as u64)
            .and_then(|bytes| bytes.checked_mul(8))
            .and_then(|bits| bits.checked_add(self.bit_len))
            .ok_or(Error::MessageTooLong)?;

        // Top up a partially filled buffer first
        if self.buffer_len > 0 {
            let take = (BLOCK_SIZE - self.buffer_len).min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&data[..take]);
            self.buffer_len += take;
            data = &data[take..];

            if self.buffer_len < BLOCK_SIZE {
                return Ok(());
            }
            compress(&mut self.state, &self.buffer);
            self.bit_len += 512;
            self.buffer_len = 0;
        }

        let mut blocks = data.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            self.buffer.copy_from_slice(block);
            compress(&mut self.state, &self.buffer);
            self.bit_len += 512;
        }

        let rest = blocks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffer_len = rest.len();

        Ok(())
    }

    /// Finish the computation and return the digest.
    pub fn finalize(mut self) -> Digest {
        self.pad_and_finish()
    }

    /// Finish the computation, writing the digest into `out`.
    pub fn finalize_into(mut self, out: &mut [u8; DIGEST_SIZE]) {
        *out = self.pad_and_finish().into_bytes();
    }

    /// Finish the computation and reset, so the hasher can take a new message.
    pub fn finalize_reset(&mut self) -> Digest {
        let digest = self.pad_and_finish();
        self.reset();
        digest
    }

    /// Pad per FIPS 180-4 Section 5.1.1, run the final one or two
    /// compressions and serialize the state big-endian.
    ///
    /// Leaves the hasher consumed; callers either drop it or reset it.
    fn pad_and_finish(&mut self) -> Digest {
        let pending = self.buffer_len;
        let mut pos = pending;

        // Append bit '1' (0x80 byte)
        self.buffer[pos] = 0x80;
        pos += 1;

        if pos > LENGTH_OFFSET {
            // No room for the length: spill into an extra block
            self.buffer[pos..].fill(0);
            compress(&mut self.state, &self.buffer);
            self.buffer[..LENGTH_OFFSET].fill(0);
        } else {
            self.buffer[pos..LENGTH_OFFSET].fill(0);
        }

        // Cannot overflow: try_update bounds bit_len + 8 * buffer_len
        let total_bits = self.bit_len + (pending as u64) * 8;
        self.buffer[LENGTH_OFFSET..].copy_from_slice(&total_bits.to_be_bytes());
        compress(&mut self.state, &self.buffer);

        let mut out = [0u8; DIGEST_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        Digest::from_bytes(out)
    }
}

impl io::Write for Sha256 {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.try_update(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Compute the SHA-256 digest of `data` in one shot.
pub fn hash(data: impl AsRef<[u8]>) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize()
}

/// Compute the SHA-256 digest of `data` as 64 lowercase hex characters.
pub fn hash_to_hex(data: impl AsRef<[u8]>) -> String {
    hash(data).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::io::Write;

    fn reference(data: &[u8]) -> [u8; 32] {
        use sha2::Digest as _;
        sha2::Sha256::digest(data).into()
    }

    #[test]
    fn test_empty() {
        assert_eq!(
            hash_to_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_abc() {
        assert_eq!(
            hash_to_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_448_bits() {
        // 56 bytes: the 0x80 marker forces the spillover block
        let result = hash_to_hex(b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq");
        assert_eq!(
            result,
            "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
        );
    }

    #[test]
    fn test_string_and_vec_inputs_agree() {
        let text = String::from("The quick brown fox jumps over the lazy dog");
        let bytes = text.clone().into_bytes();
        assert_eq!(hash(&text), hash(&bytes));
        assert_eq!(
            hash_to_hex(text),
            "d7a8fbb307d7809469ca9abcb0082e4f8d5651e46d3cdb762d02d0bf37c9e592"
        );
    }

    #[test]
    fn test_padding_boundaries_against_sha2() {
        for len in [0usize, 1, 54, 55, 56, 57, 62, 63, 64, 65, 119, 120, 127, 128, 129] {
            let data: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            assert_eq!(
                hash(&data).into_bytes(),
                reference(&data),
                "mismatch for input len {}",
                len
            );
        }
    }

    #[test]
    fn test_spillover_path_taken_at_56() {
        // 55 pending bytes fit marker + length in one block; 56 do not.
        let mut fits = Sha256::new();
        fits.update([0u8; 55]);
        assert_eq!(fits.buffer_len, 55);

        let mut spills = Sha256::new();
        spills.update([0u8; 56]);
        assert_eq!(spills.buffer_len, 56);

        assert_eq!(fits.finalize().into_bytes(), reference(&[0u8; 55]));
        assert_eq!(spills.finalize().into_bytes(), reference(&[0u8; 56]));
    }

    #[test]
    fn test_buffer_never_holds_full_block() {
        let mut hasher = Sha256::new();
        hasher.update([1u8; 64]);
        assert_eq!(hasher.buffer_len, 0);
        assert_eq!(hasher.bit_len, 512);

        hasher.update([1u8; 63]);
        assert_eq!(hasher.buffer_len, 63);
        hasher.update([1u8; 1]);
        assert_eq!(hasher.buffer_len, 0);
        assert_eq!(hasher.bit_len, 1024);
    }

    #[test]
    fn test_streaming_equivalence_random_splits() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let len = rng.gen_range(0..1000);
            let mut data = vec![0u8; len];
            rng.fill(&mut data[..]);

            let mut hasher = Sha256::new();
            let mut rest = &data[..];
            while !rest.is_empty() {
                let take = rng.gen_range(0..=rest.len().min(150));
                hasher.update(&rest[..take]);
                rest = &rest[take..];
            }

            assert_eq!(hasher.finalize(), hash(&data), "len {}", len);
        }
    }

    #[test]
    fn test_multi_megabyte_single_vs_bytewise() {
        let data: Vec<u8> = (0..(2 * 1024 * 1024u32)).map(|i| (i % 251) as u8).collect();

        let single = hash(&data);

        let mut bytewise = Sha256::new();
        for byte in &data {
            bytewise.update([*byte]);
        }

        assert_eq!(bytewise.finalize(), single);
        assert_eq!(single.into_bytes(), reference(&data));
    }

    #[test]
    fn test_empty_updates_are_noops() {
        let mut hasher = Sha256::new();
        hasher.update(b"");
        hasher.update("ab");
        hasher.update(Vec::<u8>::new());
        hasher.update("c");
        assert_eq!(hasher.finalize(), hash("abc"));
    }

    #[test]
    fn test_deterministic() {
        let data = b"hello world";
        assert_eq!(hash(data), hash(data));
        assert_eq!(hash_to_hex(data).len(), 64);
    }

    #[test]
    fn test_hex_is_lowercase() {
        let hex = hash_to_hex(b"abc");
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_finalize_into() {
        let mut hasher = Sha256::new();
        hasher.update(b"abc");
        let mut out = [0u8; DIGEST_SIZE];
        hasher.finalize_into(&mut out);
        assert_eq!(out, reference(b"abc"));
    }

    #[test]
    fn test_finalize_reset_allows_reuse() {
        let mut hasher = Sha256::new();
        hasher.update(b"first message");
        let first = hasher.finalize_reset();

        hasher.update(b"abc");
        let second = hasher.finalize_reset();

        assert_eq!(first, hash(b"first message"));
        assert_eq!(second, hash(b"abc"));
        assert_eq!(hasher.finalize(), hash(b""));
    }

    #[test]
    fn test_reset_discards_pending_input() {
        let mut hasher = Sha256::new();
        hasher.update([9u8; 100]);
        hasher.reset();
        hasher.update(b"abc");
        assert_eq!(hasher.finalize(), hash(b"abc"));
    }

    #[test]
    fn test_clone_forks_state() {
        let mut prefix = Sha256::new();
        prefix.update(b"common prefix ");

        let mut a = prefix.clone();
        let mut b = prefix;
        a.update(b"one");
        b.update(b"two");

        assert_eq!(a.finalize(), hash(b"common prefix one"));
        assert_eq!(b.finalize(), hash(b"common prefix two"));
    }

    #[test]
    fn test_io_write() {
        let data = vec![0x42u8; 10_000];
        let mut hasher = Sha256::new();
        std::io::copy(&mut &data[..], &mut hasher).unwrap();
        hasher.flush().unwrap();
        assert_eq!(hasher.finalize(), hash(&data));
    }

    #[test]
    fn test_try_update_rejects_length_overflow() {
        let mut hasher = Sha256::new();
        hasher.bit_len = u64::MAX - 511;
        let before = hasher.clone();

        let result = hasher.try_update([0u8; 64]);
        assert!(matches!(result, Err(Error::MessageTooLong)));
        assert_eq!(hasher.state, before.state);
        assert_eq!(hasher.buffer_len, before.buffer_len);
        assert_eq!(hasher.bit_len, before.bit_len);

        // Exactly filling the remaining length is still fine
        assert!(hasher.try_update([0u8; 63]).is_ok());
    }

    #[test]
    fn test_io_write_rejects_length_overflow() {
        let mut hasher = Sha256::new();
        hasher.bit_len = u64::MAX - 511;

        let err = hasher.write(&[0u8; 64]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("message too long"));
        assert_eq!(hasher.bit_len, u64::MAX - 511);
        assert_eq!(hasher.buffer_len, 0);
    }

    #[test]
    #[should_panic(expected = "message too long")]
    fn test_update_panics_on_length_overflow() {
        let mut hasher = Sha256::new();
        hasher.bit_len = u64::MAX - 7;
        hasher.update([0u8; 2]);
    }
}
