//! PBKDF2-HMAC-SHA256 specialized to a single iteration.
//!
//! Both derivations in the hash envelope run PBKDF2 with `c = 1`, so the
//! whole function collapses to `HMAC(password, salt || INT(i))` per output
//! block. The password digests are precomputed once and the salt is absorbed
//! once, leaving two compressions per 32 output bytes.

use sha2::{digest::crypto_common, Digest, Sha256};

const IV: [u32; 8] = [
    0x6a09e667, 0xbb67ae85, 0x3c6ef372, 0xa54ff53a, 0x510e527f, 0x9b05688c, 0x1f83d9ab, 0x5be0cd19,
];

const OPAD: u8 = 0x5c;
const IPAD: u8 = 0x36;

/// SHA-256 running state with byte-granular buffering, used to absorb salts
/// of arbitrary length ahead of the per-block counter finalization.
#[derive(Clone)]
struct Sha256Stream {
    words: [u32; 8],
    buf: crypto_common::Block<Sha256>,
    len: usize,
    blocks: u64,
}

impl Sha256Stream {
    fn update(&mut self, mut data: &[u8]) {
        if self.len > 0 {
            let take = (64 - self.len).min(data.len());
            self.buf[self.len..self.len + take].copy_from_slice(&data[..take]);
            self.len += take;
            data = &data[take..];

            if self.len < 64 {
                return;
            }
            let block = self.buf.clone();
            sha2::compress256(&mut self.words, core::slice::from_ref(&block));
            self.blocks += 1;
            self.len = 0;
        }

        let mut chunks = data.chunks_exact(64);
        for chunk in &mut chunks {
            sha2::compress256(
                &mut self.words,
                core::slice::from_ref(crypto_common::Block::<Sha256>::from_slice(chunk)),
            );
            self.blocks += 1;
        }

        let rem = chunks.remainder();
        self.buf[..rem.len()].copy_from_slice(rem);
        self.len = rem.len();
    }

    /// Hash of everything absorbed so far followed by a big-endian counter,
    /// without disturbing the stream.
    fn finalize_with_counter(&self, counter: u32) -> [u32; 8] {
        let mut words = self.words;
        let mut tail = [0u8; 128];

        tail[..self.len].copy_from_slice(&self.buf[..self.len]);
        tail[self.len..self.len + 4].copy_from_slice(&counter.to_be_bytes());
        tail[self.len + 4] = 0x80;

        let bit_len = (self.blocks * 64 + self.len as u64 + 4) * 8;
        let end = if self.len + 4 + 1 + 8 > 64 { 128 } else { 64 };
        tail[end - 8..end].copy_from_slice(&bit_len.to_be_bytes());

        for chunk in tail[..end].chunks_exact(64) {
            sha2::compress256(
                &mut words,
                core::slice::from_ref(crypto_common::Block::<Sha256>::from_slice(chunk)),
            );
        }
        words
    }
}

/// A cheaply copyable HMAC-SHA256 state for one-iteration PBKDF2-HMAC-SHA256.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2HmacSha256State {
    /// The value of H(K ^ IPAD)
    inner_digest_words: [u32; 8],
    /// The value of H(K ^ OPAD)
    outer_digest_words: [u32; 8],
}

impl Pbkdf2HmacSha256State {
    /// Create a new PBKDF2-HMAC-SHA256 state from a password.
    pub fn new(password: &[u8]) -> Self {
        let mut key_pad = crypto_common::Block::<Sha256>::default();
        if password.len() <= key_pad.len() {
            key_pad[..password.len()].copy_from_slice(password);
        } else {
            let key_hash = Sha256::digest(password);
            key_pad[..key_hash.len()].copy_from_slice(&key_hash);
        }

        let mut inner_words = IV;
        let mut outer_words = IV;
        key_pad.iter_mut().for_each(|b| *b ^= IPAD);
        sha2::compress256(&mut inner_words, core::slice::from_ref(&key_pad));
        key_pad.iter_mut().for_each(|b| *b ^= IPAD ^ OPAD);
        sha2::compress256(&mut outer_words, core::slice::from_ref(&key_pad));

        Self {
            inner_digest_words: inner_words,
            outer_digest_words: outer_words,
        }
    }

    /// Fill `output` with the one-iteration PBKDF2-HMAC-SHA256 stream for the
    /// given salt.
    pub fn emit(&self, salt: &[u8], output: &mut [u8]) {
        let mut inner = Sha256Stream {
            words: self.inner_digest_words,
            buf: Default::default(),
            len: 0,
            blocks: 1,
        };
        inner.update(salt);

        for (i, chunk) in output.chunks_mut(32).enumerate() {
            let inner_hash = inner.finalize_with_counter(i as u32 + 1);

            let mut outer_block = crypto_common::Block::<Sha256>::default();
            for (k, word) in inner_hash.iter().enumerate() {
                outer_block[k * 4..(k + 1) * 4].copy_from_slice(&word.to_be_bytes());
            }
            outer_block[32] = 0x80;
            // (64 + 32) bytes = 768 bits, big-endian
            outer_block[62] = 0x03;

            let mut outer_hash = self.outer_digest_words;
            sha2::compress256(&mut outer_hash, core::slice::from_ref(&outer_block));

            for (k, byte) in chunk.iter_mut().enumerate() {
                *byte = outer_hash[k / 4].to_be_bytes()[k % 4];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // make sure salt of any length is handled correctly
    const SALT: [u8; 176] = *b"SodiumChlorideabcdefghijklmnopqrstuvwxyz01234567890abcdefghijklmnopqrstuvwxyz01234567890\
SodiumChlorideabcdefghijklmnopqrstuvwxyz01234567890abcdefghijklmnopqrstuvwxyz01234567890";

    #[test]
    fn matches_pbkdf2_reference_over_salt_lengths() {
        let state = Pbkdf2HmacSha256State::new(b"LetMeIn1234");
        let mut output = [0u8; 64];
        let mut expected = [0u8; 64];

        for salt_len in 0..SALT.len() {
            let salt = &SALT[..salt_len];
            state.emit(salt, &mut output);
            pbkdf2::pbkdf2_hmac::<Sha256>(b"LetMeIn1234", salt, 1, &mut expected);
            assert_eq!(output, expected, "salt_len: {salt_len}");
        }
    }

    #[test]
    fn matches_pbkdf2_reference_for_wide_output() {
        let state = Pbkdf2HmacSha256State::new(b"proof-of-work");
        let mut output = vec![0u8; 128 * 8];
        let mut expected = vec![0u8; 128 * 8];

        state.emit(b"personality", &mut output);
        pbkdf2::pbkdf2_hmac::<Sha256>(b"proof-of-work", b"personality", 1, &mut expected);
        assert_eq!(output, expected);
    }

    #[test]
    fn long_passwords_are_prehashed() {
        let password = [0xabu8; 96];
        let state = Pbkdf2HmacSha256State::new(&password);
        let mut output = [0u8; 32];
        let mut expected = [0u8; 32];

        state.emit(b"salt", &mut output);
        pbkdf2::pbkdf2_hmac::<Sha256>(&password, b"salt", 1, &mut expected);
        assert_eq!(output, expected);
    }

    #[test]
    fn empty_salt_and_output_tail() {
        let state = Pbkdf2HmacSha256State::new(b"");
        let mut output = [0u8; 48];
        let mut expected = [0u8; 48];

        state.emit(b"", &mut output);
        pbkdf2::pbkdf2_hmac::<Sha256>(b"", b"", 1, &mut expected);
        assert_eq!(output, expected);
    }
}
