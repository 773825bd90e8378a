#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

use hmac::Mac;
use sha2::{Digest, Sha256};

/// Re-export sha2
pub use sha2;

/// Re-export hmac
pub use hmac;


/// Memory utilities
pub mod memory;

/// PBKDF2-HMAC-SHA256 implementation (1 iteration special case)
pub mod pbkdf2_1;

/// C ABI exports
pub mod compat;

mod pwxform;
mod salsa20;
mod smix;

use crate::memory::MaybeHugeSlice;
use crate::pbkdf2_1::Pbkdf2HmacSha256State;
use crate::pwxform::PwxformCtx;

type HmacSha256 = hmac::Hmac<Sha256>;

/// Smallest supported cost parameter.
pub const MIN_N: u32 = 1024;
/// Largest supported cost parameter.
pub const MAX_N: u32 = 512 * 1024;
/// Smallest supported block-size parameter.
pub const MIN_R: u32 = 8;
/// Largest supported block-size parameter.
pub const MAX_R: u32 = 32;

/// Hash family selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// yescrypt 0.5, as used by early adopters of the algorithm.
    V0_5,
    /// yespower 1.0.
    V1_0,
}

/// Cost parameters for one hashing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Hash family.
    pub version: Version,
    /// Number of 128·r-byte arena blocks; a power of two in
    /// [`MIN_N`]..=[`MAX_N`].
    pub n: u32,
    /// Block size factor in [`MIN_R`]..=[`MAX_R`].
    pub r: u32,
}

impl Params {
    /// Construct a parameter set; validation happens in [`Hasher::new`].
    pub const fn new(version: Version, n: u32, r: u32) -> Self {
        Self { version, n, r }
    }

    /// Check the documented parameter bounds.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.n.is_power_of_two() || self.n < MIN_N || self.n > MAX_N {
            return Err(Error::InvalidParams);
        }
        if self.r < MIN_R || self.r > MAX_R {
            return Err(Error::InvalidParams);
        }
        Ok(())
    }
}

/// Errors surfaced at the call boundary; there are no partial results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `n` is not a power of two in bounds, or `r` is out of bounds.
    #[error(
        "invalid parameters: N must be a power of two in [{MIN_N}, {MAX_N}], r in [{MIN_R}, {MAX_R}]"
    )]
    InvalidParams,
    /// The scratch arena could not be sized or allocated.
    #[error("scratch arena allocation failed")]
    AllocFailed,
}

/// A reusable hashing context owning the scratch arena, the working block,
/// and the pwxform S-box for one parameter set.
///
/// Reuse across calls is indistinguishable from fresh construction; the
/// S-box and its cursors are re-derived by every call. Not safe for
/// concurrent use — give each thread its own.
pub struct Hasher {
    params: Params,
    ctx: PwxformCtx,
    v: MaybeHugeSlice<u32>,
    x: Box<[u32]>,
    b: Box<[u32]>,
    buf: Box<[u8]>,
}

impl Hasher {
    /// Validate `params` and allocate the arenas for it.
    ///
    /// The scratch arena is `128 · r · n` bytes; at the upper parameter
    /// bounds that is 2 GiB, so construction is the expensive step and
    /// contexts are meant to be reused across many inputs.
    pub fn new(params: Params) -> Result<Self, Error> {
        params.validate()?;

        let n = params.n as usize;
        let r = params.r as usize;

        let v_words = n.checked_mul(32 * r).ok_or(Error::AllocFailed)?;
        v_words
            .checked_mul(4)
            .filter(|&bytes| bytes <= isize::MAX as usize)
            .ok_or(Error::AllocFailed)?;

        Ok(Self {
            params,
            ctx: PwxformCtx::new(params.version),
            v: MaybeHugeSlice::new(v_words),
            x: vec![0u32; 32 * r].into_boxed_slice(),
            b: vec![0u32; 32 * r].into_boxed_slice(),
            buf: vec![0u8; 128 * r].into_boxed_slice(),
        })
    }

    /// The parameter set this context was built for.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Hash `input` under the context's parameters, binding the optional
    /// personalization token, and return the 32-byte digest.
    pub fn hash(&mut self, input: &[u8], pers: &[u8]) -> [u8; 32] {
        let n = self.params.n as usize;
        let r = self.params.r as usize;

        self.ctx.reset();

        let prehash: [u8; 32] = Sha256::digest(input).into();
        let hmac_state = Pbkdf2HmacSha256State::new(&prehash);

        let salt = match self.params.version {
            Version::V0_5 => input,
            Version::V1_0 => pers,
        };
        hmac_state.emit(salt, &mut self.buf);

        let mut data = [0u8; 32];
        data.copy_from_slice(&self.buf[..32]);

        for (word, chunk) in self.b.iter_mut().zip(self.buf.chunks_exact(4)) {
            *word = u32::from_le_bytes(chunk.try_into().unwrap());
        }

        smix::smix(
            &mut self.b,
            r,
            n,
            self.v.as_mut(),
            &mut self.x,
            &mut self.ctx,
        );

        for (word, chunk) in self.b.iter().zip(self.buf.chunks_exact_mut(4)) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }

        match self.params.version {
            Version::V0_5 => {
                let mut out = [0u8; 32];
                Pbkdf2HmacSha256State::new(&data).emit(&self.buf, &mut out);

                if !pers.is_empty() {
                    let mut mac = HmacSha256::new_from_slice(&out)
                        .expect("HMAC-SHA256 accepts keys of any length");
                    mac.update(pers);
                    out = Sha256::digest(mac.finalize().into_bytes()).into();
                }
                out
            }
            Version::V1_0 => {
                let key_start = self.buf.len() - 64;
                let mut mac = HmacSha256::new_from_slice(&self.buf[key_start..])
                    .expect("HMAC-SHA256 accepts keys of any length");
                mac.update(&data);
                mac.finalize().into_bytes().into()
            }
        }
    }
}

/// One-shot yespower 1.0 hash.
pub fn yespower(input: &[u8], n: u32, r: u32, pers: &[u8]) -> Result<[u8; 32], Error> {
    Ok(Hasher::new(Params::new(Version::V1_0, n, r))?.hash(input, pers))
}

/// One-shot yescrypt 0.5 hash.
pub fn yescrypt(input: &[u8], n: u32, r: u32, pers: &[u8]) -> Result<[u8; 32], Error> {
    Ok(Hasher::new(Params::new(Version::V0_5, n, r))?.hash(input, pers))
}
