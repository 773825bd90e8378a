//! The pwxform round function and its S-box context.

use crate::Version;

/// Number of 64-bit lanes per gather.
pub(crate) const PWX_SIMPLE: usize = 2;
/// Number of gathers per round.
pub(crate) const PWX_GATHER: usize = 4;
/// Bytes mixed per pwxform invocation.
pub(crate) const PWX_BYTES: usize = PWX_GATHER * PWX_SIMPLE * 8;
/// 32-bit words mixed per pwxform invocation.
pub(crate) const PWX_WORDS: usize = PWX_BYTES / 4;

/// Per-hash mixing context: version-dependent round counts plus the S-box
/// with its region pointers and write cursor.
///
/// The S-box contents, region pointers, and cursor are all re-derived at the
/// start of every hash; a context may be reused across calls but never shared
/// across threads.
pub(crate) struct PwxformCtx {
    pub(crate) version: Version,
    pub(crate) salsa20_rounds: u32,
    pwx_rounds: usize,
    s_width: u32,
    s_mask: u32,
    pub(crate) s: Box<[u32]>,
    s0: usize,
    s1: usize,
    s2: usize,
    w: usize,
}

impl PwxformCtx {
    pub(crate) fn new(version: Version) -> Self {
        let (salsa20_rounds, pwx_rounds, s_width, regions) = match version {
            Version::V0_5 => (8, 6, 8, 2),
            Version::V1_0 => (2, 3, 11, 3),
        };
        let s_bytes = regions * (1usize << s_width) * PWX_SIMPLE * 8;

        let mut ctx = Self {
            version,
            salsa20_rounds,
            pwx_rounds,
            s_width,
            s_mask: ((1u32 << s_width) - 1) * (PWX_SIMPLE as u32) * 8,
            s: vec![0u32; s_bytes / 4].into_boxed_slice(),
            s0: 0,
            s1: 0,
            s2: 0,
            w: 0,
        };
        ctx.reset();
        ctx
    }

    /// Restore the region pointers and write cursor to their initial layout.
    ///
    /// The S-box words themselves are rebuilt by the first `smix1` pass of
    /// each hash, so reuse of a context is indistinguishable from a fresh one.
    pub(crate) fn reset(&mut self) {
        let region_words = (1usize << self.s_width) * PWX_SIMPLE * 2;
        self.s0 = 0;
        self.s1 = region_words;
        self.s2 = 2 * region_words;
        self.w = 0;
    }
}

/// One pwxform pass over a 64-byte block: per gather lane, the low pair of
/// words selects two S-box entries, and each 64-bit lane is replaced by
/// `lo(x) * hi(x) + s0 ^ s1`.
///
/// For `Version::V1_0` the freshly mixed lanes are also written back into the
/// S-box (odd gathers advance the cursor, even gathers do not), and the
/// region labels rotate once per invocation.
pub(crate) fn pwxform(x: &mut [u32; PWX_WORDS], ctx: &mut PwxformCtx) {
    let mut w = ctx.w;
    let (s0, s1) = (ctx.s0, ctx.s1);

    for i in 0..ctx.pwx_rounds {
        for j in 0..PWX_GATHER {
            let xl = x[j * 4];
            let xh = x[j * 4 + 1];

            let p0 = s0 + 2 * ((xl & ctx.s_mask) / 8) as usize;
            let p1 = s1 + 2 * ((xh & ctx.s_mask) / 8) as usize;

            for k in 0..PWX_SIMPLE {
                let lane0 = ((ctx.s[p0 + 2 * k + 1] as u64) << 32) | ctx.s[p0 + 2 * k] as u64;
                let lane1 = ((ctx.s[p1 + 2 * k + 1] as u64) << 32) | ctx.s[p1 + 2 * k] as u64;

                let xl = x[j * 4 + 2 * k] as u64;
                let xh = x[j * 4 + 2 * k + 1] as u64;

                let mut t = xl * xh;
                t = t.wrapping_add(lane0);
                t ^= lane1;

                x[j * 4 + 2 * k] = t as u32;
                x[j * 4 + 2 * k + 1] = (t >> 32) as u32;
            }

            if ctx.version == Version::V1_0 && (i == 0 || j < PWX_GATHER / 2) {
                if j & 1 != 0 {
                    for k in 0..PWX_SIMPLE {
                        ctx.s[s1 + w] = x[j * 4 + 2 * k];
                        ctx.s[s1 + w + 1] = x[j * 4 + 2 * k + 1];
                        w += 2;
                    }
                } else {
                    // Even gathers overwrite the same window; the cursor only
                    // moves on the odd ones.
                    for k in 0..PWX_SIMPLE {
                        ctx.s[s0 + w + 2 * k] = x[j * 4 + 2 * k];
                        ctx.s[s0 + w + 2 * k + 1] = x[j * 4 + 2 * k + 1];
                    }
                }
            }
        }
    }

    if ctx.version == Version::V1_0 {
        ctx.s0 = ctx.s2;
        ctx.s1 = s0;
        ctx.s2 = s1;
        ctx.w = w & ((1usize << (ctx.s_width + 1)) * PWX_SIMPLE - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrambled_block(seed: u32) -> [u32; PWX_WORDS] {
        core::array::from_fn(|i| {
            (seed ^ i as u32)
                .wrapping_mul(0x9e3779b9)
                .rotate_left(i as u32)
        })
    }

    #[test]
    fn v1_write_cursor_stays_aligned_and_bounded() {
        let mut ctx = PwxformCtx::new(Version::V1_0);
        let bound = (1usize << (11 + 1)) * PWX_SIMPLE;
        let mut x = scrambled_block(0xdead);
        for step in 0..4096 {
            pwxform(&mut x, &mut ctx);
            assert_eq!(ctx.w % 16, 0, "cursor drifted at step {step}");
            assert!(ctx.w < bound, "cursor escaped its mask at step {step}");
        }
    }

    #[test]
    fn v1_region_rotation_has_period_three() {
        let mut ctx = PwxformCtx::new(Version::V1_0);
        let start = (ctx.s0, ctx.s1, ctx.s2);
        let mut x = scrambled_block(1);
        pwxform(&mut x, &mut ctx);
        assert_eq!((ctx.s0, ctx.s1, ctx.s2), (start.2, start.0, start.1));
        pwxform(&mut x, &mut ctx);
        pwxform(&mut x, &mut ctx);
        assert_eq!((ctx.s0, ctx.s1, ctx.s2), start);
    }

    #[test]
    fn v0_5_never_touches_the_sbox() {
        let mut ctx = PwxformCtx::new(Version::V0_5);
        for (i, word) in ctx.s.iter_mut().enumerate() {
            *word = (i as u32).wrapping_mul(0x01000193);
        }
        let snapshot = ctx.s.clone();
        let cursor = ctx.w;
        let regions = (ctx.s0, ctx.s1, ctx.s2);

        let mut x = scrambled_block(7);
        for _ in 0..64 {
            pwxform(&mut x, &mut ctx);
        }

        assert_eq!(ctx.s, snapshot);
        assert_eq!(ctx.w, cursor);
        assert_eq!((ctx.s0, ctx.s1, ctx.s2), regions);
    }

    #[test]
    fn mixing_depends_on_sbox_contents() {
        let mut ctx_a = PwxformCtx::new(Version::V0_5);
        let mut ctx_b = PwxformCtx::new(Version::V0_5);
        for (i, word) in ctx_b.s.iter_mut().enumerate() {
            *word = i as u32 + 1;
        }

        let mut xa = scrambled_block(42);
        let mut xb = xa;
        pwxform(&mut xa, &mut ctx_a);
        pwxform(&mut xb, &mut ctx_b);
        assert_ne!(xa, xb);
    }
}
