//! The sequential memory-hard mixing driver.

use crate::pwxform::{pwxform, PwxformCtx, PWX_BYTES, PWX_WORDS};
use crate::salsa20::salsa_xor;
use crate::Version;

/// Low 32 bits of the last 64-byte sub-block, used to pick the next jump
/// target.
pub(crate) fn integerify(x: &[u32], r: usize) -> u32 {
    x[(2 * r - 1) * 16]
}

/// Clamp a jump target to the most recently written blocks: with `n` the
/// largest power of two not above `i`, the result lies in `[i - n, i)`.
pub(crate) fn wrap(x: u32, i: usize) -> usize {
    debug_assert!(i >= 2);
    let mut n = i;
    while n & (n - 1) != 0 {
        n &= n - 1;
    }
    (x as usize & (n - 1)) + (i - n)
}

/// Classic scrypt block mix over two 16-word sub-blocks, used only while
/// filling the S-box.
fn blockmix_salsa(b: &mut [u32], rounds: u32) {
    let mut x = [0u32; 16];
    x.copy_from_slice(&b[16..32]);

    for i in 0..2 {
        for (xj, bj) in x.iter_mut().zip(&b[i * 16..i * 16 + 16]) {
            *xj ^= *bj;
        }
        salsa_xor(&mut x, rounds);
        b[i * 16..i * 16 + 16].copy_from_slice(&x);
    }
}

/// Chain pwxform across the `2r` 64-byte sub-blocks of `b`, then run one
/// Salsa20 pass over the final sub-block.
fn blockmix_pwxform(b: &mut [u32], ctx: &mut PwxformCtx, r: usize) {
    let r1 = 128 * r / PWX_BYTES;

    let mut x = [0u32; PWX_WORDS];
    x.copy_from_slice(&b[(r1 - 1) * PWX_WORDS..r1 * PWX_WORDS]);

    for i in 0..r1 {
        let blk = i * PWX_WORDS;
        if r1 > 1 {
            for (xj, bj) in x.iter_mut().zip(&b[blk..blk + PWX_WORDS]) {
                *xj ^= *bj;
            }
        }

        pwxform(&mut x, ctx);

        b[blk..blk + PWX_WORDS].copy_from_slice(&x);
    }

    let tail = (r1 - 1) * (PWX_BYTES / 64) * 16;
    salsa_xor(&mut b[tail..tail + 16], ctx.salsa20_rounds);
}

/// Sequential-write pass: snapshot `x` into each of the `n` arena blocks,
/// folding in a wrapped back-reference from the third block on.
///
/// With `init` set the salsa mixer is used and `v` is the S-box being built;
/// afterwards the pwxform mixer takes over against the main arena.
pub(crate) fn smix1(
    b: &mut [u32],
    r: usize,
    n: usize,
    v: &mut [u32],
    x: &mut [u32],
    ctx: &mut PwxformCtx,
    init: bool,
) {
    let s = 32 * r;

    for k in 0..2 * r {
        for i in 0..16 {
            x[k * 16 + i] = b[k * 16 + (i * 5 % 16)];
        }
    }

    if ctx.version == Version::V1_0 {
        // Derive each successive 128-byte sub-block from its predecessor so
        // the whole of B participates before the arena walk starts. Vacuous
        // for the S-box fill where r == 1.
        for k in 1..r {
            let (head, tail) = x.split_at_mut(k * 32);
            tail[..32].copy_from_slice(&head[(k - 1) * 32..]);
            blockmix_pwxform(&mut tail[..32], ctx, 1);
        }
    }

    for i in 0..n {
        v[i * s..(i + 1) * s].copy_from_slice(&x[..s]);

        if i > 1 {
            let j = wrap(integerify(x, r), i);
            for (xk, vk) in x[..s].iter_mut().zip(&v[j * s..(j + 1) * s]) {
                *xk ^= *vk;
            }
        }

        if init {
            blockmix_salsa(x, ctx.salsa20_rounds);
        } else {
            blockmix_pwxform(&mut x[..s], ctx, r);
        }
    }

    for k in 0..2 * r {
        for i in 0..16 {
            b[k * 16 + (i * 5 % 16)] = x[k * 16 + i];
        }
    }
}

/// Random-access pass: `nloop` rounds of jump, fold, optionally write back,
/// and mix. The write-back is suppressed exactly when `nloop == 2`, which is
/// how the driver realizes its read-only tail pass.
pub(crate) fn smix2(
    b: &mut [u32],
    r: usize,
    n: usize,
    nloop: usize,
    v: &mut [u32],
    x: &mut [u32],
    ctx: &mut PwxformCtx,
) {
    let s = 32 * r;

    for k in 0..2 * r {
        for i in 0..16 {
            x[k * 16 + i] = b[k * 16 + (i * 5 % 16)];
        }
    }

    for _ in 0..nloop {
        let j = (integerify(x, r) & (n as u32 - 1)) as usize;

        for (xk, vk) in x[..s].iter_mut().zip(&v[j * s..(j + 1) * s]) {
            *xk ^= *vk;
        }

        if nloop != 2 {
            v[j * s..(j + 1) * s].copy_from_slice(&x[..s]);
        }

        blockmix_pwxform(&mut x[..s], ctx, r);
    }

    for k in 0..2 * r {
        for i in 0..16 {
            b[k * 16 + (i * 5 % 16)] = x[k * 16 + i];
        }
    }
}

/// The full memory-hard schedule: build the S-box, fill the arena, then a
/// read-write and a read-only random-access pass whose loop counts split
/// `(n + 2) / 3` by version.
pub(crate) fn smix(
    b: &mut [u32],
    r: usize,
    n: usize,
    v: &mut [u32],
    x: &mut [u32],
    ctx: &mut PwxformCtx,
) {
    let mut nloop_all = (n as u32 + 2) / 3;
    let mut nloop_rw = nloop_all;

    nloop_all += 1;
    nloop_all &= !1;

    match ctx.version {
        Version::V0_5 => {
            nloop_rw &= !1;
        }
        Version::V1_0 => {
            nloop_rw += 1;
            nloop_rw &= !1;
        }
    }

    // The S-box doubles as the arena for the first pass; borrow it out of
    // the context for the duration (nothing in the salsa path reads it).
    let mut sbox = core::mem::take(&mut ctx.s);
    let sbox_blocks = sbox.len() * 4 / 128;
    smix1(b, 1, sbox_blocks, &mut sbox, x, ctx, true);
    ctx.s = sbox;

    smix1(b, r, n, v, x, ctx, false);

    smix2(b, r, n, nloop_rw as usize, v, x, ctx);
    smix2(b, r, n, (nloop_all - nloop_rw) as usize, v, x, ctx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_lands_in_the_trailing_window() {
        for i in 2..4096usize {
            let n = 1usize << (usize::BITS - 1 - i.leading_zeros());
            for x in [0u32, 1, 2, 0x5a5a_5a5a, u32::MAX] {
                let j = wrap(x, i);
                assert!(j >= i - n, "wrap({x}, {i}) = {j} below window");
                assert!(j < i, "wrap({x}, {i}) = {j} not behind cursor");
            }
        }
    }

    #[test]
    fn wrap_is_exact_on_powers_of_two() {
        // When i is itself a power of two the window is the whole prefix.
        assert_eq!(wrap(5, 4), 1);
        assert_eq!(wrap(4, 4), 0);
        assert_eq!(wrap(1023, 512), 511);
    }

    #[test]
    fn integerify_reads_the_last_sub_block() {
        let mut x = vec![0u32; 32 * 8];
        x[(2 * 8 - 1) * 16] = 0xfeed_beef;
        assert_eq!(integerify(&x, 8), 0xfeed_beef);
    }
}
