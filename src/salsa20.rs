//! Salsa20/r permutation over the shuffled word order.
//!
//! `B` is kept in the classic scrypt SIMD word order throughout the mixing
//! loops; the kernel unshuffles on entry with `x[(i*5) % 16] = b[i]`, runs
//! the requested number of rounds over the straightened state, and applies
//! the inverse permutation while adding back into the block.

#[rustfmt::skip]
macro_rules! quarter_words {
    ($w:expr, $a:literal, $b:literal, $c:literal, $d:literal) => {
        $w[$b] ^= $w[$a].wrapping_add($w[$d]).rotate_left(7);
        $w[$c] ^= $w[$b].wrapping_add($w[$a]).rotate_left(9);
        $w[$d] ^= $w[$c].wrapping_add($w[$b]).rotate_left(13);
        $w[$a] ^= $w[$d].wrapping_add($w[$c]).rotate_left(18);
    };
}

/// Apply `rounds` Salsa20 rounds to the 16-word block at the front of `b`,
/// in place, adding the keystream into the shuffled representation.
pub(crate) fn salsa_xor(b: &mut [u32], rounds: u32) {
    let mut x = [0u32; 16];
    for i in 0..16 {
        x[i * 5 % 16] = b[i];
    }

    for _ in 0..rounds / 2 {
        quarter_words!(x, 0, 4, 8, 12);
        quarter_words!(x, 5, 9, 13, 1);
        quarter_words!(x, 10, 14, 2, 6);
        quarter_words!(x, 15, 3, 7, 11);

        quarter_words!(x, 0, 1, 2, 3);
        quarter_words!(x, 5, 6, 7, 4);
        quarter_words!(x, 10, 11, 8, 9);
        quarter_words!(x, 15, 12, 13, 14);
    }

    for i in 0..16 {
        b[i] = b[i].wrapping_add(x[i * 5 % 16]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_state_is_a_fixed_point() {
        for rounds in [2, 8] {
            let mut b = [0u32; 16];
            salsa_xor(&mut b, rounds);
            assert_eq!(b, [0u32; 16]);
        }
    }

    #[test]
    fn entry_and_exit_permutations_agree() {
        // With zero rounds the keystream is the unshuffled input itself, so
        // the exit permutation must land every word back on its own slot.
        let mut b: [u32; 16] = core::array::from_fn(|i| 0x9e3779b9u32.wrapping_mul(i as u32 + 1));
        let expected: [u32; 16] = core::array::from_fn(|i| b[i].wrapping_mul(2));
        salsa_xor(&mut b, 0);
        assert_eq!(b, expected);
    }

    #[test]
    fn round_counts_diverge() {
        let mut a: [u32; 16] = core::array::from_fn(|i| i as u32 + 1);
        let mut b = a;
        salsa_xor(&mut a, 2);
        salsa_xor(&mut b, 8);
        assert_ne!(a, b);
    }
}
