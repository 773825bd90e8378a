//! C ABI exports matching the upstream library interface.

use crate::{Hasher, Params, Version};

/// C export computing a yespower 1.0 digest.
///
/// `output` must point to 32 writable bytes; `pers` may be null when
/// `pers_len` is zero. Returns 0 on success, -1 on invalid parameters.
#[unsafe(export_name = "yespower_hash")]
pub unsafe extern "C" fn yespower_c(
    input: *const u8,
    input_len: u32,
    n: u32,
    r: u32,
    pers: *const u8,
    pers_len: u32,
    output: *mut u8,
) -> core::ffi::c_int {
    let input = if input.is_null() {
        &[][..]
    } else {
        unsafe { core::slice::from_raw_parts(input, input_len as usize) }
    };
    let pers = if pers.is_null() {
        &[][..]
    } else {
        unsafe { core::slice::from_raw_parts(pers, pers_len as usize) }
    };

    let Ok(mut hasher) = Hasher::new(Params::new(Version::V1_0, n, r)) else {
        return -1;
    };
    let digest = hasher.hash(input, pers);
    unsafe { core::ptr::copy_nonoverlapping(digest.as_ptr(), output, digest.len()) };
    0
}

/// C export computing a yescrypt 0.5 digest, same contract as
/// [`yespower_c`].
#[unsafe(export_name = "yescrypt_hash")]
pub unsafe extern "C" fn yescrypt_c(
    input: *const u8,
    input_len: u32,
    n: u32,
    r: u32,
    pers: *const u8,
    pers_len: u32,
    output: *mut u8,
) -> core::ffi::c_int {
    let input = if input.is_null() {
        &[][..]
    } else {
        unsafe { core::slice::from_raw_parts(input, input_len as usize) }
    };
    let pers = if pers.is_null() {
        &[][..]
    } else {
        unsafe { core::slice::from_raw_parts(pers, pers_len as usize) }
    };

    let Ok(mut hasher) = Hasher::new(Params::new(Version::V0_5, n, r)) else {
        return -1;
    };
    let digest = hasher.hash(input, pers);
    unsafe { core::ptr::copy_nonoverlapping(digest.as_ptr(), output, digest.len()) };
    0
}
