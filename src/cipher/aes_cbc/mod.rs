#[cfg(all(feature = "aes-cbc", not(feature = "openssl-aes-cbc")))]
mod rust_aes_cbc_cipher;
#[cfg(all(feature = "aes-cbc", not(feature = "openssl-aes-cbc")))]
pub use rust_aes_cbc_cipher::*;

#[cfg(feature = "openssl-aes-cbc")]
mod openssl_aes_cbc_cipher;
#[cfg(feature = "openssl-aes-cbc")]
pub use openssl_aes_cbc_cipher::*;

use crate::cipher::padding::BLOCK_SIZE;
use crate::error::{Error, Result};

/// Initialization vector shared by every message under every key.
///
/// Identical plaintext prefixes encrypt to identical ciphertext prefixes. It
/// is kept for wire compatibility; replacing it with a per-message nonce
/// needs a new protocol version.
pub const FIXED_IV: [u8; BLOCK_SIZE] = *b"UHNJUSBACIJFYSQN";

pub(crate) fn check_aligned(len: usize) -> Result<()> {
    if len == 0 || len % BLOCK_SIZE != 0 {
        return Err(Error::Decode(format!(
            "ciphertext length {len} is not a multiple of {BLOCK_SIZE}"
        )));
    }
    Ok(())
}

pub(crate) fn copy_key<const N: usize>(key: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&key[..N]);
    out
}
