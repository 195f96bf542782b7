//! Datagram payload codec.
//!
//! Payloads are PKCS#7 padded and encrypted with AES-CBC under a fixed IV
//! (see [`aes_cbc::FIXED_IV`]). An empty key disables encryption and the
//! codec passes data through untouched.

#[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
pub mod aes_cbc;
pub mod padding;

pub use padding::{pad, padded_len, unpad, BLOCK_SIZE};

use crate::error::{Error, Result};

#[derive(Clone, Default)]
pub enum Cipher {
    #[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
    AesCbc(aes_cbc::AesCbcCipher),
    #[default]
    None,
}

impl Cipher {
    /// Build a cipher from raw key bytes. An empty key selects pass-through
    /// mode; 16 bytes select AES-128 and 32 bytes AES-256.
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.is_empty() {
            return Ok(Cipher::None);
        }
        Self::new_aes_cbc(key)
    }
    #[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
    fn new_aes_cbc(key: &[u8]) -> Result<Self> {
        Ok(Cipher::AesCbc(aes_cbc::AesCbcCipher::new(key)?))
    }
    #[cfg(not(any(feature = "aes-cbc", feature = "openssl-aes-cbc")))]
    fn new_aes_cbc(_key: &[u8]) -> Result<Self> {
        Err(Error::Cipher("no AES-CBC backend enabled".to_string()))
    }
    pub fn is_none(&self) -> bool {
        matches!(self, Cipher::None)
    }
    /// Encrypts the first `plain_len` bytes of `buf` in place and returns the
    /// resulting length. `buf` must reserve [`Cipher::reserved_len`] bytes
    /// past the plaintext.
    pub fn encrypt(&self, buf: &mut [u8], plain_len: usize) -> Result<usize> {
        if plain_len > buf.len() {
            return Err(Error::Overflow {
                cap: buf.len(),
                required: plain_len,
            });
        }
        match self {
            #[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
            Cipher::AesCbc(c) => c.encrypt(buf, plain_len),
            Cipher::None => Ok(plain_len),
        }
    }
    /// Decrypts the whole of `payload` in place and returns the plaintext
    /// length.
    pub fn decrypt(&self, payload: &mut [u8]) -> Result<usize> {
        match self {
            #[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
            Cipher::AesCbc(c) => c.decrypt(payload),
            Cipher::None => Ok(payload.len()),
        }
    }
    /// Upper bound on the bytes encryption adds to a payload.
    pub fn reserved_len(&self) -> usize {
        match self {
            #[cfg(any(feature = "aes-cbc", feature = "openssl-aes-cbc"))]
            Cipher::AesCbc(_) => BLOCK_SIZE,
            Cipher::None => 0,
        }
    }
}

/// Encrypt in place under `key`; see [`Cipher::encrypt`].
pub fn encrypt(key: &[u8], buf: &mut [u8], plain_len: usize) -> Result<usize> {
    Cipher::new(key)?.encrypt(buf, plain_len)
}

/// Decrypt the first `len` bytes of `buf` in place under `key`.
pub fn decrypt(key: &[u8], buf: &mut [u8], len: usize) -> Result<usize> {
    if len > buf.len() {
        return Err(Error::Decode(format!(
            "ciphertext length {len} exceeds buffer {}",
            buf.len()
        )));
    }
    Cipher::new(key)?.decrypt(&mut buf[..len])
}

pub fn encrypt_to_vec(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Cipher::new(key)?;
    let mut buf = vec![0; plaintext.len() + cipher.reserved_len()];
    buf[..plaintext.len()].copy_from_slice(plaintext);
    let len = cipher.encrypt(&mut buf, plaintext.len())?;
    buf.truncate(len);
    Ok(buf)
}

#[cfg(all(test, any(feature = "aes-cbc", feature = "openssl-aes-cbc")))]
mod test {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_round_trip() {
        let mut rng = rand::thread_rng();
        for key_len in [0usize, 16, 32] {
            let mut key = vec![0u8; key_len];
            rng.fill_bytes(&mut key);
            for len in 0..=100 {
                let mut plaintext = vec![0u8; len];
                rng.fill_bytes(&mut plaintext);
                let mut data = encrypt_to_vec(&key, &plaintext).unwrap();
                if key_len == 0 {
                    assert_eq!(data, plaintext);
                } else {
                    assert_eq!(data.len(), padded_len(len));
                }
                let data_len = data.len();
                let len = decrypt(&key, &mut data, data_len).unwrap();
                assert_eq!(&data[..len], &plaintext[..]);
            }
        }
    }

    #[test]
    fn test_fixed_iv_is_deterministic() {
        let key = [9u8; 16];
        let a = encrypt_to_vec(&key, b"same message").unwrap();
        let b = encrypt_to_vec(&key, b"same message").unwrap();
        assert_eq!(a, b);
        let c = encrypt_to_vec(&[9u8; 32], b"same message").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_key_length() {
        assert!(matches!(Cipher::new(&[1; 15]), Err(Error::InvalidKeyLength(15))));
        assert!(matches!(Cipher::new(&[1; 24]), Err(Error::InvalidKeyLength(24))));
        assert!(Cipher::new(&[]).unwrap().is_none());
    }

    #[test]
    fn test_decrypt_unaligned() {
        let key = [1u8; 16];
        let mut data = encrypt_to_vec(&key, b"hello").unwrap();
        assert!(matches!(decrypt(&key, &mut data, 15), Err(Error::Decode(_))));
        assert!(matches!(decrypt(&key, &mut data, 0), Err(Error::Decode(_))));
        assert!(matches!(decrypt(&key, &mut data, 17), Err(Error::Decode(_))));
    }

    #[test]
    fn test_encrypt_needs_room() {
        let cipher = Cipher::new(&[1u8; 16]).unwrap();
        let mut buf = [0u8; 16];
        assert!(matches!(
            cipher.encrypt(&mut buf, 16),
            Err(Error::Overflow { .. })
        ));
        assert_eq!(Cipher::None.encrypt(&mut buf, 16).unwrap(), 16);
    }

    #[test]
    fn test_tampered_padding() {
        let key = [5u8; 32];
        let mut data = encrypt_to_vec(&key, &[0u8; 16]).unwrap();
        assert_eq!(data.len(), 32);
        // the last block is a full padding block; corrupt it
        data[31] ^= 0xFF;
        let len = data.len();
        match decrypt(&key, &mut data, len) {
            Err(e) => assert!(e.is_packet_error()),
            Ok(n) => assert!(n < 32),
        }
    }
}
