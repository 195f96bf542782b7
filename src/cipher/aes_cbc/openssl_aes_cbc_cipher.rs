use openssl::symm::{Cipher, Crypter, Mode};

use crate::cipher::aes_cbc::{check_aligned, copy_key, FIXED_IV};
use crate::cipher::padding::{pad, unpad, BLOCK_SIZE};
use crate::error::{Error, Result};

#[derive(Clone)]
pub enum AesCbcCipher {
    AesCbc128([u8; 16]),
    AesCbc256([u8; 32]),
}

impl AesCbcCipher {
    pub fn new(key: &[u8]) -> Result<Self> {
        match key.len() {
            16 => Ok(AesCbcCipher::AesCbc128(copy_key(key))),
            32 => Ok(AesCbcCipher::AesCbc256(copy_key(key))),
            len => Err(Error::InvalidKeyLength(len)),
        }
    }
    /// Pads the first `plain_len` bytes of `buf` and encrypts them in place.
    /// `buf` must have room for the padding; returns the ciphertext length.
    pub fn encrypt(&self, buf: &mut [u8], plain_len: usize) -> Result<usize> {
        let total = plain_len + pad(buf, plain_len, BLOCK_SIZE)?;
        self.crypt(Mode::Encrypt, &mut buf[..total])
            .map_err(|e| Error::Cipher(format!("AesCbc encryption failed: {e}")))?;
        Ok(total)
    }
    /// Decrypts `buf` in place and strips the padding; returns the plaintext
    /// length.
    pub fn decrypt(&self, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        check_aligned(len)?;
        self.crypt(Mode::Decrypt, buf)
            .map_err(|e| Error::Decode(format!("AesCbc decryption failed: {e}")))?;
        Ok(unpad(buf, len)?.len())
    }
    fn crypt(&self, mode: Mode, buf: &mut [u8]) -> Result<(), openssl::error::ErrorStack> {
        let (cipher, key): (Cipher, &[u8]) = match self {
            AesCbcCipher::AesCbc128(key) => (Cipher::aes_128_cbc(), &key[..]),
            AesCbcCipher::AesCbc256(key) => (Cipher::aes_256_cbc(), &key[..]),
        };
        let mut crypter = Crypter::new(cipher, mode, key, Some(&FIXED_IV))?;
        // padding is applied by the caller
        crypter.pad(false);
        let mut out = vec![0; buf.len() + cipher.block_size()];
        let mut count = crypter.update(buf, &mut out)?;
        count += crypter.finalize(&mut out[count..])?;
        let count = count.min(buf.len());
        buf[..count].copy_from_slice(&out[..count]);
        Ok(())
    }
}

#[test]
fn test_aes_cbc() {
    let d = AesCbcCipher::new(&[7; 16]).unwrap();
    let src = [3u8; 100];
    let mut data = [0u8; 112];
    data[..100].copy_from_slice(&src);
    assert_eq!(d.encrypt(&mut data, 100).unwrap(), 112);
    let len = d.decrypt(&mut data).unwrap();
    assert_eq!(&data[..len], &src[..]);
}
