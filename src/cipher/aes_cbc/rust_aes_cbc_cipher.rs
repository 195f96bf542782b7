use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::cipher::aes_cbc::{check_aligned, copy_key, FIXED_IV};
use crate::cipher::padding::{pad, unpad, BLOCK_SIZE};
use crate::error::{Error, Result};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

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
        let data = &mut buf[..total];
        let rs = match self {
            AesCbcCipher::AesCbc128(key) => Aes128CbcEnc::new_from_slices(key, &FIXED_IV)
                .map_err(|e| Error::Cipher(format!("{e:?}")))?
                .encrypt_padded_mut::<NoPadding>(data, total)
                .map(|v| v.len()),
            AesCbcCipher::AesCbc256(key) => Aes256CbcEnc::new_from_slices(key, &FIXED_IV)
                .map_err(|e| Error::Cipher(format!("{e:?}")))?
                .encrypt_padded_mut::<NoPadding>(data, total)
                .map(|v| v.len()),
        };
        rs.map_err(|e| Error::Cipher(format!("Encryption failed:{e:?}")))
    }
    /// Decrypts `buf` in place and strips the padding; returns the plaintext
    /// length.
    pub fn decrypt(&self, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        check_aligned(len)?;
        let rs = match self {
            AesCbcCipher::AesCbc128(key) => Aes128CbcDec::new_from_slices(key, &FIXED_IV)
                .map_err(|e| Error::Cipher(format!("{e:?}")))?
                .decrypt_padded_mut::<NoPadding>(buf)
                .map(|v| v.len()),
            AesCbcCipher::AesCbc256(key) => Aes256CbcDec::new_from_slices(key, &FIXED_IV)
                .map_err(|e| Error::Cipher(format!("{e:?}")))?
                .decrypt_padded_mut::<NoPadding>(buf)
                .map(|v| v.len()),
        };
        let len = rs.map_err(|e| Error::Decode(format!("Decryption failed:{e:?}")))?;
        Ok(unpad(buf, len)?.len())
    }
}

#[test]
fn test_aes_cbc() {
    let d = AesCbcCipher::new(&[7; 32]).unwrap();
    let src = [3u8; 100];
    let mut data = [0u8; 112];
    data[..100].copy_from_slice(&src);
    assert_eq!(d.encrypt(&mut data, 100).unwrap(), 112);
    assert_ne!(&data[..100], &src[..]);
    let len = d.decrypt(&mut data).unwrap();
    assert_eq!(&data[..len], &src[..]);
}
