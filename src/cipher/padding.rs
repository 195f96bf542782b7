use crate::error::{Error, Result};

pub const BLOCK_SIZE: usize = 16;

const PADDING: [[u8; BLOCK_SIZE]; BLOCK_SIZE + 1] = padding_table();

const fn padding_table() -> [[u8; BLOCK_SIZE]; BLOCK_SIZE + 1] {
    let mut table = [[0u8; BLOCK_SIZE]; BLOCK_SIZE + 1];
    let mut i = 0;
    while i <= BLOCK_SIZE {
        table[i] = [i as u8; BLOCK_SIZE];
        i += 1;
    }
    table
}

/// Length of `plain_len` bytes after PKCS#7 padding to [`BLOCK_SIZE`].
pub const fn padded_len(plain_len: usize) -> usize {
    plain_len + BLOCK_SIZE - plain_len % BLOCK_SIZE
}

/// Append PKCS#7 padding after the first `plain_len` bytes of `buf`.
///
/// Padding is always added, a full block of it for aligned input. Returns
/// the number of padding bytes written.
pub fn pad(buf: &mut [u8], plain_len: usize, block_size: usize) -> Result<usize> {
    if block_size == 0 || block_size > BLOCK_SIZE {
        return Err(Error::InvalidArgument(format!(
            "block size {block_size} out of 1..={BLOCK_SIZE}"
        )));
    }
    let pad_len = block_size - plain_len % block_size;
    let required = plain_len + pad_len;
    if buf.len() < required {
        return Err(Error::Overflow {
            cap: buf.len(),
            required,
        });
    }
    buf[plain_len..required].copy_from_slice(&PADDING[pad_len][..pad_len]);
    Ok(pad_len)
}

/// Strip PKCS#7 padding from the first `total_len` bytes of `buf`.
///
/// Only the last byte is inspected; the remaining padding bytes are not
/// verified to carry the same value.
pub fn unpad(buf: &[u8], total_len: usize) -> Result<&[u8]> {
    if total_len == 0 || total_len > buf.len() {
        return Err(Error::Decode(format!(
            "padded length {total_len} out of buffer {}",
            buf.len()
        )));
    }
    let unpad_len = buf[total_len - 1];
    if unpad_len == 0 || unpad_len as usize > BLOCK_SIZE || unpad_len as usize > total_len {
        return Err(Error::Padding(unpad_len));
    }
    Ok(&buf[..total_len - unpad_len as usize])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pad_unpad_identity() {
        for plain_len in 0..=10 * BLOCK_SIZE {
            let plain: Vec<u8> = (0..plain_len).map(|i| i as u8).collect();
            let mut buf = vec![0u8; padded_len(plain_len)];
            buf[..plain_len].copy_from_slice(&plain);
            let pad_len = pad(&mut buf, plain_len, BLOCK_SIZE).unwrap();
            assert!((1..=BLOCK_SIZE).contains(&pad_len));
            assert_eq!((plain_len + pad_len) % BLOCK_SIZE, 0);
            assert_eq!(plain_len + pad_len, padded_len(plain_len));
            assert!(buf[plain_len..].iter().all(|b| *b as usize == pad_len));
            assert_eq!(unpad(&buf, plain_len + pad_len).unwrap(), &plain[..]);
        }
    }

    #[test]
    fn test_pad_aligned_adds_block() {
        let mut buf = [0u8; 32];
        assert_eq!(pad(&mut buf, 16, BLOCK_SIZE).unwrap(), 16);
        assert_eq!(buf[16..], [16u8; 16]);
    }

    #[test]
    fn test_pad_small_block() {
        let mut buf = [0u8; 8];
        assert_eq!(pad(&mut buf, 5, 8).unwrap(), 3);
        assert_eq!(buf[5..], [3, 3, 3]);
        assert!(pad(&mut buf, 5, 0).is_err());
        assert!(pad(&mut buf, 5, 17).is_err());
    }

    #[test]
    fn test_pad_overflow() {
        let mut buf = [0u8; 20];
        assert!(matches!(
            pad(&mut buf, 17, BLOCK_SIZE),
            Err(Error::Overflow {
                cap: 20,
                required: 32
            })
        ));
    }

    #[test]
    fn test_unpad_errors() {
        assert!(matches!(unpad(&[1, 2, 0], 3), Err(Error::Padding(0))));
        assert!(matches!(unpad(&[1, 2, 17], 3), Err(Error::Padding(17))));
        assert!(matches!(unpad(&[4, 4, 4], 3), Err(Error::Padding(4))));
        assert!(matches!(unpad(&[], 0), Err(Error::Decode(_))));
        assert!(matches!(unpad(&[1], 2), Err(Error::Decode(_))));
        // trailing bytes are not cross-checked
        assert_eq!(unpad(&[9, 9, 7, 2], 4).unwrap(), &[9, 9]);
    }
}
