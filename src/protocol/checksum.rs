/// Internet-style ones'-complement checksum.
///
/// Data is summed as big-endian 16-bit words. A trailing odd byte is added
/// as its own (zero-extended) value, carries are folded back into 16 bits and
/// the result is complemented.
///
/// The trailing byte lands in the low-order half of its word, so appending
/// the checksum to odd-length data does not make [`verify_checksum`] hold;
/// only even-length data is self-verifying.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u64 = 0;
    let mut chunks = data.chunks_exact(2);
    for word in &mut chunks {
        sum += u16::from_be_bytes([word[0], word[1]]) as u64;
    }
    if let [last] = chunks.remainder() {
        sum += *last as u64;
    }
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}

/// True when `data` (with its checksum appended in place) sums to zero.
pub fn verify_checksum(data: &[u8]) -> bool {
    checksum(data) == 0
}
