/// Distance reported when two fingerprints cannot be compared (length
/// mismatch or a non-hex digit). Excludes the record from any cutoff-based
/// ranking.
pub const MISMATCH: u32 = u32::MAX;

/// Hamming distance between two hex-encoded fingerprints: per-digit XOR,
/// popcount each nibble, summed over all digits.
pub fn hex_distance(a: &str, b: &str) -> u32 {
    if a.len() != b.len() {
        return MISMATCH;
    }
    let mut sum = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        let (Some(na), Some(nb)) = (ca.to_digit(16), cb.to_digit(16)) else {
            return MISMATCH;
        };
        sum += (na ^ nb).count_ones();
    }
    sum
}
