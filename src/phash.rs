use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::fmt;
use std::time::Duration;

use image::imageops::FilterType;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::timeout;

/// Edge length of the resampled input fed into the DCT.
const INPUT_SIZE: usize = 32;
/// Edge length of the low-frequency block kept from the transform.
const BLOCK_SIZE: usize = 8;
/// Number of bits in a fingerprint.
pub const FINGERPRINT_BITS: usize = BLOCK_SIZE * BLOCK_SIZE;
/// Upper bound on decoding a single image.
pub const DECODE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum PhashError {
    /// Empty or undecodable image payload. Caller's fault, not retried.
    #[error("invalid image input: {0}")]
    InvalidInput(String),
    /// Decoding exceeded [`DECODE_TIMEOUT`]. Treated as a content problem,
    /// not a transient fault.
    #[error("image decode timed out after 10s")]
    DecodeTimeout,
    #[error("fingerprint worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// A 64-bit DCT perceptual hash, rendered as 16 lowercase hex characters.
///
/// Visually similar images produce fingerprints with a small hamming
/// distance. The fingerprint is a hash, not a key: distinct images may
/// collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    pub fn into_hex(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the perceptual hash of an encoded image.
///
/// The payload is decoded and resampled to 32x32 (aspect ratio discarded),
/// converted to BT.601 luminance, transformed with an orthonormal 2D DCT-II,
/// and the top-left 8x8 coefficient block is thresholded against its median:
/// bit i is set iff coefficient i is strictly greater than the median.
///
/// Pure computation, no I/O. Deterministic for a fixed payload.
pub fn compute(data: &[u8]) -> Result<Fingerprint, PhashError> {
    if data.is_empty() {
        return Err(PhashError::InvalidInput("empty image payload".to_string()));
    }

    let img = image::load_from_memory(data)
        .map_err(|e| PhashError::InvalidInput(e.to_string()))?
        .resize_exact(INPUT_SIZE as u32, INPUT_SIZE as u32, FilterType::Triangle)
        .to_rgb8();

    let mut luma = [[0f64; INPUT_SIZE]; INPUT_SIZE];
    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        luma[y as usize][x as usize] = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
    }

    let dct = dct2d(&luma);

    // top-left block holds the lowest spatial frequencies, row-major
    let mut block = [0f64; FINGERPRINT_BITS];
    for u in 0..BLOCK_SIZE {
        for v in 0..BLOCK_SIZE {
            block[u * BLOCK_SIZE + v] = dct[u][v];
        }
    }

    let median = median(&block);
    let mut bytes = [0u8; FINGERPRINT_BITS / 8];
    for (i, &coefficient) in block.iter().enumerate() {
        // strict comparison: coefficients equal to the median stay 0
        if coefficient > median {
            bytes[i / 8] |= 1 << (7 - i % 8);
        }
    }

    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(Fingerprint(hex))
}

/// [`compute`] on a blocking worker, bounded by [`DECODE_TIMEOUT`].
pub async fn compute_with_timeout(data: Vec<u8>) -> Result<Fingerprint, PhashError> {
    match timeout(DECODE_TIMEOUT, tokio::task::spawn_blocking(move || compute(&data))).await {
        Ok(joined) => joined?,
        Err(_) => Err(PhashError::DecodeTimeout),
    }
}

/// Orthonormal 2D DCT-II over a 32x32 matrix, with the standard
/// `c(0) = 1/sqrt(2)`, `c(k>0) = 1` scale factors.
fn dct2d(matrix: &[[f64; INPUT_SIZE]; INPUT_SIZE]) -> [[f64; INPUT_SIZE]; INPUT_SIZE] {
    let n = INPUT_SIZE;

    // cos_table[k][u] = cos((2k + 1) * u * pi / (2n))
    let mut cos_table = [[0f64; INPUT_SIZE]; INPUT_SIZE];
    for (k, row) in cos_table.iter_mut().enumerate() {
        for (u, value) in row.iter_mut().enumerate() {
            *value = ((2 * k + 1) as f64 * u as f64 * PI / (2 * n) as f64).cos();
        }
    }

    let mut out = [[0f64; INPUT_SIZE]; INPUT_SIZE];
    for u in 0..n {
        for v in 0..n {
            let mut sum = 0.0;
            for i in 0..n {
                for j in 0..n {
                    sum += matrix[i][j] * cos_table[i][u] * cos_table[j][v];
                }
            }
            let cu = if u == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            let cv = if v == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            out[u][v] = 2.0 / n as f64 * cu * cv * sum;
        }
    }
    out
}

/// Median with the average-of-middle-two rule for even element counts.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] }
}
