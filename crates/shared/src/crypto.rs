//! Hashing and random code helpers for one-time passwords.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Number of digits in an emailed verification code.
pub const OTP_LENGTH: usize = 6;

/// Computes SHA-256 of the input as a lowercase hex string.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a numeric one-time code of `digits` length, zero-padded.
pub fn generate_otp(digits: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..digits)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Compares two strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
