//! Recovery phrase, device secret, and password generation.
//!
//! All sampling uses `random_range`, which rejects rather than folds, so no
//! character is ever more likely than another.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::{Rng, RngCore};

/// Recovery phrase length in characters.
pub const RECOVERY_PHRASE_LEN: usize = 32;

/// Characters a recovery phrase is drawn from.
const PHRASE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Characters generated passwords are drawn from.
const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+~`|}{[]:;?><,./-=";

/// Shortest password [`generate_password`] will produce.
pub const MIN_GENERATED_PASSWORD_LEN: usize = 8;

/// Longest password [`generate_password`] will produce.
pub const MAX_GENERATED_PASSWORD_LEN: usize = 64;

/// Generates a 32-character recovery phrase (uppercase letters and digits).
///
/// Shown to the user exactly once at signup; never stored anywhere.
pub fn generate_recovery_phrase() -> String {
    sample_chars(PHRASE_CHARSET, RECOVERY_PHRASE_LEN)
}

/// Generates a random device secret for the biometric factor.
///
/// 256 bits of OS entropy, base64-encoded so it can feed the same
/// string-based derivation path as the other factors.
pub fn generate_device_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Generates a random password of `len` printable characters.
///
/// `len` is clamped to 8..=64.
pub fn generate_password(len: usize) -> String {
    let len = len.clamp(MIN_GENERATED_PASSWORD_LEN, MAX_GENERATED_PASSWORD_LEN);
    sample_chars(PASSWORD_CHARSET, len)
}

fn sample_chars(charset: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| charset[rng.random_range(0..charset.len())] as char)
        .collect()
}
