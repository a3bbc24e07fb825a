//! Media Vault - Password Key Derivation
//!
//! Turns (password, salt) into the 256-bit master key and the stored password
//! verifier. The two derivations use different context labels appended to the
//! salt, so the verifier on disk can never be used to reconstruct the
//! encryption key.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::keys::{VaultKey, KEY_LEN, SALT_LEN};

/// PBKDF2-HMAC-SHA256 iteration count. Deliberately slow (~50-200ms depending
/// on device); changing this invalidates every existing verifier and key.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Context label for the encryption-key derivation path.
const CONTEXT_ENCRYPTION: &[u8] = b"media-vault:kdf:enc:v1";

/// Context label for the password-verifier derivation path.
const CONTEXT_VERIFIER: &[u8] = b"media-vault:kdf:verify:v1";

/// Derive the 32-byte master key from (password, salt).
///
/// Deterministic: identical inputs always yield the identical key. This is
/// what makes salt-based recovery on a replacement device possible. A wrong
/// password is not an error here; it surfaces later as an authentication
/// failure during decryption.
pub fn derive_master_key(password: &str, salt: &[u8; SALT_LEN]) -> VaultKey {
    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        &contextualized(salt, CONTEXT_ENCRYPTION),
        PBKDF2_ITERATIONS,
        &mut *okm,
    );
    VaultKey::new(*okm)
}

/// Derive the 32-byte password verifier persisted next to the salt.
///
/// Uses a separate derivation context from [`derive_master_key`]; knowledge of
/// the verifier reveals nothing about the encryption key.
pub fn derive_verifier(password: &str, salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
    let mut okm = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        &contextualized(salt, CONTEXT_VERIFIER),
        PBKDF2_ITERATIONS,
        &mut okm,
    );
    okm
}

/// Check a password against a stored verifier. Never fails with a crypto
/// error for a merely-wrong password.
pub fn verify_password(password: &str, salt: &[u8; SALT_LEN], verifier: &[u8; KEY_LEN]) -> bool {
    let computed = derive_verifier(password, salt);
    constant_time_eq(&computed, verifier)
}

fn contextualized(salt: &[u8; SALT_LEN], context: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SALT_LEN + context.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(context);
    out
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8; KEY_LEN], b: &[u8; KEY_LEN]) -> bool {
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: [u8; SALT_LEN] = [7u8; SALT_LEN];

    #[test]
    fn test_derivation_is_deterministic() {
        let k1 = derive_master_key("Tr0ub4dor&3", &SALT);
        let k2 = derive_master_key("Tr0ub4dor&3", &SALT);
        assert_eq!(k1.expose(), k2.expose());
    }

    #[test]
    fn test_different_salt_different_key() {
        let other = [8u8; SALT_LEN];
        let k1 = derive_master_key("Tr0ub4dor&3", &SALT);
        let k2 = derive_master_key("Tr0ub4dor&3", &other);
        assert_ne!(k1.expose(), k2.expose());
    }

    #[test]
    fn test_verifier_and_key_are_domain_separated() {
        let key = derive_master_key("Tr0ub4dor&3", &SALT);
        let verifier = derive_verifier("Tr0ub4dor&3", &SALT);
        assert_ne!(key.expose(), &verifier);
    }

    #[test]
    fn test_verify_matches_only_original_password() {
        let verifier = derive_verifier("correct horse", &SALT);
        assert!(verify_password("correct horse", &SALT, &verifier));
        assert!(!verify_password("correct_horse", &SALT, &verifier));
        assert!(!verify_password("", &SALT, &verifier));
    }
}
