//! Media Vault - One-shot AEAD for metadata rows
//!
//! XChaCha20-Poly1305 for the small encrypted records in the index database.
//! Media content goes through [`crate::crypto::stream`] instead; this path is
//! for payloads that always fit in memory.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};

use crate::crypto::keys::VaultKey;
use crate::error::{VaultError, VaultResult};

/// Nonce length for XChaCha20-Poly1305
pub const XNONCE_LEN: usize = 24;

/// Poly1305 tag length
const TAG_LEN: usize = 16;

/// Encrypt a small payload; output is `[24-byte nonce][ciphertext + tag]`.
pub fn seal_xchacha(key: &VaultKey, plaintext: &[u8]) -> VaultResult<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new_from_slice(key.expose())
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    let nonce_bytes = generate_xnonce();
    let nonce = XNonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    let mut out = Vec::with_capacity(XNONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a payload produced by [`seal_xchacha`].
pub fn open_xchacha(key: &VaultKey, blob: &[u8]) -> VaultResult<Vec<u8>> {
    if blob.len() < XNONCE_LEN + TAG_LEN {
        return Err(VaultError::AuthenticationFailure);
    }

    let cipher = XChaCha20Poly1305::new_from_slice(key.expose())
        .map_err(|e| VaultError::Crypto(e.to_string()))?;

    let nonce = XNonce::from_slice(&blob[..XNONCE_LEN]);

    cipher
        .decrypt(nonce, &blob[XNONCE_LEN..])
        .map_err(|_| VaultError::AuthenticationFailure)
}

fn generate_xnonce() -> [u8; XNONCE_LEN] {
    use rand::RngCore;
    let mut nonce = [0u8; XNONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}
