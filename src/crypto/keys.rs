//! Media Vault - Key Management
//!
//! Wraps the password-derived master key and derives the specialized subkeys
//! via HKDF-SHA256 with distinct context labels.

use hkdf::Hkdf;
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use uuid::Uuid;
use zeroize::ZeroizeOnDrop;

use crate::error::{VaultError, VaultResult};

/// Key length for AES-256 and XChaCha20
pub const KEY_LEN: usize = 32;

/// Salt length for password derivation (persisted plaintext)
pub const SALT_LEN: usize = 32;

/// HKDF contexts for subkey derivation
pub mod contexts {
    /// Context for per-media file keys
    pub const FILE: &[u8] = b"media-vault:file:v1";

    /// Context for per-media thumbnail keys
    pub const THUMB: &[u8] = b"media-vault:thumb:v1";

    /// Context for the metadata-index encryption key
    pub const INDEX: &[u8] = b"media-vault:index:v1";
}

/// Secure key wrapper with automatic zeroization
#[derive(Clone, ZeroizeOnDrop)]
pub struct VaultKey {
    #[zeroize(skip)]
    inner: Secret<[u8; KEY_LEN]>,
}

impl VaultKey {
    /// Create a new vault key from bytes
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            inner: Secret::new(bytes),
        }
    }

    /// Expose the key bytes (use with caution)
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        self.inner.expose_secret()
    }

    /// Generate a random key
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(bytes)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material never appears in Debug output or logs.
        f.write_str("VaultKey(..)")
    }
}

/// Holds the unlocked master key and derives everything else from it.
///
/// File and thumbnail keys depend on (password, salt) alone so blobs remain
/// recoverable on a replacement device. The index key additionally mixes in
/// the device-bound hardware key when one is available; the index is
/// device-local and rebuilt after recovery.
pub struct KeyManager {
    master: VaultKey,
    index_key: VaultKey,
}

impl KeyManager {
    /// Build the subkey hierarchy from the master key.
    pub fn new(master: VaultKey, device_key: Option<&VaultKey>) -> VaultResult<Self> {
        let index_key = derive_key(
            master.expose(),
            device_key.map(|k| k.expose().as_slice()).unwrap_or(b""),
            contexts::INDEX,
        )?;

        Ok(Self { master, index_key })
    }

    /// Get the metadata-index encryption key
    pub fn index_key(&self) -> &VaultKey {
        &self.index_key
    }

    /// Derive the unique content key for a media item
    pub fn file_key(&self, id: &Uuid) -> VaultResult<VaultKey> {
        derive_key(self.master.expose(), id.as_bytes(), contexts::FILE)
    }

    /// Derive the unique thumbnail key for a media item
    pub fn thumb_key(&self, id: &Uuid) -> VaultResult<VaultKey> {
        derive_key(self.master.expose(), id.as_bytes(), contexts::THUMB)
    }
}

/// Derive a key using HKDF-SHA256
pub fn derive_key(ikm: &[u8], salt: &[u8], info: &[u8]) -> VaultResult<VaultKey> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = [0u8; KEY_LEN];

    hk.expand(info, &mut okm)
        .map_err(|e| VaultError::KeyDerivationFailed(e.to_string()))?;

    Ok(VaultKey::new(okm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subkeys_are_domain_separated() {
        let km = KeyManager::new(VaultKey::new([0x42; KEY_LEN]), None).unwrap();
        let id = Uuid::new_v4();

        let file = km.file_key(&id).unwrap();
        let thumb = km.thumb_key(&id).unwrap();
        assert_ne!(file.expose(), thumb.expose());
        assert_ne!(file.expose(), km.index_key().expose());
    }

    #[test]
    fn test_file_keys_deterministic_per_id() {
        let km = KeyManager::new(VaultKey::new([0x42; KEY_LEN]), None).unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert_eq!(km.file_key(&a).unwrap().expose(), km.file_key(&a).unwrap().expose());
        assert_ne!(km.file_key(&a).unwrap().expose(), km.file_key(&b).unwrap().expose());
    }

    #[test]
    fn test_device_key_only_affects_index_key() {
        let master = VaultKey::new([0x42; KEY_LEN]);
        let device = VaultKey::new([0x99; KEY_LEN]);
        let id = Uuid::new_v4();

        let km_plain = KeyManager::new(master.clone(), None).unwrap();
        let km_hw = KeyManager::new(master, Some(&device)).unwrap();

        assert_ne!(km_plain.index_key().expose(), km_hw.index_key().expose());
        // Blobs stay recoverable from (password, salt) alone.
        assert_eq!(
            km_plain.file_key(&id).unwrap().expose(),
            km_hw.file_key(&id).unwrap().expose()
        );
    }
}
