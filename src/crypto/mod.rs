//! Media Vault - Cryptography
//!
//! PBKDF2 password derivation, HKDF subkey derivation, streaming AES-256-GCM
//! for media blobs, XChaCha20-Poly1305 for metadata rows.

pub mod aead;
pub mod kdf;
pub mod keys;
pub mod stream;

pub use aead::{open_xchacha, seal_xchacha};
pub use kdf::{derive_master_key, derive_verifier, verify_password};
pub use keys::{KeyManager, VaultKey, KEY_LEN, SALT_LEN};
pub use stream::{DecryptingSource, EncryptingSink};
