//! Media Vault - Error Types

use thiserror::Error;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    // ═══════════════════════════════════════════════════════════════
    // PASSWORD / KEY ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Wrong password")]
    WrongPassword,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Vault is locked - unlock before accessing encrypted content")]
    KeyUnavailable,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // ═══════════════════════════════════════════════════════════════
    // CRYPTO ERRORS
    // ═══════════════════════════════════════════════════════════════

    /// GCM tag mismatch, truncated ciphertext, or wrong key. The data is
    /// corrupted, tampered, or encrypted under a different key.
    #[error("Authentication failed - file corrupted, tampered, or wrong key")]
    AuthenticationFailure,

    /// Crypto-provider failure unrelated to the data itself.
    #[error("Crypto error: {0}")]
    Crypto(String),

    // ═══════════════════════════════════════════════════════════════
    // SETUP / RECOVERY ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Vault already initialized - a salt exists at this root")]
    AlreadyInitialized,

    #[error("Vault not initialized - run password setup first")]
    NotInitialized,

    #[error("Invalid recovery token")]
    InvalidRecoveryToken,

    // ═══════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Media not found: {0}")]
    MediaNotFound(uuid::Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // ═══════════════════════════════════════════════════════════════
    // THUMBNAIL ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Thumbnail error: {0}")]
    Thumbnail(String),
}

impl VaultError {
    /// Errors a caller may retry (transient storage conditions).
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::Io(_) | VaultError::Database(_))
    }

    /// Errors that mean the data itself is unreadable; retrying cannot help.
    pub fn is_security_critical(&self) -> bool {
        matches!(self, VaultError::AuthenticationFailure)
    }

    /// Wrap for transport through `std::io::Read`/`Write` adapters.
    pub(crate) fn into_io(self) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, self)
    }

    /// Recover a `VaultError` smuggled through an `std::io::Error`, keeping
    /// plain IO errors as `Io`.
    pub fn from_io(err: std::io::Error) -> Self {
        let carries_vault_error = err
            .get_ref()
            .map(|inner| inner.is::<VaultError>())
            .unwrap_or(false);

        if carries_vault_error {
            let inner = err.into_inner().expect("checked by get_ref");
            *inner.downcast::<VaultError>().expect("checked by get_ref")
        } else {
            VaultError::Io(err)
        }
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        VaultError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Serialization(e.to_string())
    }
}

impl From<image::ImageError> for VaultError {
    fn from(e: image::ImageError) -> Self {
        VaultError::Thumbnail(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_round_trip_preserves_variant() {
        let io = VaultError::AuthenticationFailure.into_io();
        assert!(matches!(
            VaultError::from_io(io),
            VaultError::AuthenticationFailure
        ));
    }

    #[test]
    fn test_plain_io_error_stays_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(VaultError::from_io(io), VaultError::Io(_)));
    }
}
