//! Media Vault - Secret Store
//!
//! Process-wide holder of the unlocked master key. Owns the
//! `Locked → Unlocking → Unlocked` state machine, the salt and
//! password-verifier files, and the recovery-token encoding.
//!
//! The salt is persisted in plaintext: its secrecy is not required, only its
//! uniqueness and integrity. The verifier is derived on a separate path from
//! the encryption key (see [`crate::crypto::kdf`]), so neither file on disk
//! reveals key material.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::crypto::kdf::{derive_master_key, derive_verifier, verify_password};
use crate::crypto::keys::{KeyManager, VaultKey, KEY_LEN, SALT_LEN};
use crate::error::{VaultError, VaultResult};

const SALT_FILE: &str = "salt.bin";
const VERIFIER_FILE: &str = "verifier.bin";

/// Recovery token prefix; bumped if the token layout ever changes.
const TOKEN_PREFIX: &str = "MVT1";

/// Checksum bytes appended to the token to catch corruption.
const TOKEN_CHECKSUM_LEN: usize = 4;

/// Lock state machine. `Locked` is the initial and only terminal-safe state;
/// process exit forces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Locked,
    Unlocking,
    Unlocked,
}

/// Capability interface for device-bound key storage.
///
/// Platforms with hardware-backed storage hand the device key to the store at
/// construction; everything degrades gracefully to password-derived
/// protection alone when none is available.
pub trait HardwareKeyProvider: Send + Sync {
    /// The device-bound key, if the platform offers one.
    fn device_key(&self) -> Option<VaultKey>;
}

/// The unavailable variant: no hardware-backed storage on this device.
pub struct NoHardwareKey;

impl HardwareKeyProvider for NoHardwareKey {
    fn device_key(&self) -> Option<VaultKey> {
        None
    }
}

/// The available variant: a key already released by platform secure storage.
pub struct StaticDeviceKey(pub VaultKey);

impl HardwareKeyProvider for StaticDeviceKey {
    fn device_key(&self) -> Option<VaultKey> {
        Some(self.0.clone())
    }
}

struct StoreInner {
    state: LockState,
    keys: Option<Arc<KeyManager>>,
    last_activity: Instant,
}

/// Process-wide, lifecycle-scoped holder of the unlocked master key.
pub struct SecretStore {
    keys_dir: PathBuf,
    device_key: Option<VaultKey>,
    auto_lock_after: Duration,
    inner: Mutex<StoreInner>,
    transition: Condvar,
}

impl SecretStore {
    /// Open the store rooted at `<vault_root>/keys`. Starts `Locked`.
    pub fn new(
        vault_root: &Path,
        hardware: &dyn HardwareKeyProvider,
        auto_lock_after: Duration,
    ) -> VaultResult<Self> {
        let keys_dir = vault_root.join("keys");
        fs::create_dir_all(&keys_dir)?;

        Ok(Self {
            keys_dir,
            device_key: hardware.device_key(),
            auto_lock_after,
            inner: Mutex::new(StoreInner {
                state: LockState::Locked,
                keys: None,
                last_activity: Instant::now(),
            }),
            transition: Condvar::new(),
        })
    }

    /// Whether a salt (and therefore a vault) exists at this root.
    pub fn is_initialized(&self) -> bool {
        self.keys_dir.join(SALT_FILE).exists()
    }

    pub fn state(&self) -> LockState {
        self.inner.lock().state
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SETUP / UNLOCK / LOCK
    // ═══════════════════════════════════════════════════════════════════════

    /// First-time password setup: generates the salt, persists salt and
    /// verifier, unlocks, and returns the recovery token.
    pub fn setup_password(&self, password: &str) -> VaultResult<String> {
        check_password_strength(password)?;

        if self.is_initialized() {
            return Err(VaultError::AlreadyInitialized);
        }

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        self.persist_credentials(&salt, password)?;
        self.install_session(derive_master_key(password, &salt))?;

        info!("vault initialized, salt persisted");
        Ok(encode_recovery_token(&salt))
    }

    /// Unlock with a password. Verifies against the stored verifier first so
    /// a wrong password fast-fails without touching any encrypted file, then
    /// derives the master key.
    ///
    /// Concurrent unlock attempts serialize: one derivation runs at a time,
    /// and callers that arrive while another unlock is in flight wait for and
    /// share its outcome rather than re-deriving.
    pub fn unlock(&self, password: &str) -> VaultResult<()> {
        let mut inner = self.inner.lock();
        loop {
            match inner.state {
                LockState::Unlocked => return Ok(()),
                LockState::Unlocking => self.transition.wait(&mut inner),
                LockState::Locked => break,
            }
        }
        inner.state = LockState::Unlocking;
        drop(inner);

        // PBKDF2 runs outside the lock; waiters park on the condvar.
        let outcome = self.derive_session(password);

        let mut inner = self.inner.lock();
        match outcome {
            Ok(manager) => {
                inner.keys = Some(Arc::new(manager));
                inner.state = LockState::Unlocked;
                inner.last_activity = Instant::now();
                self.transition.notify_all();
                info!("vault unlocked");
                Ok(())
            }
            Err(e) => {
                inner.state = LockState::Locked;
                self.transition.notify_all();
                Err(e)
            }
        }
    }

    /// Lock the store. The master key and every derived subkey are zeroized
    /// as the key manager drops, not merely released.
    pub fn lock(&self) {
        let mut inner = self.inner.lock();
        inner.keys = None;
        inner.state = LockState::Locked;
        debug!("vault locked, key material zeroized");
    }

    /// Lock if the auth timeout elapsed since the last touched operation.
    /// Returns true when this call performed the lock.
    pub fn lock_if_expired(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == LockState::Unlocked
            && inner.last_activity.elapsed() > self.auto_lock_after
        {
            inner.keys = None;
            inner.state = LockState::Locked;
            info!("vault auto-locked after inactivity");
            return true;
        }
        false
    }

    /// The active session keys, or `KeyUnavailable` while locked. Also
    /// refreshes the activity timestamp.
    pub fn session(&self) -> VaultResult<Arc<KeyManager>> {
        let mut inner = self.inner.lock();
        inner.last_activity = Instant::now();
        inner.keys.clone().ok_or(VaultError::KeyUnavailable)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // RECOVERY
    // ═══════════════════════════════════════════════════════════════════════

    /// Export the salt as a recovery token. Only permitted while unlocked:
    /// possession of the password is proven before recovery material is
    /// revealed.
    pub fn export_salt(&self) -> VaultResult<String> {
        if self.inner.lock().state != LockState::Unlocked {
            return Err(VaultError::KeyUnavailable);
        }
        let salt = self.load_salt()?;
        Ok(encode_recovery_token(&salt))
    }

    /// New-device setup: adopt the salt from a recovery token and unlock with
    /// the password. Refused once a salt already exists locally.
    ///
    /// There is nothing local to verify the password against at this point; a
    /// wrong password surfaces as `AuthenticationFailure` when the first
    /// re-supplied blob is read.
    pub fn import_and_unlock(&self, token: &str, password: &str) -> VaultResult<()> {
        if self.is_initialized() {
            return Err(VaultError::AlreadyInitialized);
        }

        let salt = decode_recovery_token(token)?;
        self.persist_credentials(&salt, password)?;
        self.install_session(derive_master_key(password, &salt))?;

        info!("vault recovered from salt token");
        Ok(())
    }

    /// Destroy the credentials. Locks first; all prior data becomes
    /// permanently unreadable.
    pub fn reset(&self) -> VaultResult<()> {
        self.lock();
        for file in [SALT_FILE, VERIFIER_FILE] {
            let path = self.keys_dir.join(file);
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        warn!("vault credentials destroyed");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INTERNALS
    // ═══════════════════════════════════════════════════════════════════════

    fn derive_session(&self, password: &str) -> VaultResult<KeyManager> {
        let salt = self.load_salt()?;
        let verifier = self.load_verifier()?;

        if !verify_password(password, &salt, &verifier) {
            return Err(VaultError::WrongPassword);
        }

        KeyManager::new(derive_master_key(password, &salt), self.device_key.as_ref())
    }

    fn install_session(&self, master: VaultKey) -> VaultResult<()> {
        let manager = KeyManager::new(master, self.device_key.as_ref())?;
        let mut inner = self.inner.lock();
        inner.keys = Some(Arc::new(manager));
        inner.state = LockState::Unlocked;
        inner.last_activity = Instant::now();
        self.transition.notify_all();
        Ok(())
    }

    fn persist_credentials(&self, salt: &[u8; SALT_LEN], password: &str) -> VaultResult<()> {
        let verifier = derive_verifier(password, salt);
        write_atomic(&self.keys_dir.join(SALT_FILE), salt)?;
        write_atomic(&self.keys_dir.join(VERIFIER_FILE), &verifier)?;
        Ok(())
    }

    fn load_salt(&self) -> VaultResult<[u8; SALT_LEN]> {
        let bytes = fs::read(self.keys_dir.join(SALT_FILE))
            .map_err(|_| VaultError::NotInitialized)?;
        bytes
            .try_into()
            .map_err(|_| VaultError::Crypto("salt file has wrong length".into()))
    }

    fn load_verifier(&self) -> VaultResult<[u8; KEY_LEN]> {
        let bytes = fs::read(self.keys_dir.join(VERIFIER_FILE))
            .map_err(|_| VaultError::NotInitialized)?;
        bytes
            .try_into()
            .map_err(|_| VaultError::Crypto("verifier file has wrong length".into()))
    }
}

/// Minimum acceptable password: 8+ characters with at least one digit.
fn check_password_strength(password: &str) -> VaultResult<()> {
    if password.len() < 8 {
        return Err(VaultError::WeakPassword(
            "must be at least 8 characters".into(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(VaultError::WeakPassword(
            "must contain at least one digit".into(),
        ));
    }
    Ok(())
}

/// Write small credential files atomically (tmp + rename).
fn write_atomic(path: &Path, data: &[u8]) -> VaultResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════
// Recovery token
// ═══════════════════════════════════════════════════════════════════════════

/// Encode the salt as a printable token: `MVT1.<base64 salt>.<hex checksum>`.
/// The token is not secret, but corruption must be detected, never silently
/// derive a wrong key.
pub fn encode_recovery_token(salt: &[u8; SALT_LEN]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    let checksum = &Sha256::digest(salt)[..TOKEN_CHECKSUM_LEN];
    format!(
        "{TOKEN_PREFIX}.{}.{}",
        STANDARD.encode(salt),
        hex::encode(checksum)
    )
}

/// Decode and integrity-check a recovery token.
pub fn decode_recovery_token(token: &str) -> VaultResult<[u8; SALT_LEN]> {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let mut parts = token.trim().split('.');
    let (prefix, body, checksum) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(p), Some(b), Some(c), None) => (p, b, c),
        _ => return Err(VaultError::InvalidRecoveryToken),
    };

    if prefix != TOKEN_PREFIX {
        return Err(VaultError::InvalidRecoveryToken);
    }

    let salt: [u8; SALT_LEN] = STANDARD
        .decode(body)
        .map_err(|_| VaultError::InvalidRecoveryToken)?
        .try_into()
        .map_err(|_| VaultError::InvalidRecoveryToken)?;

    let expected = hex::encode(&Sha256::digest(salt)[..TOKEN_CHECKSUM_LEN]);
    if checksum != expected {
        return Err(VaultError::InvalidRecoveryToken);
    }

    Ok(salt)
}
