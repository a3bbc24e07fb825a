//! # Media Vault
//!
//! Local encrypted media vault: photos, video, audio and notes are stored
//! on-device such that plaintext never persists to disk, and a user password
//! (not the device alone) protects the data so it survives device
//! replacement.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       MEDIA VAULT                        │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │ SECRET STORE│  │ FILE STORE   │  │ MEDIA INDEX    │  │
//! │  │ PBKDF2 +    │  │ streaming    │  │ encrypted      │  │
//! │  │ lock machine│  │ AES-256-GCM  │  │ SQLite rows    │  │
//! │  └──────┬──────┘  └──────┬───────┘  └───────┬────────┘  │
//! │         │                │                  │           │
//! │  ┌──────┴────────────────┴──────────────────┴────────┐  │
//! │  │     MASTER KEY → HKDF → K_file / K_thumb / K_idx  │  │
//! │  └───────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │ THUMBNAIL   │  │ MEMORY CACHE │  │ WORKER POOL    │  │
//! │  │ ENGINE      │  │ (pressure-   │  │ (backfill)     │  │
//! │  │             │  │  evicted)    │  │                │  │
//! │  └─────────────┘  └──────────────┘  └────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Media encrypted with chunked AES-256-GCM; any tampering or truncation
//!   fails authentication before a single plaintext byte is served
//! - Per-item keys derived via HKDF from a PBKDF2 password key
//! - Password verifier derived on a separate path from the encryption key
//! - Salt persisted plaintext for cross-device recovery; everything else
//!   derives from the password
//! - Key material zeroized at lock; decrypted caches evicted under memory
//!   pressure

pub mod cache;
pub mod crypto;
pub mod error;
pub mod index;
pub mod keystore;
pub mod store;
pub mod thumbs;
pub mod vault;
pub mod workers;

pub use cache::{MemoryPressure, ThumbCache};
pub use error::{VaultError, VaultResult};
pub use keystore::{HardwareKeyProvider, LockState, NoHardwareKey, SecretStore, StaticDeviceKey};
pub use store::{MediaReader, VaultFileStore};
pub use thumbs::ThumbnailEngine;
pub use vault::{MediaKind, MediaRecord, MediaVault, UploadState, VaultConfig, VaultStats};

/// Media Vault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
