//! Media Vault - Encrypted File Store
//!
//! Maps media ids to encrypted blobs on disk. Writes stream through the
//! encrypting sink into a temporary file that is renamed into place only
//! after the final authentication tag is sealed; a crash mid-write never
//! leaves a partial file visible as vault content. Reads are lazy: bytes
//! decrypt as the consumer pulls them.
//!
//! Operations on one media id serialize through a per-id lock (readers
//! shared, writers exclusive); distinct ids are independent.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{Mutex, RawRwLock, RwLock};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::crypto::keys::VaultKey;
use crate::crypto::stream::{DecryptingSource, EncryptingSink};
use crate::error::{VaultError, VaultResult};

const MEDIA_DIR: &str = "media";
const THUMBS_DIR: &str = "thumbs";
const BLOB_EXT: &str = "enc";
const TMP_EXT: &str = "enc.tmp";

type IdLock = Arc<RwLock<()>>;
type ReadGuard = ArcRwLockReadGuard<RawRwLock, ()>;
type WriteGuard = ArcRwLockWriteGuard<RawRwLock, ()>;

/// Lazy decrypting byte source for one media item.
///
/// Holds the shared per-id lock for as long as it lives, so a writer cannot
/// replace the blob under an active reader. Dropping it cancels the read.
pub struct MediaReader {
    source: DecryptingSource<File>,
    _guard: ReadGuard,
}

impl Read for MediaReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.source.read(out)
    }
}

/// Encrypted blob store under a private storage root.
pub struct VaultFileStore {
    root: PathBuf,
    locks: Mutex<HashMap<Uuid, IdLock>>,
}

impl VaultFileStore {
    pub fn new(root: &Path) -> VaultResult<Self> {
        fs::create_dir_all(root.join(MEDIA_DIR))?;
        fs::create_dir_all(root.join(THUMBS_DIR))?;

        Ok(Self {
            root: root.to_path_buf(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn id_lock(&self, id: &Uuid) -> IdLock {
        let mut locks = self.locks.lock();
        locks
            .entry(*id)
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    fn media_path(&self, id: &Uuid) -> PathBuf {
        self.root.join(MEDIA_DIR).join(format!("{id}.{BLOB_EXT}"))
    }

    fn thumb_path(&self, id: &Uuid) -> PathBuf {
        self.root.join(THUMBS_DIR).join(format!("{id}.{BLOB_EXT}"))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WRITE
    // ═══════════════════════════════════════════════════════════════════════

    /// Encrypt `src` into the media blob for `id`. Returns the encrypted
    /// size on disk.
    pub fn write(&self, id: &Uuid, key: &VaultKey, src: &mut dyn Read) -> VaultResult<u64> {
        let lock = self.id_lock(id);
        let _guard: WriteGuard = lock.write_arc();
        self.encrypt_to(&self.media_path(id), key, src)
    }

    /// Encrypt an in-memory thumbnail into the thumb blob for `id`.
    pub fn write_thumb(&self, id: &Uuid, key: &VaultKey, bytes: &[u8]) -> VaultResult<u64> {
        let lock = self.id_lock(id);
        let _guard: WriteGuard = lock.write_arc();
        self.encrypt_to(&self.thumb_path(id), key, &mut io::Cursor::new(bytes))
    }

    /// Stream-encrypt into `path` via tmp + fsync + rename. The destination
    /// appears only after the final tag is sealed.
    fn encrypt_to(&self, path: &Path, key: &VaultKey, src: &mut dyn Read) -> VaultResult<u64> {
        let tmp = path.with_extension(TMP_EXT);

        let result = (|| -> VaultResult<u64> {
            let file = File::create(&tmp)?;
            let mut sink = EncryptingSink::new(key, file)?;
            io::copy(src, &mut sink).map_err(VaultError::from_io)?;
            let file = sink.finish()?;
            file.sync_all()?;
            fs::rename(&tmp, path)?;
            Ok(fs::metadata(path)?.len())
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    // ═══════════════════════════════════════════════════════════════════════
    // READ
    // ═══════════════════════════════════════════════════════════════════════

    /// Open a lazy decrypting source over the media blob for `id`.
    pub fn read(&self, id: &Uuid, key: &VaultKey) -> VaultResult<MediaReader> {
        let lock = self.id_lock(id);
        let guard: ReadGuard = lock.read_arc();

        let file = File::open(self.media_path(id)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                VaultError::MediaNotFound(*id)
            } else {
                VaultError::Io(e)
            }
        })?;

        Ok(MediaReader {
            source: DecryptingSource::new(key, file)?,
            _guard: guard,
        })
    }

    /// Decrypt the thumbnail blob for `id` fully into memory.
    pub fn read_thumb(&self, id: &Uuid, key: &VaultKey) -> VaultResult<Vec<u8>> {
        let lock = self.id_lock(id);
        let _guard: ReadGuard = lock.read_arc();

        let file = File::open(self.thumb_path(id)).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                VaultError::MediaNotFound(*id)
            } else {
                VaultError::Io(e)
            }
        })?;

        let mut source = DecryptingSource::new(key, file)?;
        let mut out = Vec::new();
        source.read_to_end(&mut out).map_err(VaultError::from_io)?;
        Ok(out)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DELETE / INSPECT
    // ═══════════════════════════════════════════════════════════════════════

    /// Remove the media blob and its thumbnail. Ciphertext without the key is
    /// already opaque, so no overwrite pass is needed.
    pub fn delete(&self, id: &Uuid) -> VaultResult<()> {
        let lock = self.id_lock(id);
        let _guard: WriteGuard = lock.write_arc();

        let media = self.media_path(id);
        if media.exists() {
            fs::remove_file(&media)?;
        }
        let _ = fs::remove_file(self.thumb_path(id)); // thumb might not exist

        debug!("deleted blob {id}");
        Ok(())
    }

    pub fn exists(&self, id: &Uuid) -> bool {
        self.media_path(id).exists()
    }

    pub fn thumb_exists(&self, id: &Uuid) -> bool {
        self.thumb_path(id).exists()
    }

    pub fn encrypted_size(&self, id: &Uuid) -> VaultResult<u64> {
        Ok(fs::metadata(self.media_path(id))?.len())
    }

    /// Remove every blob (vault reset). The directories survive, empty.
    pub fn wipe_all(&self) -> VaultResult<()> {
        for dir in [MEDIA_DIR, THUMBS_DIR] {
            let path = self.root.join(dir);
            fs::remove_dir_all(&path)?;
            fs::create_dir_all(&path)?;
        }
        Ok(())
    }

    /// Total bytes of encrypted content on disk (media + thumbnails).
    pub fn total_encrypted_bytes(&self) -> u64 {
        WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum()
    }
}
