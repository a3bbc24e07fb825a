//! Media Vault - Media Index (Encrypted Metadata Database)
//!
//! Stores media records in SQLite with every row sealed under the index key
//! before insert. The database file itself holds only ciphertext blobs plus
//! opaque ids and timestamps for ordering. Writers use transactions so a
//! crash mid-write never leaves metadata referencing a nonexistent blob.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::crypto::aead::{open_xchacha, seal_xchacha};
use crate::crypto::keys::VaultKey;
use crate::error::{VaultError, VaultResult};
use crate::vault::MediaRecord;

/// Encrypted metadata index for media records
pub struct MediaIndex {
    conn: Mutex<Connection>,
}

impl MediaIndex {
    /// Open (or create) the index database under `<root>/db`.
    pub fn open(root: &Path) -> VaultResult<Self> {
        let db_dir = root.join("db");
        std::fs::create_dir_all(&db_dir)?;

        let conn = Connection::open(db_dir.join("index.db"))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media (
                id TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_media_created ON media(created_at);
            "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a record. Runs inside a transaction.
    pub fn add(&self, record: &MediaRecord, key: &VaultKey) -> VaultResult<()> {
        let json = serde_json::to_vec(record)?;
        let sealed = seal_xchacha(key, &json)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO media (id, data, created_at) VALUES (?1, ?2, ?3)",
            params![
                record.id.to_string(),
                sealed,
                record.created_at.to_rfc3339()
            ],
        )?;
        tx.commit()?;

        Ok(())
    }

    /// Fetch and decrypt one record.
    pub fn get(&self, id: &Uuid, key: &VaultKey) -> VaultResult<MediaRecord> {
        let sealed: Vec<u8> = {
            let conn = self.conn.lock();
            conn.query_row(
                "SELECT data FROM media WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(|_| VaultError::MediaNotFound(*id))?
        };

        let json = open_xchacha(key, &sealed)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Decrypt every record, newest first. An undecryptable row is an
    /// explicit failure, never a silently shorter list.
    pub fn list(&self, key: &VaultKey) -> VaultResult<Vec<MediaRecord>> {
        let sealed_rows: Vec<Vec<u8>> = {
            let conn = self.conn.lock();
            let mut stmt = conn.prepare("SELECT data FROM media ORDER BY created_at DESC")?;
            let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut records = Vec::with_capacity(sealed_rows.len());
        for sealed in sealed_rows {
            let json = open_xchacha(key, &sealed)?;
            records.push(serde_json::from_slice(&json)?);
        }
        Ok(records)
    }

    /// Remove a record.
    pub fn remove(&self, id: &Uuid) -> VaultResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM media WHERE id = ?1", params![id.to_string()])?;
        Ok(())
    }

    pub fn count(&self) -> VaultResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM media", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Drop every record (vault reset).
    pub fn clear(&self) -> VaultResult<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM media", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{MediaKind, MediaRecord, UploadState};
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(name: &str) -> MediaRecord {
        MediaRecord {
            id: Uuid::new_v4(),
            kind: MediaKind::Photo,
            original_name: name.into(),
            created_at: Utc::now(),
            encrypted_size: 1234,
            has_thumbnail: false,
            upload_state: UploadState::Local,
        }
    }

    #[test]
    fn test_add_get_round_trip() {
        let dir = tempdir().unwrap();
        let index = MediaIndex::open(dir.path()).unwrap();
        let key = VaultKey::generate();

        let rec = record("IMG_0001.jpg");
        index.add(&rec, &key).unwrap();

        let loaded = index.get(&rec.id, &key).unwrap();
        assert_eq!(loaded.original_name, "IMG_0001.jpg");
        assert_eq!(loaded.encrypted_size, 1234);
    }

    #[test]
    fn test_rows_are_ciphertext_on_disk() {
        let dir = tempdir().unwrap();
        let index = MediaIndex::open(dir.path()).unwrap();
        let key = VaultKey::generate();

        index.add(&record("secret-name.jpg"), &key).unwrap();
        drop(index);

        let raw = std::fs::read(dir.path().join("db").join("index.db")).unwrap();
        let needle = b"secret-name";
        assert!(
            !raw.windows(needle.len()).any(|w| w == needle),
            "record fields must not appear in plaintext in the database file"
        );
    }

    #[test]
    fn test_wrong_key_is_explicit_failure() {
        let dir = tempdir().unwrap();
        let index = MediaIndex::open(dir.path()).unwrap();

        let rec = record("a.jpg");
        index.add(&rec, &VaultKey::generate()).unwrap();

        assert!(matches!(
            index.get(&rec.id, &VaultKey::generate()),
            Err(VaultError::AuthenticationFailure)
        ));
        assert!(matches!(
            index.list(&VaultKey::generate()),
            Err(VaultError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let dir = tempdir().unwrap();
        let index = MediaIndex::open(dir.path()).unwrap();
        let key = VaultKey::generate();

        let mut older = record("older.jpg");
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = record("newer.jpg");

        index.add(&older, &key).unwrap();
        index.add(&newer, &key).unwrap();

        let all = index.list(&key).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].original_name, "newer.jpg");
    }

    #[test]
    fn test_remove_and_count() {
        let dir = tempdir().unwrap();
        let index = MediaIndex::open(dir.path()).unwrap();
        let key = VaultKey::generate();

        let rec = record("gone.jpg");
        index.add(&rec, &key).unwrap();
        assert_eq!(index.count().unwrap(), 1);

        index.remove(&rec.id).unwrap();
        assert_eq!(index.count().unwrap(), 0);
        assert!(matches!(
            index.get(&rec.id, &key),
            Err(VaultError::MediaNotFound(_))
        ));
    }
}
