//! Media Vault - Streaming Cipher
//!
//! Chunked AES-256-GCM over arbitrary `Read`/`Write` streams.
//!
//! Blob layout:
//! ```text
//! [FILE NONCE 12B][random, one per encryption call]
//! [FRAME 0][64 KiB ciphertext + 16B GCM tag]
//! [FRAME 1][...]
//! [FINAL FRAME][<64 KiB ciphertext + 16B GCM tag]
//! ```
//!
//! Each frame is sealed under a nonce derived from the file nonce and the
//! frame counter, with the counter and a final-frame flag bound as AAD.
//! Truncating the blob at any point, reordering frames, or appending trailing
//! bytes all fail authentication. Memory use is O(chunk), never O(file).
//!
//! Nonce generation lives here and only here; callers cannot supply one, so a
//! (key, nonce) pair can never be reused by a confused caller.

use std::io::{self, Read, Write};

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use zeroize::Zeroizing;

use crate::crypto::keys::VaultKey;
use crate::error::{VaultError, VaultResult};

/// Nonce length for AES-GCM (96 bits)
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Plaintext bytes per frame. Bounds peak memory for any stream size.
pub const CHUNK_LEN: usize = 64 * 1024;

/// On-disk bytes of a full (non-final) frame
const FRAME_LEN: usize = CHUNK_LEN + TAG_LEN;

/// Generate the fresh random file nonce for one encryption call
fn generate_file_nonce() -> [u8; NONCE_LEN] {
    use rand::RngCore;
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Per-frame nonce: file nonce with the trailing 4 bytes XORed with the
/// big-endian frame counter. Unique per frame under a unique file nonce.
fn frame_nonce(file_nonce: &[u8; NONCE_LEN], counter: u32) -> [u8; NONCE_LEN] {
    let mut nonce = *file_nonce;
    for (n, c) in nonce[NONCE_LEN - 4..].iter_mut().zip(counter.to_be_bytes()) {
        *n ^= c;
    }
    nonce
}

/// AAD binds the frame position and whether it terminates the stream
fn frame_aad(counter: u32, last: bool) -> [u8; 5] {
    let c = counter.to_be_bytes();
    [c[0], c[1], c[2], c[3], last as u8]
}

fn build_cipher(key: &VaultKey) -> VaultResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.expose()).map_err(|e| VaultError::Crypto(e.to_string()))
}

// ═══════════════════════════════════════════════════════════════════════════
// Encrypting sink
// ═══════════════════════════════════════════════════════════════════════════

/// Write-side half of the streaming cipher.
///
/// Accepts plaintext through `Write`, emits framed ciphertext to the inner
/// writer. Must be closed with [`EncryptingSink::finish`] to seal the final
/// frame; a sink that is dropped instead produces a blob that will fail
/// authentication, which is what makes abandoned writes harmless.
pub struct EncryptingSink<W: Write> {
    inner: W,
    cipher: Aes256Gcm,
    file_nonce: [u8; NONCE_LEN],
    buf: Zeroizing<Vec<u8>>,
    counter: u32,
}

impl<W: Write> EncryptingSink<W> {
    /// Open a sink over `inner`, writing the file-nonce header immediately.
    pub fn new(key: &VaultKey, mut inner: W) -> VaultResult<Self> {
        let cipher = build_cipher(key)?;
        let file_nonce = generate_file_nonce();
        inner.write_all(&file_nonce)?;

        Ok(Self {
            inner,
            cipher,
            file_nonce,
            buf: Zeroizing::new(Vec::with_capacity(CHUNK_LEN)),
            counter: 0,
        })
    }

    /// Seal the buffered plaintext as one frame and write it out.
    fn seal_frame(&mut self, last: bool) -> VaultResult<()> {
        let nonce_bytes = frame_nonce(&self.file_nonce, self.counter);
        let aad = frame_aad(self.counter, last);

        let frame = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: self.buf.as_slice(),
                    aad: &aad,
                },
            )
            .map_err(|e| VaultError::Crypto(e.to_string()))?;

        self.inner.write_all(&frame)?;
        self.buf.clear();
        self.counter = self
            .counter
            .checked_add(1)
            .ok_or_else(|| VaultError::Crypto("frame counter overflow".into()))?;
        Ok(())
    }

    /// Seal the final frame (possibly empty), flush, and return the inner
    /// writer. Only after this returns is the blob authenticated end to end.
    pub fn finish(mut self) -> VaultResult<W> {
        self.seal_frame(true)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for EncryptingSink<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let take = (CHUNK_LEN - self.buf.len()).min(data.len());
        self.buf.extend_from_slice(&data[..take]);

        if self.buf.len() == CHUNK_LEN {
            self.seal_frame(false).map_err(VaultError::into_io)?;
        }

        Ok(take)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Buffered plaintext cannot be flushed early: a frame is only written
        // once sealed. Flush the ciphertext already emitted.
        self.inner.flush()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Decrypting source
// ═══════════════════════════════════════════════════════════════════════════

/// Read-side half of the streaming cipher.
///
/// Pull-based: frames are read, verified, and decrypted one at a time as the
/// consumer asks for bytes. No plaintext byte is ever served before the tag
/// of its frame has verified. Dropping the source mid-stream is cancellation,
/// not an error.
pub struct DecryptingSource<R: Read> {
    inner: R,
    cipher: Aes256Gcm,
    file_nonce: [u8; NONCE_LEN],
    counter: u32,
    plain: Zeroizing<Vec<u8>>,
    pos: usize,
    /// One byte read past the current frame, proving it is not the last.
    lookahead: Option<u8>,
    done: bool,
}

impl<R: Read> DecryptingSource<R> {
    /// Open a source over `inner`, consuming the file-nonce header.
    pub fn new(key: &VaultKey, mut inner: R) -> VaultResult<Self> {
        let cipher = build_cipher(key)?;

        let mut file_nonce = [0u8; NONCE_LEN];
        inner.read_exact(&mut file_nonce).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                VaultError::AuthenticationFailure
            } else {
                VaultError::Io(e)
            }
        })?;

        Ok(Self {
            inner,
            cipher,
            file_nonce,
            counter: 0,
            plain: Zeroizing::new(Vec::new()),
            pos: 0,
            lookahead: None,
            done: false,
        })
    }

    /// Read, verify, and decrypt the next frame into `self.plain`.
    fn fill_next_frame(&mut self) -> VaultResult<()> {
        // Pull one byte beyond a full frame: reaching EOF first marks the
        // frame as final, anything else becomes the next frame's lookahead.
        let mut frame = Vec::with_capacity(FRAME_LEN + 1);
        if let Some(byte) = self.lookahead.take() {
            frame.push(byte);
        }

        let mut scratch = [0u8; 8192];
        while frame.len() < FRAME_LEN + 1 {
            let want = scratch.len().min(FRAME_LEN + 1 - frame.len());
            let n = self.inner.read(&mut scratch[..want])?;
            if n == 0 {
                break;
            }
            frame.extend_from_slice(&scratch[..n]);
        }

        let last = frame.len() <= FRAME_LEN;
        let ciphertext = if last {
            frame.as_slice()
        } else {
            self.lookahead = Some(frame[FRAME_LEN]);
            &frame[..FRAME_LEN]
        };

        if ciphertext.len() < TAG_LEN {
            // Truncated mid-frame (or header-only blob missing its final frame).
            return Err(VaultError::AuthenticationFailure);
        }

        let nonce_bytes = frame_nonce(&self.file_nonce, self.counter);
        let aad = frame_aad(self.counter, last);

        let plain = self
            .cipher
            .decrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: ciphertext,
                    aad: &aad,
                },
            )
            .map_err(|_| VaultError::AuthenticationFailure)?;

        self.plain = Zeroizing::new(plain);
        self.pos = 0;
        self.counter = self
            .counter
            .checked_add(1)
            .ok_or_else(|| VaultError::Crypto("frame counter overflow".into()))?;
        if last {
            self.done = true;
        }
        Ok(())
    }
}

impl<R: Read> Read for DecryptingSource<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        loop {
            if self.pos < self.plain.len() {
                let n = out.len().min(self.plain.len() - self.pos);
                out[..n].copy_from_slice(&self.plain[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }

            if self.done {
                return Ok(0);
            }

            self.fill_next_frame().map_err(VaultError::into_io)?;
        }
    }
}
