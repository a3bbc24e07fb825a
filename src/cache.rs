//! Media Vault - Decrypted Memory Cache
//!
//! Bounds the volume of decrypted bytes resident in memory and evicts them
//! under platform memory pressure. This is a security control as much as a
//! performance one: decrypted previews must not linger in memory
//! indefinitely after use.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use uuid::Uuid;

/// Memory-pressure levels delivered by the platform-integration collaborator.
/// The core never reaches out to platform lifecycle globals itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryPressure {
    /// App backgrounded and system memory is low
    BackgroundLow,
    /// App foregrounded, moderate pressure
    ForegroundModerate,
    /// App foregrounded, critical pressure
    ForegroundCritical,
}

/// Default ceiling for decrypted bytes held in memory
pub const DEFAULT_CACHE_CEILING: usize = 32 * 1024 * 1024;

struct CacheInner {
    entries: HashMap<Uuid, Arc<[u8]>>,
    /// LRU order, least recent at the front
    order: VecDeque<Uuid>,
    bytes: usize,
}

/// Byte-bounded LRU over decrypted thumbnail bytes.
pub struct ThumbCache {
    inner: Mutex<CacheInner>,
    ceiling: usize,
}

impl ThumbCache {
    pub fn new(ceiling: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
                bytes: 0,
            }),
            ceiling,
        }
    }

    /// Fetch an entry, marking it most recently used.
    pub fn get(&self, id: &Uuid) -> Option<Arc<[u8]>> {
        let mut inner = self.inner.lock();
        let hit = inner.entries.get(id).cloned();
        if hit.is_some() {
            inner.order.retain(|x| x != id);
            inner.order.push_back(*id);
        }
        hit
    }

    /// Insert an entry, evicting least-recently-used entries past the
    /// ceiling. Entries larger than the ceiling itself are not cached.
    pub fn insert(&self, id: Uuid, bytes: Arc<[u8]>) {
        if bytes.len() > self.ceiling {
            return;
        }

        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.remove(&id) {
            inner.bytes -= old.len();
            inner.order.retain(|x| x != &id);
        }

        inner.bytes += bytes.len();
        inner.entries.insert(id, bytes);
        inner.order.push_back(id);

        Self::trim_to(&mut inner, self.ceiling);
    }

    /// Drop a single entry (e.g. after delete).
    pub fn remove(&self, id: &Uuid) {
        let mut inner = self.inner.lock();
        if let Some(old) = inner.entries.remove(id) {
            inner.bytes -= old.len();
            inner.order.retain(|x| x != id);
        }
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.bytes = 0;
    }

    /// Apply the eviction policy for a pressure signal:
    /// background + low memory clears everything, foreground moderate trims
    /// to half the ceiling, foreground critical clears everything.
    pub fn on_memory_pressure(&self, level: MemoryPressure) {
        match level {
            MemoryPressure::BackgroundLow | MemoryPressure::ForegroundCritical => {
                debug!("memory pressure {level:?}: clearing decrypted cache");
                self.clear();
            }
            MemoryPressure::ForegroundModerate => {
                debug!("memory pressure {level:?}: trimming decrypted cache");
                let mut inner = self.inner.lock();
                Self::trim_to(&mut inner, self.ceiling / 2);
            }
        }
    }

    fn trim_to(inner: &mut CacheInner, limit: usize) {
        while inner.bytes > limit {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if let Some(old) = inner.entries.remove(&oldest) {
                inner.bytes -= old.len();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decrypted bytes currently resident.
    pub fn resident_bytes(&self) -> usize {
        self.inner.lock().bytes
    }
}

impl Default for ThumbCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CEILING)
    }
}
