//! In-memory blob descriptor cache keyed by content digest.
//!
//! Each digest maps to a [`DigestItem`] holding the last known descriptor and a
//! bounded set of repositories that have referenced the blob. Entries expire
//! after a fixed ttl, checked lazily on access; there is no background sweep.
//! Both the digest index and the per-digest repository sets are LRU bounded.

mod item;
mod repository_digest;
mod scoped;
mod statter;

pub use repository_digest::RepositoryDigest;
pub use scoped::RepositoryScopedBlobDescriptor;
pub use statter::BlobStatter;

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::metrics::{CacheMetrics, NoopMetrics, RequestScope};
use chrono::{DateTime, TimeDelta, Utc};
use item::DigestItem;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Item shared between a digest key and its cross-algorithm alias.
///
/// The inner lock is only taken while `digests` is held, so it never contends
/// and the cache keeps a single effective lock. It exists because both keys
/// must mutate the same item in place.
type SharedItem = Arc<Mutex<DigestItem>>;

/// Data merged into an entry by [`DigestCache::add`].
#[derive(Debug, Clone, Default)]
pub struct DigestValue {
    pub descriptor: Option<Descriptor>,
    pub repository: Option<String>,
}

impl DigestValue {
    pub fn descriptor(descriptor: Descriptor) -> Self {
        Self {
            descriptor: Some(descriptor),
            repository: None,
        }
    }

    pub fn repository(repository: impl Into<String>) -> Self {
        Self {
            descriptor: None,
            repository: Some(repository.into()),
        }
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = Some(repository.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.descriptor.is_none() && self.repository.is_none()
    }
}

pub struct DigestCache {
    ttl: TimeDelta,
    repository_capacity: NonZeroUsize,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn CacheMetrics>,
    digests: Mutex<LruCache<Digest, SharedItem>>,
}

impl DigestCache {
    /// Creates a cache sized by `config`, using the system clock and no metrics.
    ///
    /// Fails if either capacity is zero or the ttl is out of range.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let digest_capacity = NonZeroUsize::new(config.digest_capacity)
            .ok_or_else(|| Error::InvalidConfig("digest capacity must be greater than zero".into()))?;
        let repository_capacity = NonZeroUsize::new(config.repository_capacity_per_digest)
            .ok_or_else(|| {
                Error::InvalidConfig(
                    "repository capacity per digest must be greater than zero".into(),
                )
            })?;
        let ttl = TimeDelta::from_std(config.ttl())
            .map_err(|e| Error::InvalidConfig(format!("ttl {:?} out of range: {}", config.ttl(), e)))?;

        info!(
            "Initializing digest cache with capacity {}, {} repositories per digest and ttl {:?}",
            digest_capacity,
            repository_capacity,
            config.ttl()
        );

        Ok(Self {
            ttl,
            repository_capacity,
            clock: Arc::new(SystemClock),
            metrics: Arc::new(NoopMetrics),
            digests: Mutex::new(LruCache::new(digest_capacity)),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or_default()
    }

    /// A zero ttl turns every operation into a no-op or a miss.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Number of digest keys currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.digests.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the descriptor for `dgst` regardless of which repositories
    /// referenced it.
    pub fn get(&self, dgst: &str) -> Result<Descriptor> {
        let dgst = Digest::parse(dgst)?;
        self.lookup(&dgst, None)
    }

    /// Like [`get`](Self::get), but only if `repository` has been recorded
    /// for the digest.
    pub fn scoped_get(&self, dgst: &str, repository: &str) -> Result<Descriptor> {
        let dgst = Digest::parse(dgst)?;
        self.lookup(&dgst, Some(repository))
    }

    fn lookup(&self, dgst: &Digest, repository: Option<&str>) -> Result<Descriptor> {
        let scope = match repository {
            Some(_) => RequestScope::Scoped,
            None => RequestScope::Global,
        };

        let found = if self.is_enabled() {
            let mut digests = self.digests.lock();
            let now = self.clock.now();
            digests.get(dgst).and_then(|item| {
                let item = item.lock();
                if item.is_expired(now) {
                    return None;
                }
                match repository {
                    Some(repo) if !item.contains_repository(repo) => None,
                    _ => item.descriptor.clone(),
                }
            })
        } else {
            None
        };

        match found {
            Some(descriptor) => {
                trace!("Digest cache hit for {} ({:?})", dgst, scope);
                self.metrics.hit(scope);
                Ok(descriptor)
            }
            None => {
                trace!("Digest cache miss for {} ({:?})", dgst, scope);
                self.metrics.miss(scope);
                Err(Error::BlobUnknown)
            }
        }
    }

    /// Repositories known to reference `dgst`, least recently added first.
    ///
    /// Advisory only: an invalid digest, a disabled cache or a missing or
    /// expired entry all yield an empty list.
    pub fn repositories(&self, dgst: &str) -> Vec<String> {
        let Ok(dgst) = Digest::parse(dgst) else {
            return Vec::new();
        };
        if !self.is_enabled() {
            return Vec::new();
        }

        let mut digests = self.digests.lock();
        let now = self.clock.now();
        match digests.get(&dgst) {
            Some(item) => {
                let item = item.lock();
                if item.is_expired(now) {
                    Vec::new()
                } else {
                    item.repository_names()
                }
            }
            None => Vec::new(),
        }
    }

    /// Drops the entry stored under exactly `dgst`. An alias of the same item
    /// under another algorithm stays reachable.
    pub fn remove(&self, dgst: &str) -> Result<()> {
        let dgst = Digest::parse(dgst)?;
        if !self.is_enabled() {
            return Ok(());
        }
        if self.digests.lock().pop(&dgst).is_some() {
            debug!("Removed {} from digest cache", dgst);
        }
        Ok(())
    }

    /// Forgets that `repository` references `dgst`, leaving the descriptor and
    /// every other repository in place.
    pub fn scoped_remove(&self, dgst: &str, repository: &str) -> Result<()> {
        let dgst = Digest::parse(dgst)?;
        if !self.is_enabled() {
            return Ok(());
        }
        let digests = self.digests.lock();
        if let Some(item) = digests.peek(&dgst) {
            item.lock().repositories.pop(repository);
        }
        Ok(())
    }

    /// Creates or refreshes the entry for `dgst` and merges `value` into it.
    ///
    /// When the descriptor's own digest uses a different algorithm than `dgst`,
    /// the same entry is also indexed under the descriptor's digest.
    pub fn add(&self, dgst: &str, value: DigestValue) -> Result<()> {
        let dgst = Digest::parse(dgst)?;
        if !self.is_enabled() || value.is_empty() {
            return Ok(());
        }

        let mut digests = self.digests.lock();
        let now = self.clock.now();
        let expire_time = now
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let item = match digests.get(&dgst) {
            Some(item) => Arc::clone(item),
            None => Arc::new(Mutex::new(DigestItem::new(expire_time, self.repository_capacity))),
        };

        let alias = {
            let mut entry = item.lock();
            if entry.is_expired(now) {
                debug!("Refreshing expired digest cache entry {}", dgst);
                entry.purge();
            }
            entry.expire_time = expire_time;

            if let Some(repository) = value.repository {
                entry.repositories.put(repository, ());
            }

            value.descriptor.and_then(|descriptor| {
                let alias = (descriptor.digest.algorithm() != dgst.algorithm()
                    && descriptor.digest != dgst)
                    .then(|| descriptor.digest.clone());
                entry.descriptor = Some(descriptor);
                alias
            })
        };

        if let Some(alias) = alias {
            debug!("Indexing {} as alias of {}", alias, dgst);
            insert(&mut digests, alias, Arc::clone(&item));
        }
        insert(&mut digests, dgst, item);
        Ok(())
    }
}

fn insert(digests: &mut LruCache<Digest, SharedItem>, dgst: Digest, item: SharedItem) {
    if let Some((evicted, _)) = digests.push(dgst.clone(), item) {
        if evicted != dgst {
            trace!("Evicted {} from digest cache", evicted);
        }
    }
}
