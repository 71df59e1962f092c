use crate::descriptor::Descriptor;
use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;

/// Everything the cache knows about one digest.
#[derive(Debug)]
pub(crate) struct DigestItem {
    pub(crate) expire_time: DateTime<Utc>,
    pub(crate) descriptor: Option<Descriptor>,
    /// Repositories observed holding this blob. A hint for search order,
    /// never proof of ownership.
    pub(crate) repositories: LruCache<String, ()>,
}

impl DigestItem {
    pub(crate) fn new(expire_time: DateTime<Utc>, repository_capacity: NonZeroUsize) -> Self {
        Self {
            expire_time,
            descriptor: None,
            repositories: LruCache::new(repository_capacity),
        }
    }

    pub(crate) fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_time < now
    }

    /// Drops everything learned before the entry went stale.
    pub(crate) fn purge(&mut self) {
        self.descriptor = None;
        self.repositories.clear();
    }

    pub(crate) fn contains_repository(&self, repository: &str) -> bool {
        self.repositories.contains(repository)
    }

    /// Repository names, least recently added first.
    pub(crate) fn repository_names(&self) -> Vec<String> {
        self.repositories.iter().rev().map(|(name, _)| name.clone()).collect()
    }
}
