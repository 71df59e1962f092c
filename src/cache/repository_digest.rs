use super::{DigestCache, DigestValue};
use crate::error::Result;
use std::sync::Arc;

/// Tracks only which repositories hold a digest. Used to pick where to look
/// first when serving blobs from other repositories or remote registries.
#[derive(Clone)]
pub struct RepositoryDigest {
    cache: Arc<DigestCache>,
}

impl RepositoryDigest {
    pub fn new(cache: Arc<DigestCache>) -> Self {
        Self { cache }
    }

    pub fn add_digest(&self, dgst: &str, repository: &str) -> Result<()> {
        self.cache.add(dgst, DigestValue::repository(repository))
    }

    pub fn contains_repository(&self, dgst: &str, repository: &str) -> bool {
        self.cache.repositories(dgst).iter().any(|r| r == repository)
    }

    pub fn repositories(&self, dgst: &str) -> Vec<String> {
        self.cache.repositories(dgst)
    }
}
