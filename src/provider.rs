//! Exposes a [`DigestCache`] as the blob descriptor cache provider the
//! registry storage layer expects.

use crate::cache::{DigestCache, DigestValue, RepositoryScopedBlobDescriptor};
use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::Result;
use crate::reference::RepositoryName;
use crate::service::{BlobDescriptorCacheProvider, BlobDescriptorService};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct Provider {
    cache: Arc<DigestCache>,
}

impl Provider {
    pub fn new(cache: Arc<DigestCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<DigestCache> {
        &self.cache
    }
}

impl BlobDescriptorService for Provider {
    fn stat<'a>(&'a self, dgst: &'a Digest) -> BoxFuture<'a, Result<Descriptor>> {
        let result = self.cache.get(dgst.as_str());
        async move { result }.boxed()
    }

    fn clear<'a>(&'a self, dgst: &'a Digest) -> BoxFuture<'a, Result<()>> {
        let result = self.cache.remove(dgst.as_str());
        async move { result }.boxed()
    }

    fn set_descriptor<'a>(
        &'a self,
        dgst: &'a Digest,
        descriptor: Descriptor,
    ) -> BoxFuture<'a, Result<()>> {
        let result = self
            .cache
            .add(dgst.as_str(), DigestValue::descriptor(descriptor));
        async move { result }.boxed()
    }
}

impl BlobDescriptorCacheProvider for Provider {
    fn repository_scoped(&self, repository: &str) -> Result<Arc<dyn BlobDescriptorService>> {
        let name = RepositoryName::parse(repository)?;
        debug!("Creating blob descriptor cache scoped to {}", name);
        Ok(Arc::new(RepositoryScopedBlobDescriptor::new(
            repository,
            self.cache.clone(),
            None,
        )))
    }
}
