use super::{DigestCache, DigestValue};
use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::service::BlobDescriptorService;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

/// Read-through front for a blob descriptor service that only sees blobs its
/// repository has been recorded as referencing.
pub struct RepositoryScopedBlobDescriptor {
    repository: String,
    cache: Arc<DigestCache>,
    svc: Option<Arc<dyn BlobDescriptorService>>,
}

impl RepositoryScopedBlobDescriptor {
    pub fn new(
        repository: impl Into<String>,
        cache: Arc<DigestCache>,
        svc: Option<Arc<dyn BlobDescriptorService>>,
    ) -> Self {
        Self {
            repository: repository.into(),
            cache,
            svc,
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    fn value(&self, descriptor: Descriptor) -> DigestValue {
        DigestValue::descriptor(descriptor).with_repository(self.repository.clone())
    }

    async fn stat_inner(&self, dgst: &Digest) -> Result<Descriptor> {
        match self.cache.scoped_get(dgst.as_str(), &self.repository) {
            Err(Error::BlobUnknown) => {}
            cached => return cached,
        }
        let Some(svc) = &self.svc else {
            return Err(Error::BlobUnknown);
        };

        let descriptor = svc.stat(dgst).await.inspect_err(|e| {
            debug!(
                "Blob descriptor service failed to stat {} in {}: {}",
                dgst, self.repository, e
            );
        })?;
        self.cache
            .add(dgst.as_str(), self.value(descriptor.clone()))?;
        Ok(descriptor)
    }

    // Only this repository's claim on the blob is dropped; other repositories
    // keep seeing the shared entry.
    async fn clear_inner(&self, dgst: &Digest) -> Result<()> {
        self.cache.scoped_remove(dgst.as_str(), &self.repository)?;
        match &self.svc {
            Some(svc) => svc.clear(dgst).await,
            None => Ok(()),
        }
    }

    async fn set_descriptor_inner(&self, dgst: &Digest, descriptor: Descriptor) -> Result<()> {
        self.cache
            .add(dgst.as_str(), self.value(descriptor.clone()))?;
        match &self.svc {
            Some(svc) => svc.set_descriptor(dgst, descriptor).await,
            None => Ok(()),
        }
    }
}

impl BlobDescriptorService for RepositoryScopedBlobDescriptor {
    fn stat<'a>(&'a self, dgst: &'a Digest) -> BoxFuture<'a, Result<Descriptor>> {
        self.stat_inner(dgst).boxed()
    }

    fn clear<'a>(&'a self, dgst: &'a Digest) -> BoxFuture<'a, Result<()>> {
        self.clear_inner(dgst).boxed()
    }

    fn set_descriptor<'a>(
        &'a self,
        dgst: &'a Digest,
        descriptor: Descriptor,
    ) -> BoxFuture<'a, Result<()>> {
        self.set_descriptor_inner(dgst, descriptor).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::FakeBlobDescriptorService;
    use crate::cache::tests::{TTL, digest, new_cache};
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_stat_records_repository() {
        let (cache, clock) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("layer");
        let svc = Arc::new(FakeBlobDescriptorService::with([Descriptor::new(dgst.clone(), 5)]));
        let scoped = RepositoryScopedBlobDescriptor::new("foo", cache.clone(), Some(svc.clone()));

        assert_eq!(scoped.stat(&dgst).await.unwrap().size, 5);
        assert_eq!(svc.stat_count(), 1);
        assert_eq!(cache.repositories(dgst.as_str()), vec!["foo"]);
        assert!(cache.scoped_get(dgst.as_str(), "foo").is_ok());

        scoped.stat(&dgst).await.unwrap();
        assert_eq!(svc.stat_count(), 1);

        clock.step(TimeDelta::minutes(5));
        scoped.stat(&dgst).await.unwrap();
        assert_eq!(svc.stat_count(), 2);
    }

    #[tokio::test]
    async fn test_stat_other_repository_goes_to_service() {
        let (cache, _) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("layer");
        let svc = Arc::new(FakeBlobDescriptorService::with([Descriptor::new(dgst.clone(), 5)]));
        let foo = RepositoryScopedBlobDescriptor::new("foo", cache.clone(), Some(svc.clone()));
        let bar = RepositoryScopedBlobDescriptor::new("bar", cache.clone(), Some(svc.clone()));

        foo.stat(&dgst).await.unwrap();
        bar.stat(&dgst).await.unwrap();
        assert_eq!(svc.stat_count(), 2);
        assert_eq!(cache.repositories(dgst.as_str()), vec!["foo", "bar"]);
    }

    #[tokio::test]
    async fn test_stat_without_service_only_sees_own_repository() {
        let (cache, _) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("layer");
        cache
            .add(
                dgst.as_str(),
                DigestValue::descriptor(Descriptor::new(dgst.clone(), 5)).with_repository("foo"),
            )
            .unwrap();

        let foo = RepositoryScopedBlobDescriptor::new("foo", cache.clone(), None);
        let bar = RepositoryScopedBlobDescriptor::new("bar", cache.clone(), None);
        assert!(foo.stat(&dgst).await.is_ok());
        assert!(bar.stat(&dgst).await.unwrap_err().is_blob_unknown());
    }

    #[tokio::test]
    async fn test_clear_keeps_global_entry() {
        let (cache, _) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("cleared");
        let svc = Arc::new(FakeBlobDescriptorService::default());
        let scoped = RepositoryScopedBlobDescriptor::new("foo", cache.clone(), Some(svc.clone()));

        scoped
            .set_descriptor(&dgst, Descriptor::new(dgst.clone(), 77))
            .await
            .unwrap();
        assert!(cache.scoped_get(dgst.as_str(), "foo").is_ok());
        assert!(svc.data.lock().contains_key(&dgst));

        scoped.clear(&dgst).await.unwrap();
        assert!(!svc.data.lock().contains_key(&dgst));
        assert!(scoped.stat(&dgst).await.unwrap_err().is_blob_unknown());
        assert!(cache.repositories(dgst.as_str()).is_empty());
        assert_eq!(cache.get(dgst.as_str()).unwrap().size, 77);
    }

    #[tokio::test]
    async fn test_clear_surfaces_service_errors() {
        let (cache, _) = new_cache(10, 10, TTL);
        let scoped = RepositoryScopedBlobDescriptor::new(
            "foo",
            Arc::new(cache),
            Some(Arc::new(FakeBlobDescriptorService::default())),
        );
        let err = scoped.clear(&digest("never stored")).await.unwrap_err();
        assert!(err.is_blob_unknown());
    }
}
