use super::{DigestCache, DigestValue};
use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::{Error, Result};
use crate::service::BlobDescriptorService;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

/// Read-through front for a blob descriptor service, ignoring repositories.
pub struct BlobStatter {
    cache: Arc<DigestCache>,
    svc: Option<Arc<dyn BlobDescriptorService>>,
}

impl BlobStatter {
    pub fn new(cache: Arc<DigestCache>, svc: Option<Arc<dyn BlobDescriptorService>>) -> Self {
        Self { cache, svc }
    }

    async fn stat_inner(&self, dgst: &Digest) -> Result<Descriptor> {
        match self.cache.get(dgst.as_str()) {
            Err(Error::BlobUnknown) => {}
            cached => return cached,
        }
        let Some(svc) = &self.svc else {
            return Err(Error::BlobUnknown);
        };

        let descriptor = svc.stat(dgst).await.inspect_err(|e| {
            debug!("Blob descriptor service failed to stat {}: {}", dgst, e);
        })?;
        self.cache
            .add(dgst.as_str(), DigestValue::descriptor(descriptor.clone()))?;
        Ok(descriptor)
    }

    async fn clear_inner(&self, dgst: &Digest) -> Result<()> {
        self.cache.remove(dgst.as_str())?;
        match &self.svc {
            Some(svc) => svc.clear(dgst).await,
            None => Ok(()),
        }
    }

    async fn set_descriptor_inner(&self, dgst: &Digest, descriptor: Descriptor) -> Result<()> {
        self.cache
            .add(dgst.as_str(), DigestValue::descriptor(descriptor.clone()))?;
        match &self.svc {
            Some(svc) => svc.set_descriptor(dgst, descriptor).await,
            None => Ok(()),
        }
    }
}

impl BlobDescriptorService for BlobStatter {
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
    use crate::cache::tests::{TTL, digest, new_cache};
    use crate::service::tests::FakeBlobDescriptorService;
    use chrono::TimeDelta;

    #[tokio::test]
    async fn test_stat_reads_through_once_per_ttl() {
        let (cache, clock) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("layer");
        let svc = Arc::new(FakeBlobDescriptorService::with([Descriptor::new(dgst.clone(), 1234)]));
        let statter = BlobStatter::new(cache.clone(), Some(svc.clone()));

        let desc = statter.stat(&dgst).await.expect("stat through service");
        assert_eq!(desc.size, 1234);
        assert_eq!(svc.stat_count(), 1);
        assert_eq!(cache.get(dgst.as_str()).unwrap().size, 1234);

        statter.stat(&dgst).await.expect("stat from cache");
        assert_eq!(svc.stat_count(), 1);

        clock.step(TimeDelta::minutes(5));
        statter.stat(&dgst).await.expect("stat after expiry");
        assert_eq!(svc.stat_count(), 2);
    }

    #[tokio::test]
    async fn test_stat_unknown_blob() {
        let (cache, _) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("unknown");
        let svc = Arc::new(FakeBlobDescriptorService::default());
        let statter = BlobStatter::new(cache.clone(), Some(svc.clone()));

        assert!(statter.stat(&dgst).await.unwrap_err().is_blob_unknown());
        assert_eq!(svc.stat_count(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_stat_passes_backend_errors_through() {
        let (cache, _) = new_cache(10, 10, TTL);
        let svc = Arc::new(FakeBlobDescriptorService {
            fail: true,
            ..Default::default()
        });
        let statter = BlobStatter::new(Arc::new(cache), Some(svc));

        let err = statter.stat(&digest("broken")).await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(err.to_string(), "storage backend unavailable");
    }

    #[tokio::test]
    async fn test_stat_without_service() {
        let (cache, _) = new_cache(10, 10, TTL);
        let statter = BlobStatter::new(Arc::new(cache), None);
        assert!(statter.stat(&digest("nothing")).await.unwrap_err().is_blob_unknown());
    }

    #[tokio::test]
    async fn test_set_descriptor_and_clear() {
        let (cache, _) = new_cache(10, 10, TTL);
        let cache = Arc::new(cache);
        let dgst = digest("written");
        let svc = Arc::new(FakeBlobDescriptorService::default());
        let statter = BlobStatter::new(cache.clone(), Some(svc.clone()));

        statter
            .set_descriptor(&dgst, Descriptor::new(dgst.clone(), 10))
            .await
            .unwrap();
        assert!(cache.get(dgst.as_str()).is_ok());
        assert!(svc.data.lock().contains_key(&dgst));

        statter.clear(&dgst).await.unwrap();
        assert!(cache.get(dgst.as_str()).unwrap_err().is_blob_unknown());
        assert!(!svc.data.lock().contains_key(&dgst));
        assert!(statter.stat(&dgst).await.unwrap_err().is_blob_unknown());
    }
}
