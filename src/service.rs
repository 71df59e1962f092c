use crate::descriptor::Descriptor;
use crate::digest::Digest;
use crate::error::Result;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Something that can describe, forget and record blobs by digest.
///
/// Implemented by the registry storage backend and by the caching wrappers
/// layered in front of it. Implementations report a missing blob as
/// [`Error::BlobUnknown`](crate::Error::BlobUnknown).
pub trait BlobDescriptorService: Send + Sync {
    fn stat<'a>(&'a self, dgst: &'a Digest) -> BoxFuture<'a, Result<Descriptor>>;

    fn clear<'a>(&'a self, dgst: &'a Digest) -> BoxFuture<'a, Result<()>>;

    fn set_descriptor<'a>(
        &'a self,
        dgst: &'a Digest,
        descriptor: Descriptor,
    ) -> BoxFuture<'a, Result<()>>;
}

/// A blob descriptor service that can also hand out views restricted to a
/// single repository.
pub trait BlobDescriptorCacheProvider: BlobDescriptorService {
    fn repository_scoped(&self, repository: &str) -> Result<Arc<dyn BlobDescriptorService>>;
}
