//! # blobcache
//!
//! A bounded, time-expiring cache of blob descriptors for container registry
//! servers. Descriptors are keyed by content digest, and every digest also
//! remembers which repositories have been seen referencing it so that
//! repository-scoped lookups only see blobs the repository has proven to hold.
//!
//! The cache sits in front of a registry's own blob descriptor storage:
//! [`BlobStatter`] and [`RepositoryScopedBlobDescriptor`] answer from the cache
//! when they can and read through to a [`BlobDescriptorService`] when they
//! cannot. [`Provider`] adapts the cache to a provider of repository-scoped
//! views, and [`RepositoryDigest`] offers just the repository-membership side.

pub mod cache;
pub mod clock;
pub mod config;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod reference;
pub mod service;

pub use cache::{BlobStatter, DigestCache, DigestValue, RepositoryDigest, RepositoryScopedBlobDescriptor};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::CacheConfig;
pub use descriptor::Descriptor;
pub use digest::{Algorithm, Digest, DigestError};
pub use error::{Error, Result};
pub use metrics::{CacheMetrics, CounterMetrics, NoopMetrics, RequestScope};
pub use provider::Provider;
pub use reference::{ReferenceError, RepositoryName};
pub use service::{BlobDescriptorCacheProvider, BlobDescriptorService};
