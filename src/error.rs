use crate::digest::DigestError;
use crate::reference::ReferenceError;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidDigest(#[from] DigestError),

    /// The blob is neither cached nor known to the backing service.
    #[error("blob unknown to registry")]
    BlobUnknown,

    #[error(transparent)]
    InvalidRepository(#[from] ReferenceError),

    /// Rejected cache parameters, raised before any entry can be stored.
    #[error("invalid cache configuration: {0}")]
    InvalidConfig(String),

    /// Opaque failure of a downstream blob descriptor service.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl Error {
    pub fn is_blob_unknown(&self) -> bool {
        matches!(self, Error::BlobUnknown)
    }
}
