use crate::digest::Digest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata about a stored blob. The cache only ever looks at `digest`;
/// everything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: String,
    pub digest: Digest,
    /// Size of the raw content in bytes.
    pub size: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
}

impl Descriptor {
    pub fn new(digest: Digest, size: i64) -> Self {
        Self {
            media_type: String::new(),
            digest,
            size,
            urls: Vec::new(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }
}
