use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static ALGORITHM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+([+._-][a-z0-9]+)*$").expect("valid algorithm regex"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DigestError {
    #[error("invalid digest format: {0:?}")]
    InvalidFormat(String),
    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("invalid {algorithm} digest length: expected {expected} hex characters, got {actual}")]
    InvalidLength {
        algorithm: Algorithm,
        expected: usize,
        actual: usize,
    },
    #[error("invalid checksum digest: {0:?} is not lowercase hex")]
    InvalidHex(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
        }
    }

    /// Number of hex characters in an encoded digest of this algorithm.
    pub fn hex_len(&self) -> usize {
        match self {
            Algorithm::Sha256 => 64,
            Algorithm::Sha384 => 96,
            Algorithm::Sha512 => 128,
        }
    }

    /// Computes the digest of `content` with this algorithm.
    pub fn digest_bytes(&self, content: &[u8]) -> Digest {
        let encoded = match self {
            Algorithm::Sha256 => hex::encode(Sha256::digest(content)),
            Algorithm::Sha384 => hex::encode(Sha384::digest(content)),
            Algorithm::Sha512 => hex::encode(Sha512::digest(content)),
        };
        Digest {
            value: format!("{}:{}", self.as_str(), encoded),
            algorithm: *self,
        }
    }
}


impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Algorithm::Sha256),
            "sha384" => Ok(Algorithm::Sha384),
            "sha512" => Ok(Algorithm::Sha512),
            other => Err(DigestError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// A validated content address of the form `algorithm:hex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    value: String,
    algorithm: Algorithm,
}

impl Digest {
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        let (algorithm, encoded) = s
            .split_once(':')
            .ok_or_else(|| DigestError::InvalidFormat(s.to_string()))?;
        if algorithm.is_empty() || encoded.is_empty() || !ALGORITHM_REGEX.is_match(algorithm) {
            return Err(DigestError::InvalidFormat(s.to_string()));
        }

        let algorithm: Algorithm = algorithm.parse()?;
        if encoded.len() != algorithm.hex_len() {
            return Err(DigestError::InvalidLength {
                algorithm,
                expected: algorithm.hex_len(),
                actual: encoded.len(),
            });
        }
        if !encoded.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(DigestError::InvalidHex(encoded.to_string()));
        }

        Ok(Self {
            value: s.to_string(),
            algorithm,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encoded(&self) -> &str {
        // the separator is always right after the algorithm name
        &self.value[self.algorithm.as_str().len() + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Digest::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Digest::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.value
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_EMPTY: &str =
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_parse_valid_sha256() {
        let digest = Digest::parse(SHA256_EMPTY).expect("digest should parse");
        assert_eq!(digest.algorithm(), Algorithm::Sha256);
        assert_eq!(
            digest.encoded(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(digest.to_string(), SHA256_EMPTY);
    }

    #[test]
    fn test_digest_bytes_matches_known_value() {
        assert_eq!(Algorithm::Sha256.digest_bytes(b"").as_str(), SHA256_EMPTY);
        assert_eq!(
            Algorithm::Sha384.digest_bytes(b"abc").as_str(),
            "sha384:cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed8086072ba1e7cc2358baeca134c825a7"
        );
        let sha512 = Algorithm::Sha512.digest_bytes(b"hello");
        assert_eq!(sha512.algorithm(), Algorithm::Sha512);
        assert_eq!(sha512.encoded().len(), 128);
        assert_eq!(Digest::parse(sha512.as_str()).unwrap(), sha512);
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert!(matches!(
            Digest::parse("sha256"),
            Err(DigestError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_algorithm() {
        assert!(matches!(
            Digest::parse(":e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"),
            Err(DigestError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            Digest::parse("sha256:abc"),
            Err(DigestError::InvalidLength {
                algorithm: Algorithm::Sha256,
                expected: 64,
                actual: 3
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown_algorithm() {
        assert!(matches!(
            Digest::parse("md5:d41d8cd98f00b204e9800998ecf8427e"),
            Err(DigestError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_parse_rejects_uppercase_hex() {
        let upper = SHA256_EMPTY.replace('e', "E");
        assert!(matches!(
            Digest::parse(&upper),
            Err(DigestError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let digest = Digest::parse(SHA256_EMPTY).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", SHA256_EMPTY));
        let invalid: Result<Digest, _> = serde_json::from_str("\"sha256:nothex\"");
        assert!(invalid.is_err());
    }
}
