use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Upper bound on the full repository name, registry domain included.
pub const NAME_TOTAL_LENGTH_MAX: usize = 255;

static DOMAIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])(?:\.(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]))*(?::[0-9]+)?$")
        .expect("valid domain regex")
});

static PATH_COMPONENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|[-]*)[a-z0-9]+)*$").expect("valid path component regex")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("repository name must have at least one component")]
    Empty,
    #[error("repository name must not be more than 255 characters")]
    NameTooLong,
    #[error("invalid reference format: {0}")]
    InvalidFormat(String),
}

/// A syntactically valid repository name such as `library/busybox` or
/// `registry.example.com:5000/team/app`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryName {
    domain: Option<String>,
    path: String,
}

impl RepositoryName {
    pub fn parse(s: &str) -> Result<Self, ReferenceError> {
        if s.is_empty() {
            return Err(ReferenceError::Empty);
        }
        if s.len() > NAME_TOTAL_LENGTH_MAX {
            return Err(ReferenceError::NameTooLong);
        }

        // The first component is a domain only if it looks like one and more
        // components follow, same as the docker reference grammar.
        let (domain, path) = match s.split_once('/') {
            Some((first, rest))
                if (first.contains('.') || first.contains(':') || first == "localhost")
                    && DOMAIN_REGEX.is_match(first) =>
            {
                (Some(first.to_string()), rest)
            }
            _ => (None, s),
        };

        if path.is_empty() || !path.split('/').all(|c| PATH_COMPONENT_REGEX.is_match(c)) {
            return Err(ReferenceError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            domain,
            path: path.to_string(),
        })
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{}/{}", domain, self.path),
            None => f.write_str(&self.path),
        }
    }
}
