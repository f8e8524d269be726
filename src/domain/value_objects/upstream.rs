use std::fmt;

/// Address of a proxied backend, e.g. `example-backend:8080`.
///
/// Nginx resolves the host itself (through the Docker-internal resolver when
/// configured), so this only guards against values that would break out of
/// the generated `proxy_pass` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream(String);

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream address must not be empty")]
    Empty,

    #[error("Upstream address contains invalid characters: {0}")]
    InvalidCharacters(String),
}

impl Upstream {
    pub fn new(address: impl Into<String>) -> Result<Self, UpstreamError> {
        let address = address.into();

        if address.is_empty() {
            return Err(UpstreamError::Empty);
        }

        if !address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-_:".contains(c))
        {
            return Err(UpstreamError::InvalidCharacters(address));
        }

        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
