use std::fmt;

/// A fully-qualified DNS hostname, e.g. `example.com`.
///
/// The accepted grammar is lowercase dot-separated labels of alphanumerics
/// and inner hyphens, ending in an alphabetic top-level label of at least
/// two characters. Uppercase input is rejected rather than folded, so name
/// identity is plain string equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName(String);

#[derive(Debug, thiserror::Error)]
pub enum DomainNameError {
    #[error("Domain must contain at least two dot-separated labels, got: {0}")]
    MissingTld(String),

    #[error("Domain contains an invalid label: {0}")]
    InvalidLabel(String),

    #[error("Top-level domain must be two or more letters, got: {0}")]
    InvalidTld(String),
}

fn is_valid_label(label: &str) -> bool {
    // Alphanumeric runs separated by single hyphens; no leading,
    // trailing, or doubled hyphen.
    !label.is_empty()
        && label.split('-').all(|run| {
            !run.is_empty()
                && run
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

impl DomainName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainNameError> {
        let name = name.into();

        let Some((prefix, tld)) = name.rsplit_once('.') else {
            return Err(DomainNameError::MissingTld(name));
        };

        if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(DomainNameError::InvalidTld(name));
        }

        if !prefix.split('.').all(is_valid_label) {
            return Err(DomainNameError::InvalidLabel(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_domain_names() {
        assert!(DomainName::new("example.com").is_ok());
        assert!(DomainName::new("my-app.example.com").is_ok());
        assert!(DomainName::new("a1.example.org").is_ok());
        assert!(DomainName::new("xn--80ak6aa92e.com").is_ok());
    }

    #[test]
    fn test_invalid_domain_names() {
        assert!(DomainName::new("localhost").is_err()); // No TLD
        assert!(DomainName::new("example.c").is_err()); // TLD too short
        assert!(DomainName::new("example.c0m").is_err()); // Digit in TLD
        assert!(DomainName::new("-app.example.com").is_err()); // Leading hyphen
        assert!(DomainName::new("app-.example.com").is_err()); // Trailing hyphen
        assert!(DomainName::new("a--b.example.com").is_err()); // Doubled hyphen
        assert!(DomainName::new("Example.com").is_err()); // Uppercase
        assert!(DomainName::new("ex ample.com").is_err()); // Whitespace
        assert!(DomainName::new(".example.com").is_err()); // Empty label
    }
}
