use std::fmt;

/// Contact email for certificate registration and recovery notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

#[derive(Debug, thiserror::Error)]
#[error("Not a valid email address: {0}")]
pub struct EmailError(String);

impl Email {
    pub fn new(address: impl Into<String>) -> Result<Self, EmailError> {
        let address = address.into();

        let Some((local, host)) = address.split_once('@') else {
            return Err(EmailError(address));
        };

        let local_ok = !local.is_empty()
            && local
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+_.-".contains(c));
        let host_ok = !host.is_empty()
            && host
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || ".-".contains(c));

        if !local_ok || !host_ok {
            return Err(EmailError(address));
        }

        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
