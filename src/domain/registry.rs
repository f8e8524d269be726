use super::{DomainEntry, DomainName, EntryError};

/// Settings that apply to the web server as a whole, persisted with the
/// domain list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSettings {
    /// Diffie-Hellman parameter size in bits.
    pub dhparams_size: u32,
    pub gzip: bool,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            dhparams_size: 2048,
            gzip: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Domain already registered: {0}")]
    DomainExists(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Domain {0} already uses a production certificate")]
    AlreadyProduction(String),

    #[error("DH parameters size must be positive")]
    ZeroDhparamsSize,

    #[error(transparent)]
    InvalidEntry(#[from] EntryError),
}

impl GlobalSettings {
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.dhparams_size == 0 {
            return Err(RegistryError::ZeroDhparamsSize);
        }
        Ok(())
    }
}

/// The configured domain list plus global settings.
///
/// Entries keep insertion order; the domain name is the unique identity key.
/// All mutators are total: on error the registry is left exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    pub settings: GlobalSettings,
    pub domains: Vec<DomainEntry>,
}

impl Registry {
    pub fn find(&self, name: &DomainName) -> Option<&DomainEntry> {
        self.domains.iter().find(|entry| &entry.domain == name)
    }

    pub fn domain_names(&self) -> Vec<DomainName> {
        self.domains.iter().map(|entry| entry.domain.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Append a validated entry. Rejects duplicates without mutating.
    pub fn add(&mut self, entry: DomainEntry) -> Result<(), RegistryError> {
        entry.validate()?;
        if self.find(&entry.domain).is_some() {
            return Err(RegistryError::DomainExists(entry.domain.to_string()));
        }
        self.domains.push(entry);
        Ok(())
    }

    /// Replace the entry with the same domain name, keeping its position.
    pub fn replace(&mut self, entry: DomainEntry) -> Result<(), RegistryError> {
        entry.validate()?;
        let slot = self
            .domains
            .iter_mut()
            .find(|existing| existing.domain == entry.domain)
            .ok_or_else(|| RegistryError::DomainNotFound(entry.domain.to_string()))?;
        *slot = entry;
        Ok(())
    }

    pub fn remove(&mut self, name: &DomainName) -> Result<DomainEntry, RegistryError> {
        let index = self
            .domains
            .iter()
            .position(|entry| &entry.domain == name)
            .ok_or_else(|| RegistryError::DomainNotFound(name.to_string()))?;
        Ok(self.domains.remove(index))
    }

    /// Switch a domain from staging to production certificates.
    /// The transition is one-directional; promoting twice is an error.
    pub fn promote(&mut self, name: &DomainName) -> Result<(), RegistryError> {
        let entry = self
            .domains
            .iter_mut()
            .find(|entry| &entry.domain == name)
            .ok_or_else(|| RegistryError::DomainNotFound(name.to_string()))?;
        if !entry.test_cert {
            return Err(RegistryError::AlreadyProduction(name.to_string()));
        }
        entry.test_cert = false;
        Ok(())
    }
}
