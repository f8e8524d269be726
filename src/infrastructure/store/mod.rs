mod dto;

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::domain::Registry;
use crate::infrastructure::atomic::write_atomic;
use dto::RegistryDto;

/// A durable write failed. Reads never produce this; a missing or broken
/// record is the first-run signal, not an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to serialize the registry: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write the registry file: {0}")]
    Write(#[from] io::Error),
}

/// Sole reader and writer of the durable registry record.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the durable record. Missing, unreadable, or invalid records
    /// all yield a fresh empty registry: the configurator treats them as
    /// "no configuration yet" and enters the initialization workflow.
    pub fn load(&self) -> Registry {
        debug!("Reading registry record {}", self.path.display());

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No existing configuration found, starting empty");
                return Registry::default();
            }
            Err(e) => {
                warn!(
                    "Could not read {}: {}. Starting with an empty configuration.",
                    self.path.display(),
                    e
                );
                return Registry::default();
            }
        };

        let dto: RegistryDto = match toml::from_str(&content) {
            Ok(dto) => dto,
            Err(e) => {
                warn!(
                    "Could not parse {}: {}. Starting with an empty configuration.",
                    self.path.display(),
                    e
                );
                return Registry::default();
            }
        };

        match Registry::try_from(dto) {
            Ok(registry) => registry,
            Err(e) => {
                warn!(
                    "Invalid registry record in {}: {}. Starting with an empty configuration.",
                    self.path.display(),
                    e
                );
                Registry::default()
            }
        }
    }

    /// Overwrite the durable record. The write goes to a temporary sibling
    /// and is renamed into place, so no caller ever observes a torn record.
    pub fn save(&self, registry: &Registry) -> Result<(), StoreError> {
        info!("Writing registry record {}", self.path.display());
        let content = toml::to_string_pretty(&RegistryDto::from(registry))?;
        write_atomic(&self.path, &content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainEntry, DomainName, Email, RequestHandler, Upstream};

    fn store(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.toml"))
    }

    fn sample_registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .add(DomainEntry {
                domain: DomainName::new("example.com").unwrap(),
                email: Some(Email::new("admin@example.com").unwrap()),
                www_subdomain: true,
                test_cert: true,
                rsa_key_size: 4096,
                handler: RequestHandler::ReverseProxy {
                    upstream: Upstream::new("example-backend:8080").unwrap(),
                    dns_resolver: Some("127.0.0.11".to_string()),
                    websockets: true,
                },
            })
            .unwrap();
        registry
            .add(DomainEntry {
                domain: DomainName::new("static.example.com").unwrap(),
                email: None,
                www_subdomain: false,
                test_cert: false,
                rsa_key_size: 2048,
                handler: RequestHandler::StaticContent,
            })
            .unwrap();
        registry
    }

    #[test]
    fn test_missing_record_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).load(), Registry::default());
    }

    #[test]
    fn test_corrupt_record_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        fs::write(dir.path().join("config.toml"), "not [valid toml").unwrap();
        assert_eq!(store.load(), Registry::default());
    }

    #[test]
    fn test_invalid_entry_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        // Parses as TOML but the reverse-proxy entry is missing its upstream.
        fs::write(
            dir.path().join("config.toml"),
            concat!(
                "dhparams_size = 2048\n",
                "gzip = true\n\n",
                "[[domains]]\n",
                "domain = \"example.com\"\n",
                "www_subdomain = true\n",
                "test_cert = true\n",
                "rsa_key_size = 4096\n",
                "handler = \"reverse-proxy\"\n",
            ),
        )
        .unwrap();
        assert_eq!(store.load(), Registry::default());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let registry = sample_registry();

        store.save(&registry).unwrap();
        assert_eq!(store.load(), registry);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample_registry()).unwrap();

        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["config.toml"]);
    }

    #[test]
    fn test_proxy_fields_omitted_for_static_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&sample_registry()).unwrap();

        let content = fs::read_to_string(dir.path().join("config.toml")).unwrap();
        let static_table = content.split("[[domains]]").nth(2).unwrap();
        assert!(!static_table.contains("upstream"));
        assert!(!static_table.contains("dns_resolver"));
        assert!(!static_table.contains("websockets"));
    }
}
