use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::info;

use crate::domain::DomainName;
use crate::infrastructure::atomic::write_atomic;
use crate::infrastructure::paths::ProjectPaths;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact to delete does not exist. Callers that may race with
    /// manual cleanup treat this as already satisfied.
    #[error("No generated configuration for domain: {0}")]
    NotFound(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes rendered configuration artifacts into the Nginx config tree:
/// one global `nginx.conf` plus `conf.d/<domain>.conf` per domain.
/// Each write is atomic per file.
pub struct ConfigFileWriter {
    nginx_conf_dir: PathBuf,
    servers_conf_dir: PathBuf,
}

impl ConfigFileWriter {
    pub fn new(paths: &ProjectPaths) -> Self {
        Self {
            nginx_conf_dir: paths.nginx_conf_dir.clone(),
            servers_conf_dir: paths.servers_conf_dir.clone(),
        }
    }

    pub fn global_path(&self) -> PathBuf {
        self.nginx_conf_dir.join("nginx.conf")
    }

    pub fn domain_path(&self, domain: &DomainName) -> PathBuf {
        self.servers_conf_dir.join(format!("{}.conf", domain))
    }

    pub fn write_global(&self, text: &str) -> Result<(), ArtifactError> {
        let path = self.global_path();
        info!("Writing {}", path.display());
        fs::create_dir_all(&self.nginx_conf_dir)
            .and_then(|()| write_atomic(&path, text))
            .map_err(|source| ArtifactError::Write { path, source })
    }

    pub fn write_domain(&self, domain: &DomainName, text: &str) -> Result<(), ArtifactError> {
        let path = self.domain_path(domain);
        info!("Writing {}", path.display());
        fs::create_dir_all(&self.servers_conf_dir)
            .and_then(|()| write_atomic(&path, text))
            .map_err(|source| ArtifactError::Write { path, source })
    }

    pub fn delete_domain(&self, domain: &DomainName) -> Result<(), ArtifactError> {
        let path = self.domain_path(domain);
        info!("Deleting {}", path.display());
        fs::remove_file(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ArtifactError::NotFound(domain.to_string())
            } else {
                ArtifactError::Delete { path, source }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(dir: &tempfile::TempDir) -> ConfigFileWriter {
        ConfigFileWriter::new(&ProjectPaths::new(dir.path()))
    }

    fn name(s: &str) -> DomainName {
        DomainName::new(s).unwrap()
    }

    #[test]
    fn test_write_then_delete_domain_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(&dir);
        let domain = name("example.com");

        writer.write_domain(&domain, "server {}\n").unwrap();
        let path = writer.domain_path(&domain);
        assert_eq!(fs::read_to_string(&path).unwrap(), "server {}\n");

        writer.delete_domain(&domain).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = writer(&dir).delete_domain(&name("gone.example.com")).unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
    }

    #[test]
    fn test_global_write_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(&dir);
        writer.write_global("http {}\n").unwrap();
        assert_eq!(
            fs::read_to_string(writer.global_path()).unwrap(),
            "http {}\n"
        );
    }
}
