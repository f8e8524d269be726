use std::path::PathBuf;

/// All resolved paths needed by the configurator.
/// Computed once from the CLI flags, then passed to components via DI.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    /// The Docker Compose project directory.
    pub project_dir: PathBuf,
    /// Durable registry record.
    pub registry_file: PathBuf,
    /// Directory holding the global `nginx.conf` artifact.
    pub nginx_conf_dir: PathBuf,
    /// Directory holding the per-domain `<domain>.conf` artifacts.
    pub servers_conf_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let nginx_conf_dir = project_dir.join("nginx-conf");
        Self {
            registry_file: project_dir.join("config.toml"),
            servers_conf_dir: nginx_conf_dir.join("conf.d"),
            nginx_conf_dir,
            project_dir,
        }
    }
}
