use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, warn};

use crate::domain::DomainName;
use crate::infrastructure::paths::ProjectPaths;

/// Result of one external command. External failures are data, not errors:
/// every operation completes or reports, it never propagates an `Err`.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub ok: bool,
    /// Captured stdout and stderr, kept for the final summary.
    pub output: String,
    pub error: Option<String>,
}

impl CommandOutcome {
    fn success(output: String) -> Self {
        Self {
            ok: true,
            output,
            error: None,
        }
    }

    fn failure(output: String, error: String) -> Self {
        Self {
            ok: false,
            output,
            error: Some(error),
        }
    }
}

/// The container-runtime command surface the workflow engine sequences.
///
/// One operation per external effect. Implementations promise nothing about
/// transactionality; each call either completes or reports failure with its
/// captured diagnostic output.
pub trait ComposeRuntime {
    fn is_web_server_live(&self) -> bool;
    fn reload(&self) -> CommandOutcome;
    fn apply_placeholder_certificate(&self) -> CommandOutcome;
    fn issue_certificate(&self) -> CommandOutcome;
    fn revoke_certificate(&self, domain: &DomainName) -> CommandOutcome;
    fn force_renew_all(&self) -> CommandOutcome;
}

/// `docker compose` invocations against the project directory.
pub struct DockerCompose {
    project_dir: PathBuf,
}

impl DockerCompose {
    pub fn new(paths: &ProjectPaths) -> Self {
        Self {
            project_dir: paths.project_dir.clone(),
        }
    }

    /// Spawn `docker` directly with discrete arguments; nothing here passes
    /// through a shell. User-supplied domain names are constrained to
    /// `[a-z0-9.-]` by `DomainName` before they can reach an argv element.
    fn run(&self, args: &[&str]) -> CommandOutcome {
        debug!("docker {}", args.join(" "));

        let output = match Command::new("docker")
            .args(args)
            .current_dir(&self.project_dir)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to spawn docker: {}", e);
                return CommandOutcome::failure(String::new(), e.to_string());
            }
        };

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !captured.is_empty() {
                captured.push('\n');
            }
            captured.push_str(stderr.trim_end());
        }

        if output.status.success() {
            CommandOutcome::success(captured)
        } else {
            warn!("docker {} failed: {}", args.join(" "), output.status);
            CommandOutcome::failure(captured, output.status.to_string())
        }
    }
}

impl ComposeRuntime for DockerCompose {
    fn is_web_server_live(&self) -> bool {
        let outcome = self.run(&["compose", "ps", "--status", "running", "--services"]);
        outcome.ok && outcome.output.lines().any(|line| line.trim() == "nginx")
    }

    fn reload(&self) -> CommandOutcome {
        self.run(&["compose", "exec", "--no-TTY", "nginx", "nginx", "-s", "reload"])
    }

    /// Recreating the web server container runs its entrypoint, which
    /// provisions self-signed placeholder certificates for every configured
    /// domain that has none, letting TLS come up before issuance.
    fn apply_placeholder_certificate(&self) -> CommandOutcome {
        self.run(&["compose", "up", "-d", "--force-recreate", "--no-deps", "nginx"])
    }

    fn issue_certificate(&self) -> CommandOutcome {
        self.run(&["compose", "up", "-d", "--always-recreate-deps", "certbot"])
    }

    fn revoke_certificate(&self, domain: &DomainName) -> CommandOutcome {
        self.run(&[
            "compose",
            "run",
            "--rm",
            "--no-deps",
            "--no-TTY",
            "--entrypoint",
            "certbot",
            "certbot",
            "-n",
            "delete",
            "--cert-name",
            domain.as_str(),
        ])
    }

    fn force_renew_all(&self) -> CommandOutcome {
        self.run(&[
            "compose",
            "run",
            "--rm",
            "--no-deps",
            "--no-TTY",
            "--entrypoint",
            "certbot",
            "certbot",
            "renew",
            "--no-random-sleep-on-renew",
            "--force-renew",
        ])
    }
}
