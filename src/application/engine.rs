use tracing::warn;

use crate::domain::{DomainEntry, DomainName, Registry, RegistryError};
use crate::infrastructure::compose::{CommandOutcome, ComposeRuntime};
use crate::infrastructure::nginx::{ArtifactError, ConfigFileWriter, RenderError, TemplateRenderer};
use crate::infrastructure::store::{ConfigStore, StoreError};

use super::{CommitReport, ExternalStep, Intent, RegenScope, StepOutcome};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(
        "The web server is not running, so this action cannot be applied.\n\
         Start the stack with `docker compose up -d` and try again."
    )]
    WebServerDown,

    #[error("Could not persist the configuration: {0}")]
    Persistence(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// A computed, not-yet-applied workflow outcome: the next registry plus the
/// artifact and orchestrator plan.
///
/// Building one touches neither disk nor processes; dropping one discards
/// the intent without a trace. Side effects exist only behind
/// [`WorkflowEngine::commit`], so "no mutation before confirmation" is a
/// property of the types, not of call-site discipline.
#[derive(Debug)]
pub struct ProposedChange {
    description: String,
    next: Registry,
    scope: RegenScope,
    deletions: Vec<DomainName>,
    steps: Vec<ExternalStep>,
}

impl ProposedChange {
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The registry as it will be once committed, for the confirmation
    /// summary.
    pub fn registry(&self) -> &Registry {
        &self.next
    }
}

/// Sequences a confirmed intent into ordered side effects:
/// durable save, artifact regeneration, then external commands.
pub struct WorkflowEngine<'a> {
    store: &'a ConfigStore,
    renderer: &'a TemplateRenderer,
    writer: &'a ConfigFileWriter,
    runtime: &'a dyn ComposeRuntime,
}

impl<'a> WorkflowEngine<'a> {
    pub fn new(
        store: &'a ConfigStore,
        renderer: &'a TemplateRenderer,
        writer: &'a ConfigFileWriter,
        runtime: &'a dyn ComposeRuntime,
    ) -> Self {
        Self {
            store,
            renderer,
            writer,
            runtime,
        }
    }

    /// Refuse to start a workflow that will command the web server while it
    /// is down. Called before any prompting, so a declined guard leaves the
    /// session exactly where it was.
    pub fn ensure_web_server_live(&self) -> Result<(), EngineError> {
        if self.runtime.is_web_server_live() {
            Ok(())
        } else {
            Err(EngineError::WebServerDown)
        }
    }

    /// Compute the next registry and the side-effect plan for an intent.
    /// Pure with respect to disk and processes; on error the current
    /// registry is untouched and nothing else happened.
    pub fn propose(
        &self,
        intent: Intent,
        current: &Registry,
    ) -> Result<ProposedChange, RegistryError> {
        let mut next = current.clone();

        match &intent {
            Intent::Init { settings, domains } => {
                settings.validate()?;
                next.settings = settings.clone();
                for entry in domains {
                    next.add(entry.clone())?;
                }
            }
            Intent::AddDomains(domains) => {
                for entry in domains {
                    next.add(entry.clone())?;
                }
            }
            Intent::EditDomain(entry) => next.replace(entry.clone())?,
            Intent::RemoveDomain(name) => {
                next.remove(name)?;
            }
            Intent::PromoteToProduction(name) => next.promote(name)?,
            Intent::EditSettings(settings) => {
                settings.validate()?;
                next.settings = settings.clone();
            }
            Intent::ForceRenewAll | Intent::Reload => {}
        }

        Ok(ProposedChange {
            description: intent.describe(),
            scope: intent.regen_scope(),
            deletions: intent.artifact_deletions(),
            steps: intent.external_steps(),
            next,
        })
    }

    /// Apply a confirmed change.
    ///
    /// Ordering: durable save, then artifact regeneration and deletion, then
    /// the external sequence. A persistence failure aborts before anything
    /// else happens. Failures after that point are recorded in the report
    /// and execution continues: the orchestrated tools are idempotent and
    /// safely retryable, so the configuration is left reflecting user intent
    /// rather than rolled back.
    pub fn commit(&self, change: ProposedChange) -> Result<(Registry, CommitReport), EngineError> {
        let ProposedChange {
            next,
            scope,
            deletions,
            steps,
            ..
        } = change;

        self.store.save(&next)?;

        let mut report = CommitReport::default();
        self.regenerate(&next, &scope, &mut report)?;

        for name in &deletions {
            let step = format!("delete configuration for {}", name);
            match self.writer.delete_domain(name) {
                Ok(()) => report.record(step, StepOutcome::Success("deleted".into())),
                Err(ArtifactError::NotFound(_)) => {
                    warn!("Configuration for {} was already absent", name);
                    report.record(step, StepOutcome::Skipped("already absent".into()));
                }
                Err(e) => report.record(step, StepOutcome::Failed(e.to_string())),
            }
        }

        // All artifact writes have completed; the external sequence runs
        // strictly in order, one command at a time.
        for step in &steps {
            let outcome = self.run_step(step);
            report.record(
                step.label(),
                if outcome.ok {
                    StepOutcome::Success("ok".into())
                } else {
                    StepOutcome::Failed(summarize_failure(&outcome))
                },
            );
        }

        Ok((next, report))
    }

    fn regenerate(
        &self,
        registry: &Registry,
        scope: &RegenScope,
        report: &mut CommitReport,
    ) -> Result<(), EngineError> {
        let domains: Vec<&DomainEntry> = match scope {
            RegenScope::None => return Ok(()),
            RegenScope::GlobalOnly => Vec::new(),
            RegenScope::All => registry.domains.iter().collect(),
            RegenScope::GlobalAndDomains(names) => names
                .iter()
                .filter_map(|name| registry.find(name))
                .collect(),
        };

        let global = self
            .renderer
            .render_global(&registry.settings, &registry.domains)?;
        match self.writer.write_global(&global) {
            Ok(()) => report.record("write nginx.conf", StepOutcome::Success("written".into())),
            Err(e) => report.record("write nginx.conf", StepOutcome::Failed(e.to_string())),
        }

        for entry in domains {
            let text = self.renderer.render_domain(&registry.settings, entry)?;
            let step = format!("write configuration for {}", entry.domain);
            match self.writer.write_domain(&entry.domain, &text) {
                Ok(()) => report.record(step, StepOutcome::Success("written".into())),
                Err(e) => report.record(step, StepOutcome::Failed(e.to_string())),
            }
        }

        Ok(())
    }

    fn run_step(&self, step: &ExternalStep) -> CommandOutcome {
        match step {
            ExternalStep::ApplyPlaceholderCertificate => {
                self.runtime.apply_placeholder_certificate()
            }
            ExternalStep::IssueCertificate => self.runtime.issue_certificate(),
            ExternalStep::RevokeCertificate(domain) => self.runtime.revoke_certificate(domain),
            ExternalStep::Reload => self.runtime.reload(),
            ExternalStep::ForceRenewAll => self.runtime.force_renew_all(),
        }
    }
}

fn summarize_failure(outcome: &CommandOutcome) -> String {
    let error = outcome.error.as_deref().unwrap_or("command failed");
    if outcome.output.trim().is_empty() {
        error.to_string()
    } else {
        format!("{}\n{}", error, outcome.output.trim_end())
    }
}
