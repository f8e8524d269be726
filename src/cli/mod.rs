mod wizard;

use anyhow::{Context, Result};
use dialoguer::Select;

use crate::application::{CommitReport, Intent, WorkflowEngine};
use crate::domain::Registry;
use crate::infrastructure::compose::DockerCompose;
use crate::infrastructure::nginx::{ConfigFileWriter, TemplateRenderer};
use crate::infrastructure::paths::ProjectPaths;
use crate::infrastructure::store::ConfigStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuChoice {
    AddDomains,
    EditDomain,
    RemoveDomain,
    PromoteToProduction,
    EditSettings,
    ForceRenew,
    Reload,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 8] = [
        MenuChoice::AddDomains,
        MenuChoice::EditDomain,
        MenuChoice::RemoveDomain,
        MenuChoice::PromoteToProduction,
        MenuChoice::EditSettings,
        MenuChoice::ForceRenew,
        MenuChoice::Reload,
        MenuChoice::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuChoice::AddDomains => "Add new domains",
            MenuChoice::EditDomain => "Edit an existing domain",
            MenuChoice::RemoveDomain => "Remove a domain",
            MenuChoice::PromoteToProduction => "Switch a domain to a production certificate",
            MenuChoice::EditSettings => "Edit Nginx configuration",
            MenuChoice::ForceRenew => "Force renewal of all certificates",
            MenuChoice::Reload => "Reload Nginx",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Intents that command the running web server are refused up front
    /// when it is down, before any prompting starts.
    fn needs_live_web_server(self) -> bool {
        matches!(
            self,
            MenuChoice::EditDomain
                | MenuChoice::RemoveDomain
                | MenuChoice::PromoteToProduction
                | MenuChoice::EditSettings
                | MenuChoice::Reload
        )
    }

    /// Choices that start by picking one of the configured domains.
    fn needs_existing_domain(self) -> bool {
        matches!(
            self,
            MenuChoice::EditDomain | MenuChoice::RemoveDomain | MenuChoice::PromoteToProduction
        )
    }
}

/// Run one interactive session: load state, then either the first-run
/// initialization workflow or the main menu loop.
pub fn run(paths: &ProjectPaths) -> Result<()> {
    let store = ConfigStore::new(paths.registry_file.clone());
    let renderer =
        TemplateRenderer::new().context("The embedded Nginx templates failed to compile")?;
    let writer = ConfigFileWriter::new(paths);
    let runtime = DockerCompose::new(paths);
    let engine = WorkflowEngine::new(&store, &renderer, &writer, &runtime);

    let mut registry = store.load();

    if registry.is_empty() {
        return initialize(&engine, &mut registry);
    }

    loop {
        let items: Vec<&str> = MenuChoice::ALL.iter().map(|choice| choice.label()).collect();
        let selection = Select::new()
            .with_prompt("What do you want to do?")
            .items(&items)
            .default(0)
            .interact()?;
        let choice = MenuChoice::ALL[selection];

        if choice == MenuChoice::Exit {
            return Ok(());
        }

        if choice.needs_live_web_server() {
            if let Err(e) = engine.ensure_web_server_live() {
                println!("{}\n", e);
                continue;
            }
        }

        if choice.needs_existing_domain() && registry.is_empty() {
            println!("No domains are configured yet.\n");
            continue;
        }

        let intent = match choice {
            MenuChoice::AddDomains => Some(Intent::AddDomains(wizard::ask_new_domains(&registry)?)),
            MenuChoice::EditDomain => {
                let name = wizard::choose_domain("edit", &registry)?;
                // The picker only offers configured names.
                let existing = registry
                    .find(&name)
                    .cloned()
                    .context("selected domain disappeared from the registry")?;
                Some(Intent::EditDomain(wizard::ask_edited_domain(&existing)?))
            }
            MenuChoice::RemoveDomain => {
                Some(Intent::RemoveDomain(wizard::choose_domain("remove", &registry)?))
            }
            MenuChoice::PromoteToProduction => match wizard::choose_staging_domain(&registry)? {
                Some(name) => Some(Intent::PromoteToProduction(name)),
                None => {
                    println!("Every configured domain already uses a production certificate.\n");
                    None
                }
            },
            MenuChoice::EditSettings => {
                Some(Intent::EditSettings(wizard::ask_settings(&registry.settings)?))
            }
            MenuChoice::ForceRenew => Some(Intent::ForceRenewAll),
            MenuChoice::Reload => Some(Intent::Reload),
            MenuChoice::Exit => None,
        };

        if let Some(intent) = intent {
            run_intent(&engine, &mut registry, intent)?;
        }
        println!();
    }
}

/// First-run workflow: collect settings and at least one domain, confirm,
/// commit. No certificates exist yet, so no orchestrator commands run.
fn initialize(engine: &WorkflowEngine<'_>, registry: &mut Registry) -> Result<()> {
    println!("No existing configuration found. Let's create one.\n");

    let domains = wizard::ask_new_domains(registry)?;
    let settings = wizard::ask_settings(&registry.settings)?;

    run_intent(engine, registry, Intent::Init { settings, domains })?;

    if !registry.is_empty() {
        println!("\nConfiguration created. Start the stack with `docker compose up -d`,");
        println!("then rerun this tool to obtain certificates or adjust domains.");
    }
    Ok(())
}

/// The single confirmation gate: propose, show, ask, and only then commit.
/// Declining drops the proposal with no durable or external effect.
fn run_intent(engine: &WorkflowEngine<'_>, registry: &mut Registry, intent: Intent) -> Result<()> {
    let proposed = match engine.propose(intent, registry) {
        Ok(proposed) => proposed,
        Err(e) => {
            println!("Cannot apply this change: {}", e);
            return Ok(());
        }
    };

    println!("\nAbout to {}.\n", proposed.description());
    print_registry(proposed.registry());

    if !wizard::confirm_proposal()? {
        println!("Discarded; nothing was changed.");
        return Ok(());
    }

    match engine.commit(proposed) {
        Ok((next, report)) => {
            *registry = next;
            print_report(&report);
        }
        Err(e) => println!("The change could not be applied: {}", e),
    }
    Ok(())
}

fn print_registry(registry: &Registry) {
    println!("Domains:");
    for entry in &registry.domains {
        let cert = if entry.test_cert {
            "staging certificate"
        } else {
            "production certificate"
        };
        println!(
            "  {} ({}, RSA {} bits)",
            entry.domain, cert, entry.rsa_key_size
        );
        println!("    handler: {}", entry.handler);
        if entry.www_subdomain {
            println!("    www subdomain: yes");
        }
        if let Some(email) = &entry.email {
            println!("    contact: {}", email);
        }
    }
    println!(
        "Settings: {}-bit DH parameters, gzip {}\n",
        registry.settings.dhparams_size,
        if registry.settings.gzip { "on" } else { "off" }
    );
}

fn print_report(report: &CommitReport) {
    println!();
    for (step, outcome) in &report.steps {
        println!("  {}: {}", step, outcome);
    }
    if report.succeeded() {
        println!("\nDone.");
    } else {
        println!("\nCompleted with failures. The configuration already reflects your");
        println!("changes; review the output above and retry the failed commands.");
    }
}
