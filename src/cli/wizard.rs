//! Interactive prompts. Invalid input never leaves a prompt: every answer is
//! validated in place and re-asked until it parses, so the workflow layer
//! only ever sees well-formed values.

use anyhow::Result;
use dialoguer::{Confirm, Input, Select};

use crate::domain::{
    DomainEntry, DomainName, Email, GlobalSettings, Registry, RequestHandler, Upstream,
};

/// Docker's embedded DNS server, used when the proxied backend is another
/// service in the same Compose file.
const DOCKER_DNS: &str = "127.0.0.11";

pub fn confirm_proposal() -> Result<bool> {
    Ok(Confirm::new()
        .with_prompt("Are the entered data correct?")
        .default(false)
        .interact()?)
}

/// Ask for one or more new domains, looping until the user declines to add
/// another. Names are checked against the registry and the batch itself.
pub fn ask_new_domains(registry: &Registry) -> Result<Vec<DomainEntry>> {
    let mut entries: Vec<DomainEntry> = Vec::new();

    loop {
        let mut taken = registry.domain_names();
        taken.extend(entries.iter().map(|entry| entry.domain.clone()));

        let domain = ask_domain_name(taken)?;
        entries.push(ask_entry_fields(domain, None)?);

        let again = Confirm::new()
            .with_prompt("Want to add another domain?")
            .default(false)
            .interact()?;
        if !again {
            return Ok(entries);
        }
    }
}

/// Re-ask every editable field of an existing entry, defaulting to its
/// current values. The domain name and the staging/production state are
/// fixed: the name is the entry's identity and promotion has its own
/// workflow.
pub fn ask_edited_domain(existing: &DomainEntry) -> Result<DomainEntry> {
    ask_entry_fields(existing.domain.clone(), Some(existing))
}

pub fn ask_settings(current: &GlobalSettings) -> Result<GlobalSettings> {
    let dhparams_size: u32 = Input::new()
        .with_prompt("What is the DH parameters size in bits?")
        .default(current.dhparams_size)
        .validate_with(|size: &u32| {
            if *size == 0 {
                Err("Size must be positive")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let gzip = Confirm::new()
        .with_prompt("Use Gzip?")
        .default(current.gzip)
        .interact()?;

    Ok(GlobalSettings {
        dhparams_size,
        gzip,
    })
}

pub fn choose_domain(action: &str, registry: &Registry) -> Result<DomainName> {
    let names = registry.domain_names();
    let items: Vec<&str> = names.iter().map(DomainName::as_str).collect();

    let selection = Select::new()
        .with_prompt(format!("What domain do you want to {}?", action))
        .items(&items)
        .default(0)
        .interact()?;

    Ok(names[selection].clone())
}

/// Pick among the domains still on staging certificates.
/// Returns `None` when every domain is already on production.
pub fn choose_staging_domain(registry: &Registry) -> Result<Option<DomainName>> {
    let names: Vec<DomainName> = registry
        .domains
        .iter()
        .filter(|entry| entry.test_cert)
        .map(|entry| entry.domain.clone())
        .collect();
    if names.is_empty() {
        return Ok(None);
    }

    let items: Vec<&str> = names.iter().map(DomainName::as_str).collect();
    let selection = Select::new()
        .with_prompt("What domain do you want to switch to a production certificate?")
        .items(&items)
        .default(0)
        .interact()?;

    Ok(Some(names[selection].clone()))
}

fn ask_domain_name(taken: Vec<DomainName>) -> Result<DomainName> {
    let input: String = Input::new()
        .with_prompt("What's your domain name (e.g. example.com)?")
        .validate_with(move |value: &String| -> Result<(), String> {
            let name = DomainName::new(value.clone()).map_err(|e| e.to_string())?;
            if taken.contains(&name) {
                return Err(format!("{} is already configured", name));
            }
            Ok(())
        })
        .interact_text()?;

    Ok(DomainName::new(input)?)
}

fn ask_entry_fields(
    domain: DomainName,
    existing: Option<&DomainEntry>,
) -> Result<DomainEntry> {
    let email_input: String = Input::new()
        .with_prompt("What's your email for registration and recovery contact?")
        .allow_empty(true)
        .default(
            existing
                .and_then(|entry| entry.email.as_ref())
                .map(ToString::to_string)
                .unwrap_or_default(),
        )
        .validate_with(|value: &String| -> Result<(), String> {
            if value.is_empty() {
                return Ok(());
            }
            Email::new(value.clone())
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;
    let email = if email_input.is_empty() {
        None
    } else {
        Some(Email::new(email_input)?)
    };

    let www_subdomain = Confirm::new()
        .with_prompt("Want to have 'www' subdomain (e.g. www.example.com)?")
        .default(existing.map_or(true, |entry| entry.www_subdomain))
        .interact()?;

    let test_cert = match existing {
        Some(entry) => entry.test_cert,
        None => Confirm::new()
            .with_prompt("Want to obtain a test certificate from a staging server?")
            .default(true)
            .interact()?,
    };

    let rsa_key_size: u32 = Input::new()
        .with_prompt("What is the RSA key size in bits?")
        .default(existing.map_or(4096, |entry| entry.rsa_key_size))
        .validate_with(|size: &u32| {
            if *size == 0 {
                Err("Key size must be positive")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let handler = ask_handler(existing)?;

    Ok(DomainEntry {
        domain,
        email,
        www_subdomain,
        test_cert,
        rsa_key_size,
        handler,
    })
}

fn ask_handler(existing: Option<&DomainEntry>) -> Result<RequestHandler> {
    let items = [
        "To serve static content",
        "As a reverse proxy",
        "To pass requests to PHP-FPM",
    ];
    let default = match existing.map(|entry| &entry.handler) {
        Some(RequestHandler::ReverseProxy { .. }) => 1,
        Some(RequestHandler::PhpFpm) => 2,
        _ => 0,
    };

    let selection = Select::new()
        .with_prompt("How do you want to configure Nginx?")
        .items(&items)
        .default(default)
        .interact()?;

    if selection != 1 {
        return Ok(if selection == 0 {
            RequestHandler::StaticContent
        } else {
            RequestHandler::PhpFpm
        });
    }

    let previous = match existing.map(|entry| &entry.handler) {
        Some(RequestHandler::ReverseProxy {
            upstream,
            dns_resolver,
            websockets,
        }) => Some((upstream.clone(), dns_resolver.clone(), *websockets)),
        _ => None,
    };

    let compose_service = Confirm::new()
        .with_prompt("Proxy to a server defined in the same docker-compose.yml?")
        .default(
            previous
                .as_ref()
                .map_or(true, |(_, resolver, _)| resolver.is_some()),
        )
        .interact()?;

    let mut upstream_prompt = Input::new()
        .with_prompt("What is the address of the proxied server (e.g. example-backend:8080)?");
    if let Some((upstream, _, _)) = &previous {
        upstream_prompt = upstream_prompt.default(upstream.to_string());
    }
    let upstream_input: String = upstream_prompt
        .validate_with(|value: &String| -> Result<(), String> {
            Upstream::new(value.clone())
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    let websockets = Confirm::new()
        .with_prompt("Proxy WebSocket connections to the server?")
        .default(previous.as_ref().is_some_and(|(_, _, ws)| *ws))
        .interact()?;

    Ok(RequestHandler::ReverseProxy {
        upstream: Upstream::new(upstream_input)?,
        dns_resolver: compose_service.then(|| DOCKER_DNS.to_string()),
        websockets,
    })
}
