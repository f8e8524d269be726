//! Persistence DTOs for the registry record.
//!
//! Decouples the on-disk TOML layout from the domain types so that adding
//! or removing domain fields doesn't accidentally change the record layout,
//! and deserialization can't bypass the invariants enforced by the domain
//! constructors.

use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainEntry, DomainName, DomainNameError, Email, EmailError, GlobalSettings, Registry,
    RegistryError, RequestHandler, Upstream, UpstreamError,
};

/// A record that parsed as TOML but does not describe a valid registry.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    DomainName(#[from] DomainNameError),

    #[error(transparent)]
    Email(#[from] EmailError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Domain {0}: upstream is required for the reverse-proxy handler")]
    MissingUpstream(String),

    #[error("Domain {0}: proxy fields are only valid for the reverse-proxy handler")]
    StrayProxyFields(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum HandlerKind {
    StaticContent,
    ReverseProxy,
    PhpFpm,
}

/// One `[[domains]]` table. The reverse-proxy fields are flat optionals on
/// disk and folded back into the handler variant on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DomainEntryDto {
    domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    www_subdomain: bool,
    test_cert: bool,
    rsa_key_size: u32,
    handler: HandlerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    upstream: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dns_resolver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    websockets: Option<bool>,
}

/// Top-level record: flattened global settings, then the domain tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct RegistryDto {
    dhparams_size: u32,
    gzip: bool,
    #[serde(default)]
    domains: Vec<DomainEntryDto>,
}

impl From<&DomainEntry> for DomainEntryDto {
    fn from(entry: &DomainEntry) -> Self {
        let (upstream, dns_resolver, websockets) = match &entry.handler {
            RequestHandler::ReverseProxy {
                upstream,
                dns_resolver,
                websockets,
            } => (
                Some(upstream.to_string()),
                dns_resolver.clone(),
                Some(*websockets),
            ),
            RequestHandler::StaticContent | RequestHandler::PhpFpm => (None, None, None),
        };

        Self {
            domain: entry.domain.to_string(),
            email: entry.email.as_ref().map(ToString::to_string),
            www_subdomain: entry.www_subdomain,
            test_cert: entry.test_cert,
            rsa_key_size: entry.rsa_key_size,
            handler: match entry.handler {
                RequestHandler::StaticContent => HandlerKind::StaticContent,
                RequestHandler::ReverseProxy { .. } => HandlerKind::ReverseProxy,
                RequestHandler::PhpFpm => HandlerKind::PhpFpm,
            },
            upstream,
            dns_resolver,
            websockets,
        }
    }
}

impl TryFrom<DomainEntryDto> for DomainEntry {
    type Error = RecordError;

    fn try_from(dto: DomainEntryDto) -> Result<Self, Self::Error> {
        let handler = match dto.handler {
            HandlerKind::ReverseProxy => RequestHandler::ReverseProxy {
                upstream: Upstream::new(
                    dto.upstream
                        .ok_or_else(|| RecordError::MissingUpstream(dto.domain.clone()))?,
                )?,
                dns_resolver: dto.dns_resolver,
                websockets: dto.websockets.unwrap_or(false),
            },
            HandlerKind::StaticContent | HandlerKind::PhpFpm => {
                if dto.upstream.is_some()
                    || dto.dns_resolver.is_some()
                    || dto.websockets.is_some()
                {
                    return Err(RecordError::StrayProxyFields(dto.domain));
                }
                match dto.handler {
                    HandlerKind::StaticContent => RequestHandler::StaticContent,
                    _ => RequestHandler::PhpFpm,
                }
            }
        };

        Ok(Self {
            domain: DomainName::new(dto.domain)?,
            email: dto.email.map(Email::new).transpose()?,
            www_subdomain: dto.www_subdomain,
            test_cert: dto.test_cert,
            rsa_key_size: dto.rsa_key_size,
            handler,
        })
    }
}

impl From<&Registry> for RegistryDto {
    fn from(registry: &Registry) -> Self {
        Self {
            dhparams_size: registry.settings.dhparams_size,
            gzip: registry.settings.gzip,
            domains: registry.domains.iter().map(DomainEntryDto::from).collect(),
        }
    }
}

impl TryFrom<RegistryDto> for Registry {
    type Error = RecordError;

    fn try_from(dto: RegistryDto) -> Result<Self, Self::Error> {
        let mut registry = Registry {
            settings: GlobalSettings {
                dhparams_size: dto.dhparams_size,
                gzip: dto.gzip,
            },
            domains: Vec::new(),
        };
        registry.settings.validate()?;

        // Registry::add re-checks uniqueness and entry invariants, so a
        // hand-edited record with duplicates is rejected here.
        for entry_dto in dto.domains {
            registry.add(DomainEntry::try_from(entry_dto)?)?;
        }

        Ok(registry)
    }
}
