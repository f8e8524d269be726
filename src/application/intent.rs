use crate::domain::{DomainEntry, DomainName, GlobalSettings};

/// One fully-specified user intention, carrying exactly the data its
/// workflow needs. The per-intent regeneration scope and external command
/// sequence are exhaustive matches over this enum, so adding an intent
/// without deciding both is a compile error.
#[derive(Debug, Clone)]
pub enum Intent {
    /// First-run setup: global settings plus the initial domain list.
    /// No certificates exist yet, so no external commands run.
    Init {
        settings: GlobalSettings,
        domains: Vec<DomainEntry>,
    },
    AddDomains(Vec<DomainEntry>),
    /// Replace an existing domain's configuration (same name, new fields).
    EditDomain(DomainEntry),
    RemoveDomain(DomainName),
    /// Switch a domain from staging to production certificates.
    PromoteToProduction(DomainName),
    EditSettings(GlobalSettings),
    ForceRenewAll,
    Reload,
}

/// Which artifacts a committed intent regenerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenScope {
    All,
    GlobalAndDomains(Vec<DomainName>),
    GlobalOnly,
    None,
}

/// One orchestrator invocation in a commit's fixed step list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalStep {
    ApplyPlaceholderCertificate,
    IssueCertificate,
    RevokeCertificate(DomainName),
    Reload,
    ForceRenewAll,
}

impl ExternalStep {
    pub fn label(&self) -> String {
        match self {
            Self::ApplyPlaceholderCertificate => "apply placeholder certificate".to_string(),
            Self::IssueCertificate => "issue certificate".to_string(),
            Self::RevokeCertificate(domain) => format!("revoke certificate for {}", domain),
            Self::Reload => "reload nginx".to_string(),
            Self::ForceRenewAll => "force certificate renewal".to_string(),
        }
    }
}

impl Intent {
    pub fn describe(&self) -> String {
        match self {
            Self::Init { domains, .. } => format!("initialize with {} domain(s)", domains.len()),
            Self::AddDomains(domains) => format!("add {} domain(s)", domains.len()),
            Self::EditDomain(entry) => format!("edit {}", entry.domain),
            Self::RemoveDomain(name) => format!("remove {}", name),
            Self::PromoteToProduction(name) => {
                format!("switch {} to a production certificate", name)
            }
            Self::EditSettings(_) => "edit Nginx configuration".to_string(),
            Self::ForceRenewAll => "force renewal of all certificates".to_string(),
            Self::Reload => "reload Nginx".to_string(),
        }
    }

    pub fn regen_scope(&self) -> RegenScope {
        match self {
            Self::Init { .. } | Self::EditSettings(_) => RegenScope::All,
            Self::AddDomains(domains) => RegenScope::GlobalAndDomains(
                domains.iter().map(|entry| entry.domain.clone()).collect(),
            ),
            Self::EditDomain(entry) => {
                RegenScope::GlobalAndDomains(vec![entry.domain.clone()])
            }
            Self::PromoteToProduction(name) => {
                RegenScope::GlobalAndDomains(vec![name.clone()])
            }
            // The removed domain's artifact is deleted, not rewritten.
            Self::RemoveDomain(_) => RegenScope::GlobalOnly,
            Self::ForceRenewAll | Self::Reload => RegenScope::None,
        }
    }

    /// Artifacts to delete during commit, after regeneration.
    pub fn artifact_deletions(&self) -> Vec<DomainName> {
        match self {
            Self::RemoveDomain(name) => vec![name.clone()],
            _ => Vec::new(),
        }
    }

    /// The fixed, ordered orchestrator sequence for this intent. Later steps
    /// assume earlier ones took effect (a placeholder certificate must exist
    /// before the web server can serve the issuance challenge), which is why
    /// the engine runs them strictly in order.
    pub fn external_steps(&self) -> Vec<ExternalStep> {
        match self {
            Self::Init { .. } => vec![],
            Self::AddDomains(_) => vec![
                ExternalStep::ApplyPlaceholderCertificate,
                ExternalStep::IssueCertificate,
                ExternalStep::Reload,
            ],
            Self::EditDomain(_) | Self::EditSettings(_) => vec![ExternalStep::Reload],
            Self::RemoveDomain(name) => vec![
                ExternalStep::Reload,
                ExternalStep::RevokeCertificate(name.clone()),
            ],
            Self::PromoteToProduction(name) => vec![
                ExternalStep::RevokeCertificate(name.clone()),
                ExternalStep::ApplyPlaceholderCertificate,
                ExternalStep::IssueCertificate,
                ExternalStep::Reload,
            ],
            Self::ForceRenewAll => vec![ExternalStep::ForceRenewAll, ExternalStep::Reload],
            Self::Reload => vec![ExternalStep::Reload],
        }
    }
}
