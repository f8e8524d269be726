use std::fmt;

use super::{DomainName, Email, Upstream};

/// How Nginx answers requests for a domain.
///
/// The reverse-proxy-only fields live inside the variant, so an entry for a
/// static or PHP-FPM domain cannot carry a stray upstream or resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestHandler {
    /// Serve static files from the domain's web root.
    StaticContent,

    /// Proxy requests to a backend service.
    ReverseProxy {
        upstream: Upstream,
        /// Resolver to use for the upstream host, typically the
        /// Docker-internal DNS at `127.0.0.11` when the backend is another
        /// Compose service.
        dns_resolver: Option<String>,
        /// Forward WebSocket upgrade handshakes to the backend.
        websockets: bool,
    },

    /// Hand requests to a PHP-FPM service over FastCGI.
    PhpFpm,
}

impl fmt::Display for RequestHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticContent => write!(f, "static content"),
            Self::ReverseProxy { upstream, .. } => write!(f, "reverse proxy -> {}", upstream),
            Self::PhpFpm => write!(f, "PHP-FPM"),
        }
    }
}

/// One hostname's full configuration: TLS preferences plus request handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    pub domain: DomainName,
    pub email: Option<Email>,
    pub www_subdomain: bool,
    /// Whether certificates come from the staging (test) CA endpoint.
    /// Flips to `false` exactly once, via production promotion.
    pub test_cert: bool,
    pub rsa_key_size: u32,
    pub handler: RequestHandler,
}

#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("RSA key size must be positive")]
    ZeroRsaKeySize,
}

impl DomainEntry {
    pub fn validate(&self) -> Result<(), EntryError> {
        if self.rsa_key_size == 0 {
            return Err(EntryError::ZeroRsaKeySize);
        }
        Ok(())
    }

    /// Whether this entry proxies WebSocket traffic. The global artifact
    /// needs this to decide on the `map $http_upgrade` block.
    pub fn uses_websockets(&self) -> bool {
        matches!(
            self.handler,
            RequestHandler::ReverseProxy {
                websockets: true,
                ..
            }
        )
    }
}
