use minijinja::{Environment, Value, context};

use crate::domain::{DomainEntry, GlobalSettings, RequestHandler};

static NGINX_CONF: &str = include_str!("templates/nginx.conf.j2");
static SERVER_CONF: &str = include_str!("templates/server.conf.j2");

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to compile template '{name}': {source}")]
    Compile {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to render template '{name}': {source}")]
    Render {
        name: &'static str,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders Nginx configuration text from the embedded templates.
///
/// The environment is built once at startup; a template that fails to
/// compile aborts the program there instead of failing per render. Rendering
/// itself is pure: same settings and entry, same text.
pub struct TemplateRenderer {
    env: Environment<'static>,
}

const GLOBAL_TEMPLATE: &str = "nginx.conf";
const SERVER_TEMPLATE: &str = "server.conf";

impl TemplateRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);

        for (name, source) in [(GLOBAL_TEMPLATE, NGINX_CONF), (SERVER_TEMPLATE, SERVER_CONF)] {
            env.add_template(name, source)
                .map_err(|source| RenderError::Compile { name, source })?;
        }

        Ok(Self { env })
    }

    /// The global artifact depends on the settings and on whether any domain
    /// proxies websockets (the upgrade map lives at the `http` level).
    pub fn render_global(
        &self,
        settings: &GlobalSettings,
        domains: &[DomainEntry],
    ) -> Result<String, RenderError> {
        self.render(
            GLOBAL_TEMPLATE,
            context! {
                dhparams_size => settings.dhparams_size,
                gzip => settings.gzip,
                websockets => domains.iter().any(DomainEntry::uses_websockets),
            },
        )
    }

    /// A per-domain artifact depends only on its own entry and the settings
    /// snapshot taken at render time.
    pub fn render_domain(
        &self,
        _settings: &GlobalSettings,
        entry: &DomainEntry,
    ) -> Result<String, RenderError> {
        let (handler, upstream, dns_resolver, websockets) = match &entry.handler {
            RequestHandler::StaticContent => ("static-content", None, None, false),
            RequestHandler::ReverseProxy {
                upstream,
                dns_resolver,
                websockets,
            } => (
                "reverse-proxy",
                Some(upstream.as_str()),
                dns_resolver.as_deref(),
                *websockets,
            ),
            RequestHandler::PhpFpm => ("php-fpm", None, None, false),
        };

        self.render(
            SERVER_TEMPLATE,
            context! {
                domain => entry.domain.as_str(),
                www_subdomain => entry.www_subdomain,
                handler => handler,
                upstream => upstream,
                dns_resolver => dns_resolver,
                websockets => websockets,
            },
        )
    }

    fn render(&self, name: &'static str, ctx: Value) -> Result<String, RenderError> {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .map_err(|source| RenderError::Render { name, source })
    }
}
