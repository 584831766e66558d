use reqwest::header::HeaderValue;
use reqwest::{Request, Url};
use std::sync::Arc;
use tracing::debug;

use crate::domain::models::{InterceptionRule, SharedLifecycle, ORIGINAL_DESTINATION_HEADER};
use crate::domain::ports::{RequestInterceptor, Reroute};

/// Rewrite `url` so it targets the governance process on `port`
///
/// Scheme and authority become `http://localhost:<port>`; path and query are
/// preserved verbatim, fragment and credentials are dropped.
pub fn local_target(url: &Url, port: u16) -> Option<Url> {
    let mut target = Url::parse(&format!("http://localhost:{port}/")).ok()?;
    target.set_path(url.path());
    target.set_query(url.query());
    Some(target)
}

/// Reroutes AI endpoint requests of one controller to its governance process
///
/// The route reads the controller's shared lifecycle on every request, so it
/// only claims requests while the controller is `Ready`.
#[derive(Debug, Clone)]
pub struct GuardianRoute {
    name: String,
    lifecycle: Arc<SharedLifecycle>,
    rule: InterceptionRule,
}

impl GuardianRoute {
    pub fn new(name: impl Into<String>, lifecycle: Arc<SharedLifecycle>, rule: InterceptionRule) -> Self {
        Self {
            name: name.into(),
            lifecycle,
            rule,
        }
    }

    pub fn lifecycle(&self) -> &Arc<SharedLifecycle> {
        &self.lifecycle
    }

    pub fn rule(&self) -> &InterceptionRule {
        &self.rule
    }

    /// Local target for `url`, or `None` when the request must pass through
    pub fn target_for(&self, url: &Url) -> Option<Url> {
        if !self.lifecycle.is_routing() || !self.rule.matches(url.path()) {
            return None;
        }
        local_target(url, self.lifecycle.port()?)
    }
}

impl RequestInterceptor for GuardianRoute {
    fn name(&self) -> &str {
        &self.name
    }

    fn rewrite(&self, request: &mut Request) -> Option<Reroute> {
        let original_url = request.url().clone();
        let target_url = self.target_for(&original_url)?;
        let destination = HeaderValue::from_str(original_url.as_str()).ok()?;

        request
            .headers_mut()
            .insert(ORIGINAL_DESTINATION_HEADER, destination);
        *request.url_mut() = target_url.clone();

        debug!(
            interceptor = %self.name,
            original_url = %original_url,
            target_url = %target_url,
            "Routing AI API call through Guardian"
        );

        Some(Reroute {
            interceptor: self.name.clone(),
            original_url,
            target_url,
        })
    }
}
