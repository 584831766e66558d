use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Body, Client, IntoUrl, Method, Request, RequestBuilder, Response};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::registry::InterceptorRegistry;

/// HTTP client that routes requests through an [`InterceptorRegistry`]
///
/// Call sites build requests exactly as with `reqwest::Client`: the builders
/// returned by [`get`](Self::get), [`post`](Self::post) and
/// [`request`](Self::request) send through the registry, as does
/// [`execute`](Self::execute). Requests no installed interceptor claims are
/// sent unmodified.
///
/// With `fail_open` enabled, a rerouted request that cannot connect to the
/// governance process is replayed against its original destination, provided
/// its body can be cloned.
#[derive(Clone)]
pub struct GuardedClient {
    inner: Client,
    registry: Arc<InterceptorRegistry>,
    fail_open: bool,
}

impl GuardedClient {
    /// Wrap a fresh client bound to the process-wide registry
    pub fn new() -> reqwest::Result<Self> {
        Ok(Self::with_registry(
            Client::builder().build()?,
            InterceptorRegistry::shared(),
        ))
    }

    pub fn with_registry(inner: Client, registry: Arc<InterceptorRegistry>) -> Self {
        Self {
            inner,
            registry,
            fail_open: true,
        }
    }

    #[must_use]
    pub fn fail_open(mut self, enabled: bool) -> Self {
        self.fail_open = enabled;
        self
    }

    pub fn inner(&self) -> &Client {
        &self.inner
    }

    pub fn registry(&self) -> &Arc<InterceptorRegistry> {
        &self.registry
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> GuardedRequestBuilder {
        GuardedRequestBuilder {
            client: self.clone(),
            inner: self.inner.request(method, url),
        }
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> GuardedRequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> GuardedRequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put<U: IntoUrl>(&self, url: U) -> GuardedRequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Send `request`, rerouting it when an interceptor claims it
    pub async fn execute(&self, mut request: Request) -> reqwest::Result<Response> {
        let fallback = if self.fail_open {
            request.try_clone()
        } else {
            None
        };

        let Some(reroute) = self.registry.apply(&mut request) else {
            return self.inner.execute(request).await;
        };

        match self.inner.execute(request).await {
            Err(e) if e.is_connect() || e.is_timeout() => match fallback {
                Some(original) => {
                    warn!(
                        original_url = %reroute.original_url,
                        target_url = %reroute.target_url,
                        error = %e,
                        "Guardian unreachable, sending request to original destination"
                    );
                    self.inner.execute(original).await
                }
                None => Err(e),
            },
            result => result,
        }
    }
}

/// Request builder whose [`send`](Self::send) goes through the registry
pub struct GuardedRequestBuilder {
    client: GuardedClient,
    inner: RequestBuilder,
}

impl GuardedRequestBuilder {
    fn map(self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        Self {
            client: self.client,
            inner: f(self.inner),
        }
    }

    #[must_use]
    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<axum::http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<axum::http::Error>,
    {
        self.map(|inner| inner.header(key, value))
    }

    #[must_use]
    pub fn headers(self, headers: HeaderMap) -> Self {
        self.map(|inner| inner.headers(headers))
    }

    #[must_use]
    pub fn bearer_auth<T: fmt::Display>(self, token: T) -> Self {
        self.map(|inner| inner.bearer_auth(token))
    }

    #[must_use]
    pub fn body<T: Into<Body>>(self, body: T) -> Self {
        self.map(|inner| inner.body(body))
    }

    #[must_use]
    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> Self {
        self.map(|inner| inner.json(json))
    }

    #[must_use]
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> Self {
        self.map(|inner| inner.query(query))
    }

    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.map(|inner| inner.timeout(timeout))
    }

    pub fn build(self) -> reqwest::Result<Request> {
        self.inner.build()
    }

    /// Send the request, rerouting it when an interceptor claims it
    pub async fn send(self) -> reqwest::Result<Response> {
        let request = self.inner.build()?;
        self.client.execute(request).await
    }
}

impl fmt::Debug for GuardedRequestBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardedRequestBuilder")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
