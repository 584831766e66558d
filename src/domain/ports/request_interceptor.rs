use reqwest::{Request, Url};

/// Outcome of a rewritten outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reroute {
    /// Name of the interceptor that claimed the request
    pub interceptor: String,
    /// Absolute URL before the rewrite
    pub original_url: Url,
    /// Absolute URL the request is sent to instead
    pub target_url: Url,
}

/// Port trait for outbound request rewriting
///
/// An interceptor either claims a request, rewriting it in place and
/// returning the [`Reroute`], or leaves it untouched and returns `None`.
/// A request that is not claimed must not be modified at all.
pub trait RequestInterceptor: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &str;

    /// Rewrite `request` if this interceptor claims it
    fn rewrite(&self, request: &mut Request) -> Option<Reroute>;
}
