//! Tenant routing
//!
//! Every request is classified from its hostname and path alone. Requests for
//! The Curve's hostname are served from the `/thecurve` namespace without the
//! visitor seeing a different URL; static assets are never touched.

use axum::{
    extract::Request,
    http::{header, uri::PathAndQuery, Uri},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Framework-internal prefix for bundled static files
pub const INTERNAL_PREFIX: &str = "/_static";

/// Conventional favicon location
pub const FAVICON_PATH: &str = "/favicon.ico";

/// A visual tenant served from the shared content repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tenant {
    /// The main site; also the default for unknown hostnames
    Main,
    /// The Curve conference microsite
    Conference,
}

impl Tenant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tenant::Main => "main",
            Tenant::Conference => "conference",
        }
    }

    /// Hostname prefix selecting this tenant
    fn host_prefix(&self) -> Option<&'static str> {
        match self {
            Tenant::Main => None,
            Tenant::Conference => Some("thecurve."),
        }
    }

    /// Path namespace this tenant's pages live under
    pub fn namespace(&self) -> Option<&'static str> {
        match self {
            Tenant::Main => None,
            Tenant::Conference => Some("/thecurve"),
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        self.host_prefix().is_some_and(|prefix| {
            host.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        })
    }

    /// Select the tenant for a hostname
    pub fn from_host(host: &str) -> Tenant {
        if Tenant::Conference.matches_host(host) {
            Tenant::Conference
        } else {
            Tenant::Main
        }
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tenant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Tenant::Main),
            "conference" | "thecurve" => Ok(Tenant::Conference),
            _ => anyhow::bail!("Unknown tenant: {}. Available: main, conference", s),
        }
    }
}

/// Per-request tenant information, available to handlers as an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub is_asset: bool,
}

impl TenantContext {
    pub fn from_request(host: &str, path: &str) -> Self {
        Self {
            tenant: Tenant::from_host(host),
            is_asset: is_asset_path(path),
        }
    }
}

/// Path the client actually requested, before any rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalPath(pub String);

/// What to do with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Static asset: served as is, no tenant logic
    Asset,
    /// Served at the requested path
    Passthrough { tenant: Tenant },
    /// Served as if `path` had been requested
    Rewrite { tenant: Tenant, path: String },
}

impl RouteDecision {
    pub fn tenant(&self) -> Option<Tenant> {
        match self {
            RouteDecision::Asset => None,
            RouteDecision::Passthrough { tenant } | RouteDecision::Rewrite { tenant, .. } => {
                Some(*tenant)
            }
        }
    }

    /// The path downstream handlers should see
    pub fn effective_path<'a>(&'a self, requested: &'a str) -> &'a str {
        match self {
            RouteDecision::Rewrite { path, .. } => path,
            _ => requested,
        }
    }
}

/// Whether a path is a static asset.
///
/// Any `.` in the path counts, so a slug containing a dot is also treated as
/// an asset and never reaches the content handlers.
pub fn is_asset_path(path: &str) -> bool {
    path.starts_with(INTERNAL_PREFIX) || path == FAVICON_PATH || path.contains('.')
}

/// Decide how to route a request
pub fn route(host: &str, path: &str) -> RouteDecision {
    if is_asset_path(path) {
        return RouteDecision::Asset;
    }

    let tenant = Tenant::from_host(host);
    match tenant.namespace() {
        Some(namespace) if !in_namespace(path, namespace) => RouteDecision::Rewrite {
            tenant,
            path: prefix_path(namespace, path),
        },
        _ => RouteDecision::Passthrough { tenant },
    }
}

fn in_namespace(path: &str, namespace: &str) -> bool {
    path.strip_prefix(namespace)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn prefix_path(namespace: &str, path: &str) -> String {
    match path {
        "" | "/" => namespace.to_string(),
        p if p.starts_with('/') => format!("{}{}", namespace, p),
        p => format!("{}/{}", namespace, p),
    }
}

/// Middleware applying [`route`] to every request.
///
/// Must wrap the whole router so the rewritten URI is what gets matched.
pub async fn rewrite_middleware(mut request: Request, next: Next) -> Response {
    let host = request_host(&request);
    let path = request.uri().path().to_string();

    let decision = route(&host, &path);
    let target = decision.effective_path(&path);
    tracing::debug!(
        host = %host,
        path = %path,
        tenant = ?decision.tenant(),
        target = %target,
        "Routed request"
    );

    if target != path {
        let new_uri = build_uri_with_new_path(request.uri(), target);
        *request.uri_mut() = new_uri;
    }
    // Handlers always see the visible path, rewritten or not
    request.extensions_mut().insert(OriginalPath(path.clone()));
    request
        .extensions_mut()
        .insert(TenantContext::from_request(&host, &path));

    next.run(request).await
}

fn request_host(request: &Request) -> String {
    request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().host())
        .unwrap_or_default()
        .to_string()
}

/// Builds a new URI with a different path but the same query
fn build_uri_with_new_path(original: &Uri, new_path: &str) -> Uri {
    let path_and_query = match original.query() {
        Some(query) => format!("{}?{}", new_path, query),
        None => new_path.to_string(),
    };

    let mut parts = original.clone().into_parts();
    match PathAndQuery::try_from(path_and_query) {
        Ok(pq) => parts.path_and_query = Some(pq),
        Err(e) => {
            tracing::warn!("Cannot rewrite {} to {}: {}", original, new_path, e);
            return original.clone();
        }
    }

    Uri::from_parts(parts).unwrap_or_else(|_| original.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::{Layer, ServiceExt};

    const PATHS: [&str; 6] = ["/", "/speakers", "/speakers/", "/agenda/day-1", "/x?y", "/thecurvex"];

    #[test]
    fn test_conference_rewrite() {
        assert_eq!(
            route("thecurve.example.org", "/speakers"),
            RouteDecision::Rewrite {
                tenant: Tenant::Conference,
                path: "/thecurve/speakers".to_string(),
            }
        );
    }

    #[test]
    fn test_decision_tenant() {
        assert_eq!(route("example.org", "/x.png").tenant(), None);
        assert_eq!(route("example.org", "/about").tenant(), Some(Tenant::Main));
        assert_eq!(
            route("thecurve.example.org", "/about").tenant(),
            Some(Tenant::Conference)
        );
    }

    #[test]
    fn test_conference_root() {
        let decision = route("thecurve.example.org", "/");
        assert_eq!(decision.effective_path("/"), "/thecurve");
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        for path in PATHS {
            let once = route("thecurve.example.org", path);
            let rewritten = once.effective_path(path).to_string();
            assert!(rewritten.starts_with("/thecurve"), "{path} -> {rewritten}");
            assert!(!rewritten.starts_with("/thecurve/thecurve/"), "{path} -> {rewritten}");

            let twice = route("thecurve.example.org", &rewritten);
            assert_eq!(
                twice,
                RouteDecision::Passthrough {
                    tenant: Tenant::Conference
                },
                "{path}"
            );
        }
    }

    #[test]
    fn test_namespace_paths_pass_through() {
        for path in ["/thecurve", "/thecurve/", "/thecurve/speakers"] {
            assert_eq!(
                route("thecurve.example.org", path),
                RouteDecision::Passthrough {
                    tenant: Tenant::Conference
                }
            );
        }
        assert_eq!(
            route("thecurve.example.org", "/thecurvex").effective_path("/thecurvex"),
            "/thecurve/thecurvex"
        );
    }

    #[test]
    fn test_dotted_paths_are_assets() {
        for host in ["example.org", "thecurve.example.org", ""] {
            for path in ["/favicon.ico", "/post-images/a/header.png", "/posts/v1.2-notes", "/."] {
                assert_eq!(route(host, path), RouteDecision::Asset, "{host} {path}");
            }
        }
    }

    #[test]
    fn test_reserved_prefixes_are_assets() {
        assert_eq!(route("thecurve.example.org", "/_static/app"), RouteDecision::Asset);
        assert_eq!(route("example.org", "/_static"), RouteDecision::Asset);
        assert!(is_asset_path(FAVICON_PATH));
        assert!(!is_asset_path("/posts/hello"));
    }

    #[test]
    fn test_other_hosts_pass_through() {
        for host in ["example.org", "www.thecurve.example.org", "thecurve", "localhost:3000"] {
            assert_eq!(
                route(host, "/speakers"),
                RouteDecision::Passthrough { tenant: Tenant::Main },
                "{host}"
            );
        }
    }

    #[test]
    fn test_host_matching_ignores_case_and_port() {
        assert_eq!(Tenant::from_host("TheCurve.Example.org"), Tenant::Conference);
        assert_eq!(Tenant::from_host("thecurve.localhost:3000"), Tenant::Conference);
        assert_eq!(Tenant::from_host("thecurv"), Tenant::Main);
    }

    #[test]
    fn test_build_uri_keeps_query() {
        let uri: Uri = "/speakers?day=2&sort=name".parse().unwrap();
        let rewritten = build_uri_with_new_path(&uri, "/thecurve/speakers");
        assert_eq!(rewritten.to_string(), "/thecurve/speakers?day=2&sort=name");
    }

    #[test]
    fn test_tenant_from_str() {
        assert_eq!("conference".parse::<Tenant>().unwrap(), Tenant::Conference);
        assert_eq!("main".parse::<Tenant>().unwrap(), Tenant::Main);
        assert!("other".parse::<Tenant>().is_err());
    }

    async fn echo(
        Extension(ctx): Extension<TenantContext>,
        original: Option<Extension<OriginalPath>>,
        request: Request,
    ) -> String {
        format!(
            "{} {} {}",
            request.uri(),
            ctx.tenant,
            original.map(|Extension(p)| p.0).unwrap_or_default()
        )
    }

    async fn call(host: &str, uri: &str) -> String {
        let router = Router::new()
            .route("/thecurve/speakers", get(echo))
            .route("/speakers", get(echo));
        let app = middleware::from_fn(rewrite_middleware).layer(router);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .header(header::HOST, host)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_middleware_rewrites_before_routing() {
        assert_eq!(
            call("thecurve.example.org", "/speakers?day=2").await,
            "/thecurve/speakers?day=2 conference /speakers"
        );
    }

    #[tokio::test]
    async fn test_middleware_passthrough() {
        assert_eq!(call("example.org", "/speakers").await, "/speakers main /speakers");
    }
}
