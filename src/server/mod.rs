//! HTTP server serving structured page data for both tenants

use anyhow::Result;
use axum::{
    extract::{Path as UrlPath, State},
    http::{StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower::Layer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::SpotlightConfig;
use crate::content::{
    assemble_listing, ContentStore, DocumentKind, MarkdownRenderer, Metadata, RenderedContent,
    Slug,
};
use crate::error::ContentError;
use crate::router::{rewrite_middleware, OriginalPath, Tenant, TenantContext, FAVICON_PATH};
use crate::Site;

/// Shared handler state
pub struct AppState {
    store: Arc<dyn ContentStore>,
    spotlight: SpotlightConfig,
    renderer: MarkdownRenderer,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, spotlight: SpotlightConfig) -> Self {
        Self {
            store,
            spotlight,
            renderer: MarkdownRenderer::new(),
        }
    }
}

type SharedState = Arc<AppState>;

/// A rendered document page
#[derive(Debug, Serialize)]
pub struct PageData {
    pub tenant: Tenant,
    pub kind: DocumentKind,
    pub slug: Slug,
    pub metadata: Metadata,
    pub authors_display: String,
    pub content: RenderedContent,
}

/// A tenant landing page with its spotlight previews
#[derive(Debug, Serialize)]
pub struct LandingPage {
    pub tenant: Tenant,
    /// Path as the visitor sees it in the address bar
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    pub spotlight: Vec<SpotlightItem>,
}

#[derive(Debug, Serialize)]
pub struct SpotlightItem {
    pub kind: DocumentKind,
    pub slug: Slug,
    pub href: String,
    pub metadata: Metadata,
    pub authors_display: String,
}

/// Any resolution failure is shown to the reader as "not found"
struct PageError(ContentError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        if self.0.is_expected() {
            tracing::debug!("Page not found: {}", self.0);
        } else {
            tracing::error!("Failed to load page: {}", self.0);
        }

        let body = serde_json::json!({ "error": "not found" });
        (StatusCode::NOT_FOUND, Json(body)).into_response()
    }
}

/// Build the application, tenant rewriting included
pub fn app(state: AppState, public_dir: &Path) -> Router {
    let routes = Router::new()
        .route("/", get(main_landing))
        .route("/posts/:slug", get(post_page))
        .route("/reports/:slug", get(report_page))
        .route("/thecurve", get(conference_landing))
        .route("/thecurve/", get(conference_landing))
        .route("/thecurve/*page", get(conference_page))
        .route_service(FAVICON_PATH, ServeFile::new(public_dir.join("favicon.ico")))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    // Rewriting has to happen before route matching, so the middleware wraps
    // the whole router rather than being added as a router layer
    let rewritten = middleware::from_fn(rewrite_middleware).layer(routes);
    Router::new().fallback_service(rewritten)
}

/// Start the server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let state = AppState::new(Arc::new(site.store()), site.config.spotlight.clone());
    let app = app(state, &site.public_dir);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn tenant_of(ctx: Option<Extension<TenantContext>>) -> Tenant {
    ctx.map(|Extension(ctx)| ctx.tenant).unwrap_or(Tenant::Main)
}

fn visible_path(original: Option<Extension<OriginalPath>>, uri: &Uri) -> String {
    original
        .map(|Extension(OriginalPath(path))| path)
        .unwrap_or_else(|| uri.path().to_string())
}

async fn main_landing(
    State(state): State<SharedState>,
    ctx: Option<Extension<TenantContext>>,
    original: Option<Extension<OriginalPath>>,
    uri: Uri,
) -> Json<LandingPage> {
    let path = visible_path(original, &uri);
    Json(landing(&state, tenant_of(ctx), Tenant::Main, path, None).await)
}

async fn conference_landing(
    State(state): State<SharedState>,
    original: Option<Extension<OriginalPath>>,
    uri: Uri,
) -> Json<LandingPage> {
    let path = visible_path(original, &uri);
    Json(landing(&state, Tenant::Conference, Tenant::Conference, path, None).await)
}

async fn conference_page(
    State(state): State<SharedState>,
    original: Option<Extension<OriginalPath>>,
    uri: Uri,
    UrlPath(page): UrlPath<String>,
) -> Response {
    let tenant = Tenant::Conference;
    match page.split_once('/') {
        Some(("posts", slug)) => document(&state, tenant, DocumentKind::Post, slug)
            .await
            .into_response(),
        Some(("reports", slug)) => document(&state, tenant, DocumentKind::Report, slug)
            .await
            .into_response(),
        _ => {
            let path = visible_path(original, &uri);
            Json(landing(&state, tenant, tenant, path, Some(page)).await).into_response()
        }
    }
}

async fn post_page(
    State(state): State<SharedState>,
    ctx: Option<Extension<TenantContext>>,
    UrlPath(slug): UrlPath<String>,
) -> Result<Json<PageData>, PageError> {
    document(&state, tenant_of(ctx), DocumentKind::Post, &slug).await
}

async fn report_page(
    State(state): State<SharedState>,
    ctx: Option<Extension<TenantContext>>,
    UrlPath(slug): UrlPath<String>,
) -> Result<Json<PageData>, PageError> {
    document(&state, tenant_of(ctx), DocumentKind::Report, &slug).await
}

async fn document(
    state: &AppState,
    tenant: Tenant,
    kind: DocumentKind,
    slug: &str,
) -> Result<Json<PageData>, PageError> {
    let doc = state.store.resolve(kind, slug).await.map_err(PageError)?;
    let content = state.renderer.render(&doc.body);

    Ok(Json(PageData {
        tenant,
        kind,
        authors_display: MarkdownRenderer::format_authors(&doc.metadata.authors),
        slug: doc.slug,
        metadata: doc.metadata,
        content,
    }))
}

async fn landing(
    state: &AppState,
    tenant: Tenant,
    spotlight_for: Tenant,
    path: String,
    page: Option<String>,
) -> LandingPage {
    let slugs = state.spotlight.for_tenant(spotlight_for);
    let entries = assemble_listing(state.store.as_ref(), DocumentKind::Post, slugs).await;

    let spotlight = entries
        .into_iter()
        .map(|entry| SpotlightItem {
            kind: entry.document.kind,
            href: format!("/{}s/{}", entry.document.kind, entry.slug),
            authors_display: MarkdownRenderer::format_authors(&entry.document.metadata.authors),
            slug: entry.slug,
            metadata: entry.document.metadata,
        })
        .collect();

    LandingPage {
        tenant,
        path,
        page,
        spotlight,
    }
}
