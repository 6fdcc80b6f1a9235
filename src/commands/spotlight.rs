//! Print a tenant's spotlight listing

use anyhow::Result;

use crate::content::{assemble_listing, DocumentKind, MarkdownRenderer};
use crate::router::Tenant;
use crate::Site;

/// Run the spotlight command
pub async fn run(site: &Site, tenant: Tenant) -> Result<()> {
    let slugs = site.config.spotlight.for_tenant(tenant);
    let entries = assemble_listing(&site.store(), DocumentKind::Post, slugs).await;

    println!(
        "Spotlight for {} ({} of {}):",
        tenant,
        entries.len(),
        slugs.len()
    );
    for entry in entries {
        let meta = &entry.document.metadata;
        let authors = MarkdownRenderer::format_authors(&meta.authors);
        if authors.is_empty() {
            println!("  {} - {} [{}]", meta.date.format("%Y-%m-%d"), meta.title, entry.slug);
        } else {
            println!(
                "  {} - {} by {} [{}]",
                meta.date.format("%Y-%m-%d"),
                meta.title,
                authors,
                entry.slug
            );
        }
    }

    Ok(())
}
