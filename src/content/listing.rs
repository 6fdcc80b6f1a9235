//! Listing assembly for landing-page previews

use serde::Serialize;

use super::{ContentStore, Document, DocumentKind, Slug};

/// A resolved entry ready for preview display
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub slug: Slug,
    pub document: Document,
}

/// Resolve an ordered list of slugs for preview display.
///
/// Input order is kept. Any slug that fails to resolve is logged and left out,
/// so one missing or broken document never takes the listing down with it.
pub async fn assemble_listing<S, I>(store: &S, kind: DocumentKind, slugs: I) -> Vec<ListingEntry>
where
    S: ContentStore + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut entries = Vec::new();

    for slug in slugs {
        let slug = slug.as_ref();
        match store.resolve(kind, slug).await {
            Ok(document) => entries.push(ListingEntry {
                slug: document.slug.clone(),
                document,
            }),
            Err(e) => tracing::warn!("Skipping {} '{}' in listing: {}", kind, slug, e),
        }
    }

    entries
}
