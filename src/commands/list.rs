//! List site content

use anyhow::Result;

use crate::content::{ContentStore, Document, DocumentKind};
use crate::router::is_asset_path;
use crate::Site;

/// Load every document of a kind, newest first.
///
/// Documents that fail to resolve are reported and skipped.
pub async fn load_all<S: ContentStore + ?Sized>(store: &S, kind: DocumentKind) -> Result<Vec<Document>> {
    let mut docs = Vec::new();

    for slug in store.list_slugs(kind).await? {
        if is_asset_path(&format!("/{}", slug)) {
            tracing::warn!(
                "{} '{}' contains a '.', requests for it are served as static assets",
                kind,
                slug
            );
        }

        match store.resolve(kind, slug.as_str()).await {
            Ok(doc) => docs.push(doc),
            Err(e) => tracing::warn!("Failed to load {} '{}': {}", kind, slug, e),
        }
    }

    docs.sort_by(|a, b| b.metadata.date.cmp(&a.metadata.date));
    Ok(docs)
}

/// List site content by kind
pub async fn run(site: &Site, kinds: &[DocumentKind]) -> Result<()> {
    let store = site.store();

    for &kind in kinds {
        let docs = load_all(&store, kind).await?;
        println!("{}s ({}):", capitalize(kind.as_str()), docs.len());
        for doc in docs {
            println!(
                "  {} - {} [{}]",
                doc.metadata.date.format("%Y-%m-%d"),
                doc.metadata.title,
                doc.slug
            );
        }
    }

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentStore;

    fn post(title: &str, date: &str) -> String {
        format!("---\ntitle: {}\ndate: {}\n---\n", title, date)
    }

    #[tokio::test]
    async fn test_load_all_sorted_newest_first() {
        let store = MemoryContentStore::new()
            .with(DocumentKind::Post, "old", post("Old", "2023-05-01"))
            .with(DocumentKind::Post, "new", post("New", "2024-05-01"))
            .with(DocumentKind::Post, "broken", "no front-matter");

        let docs = load_all(&store, DocumentKind::Post).await.unwrap();
        let titles: Vec<&str> = docs.iter().map(|d| d.metadata.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Old"]);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("post"), "Post");
        assert_eq!(capitalize(""), "");
    }
}
