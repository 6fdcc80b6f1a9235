//! Render a single document

use anyhow::Result;

use crate::content::{ContentStore, DocumentKind, MarkdownRenderer};
use crate::Site;

/// Render a document to HTML, or to its JSON page data
pub async fn render<S: ContentStore + ?Sized>(
    store: &S,
    kind: DocumentKind,
    slug: &str,
    json: bool,
) -> Result<String> {
    let doc = store.resolve(kind, slug).await?;
    let content = MarkdownRenderer::new().render(&doc.body);

    if json {
        let value = serde_json::json!({
            "kind": doc.kind,
            "slug": doc.slug,
            "metadata": doc.metadata,
            "authors_display": MarkdownRenderer::format_authors(&doc.metadata.authors),
            "content": content,
        });
        Ok(serde_json::to_string_pretty(&value)?)
    } else {
        Ok(content.to_html())
    }
}

/// Run the render command
pub async fn run(site: &Site, kind: DocumentKind, slug: &str, json: bool) -> Result<()> {
    let output = render(&site.store(), kind, slug, json).await?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::MemoryContentStore;

    fn store() -> MemoryContentStore {
        MemoryContentStore::new().with(
            DocumentKind::Post,
            "my-post",
            "---\ntitle: \"X\"\ndate: \"2024-01-01\"\nauthors: \"A\"\n---\n## Heading\n",
        )
    }

    #[tokio::test]
    async fn test_render_html() {
        let html = render(&store(), DocumentKind::Post, "my-post", false)
            .await
            .unwrap();
        assert_eq!(html, "<h4>Heading</h4>\n");
    }

    #[tokio::test]
    async fn test_render_json() {
        let out = render(&store(), DocumentKind::Post, "my-post", true)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["metadata"]["title"], "X");
        assert_eq!(value["authors_display"], "A");
        assert_eq!(value["content"]["nodes"][0]["tag"], "h4");
    }

    #[tokio::test]
    async fn test_render_missing() {
        let err = render(&store(), DocumentKind::Report, "my-post", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("report not found"));
    }
}
