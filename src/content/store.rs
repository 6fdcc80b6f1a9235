//! Content store - resolves slugs to documents

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{Document, DocumentKind, Slug};
use crate::config::SiteConfig;
use crate::error::ContentError;

/// Read access to repository content.
///
/// Implementors only provide raw sources; slug validation and parsing are
/// shared so every backend resolves documents identically.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read the full source text for a slug, or `NotFound`
    async fn load_source(&self, kind: DocumentKind, slug: &Slug) -> Result<String, ContentError>;

    /// All slugs available for a kind, sorted
    async fn list_slugs(&self, kind: DocumentKind) -> Result<Vec<Slug>, ContentError>;

    /// Resolve a slug into a parsed, validated document
    async fn resolve(&self, kind: DocumentKind, slug: &str) -> Result<Document, ContentError> {
        let slug = Slug::parse(slug)?;
        let source = self.load_source(kind, &slug).await?;
        Document::parse(kind, slug, &source)
    }
}

/// Content store backed by the site's content directories
#[derive(Debug, Clone)]
pub struct FsContentStore {
    posts_dir: PathBuf,
    reports_dir: PathBuf,
    extension: String,
}

impl FsContentStore {
    pub fn new<P: AsRef<Path>>(posts_dir: P, reports_dir: P, extension: &str) -> Self {
        Self {
            posts_dir: posts_dir.as_ref().to_path_buf(),
            reports_dir: reports_dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Create a store for the directories configured for a site
    pub fn from_config(base_dir: &Path, config: &SiteConfig) -> Self {
        let content_dir = base_dir.join(&config.content_dir);
        Self::new(
            content_dir.join(&config.posts_dir),
            content_dir.join(&config.reports_dir),
            &config.extension,
        )
    }

    pub fn dir(&self, kind: DocumentKind) -> &Path {
        match kind {
            DocumentKind::Post => &self.posts_dir,
            DocumentKind::Report => &self.reports_dir,
        }
    }

    /// Storage path for a slug
    pub fn path_for(&self, kind: DocumentKind, slug: &Slug) -> PathBuf {
        self.dir(kind)
            .join(format!("{}.{}", slug.as_str(), self.extension))
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn load_source(&self, kind: DocumentKind, slug: &Slug) -> Result<String, ContentError> {
        let path = self.path_for(kind, slug);
        tracing::debug!("Reading {} from {:?}", kind, path);

        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(source),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ContentError::not_found(kind, slug.as_str()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_slugs(&self, kind: DocumentKind) -> Result<Vec<Slug>, ContentError> {
        let dir = self.dir(kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut slugs = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            let matches_ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == self.extension)
                .unwrap_or(false);
            if !path.is_file() || !matches_ext {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Slug::parse(stem) {
                Ok(slug) => slugs.push(slug),
                Err(e) => tracing::warn!("Skipping {:?}: {}", path, e),
            }
        }

        slugs.sort();
        Ok(slugs)
    }
}

/// In-memory content store, mainly for fixtures
#[derive(Debug, Clone, Default)]
pub struct MemoryContentStore {
    sources: HashMap<DocumentKind, BTreeMap<String, String>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: DocumentKind, slug: &str, source: impl Into<String>) {
        self.sources
            .entry(kind)
            .or_default()
            .insert(slug.to_string(), source.into());
    }

    pub fn with(mut self, kind: DocumentKind, slug: &str, source: impl Into<String>) -> Self {
        self.insert(kind, slug, source);
        self
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn load_source(&self, kind: DocumentKind, slug: &Slug) -> Result<String, ContentError> {
        self.sources
            .get(&kind)
            .and_then(|docs| docs.get(slug.as_str()))
            .cloned()
            .ok_or_else(|| ContentError::not_found(kind, slug.as_str()))
    }

    async fn list_slugs(&self, kind: DocumentKind) -> Result<Vec<Slug>, ContentError> {
        let Some(docs) = self.sources.get(&kind) else {
            return Ok(Vec::new());
        };
        let slugs = docs
            .keys()
            .filter_map(|key| match Slug::parse(key) {
                Ok(slug) => Some(slug),
                Err(e) => {
                    tracing::warn!("Skipping {} {:?}: {}", kind, key, e);
                    None
                }
            })
            .collect();
        Ok(slugs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Authors;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    const MY_POST: &str = "---\ntitle: \"X\"\ndate: \"2024-01-01\"\nauthors: \"A\"\n---\n## Heading\n\nText.\n";

    fn fs_store() -> (TempDir, FsContentStore) {
        let dir = TempDir::new().unwrap();
        let posts = dir.path().join("posts");
        let reports = dir.path().join("reports");
        fs::create_dir_all(&posts).unwrap();
        fs::create_dir_all(&reports).unwrap();
        fs::write(posts.join("my-post.mdx"), MY_POST).unwrap();
        fs::write(posts.join("no-title.mdx"), "---\ndate: 2024-01-01\n---\nBody").unwrap();
        fs::write(posts.join("notes.txt"), "not content").unwrap();
        let store = FsContentStore::new(posts, reports, "mdx");
        (dir, store)
    }

    #[tokio::test]
    async fn test_resolve_from_disk() {
        let (_dir, store) = fs_store();
        let doc = store.resolve(DocumentKind::Post, "my-post").await.unwrap();
        assert_eq!(doc.slug.as_str(), "my-post");
        assert_eq!(doc.metadata.title, "X");
        assert_eq!(doc.metadata.authors, Authors::One("A".into()));
        assert_eq!(doc.metadata.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(doc.body, "## Heading\n\nText.\n");
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let (_dir, store) = fs_store();
        let err = store.resolve(DocumentKind::Post, "nope").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { .. }), "{err:?}");

        // Same slug, other tree
        let err = store.resolve(DocumentKind::Report, "my-post").await.unwrap_err();
        assert!(matches!(err, ContentError::NotFound { kind: DocumentKind::Report, .. }));
    }

    #[tokio::test]
    async fn test_resolve_malformed() {
        let (_dir, store) = fs_store();
        let err = store.resolve(DocumentKind::Post, "no-title").await.unwrap_err();
        assert!(matches!(err, ContentError::Malformed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let (_dir, store) = fs_store();
        let err = store
            .resolve(DocumentKind::Post, "../posts/my-post")
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::InvalidSlug(_)));
    }

    #[tokio::test]
    async fn test_list_slugs() {
        let (_dir, store) = fs_store();
        let slugs: Vec<String> = store
            .list_slugs(DocumentKind::Post)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(slugs, vec!["my-post", "no-title"]);
        assert!(store.list_slugs(DocumentKind::Report).await.unwrap().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = SiteConfig::default();
        let store = FsContentStore::from_config(Path::new("/site"), &config);
        let slug = Slug::parse("hello").unwrap();
        assert_eq!(
            store.path_for(DocumentKind::Report, &slug),
            Path::new("/site/./reports/hello.mdx")
        );
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryContentStore::new().with(DocumentKind::Report, "r", MY_POST);
        assert!(store.resolve(DocumentKind::Report, "r").await.is_ok());
        assert!(matches!(
            store.resolve(DocumentKind::Post, "r").await,
            Err(ContentError::NotFound { .. })
        ));
        assert_eq!(store.list_slugs(DocumentKind::Report).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_list_skips_invalid_keys() {
        let store = MemoryContentStore::new()
            .with(DocumentKind::Post, "good", MY_POST)
            .with(DocumentKind::Post, "../escape", MY_POST)
            .with(DocumentKind::Post, "", MY_POST);

        let slugs = store.list_slugs(DocumentKind::Post).await.unwrap();
        assert_eq!(slugs, vec![Slug::parse("good").unwrap()]);
    }
}
