//! Create a new post or report

use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

use super::header::{prepare_header, save_header, HEADER_FILE};
use crate::content::{DocumentKind, Slug};
use crate::router::is_asset_path;
use crate::Site;

/// Fields for a new document
#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub kind: DocumentKind,
    pub title: &'a str,
    /// Defaults to the slugified title
    pub slug: Option<&'a str>,
    pub subtitle: Option<&'a str>,
    pub authors: &'a [String],
    /// Defaults to today
    pub date: Option<NaiveDate>,
    /// Add the post to the main spotlight
    pub spotlight: bool,
    /// Image to crop into the post's header
    pub header: Option<&'a Path>,
}

/// Scaffold a new document and its image directory.
///
/// Returns the path of the created file.
pub fn create_document(site: &Site, doc: &NewDocument<'_>) -> Result<PathBuf> {
    let raw_slug = match doc.slug {
        Some(s) => s.to_string(),
        None => slug::slugify(doc.title),
    };
    let slug = Slug::parse(&raw_slug)?;

    if is_asset_path(&format!("/{}", slug)) {
        anyhow::bail!(
            "Slug '{}' contains a '.'; it would be served as a static asset",
            slug
        );
    }

    let store = site.store();
    let file_path = store.path_for(doc.kind, &slug);
    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    // Decode the header before writing anything so a bad image leaves no partial post
    let header = doc.header.map(prepare_header).transpose()?;

    fs::create_dir_all(store.dir(doc.kind))?;

    let date = doc
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    fs::write(&file_path, scaffold(doc, date)?)?;
    println!("Created: {:?}", file_path);

    let image_dir = site.image_dir(slug.as_str());
    fs::create_dir_all(&image_dir)?;
    tracing::debug!("Created image directory {:?}", image_dir);

    if let Some((image, crop)) = header {
        let output = image_dir.join(HEADER_FILE);
        save_header(&image, &output)?;
        println!("Saved header ({:?} crop): {:?}", crop, output);
    }

    if doc.spotlight {
        if doc.kind != DocumentKind::Post {
            tracing::warn!("Only posts can be spotlighted, skipping '{}'", slug);
        } else {
            let mut config = site.config.clone();
            if config.spotlight.feature(slug.as_str()) {
                config.save(&site.config_path)?;
                println!("Added '{}' to the spotlight", slug);
            } else {
                println!("'{}' is already in the spotlight", slug);
            }
        }
    }

    Ok(file_path)
}

/// Front-matter block with every value double-quoted
fn scaffold(doc: &NewDocument<'_>, date: NaiveDate) -> Result<String> {
    // JSON strings and arrays are valid YAML flow scalars
    let quote = |s: &str| serde_json::to_string(s);

    let mut content = String::from("---\n");
    content.push_str(&format!("title: {}\n", quote(doc.title)?));
    if let Some(subtitle) = doc.subtitle {
        content.push_str(&format!("subtitle: {}\n", quote(subtitle)?));
    }
    match doc.authors {
        [] => {}
        [one] => content.push_str(&format!("authors: {}\n", quote(one)?)),
        many => content.push_str(&format!("authors: {}\n", serde_json::to_string(many)?)),
    }
    content.push_str(&format!("date: \"{}\"\n", date.format("%Y-%m-%d")));
    content.push_str("---\n\n");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Authors, ContentStore};
    use tempfile::TempDir;

    fn new_doc<'a>(title: &'a str, authors: &'a [String]) -> NewDocument<'a> {
        NewDocument {
            kind: DocumentKind::Post,
            title,
            slug: None,
            subtitle: Some("A \"quoted\" subtitle"),
            authors,
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            spotlight: false,
            header: None,
        }
    }

    #[tokio::test]
    async fn test_created_document_resolves() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let authors = vec!["Ada Lovelace".to_string(), "Alan Turing".to_string()];

        let path = create_document(&site, &new_doc("Hello: World", &authors)).unwrap();
        assert_eq!(path, dir.path().join("posts").join("hello-world.mdx"));
        assert!(site.image_dir("hello-world").is_dir());

        let doc = site
            .store()
            .resolve(DocumentKind::Post, "hello-world")
            .await
            .unwrap();
        assert_eq!(doc.metadata.title, "Hello: World");
        assert_eq!(doc.metadata.subtitle.as_deref(), Some("A \"quoted\" subtitle"));
        assert_eq!(doc.metadata.authors, Authors::Many(authors));
        assert_eq!(doc.metadata.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_single_author_is_a_string() {
        let authors = vec!["Ada".to_string()];
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let content = scaffold(&new_doc("T", &authors), date).unwrap();
        assert!(content.contains("authors: \"Ada\"\n"));
        assert!(content.contains("date: \"2024-03-01\"\n"));
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();

        create_document(&site, &new_doc("Twice", &[])).unwrap();
        let err = create_document(&site, &new_doc("Twice", &[])).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_refuses_dotted_slug() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();

        let mut doc = new_doc("Release", &[]);
        doc.slug = Some("v1.2-notes");
        assert!(create_document(&site, &doc).is_err());
        assert!(!dir.path().join("posts").join("v1.2-notes.mdx").exists());
    }

    #[test]
    fn test_spotlight_updates_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("site.yml"),
            "spotlight:\n  main:\n    - older\n",
        )
        .unwrap();
        let site = Site::new(dir.path()).unwrap();

        let mut doc = new_doc("Fresh", &[]);
        doc.spotlight = true;
        create_document(&site, &doc).unwrap();

        let reloaded = Site::new(dir.path()).unwrap();
        assert_eq!(reloaded.config.spotlight.main, vec!["fresh", "older"]);
    }

    #[test]
    fn test_header_saved_with_document() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let source = dir.path().join("photo.png");
        image::RgbaImage::from_pixel(300, 600, image::Rgba([1, 2, 3, 255]))
            .save(&source)
            .unwrap();

        let mut doc = new_doc("With Header", &[]);
        doc.header = Some(&source);
        create_document(&site, &doc).unwrap();

        let header = image::open(site.image_dir("with-header").join(HEADER_FILE))
            .unwrap()
            .to_rgb8();
        assert_eq!((header.width(), header.height()), (300, 225));
    }

    #[test]
    fn test_bad_header_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let missing = dir.path().join("missing.png");

        let mut doc = new_doc("No Header", &[]);
        doc.header = Some(&missing);
        assert!(create_document(&site, &doc).is_err());
        assert!(!dir.path().join("posts").join("no-header.mdx").exists());
    }
}
