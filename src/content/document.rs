//! Document and slug models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::frontmatter::{FrontMatter, Metadata};
use crate::error::ContentError;

/// Which content tree a document lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Post,
    Report,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::Post, DocumentKind::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Post => "post",
            DocumentKind::Report => "report",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" | "posts" => Ok(DocumentKind::Post),
            "report" | "reports" => Ok(DocumentKind::Report),
            _ => anyhow::bail!("Unknown document kind: {}. Available: post, report", s),
        }
    }
}

/// A validated document slug.
///
/// Slugs map directly onto file names inside a flat content directory, so
/// anything that could address a different file is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let valid = !raw.is_empty()
            && !raw.starts_with('/')
            && !raw.contains(['/', '\\', '\0'])
            && raw != "."
            && !raw.contains("..");

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ContentError::InvalidSlug(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A resolved content document
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub kind: DocumentKind,
    pub slug: Slug,
    pub metadata: Metadata,
    /// Raw markup following the front-matter block, verbatim
    pub body: String,
}

impl Document {
    /// Parse a document from its full source text
    pub fn parse(kind: DocumentKind, slug: Slug, source: &str) -> Result<Self, ContentError> {
        let (fm, body) = FrontMatter::parse(source)
            .map_err(|e| ContentError::malformed(kind, slug.as_str(), e.to_string()))?;
        let metadata = fm
            .validate()
            .map_err(|e| ContentError::malformed(kind, slug.as_str(), e.to_string()))?;

        Ok(Self {
            kind,
            slug,
            metadata,
            body: body.to_string(),
        })
    }
}
