//! Content resolution errors

use thiserror::Error;

use crate::content::DocumentKind;

/// Errors surfaced while resolving a document from the content store
#[derive(Debug, Error)]
pub enum ContentError {
    /// No backing file exists for the slug
    #[error("{kind} not found: {slug}")]
    NotFound { kind: DocumentKind, slug: String },

    /// The file exists but its front-matter is missing, unparsable or invalid
    #[error("malformed {kind} '{slug}': {reason}")]
    Malformed {
        kind: DocumentKind,
        slug: String,
        reason: String,
    },

    /// The slug would escape the content directory or is otherwise unusable
    #[error("invalid slug: {0:?}")]
    InvalidSlug(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContentError {
    pub fn not_found(kind: DocumentKind, slug: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            slug: slug.into(),
        }
    }

    pub fn malformed(kind: DocumentKind, slug: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            slug: slug.into(),
            reason: reason.into(),
        }
    }

    /// Whether a page handler should present this as "not found".
    ///
    /// Every resolution failure is a 404 from the reader's point of view; only
    /// I/O failures other than a missing file are worth an error log.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Frontmatter-level failure, attached to a slug by the store
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("missing opening '---' fence")]
    MissingFence,

    #[error("unterminated front-matter block: expected closing '---'")]
    Unterminated,

    #[error("front-matter must be a mapping of keys to values")]
    InvalidRootType,

    #[error("front-matter parse error: {0}")]
    Parse(String),

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid date: {0:?}")]
    InvalidDate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ContentError::not_found(DocumentKind::Post, "missing");
        assert_eq!(err.to_string(), "post not found: missing");

        let err = ContentError::malformed(DocumentKind::Report, "r", "missing required field 'title'");
        assert_eq!(
            err.to_string(),
            "malformed report 'r': missing required field 'title'"
        );
    }

    #[test]
    fn test_io_errors_are_unexpected() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!ContentError::from(io).is_expected());
        assert!(ContentError::InvalidSlug("../x".into()).is_expected());
    }
}
