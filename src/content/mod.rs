//! Content module - document resolution, front-matter and rendering

mod document;
mod frontmatter;
pub mod listing;
mod markdown;
pub mod store;

pub use document::{Document, DocumentKind, Slug};
pub use frontmatter::{Authors, FrontMatter, Metadata};
pub use listing::{assemble_listing, ListingEntry};
pub use markdown::{
    remap_heading_level, Element, HeadingEntry, MarkdownRenderer, Node, RenderedContent,
    HEADING_OFFSET, MAX_HEADING_LEVEL, TABLE_WRAPPER_CLASS,
};
pub use store::{ContentStore, FsContentStore, MemoryContentStore};
