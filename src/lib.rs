//! curve-site: multi-tenant content server
//!
//! Serves one repository of posts and reports under two tenants, the main
//! site and The Curve conference microsite, selected by request hostname.
//! Documents are `.mdx` files with YAML front-matter, rendered into structured
//! page data.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod router;
pub mod server;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::{DocumentKind, FsContentStore};

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Path of the configuration file (may not exist)
    pub config_path: PathBuf,
    /// Static files directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open a site from a directory, using defaults when there is no config file
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(config::CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            config_path,
            public_dir,
        })
    }

    /// Content store for this site's content directories
    pub fn store(&self) -> FsContentStore {
        FsContentStore::from_config(&self.base_dir, &self.config)
    }

    /// Directory holding a post's images
    pub fn image_dir(&self, slug: &str) -> PathBuf {
        self.public_dir.join(&self.config.image_dir).join(slug)
    }

    /// Start the HTTP server
    pub async fn serve(&self, ip: &str, port: u16) -> Result<()> {
        server::start(self, ip, port).await
    }

    /// Print documents of the given kinds
    pub async fn list(&self, kinds: &[DocumentKind]) -> Result<()> {
        commands::list::run(self, kinds).await
    }
}
