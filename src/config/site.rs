//! Site configuration (site.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::router::Tenant;

/// Configuration file name, relative to the site root
pub const CONFIG_FILE: &str = "site.yml";

/// Main site configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,

    // Content
    pub content_dir: String,
    pub posts_dir: String,
    pub reports_dir: String,
    pub extension: String,

    // Static files
    pub public_dir: String,
    pub image_dir: String,

    pub server: ServerConfig,
    pub spotlight: SpotlightConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Golden Gate Institute".to_string(),

            content_dir: ".".to_string(),
            posts_dir: "posts".to_string(),
            reports_dir: "reports".to_string(),
            extension: "mdx".to_string(),

            public_dir: "public".to_string(),
            image_dir: "post-images".to_string(),

            server: ServerConfig::default(),
            spotlight: SpotlightConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Write configuration back to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path.as_ref(), content)?;
        tracing::debug!("Saved configuration to {:?}", path.as_ref());
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub ip: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ip: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Ordered post slugs featured on each tenant's landing page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotlightConfig {
    pub main: Vec<String>,
    pub conference: Vec<String>,
}

impl SpotlightConfig {
    pub fn for_tenant(&self, tenant: Tenant) -> &[String] {
        match tenant {
            Tenant::Main => &self.main,
            Tenant::Conference => &self.conference,
        }
    }

    /// Put a slug at the front of the main spotlight.
    ///
    /// Returns false if it was already featured.
    pub fn feature(&mut self, slug: &str) -> bool {
        if self.main.iter().any(|s| s == slug) {
            return false;
        }
        self.main.insert(0, slug.to_string());
        true
    }
}
