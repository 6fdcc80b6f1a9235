//! Configuration module

mod site;

pub use site::ServerConfig;
pub use site::SiteConfig;
pub use site::SpotlightConfig;
pub use site::CONFIG_FILE;
