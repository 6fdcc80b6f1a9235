//! CLI commands

pub mod extract;
pub mod header;
pub mod list;
pub mod new;
pub mod render;
pub mod spotlight;
