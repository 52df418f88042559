//! Data models for the wardrobe catalog.
//!
//! Field names follow the snake_case keys of the persisted blob so existing
//! catalogs round-trip without migration.

mod clothing;
mod wardrobe;

pub use clothing::*;
pub use wardrobe::*;
