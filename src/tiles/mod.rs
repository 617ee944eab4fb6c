pub mod loader;
pub mod mvt;
pub mod source;

pub use loader::{TileLoader, TileResult};
pub use source::{OpenStreetMapSource, TemplateSource, TileSource, WmsSource};
