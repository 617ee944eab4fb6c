pub mod base;
pub mod manager;
pub mod style;
pub mod tile;
pub mod vector;

pub use base::{LayerProperties, LayerTrait, LayerType};
pub use manager::LayerManager;
pub use style::{resolve_style, FeatureId, FeatureKey, FeatureRef, ParcelStyle, RenderParams, Rgba};
pub use tile::TileLayer;
pub use vector::{ParcelFeature, ParcelLayer};
