//! # parcelmap
//!
//! Cadastral parcel viewer built on a small slippy-map engine.
//!
//! The map shows an OpenStreetMap base layer, a semi-transparent CORINE land
//! cover WMS overlay and a clickable layer of cadastral parcels served as
//! vector tiles. Clicking a parcel highlights it and shows its number and area
//! fetched from the parcel attribute API.
//!
//! [`view::MapView`] owns the lifecycle; [`core::map::Map`] is the map engine;
//! the `egui` feature adds a desktop canvas in [`ui`].

pub mod api;
pub mod context;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod tiles;
pub mod view;

#[cfg(feature = "egui")]
pub mod ui;

pub use crate::core::constants;

// Re-export public API
pub use api::{HttpParcelApi, ParcelApi, ParcelAttributes};
pub use context::MapContext;
pub use core::{
    config::{TileLoaderConfig, ViewConfig, ViewerConfig, WmsParams},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, SharedMap, Surface},
    viewport::Viewport,
};
pub use input::{InputEvent, MapEvent, MapEventKind, SubscriptionId};
pub use layers::{
    base::LayerTrait,
    style::{resolve_style, FeatureId, FeatureRef, ParcelStyle, RenderParams},
    tile::TileLayer,
    vector::ParcelLayer,
};
pub use runtime::{AsyncHandle, AsyncSpawner, SharedSpawner};
pub use view::{LookupTicket, MapView, ParcelLookup, PopupData, Toast};

#[cfg(feature = "tokio-runtime")]
pub use runtime::tokio_impl::TokioSpawner;

#[cfg(feature = "egui")]
pub use ui::MapCanvas;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Tile decode error: {0}")]
    TileDecode(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[cfg(feature = "egui")]
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initialise `env_logger` with `info` as the default level. A logger that is
/// already installed is kept.
#[cfg(feature = "debug")]
pub fn init_logging() {
    if let Err(e) =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .try_init()
    {
        log::debug!("logger already initialised: {}", e);
    }
}
