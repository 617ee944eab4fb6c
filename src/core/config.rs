//! Configuration for the viewer
//!
//! Everything is fixed at build time through [`constants`](crate::core::constants);
//! these structs group those values so the view, the map and the tile loader can
//! be constructed from one place, and so tests can point them elsewhere.

use crate::core::{
    constants::*,
    geo::{LatLng, LatLngBounds},
};
use std::time::Duration;

/// Query parameters of a WMS GetMap request that stay fixed per layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WmsParams {
    pub layers: String,
    pub styles: String,
    pub format: String,
    pub transparent: bool,
    pub tiled: bool,
    pub version: String,
    pub server_type: String,
}

impl WmsParams {
    pub fn corine() -> Self {
        Self {
            layers: CORINE_WMS_LAYER.to_string(),
            styles: String::new(),
            format: "image/png".to_string(),
            transparent: true,
            tiled: true,
            version: WMS_VERSION.to_string(),
            server_type: WMS_SERVER_TYPE.to_string(),
        }
    }
}

impl Default for WmsParams {
    fn default() -> Self {
        Self::corine()
    }
}

/// Initial view and its hard panning extent.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewConfig {
    pub center: LatLng,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub extent: LatLngBounds,
}

impl Default for ViewConfig {
    fn default() -> Self {
        let (lat, lng) = INITIAL_CENTER;
        let (south, west, north, east) = PAN_EXTENT;
        Self {
            center: LatLng::new(lat, lng),
            zoom: INITIAL_ZOOM,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            extent: LatLngBounds::from_coords(south, west, north, east),
        }
    }
}

/// Configuration for the tile loader
#[derive(Debug, Clone)]
pub struct TileLoaderConfig {
    /// Maximum concurrent tile downloads
    pub max_concurrent: usize,
    /// Per-request timeout
    pub timeout: Duration,
    /// Capacity of each layer's tile cache
    pub cache_size: usize,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 32,
            timeout: Duration::from_secs(30),
            cache_size: 512,
        }
    }
}

impl TileLoaderConfig {
    pub fn for_testing() -> Self {
        Self {
            max_concurrent: 4,
            timeout: Duration::from_millis(500),
            cache_size: 16,
        }
    }
}

/// Everything the map view needs to build its layers and talk to the API.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub view: ViewConfig,
    pub wms_url: String,
    pub wms_params: WmsParams,
    pub wms_opacity: f32,
    pub cadastral_template: String,
    pub api_base: String,
    pub toast_duration: Duration,
    pub tiles: TileLoaderConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            view: ViewConfig::default(),
            wms_url: CORINE_WMS_URL.to_string(),
            wms_params: WmsParams::corine(),
            wms_opacity: WMS_OPACITY,
            cadastral_template: CADASTRAL_TILE_TEMPLATE.to_string(),
            api_base: PARCEL_API_BASE.to_string(),
            toast_duration: TOAST_DURATION,
            tiles: TileLoaderConfig::default(),
        }
    }
}

impl ViewerConfig {
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    pub fn with_view(mut self, view: ViewConfig) -> Self {
        self.view = view;
        self
    }

    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }

    pub fn with_tiles(mut self, tiles: TileLoaderConfig) -> Self {
        self.tiles = tiles;
        self
    }
}
