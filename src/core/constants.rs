//! Fixed endpoints and visual constants of the viewer.
//! Keeping them in a single place makes it easier to point the viewer at another deployment.

use std::time::Duration;

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Highest zoom level the raster and vector sources serve.
pub const MAX_ZOOM: f64 = 19.0;

/// Lowest zoom level the view allows.
pub const MIN_ZOOM: f64 = 7.0;

/// Initial zoom level of the view.
pub const INITIAL_ZOOM: f64 = 14.0;

/// Initial view center (Varaždinske Toplice), as (lat, lng).
pub const INITIAL_CENTER: (f64, f64) = (46.21, 16.42);

/// Hard panning extent as (south, west, north, east).
pub const PAN_EXTENT: (f64, f64, f64, f64) = (42.1, 13.0, 46.6, 19.7);

/// OpenStreetMap subdomains used for round-robin tile requests.
pub const OSM_SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// CORINE land cover 2018 WMS endpoint.
pub const CORINE_WMS_URL: &str =
    "https://image.discomap.eea.europa.eu/arcgis/services/Corine/CLC2018_WM/MapServer/WMSServer";

/// WMS layer id of the CORINE overlay.
pub const CORINE_WMS_LAYER: &str = "13";

/// WMS protocol version pinned for the overlay.
pub const WMS_VERSION: &str = "1.3.0";

/// Server family of the WMS endpoint.
pub const WMS_SERVER_TYPE: &str = "mapserver";

/// Cadastral parcel vector tile template.
pub const CADASTRAL_TILE_TEMPLATE: &str =
    "https://gis-dev.listlabs.net/tegola/maps/cadastral_parcels/{z}/{x}/{y}.pbf";

/// Base URL of the parcel attribute API.
pub const PARCEL_API_BASE: &str = "https://gis-dev.listlabs.net";

/// Layer ids.
pub const BASE_LAYER_ID: &str = "osm";
pub const WMS_LAYER_ID: &str = "corine";
pub const CADASTRAL_LAYER_ID: &str = "cadastral";

/// Opacity of the land-cover overlay.
pub const WMS_OPACITY: f32 = 0.6;

/// How long a toast stays on screen.
pub const TOAST_DURATION: Duration = Duration::from_millis(3200);

/// Fixed popup panel size in pixels, used for viewport clamping.
pub const POPUP_WIDTH: f64 = 180.0;
pub const POPUP_HEIGHT: f64 = 120.0;

/// How many failed (layer, tile) pairs the map remembers so they are not
/// requested again.
pub const FAILED_TILE_MEMORY: usize = 1024;

/// MVT default extent (tile-local coordinate range).
pub const MVT_EXTENT: f64 = 4096.0;
