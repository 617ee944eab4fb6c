use crate::core::{config::WmsParams, constants::{OSM_SUBDOMAINS, TILE_SIZE}, geo::TileCoord};

/// Trait representing anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;
}

/// Hits the default OpenStreetMap tile servers, spreading load across subdomains.
pub struct OpenStreetMapSource {
    subdomains: Vec<&'static str>,
}

impl OpenStreetMapSource {
    pub fn new() -> Self {
        Self {
            subdomains: OSM_SUBDOMAINS.to_vec(),
        }
    }
}

impl Default for OpenStreetMapSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TileSource for OpenStreetMapSource {
    fn url(&self, coord: TileCoord) -> String {
        if self.subdomains.is_empty() {
            return format!("https://tile.openstreetmap.org/{}/{}/{}.png", coord.z, coord.x, coord.y);
        }

        let idx = ((coord.x + coord.y) % self.subdomains.len() as u32) as usize;
        format!(
            "https://{}.tile.openstreetmap.org/{}/{}/{}.png",
            self.subdomains[idx], coord.z, coord.x, coord.y
        )
    }
}

/// `{z}/{x}/{y}` URL template, used for the cadastral vector tiles.
pub struct TemplateSource {
    template: String,
}

impl TemplateSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl TileSource for TemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        self.template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// Tiled WMS GetMap requests in Web Mercator.
pub struct WmsSource {
    endpoint: String,
    params: WmsParams,
}

impl WmsSource {
    pub fn new(endpoint: impl Into<String>, params: WmsParams) -> Self {
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }

    pub fn params(&self) -> &WmsParams {
        &self.params
    }
}

impl TileSource for WmsSource {
    fn url(&self, coord: TileCoord) -> String {
        let (min_x, min_y, max_x, max_y) = coord.mercator_bbox();
        // 1.3.0 names the projection CRS, older versions SRS
        let crs_key = if self.params.version.as_str() >= "1.3" { "CRS" } else { "SRS" };
        let separator = if self.endpoint.contains('?') { '&' } else { '?' };

        format!(
            "{}{}SERVICE=WMS&REQUEST=GetMap&VERSION={}&LAYERS={}&STYLES={}&FORMAT={}&TRANSPARENT={}&TILED={}&{}=EPSG:3857&WIDTH={}&HEIGHT={}&BBOX={:.6},{:.6},{:.6},{:.6}",
            self.endpoint,
            separator,
            self.params.version,
            self.params.layers,
            self.params.styles,
            self.params.format.replace('/', "%2F"),
            if self.params.transparent { "TRUE" } else { "FALSE" },
            if self.params.tiled { "TRUE" } else { "FALSE" },
            crs_key,
            TILE_SIZE,
            TILE_SIZE,
            min_x,
            min_y,
            max_x,
            max_y,
        )
    }
}
