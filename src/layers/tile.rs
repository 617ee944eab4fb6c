use crate::{
    core::{config::WmsParams, geo::TileCoord},
    layers::base::{LayerProperties, LayerTrait, LayerType},
    tiles::source::{OpenStreetMapSource, TileSource, WmsSource},
    Result,
};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

pub(crate) const DEFAULT_CACHE_SIZE: usize = 512;

/// Raster tile layer. Holds encoded image bytes; decoding happens where the
/// tiles are painted.
pub struct TileLayer {
    properties: LayerProperties,
    source: Box<dyn TileSource>,
    tiles: LruCache<TileCoord, Arc<Vec<u8>>>,
    revision: u64,
}

impl TileLayer {
    pub fn new(id: String, name: String, source: Box<dyn TileSource>) -> Self {
        Self {
            properties: LayerProperties::new(id, name, LayerType::Tile),
            source,
            tiles: LruCache::new(NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN)),
            revision: 0,
        }
    }

    pub fn openstreetmap(id: String, name: String) -> Self {
        Self::new(id, name, Box::new(OpenStreetMapSource::new()))
    }

    pub fn wms(id: String, name: String, endpoint: &str, params: WmsParams) -> Self {
        Self::new(id, name, Box::new(WmsSource::new(endpoint, params)))
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        if let Some(size) = NonZeroUsize::new(size) {
            self.tiles.resize(size);
        }
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.set_z_index(z_index);
        self
    }

    /// Encoded bytes of a cached tile
    pub fn tile(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.tiles.peek(coord).cloned()
    }

    /// Bumped every time a tile arrives
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cached_tiles(&self) -> usize {
        self.tiles.len()
    }
}

impl LayerTrait for TileLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }

    fn tile_url(&self, coord: TileCoord) -> String {
        self.source.url(coord)
    }

    fn has_tile(&self, coord: &TileCoord) -> bool {
        self.tiles.contains(coord)
    }

    fn insert_tile(&mut self, coord: TileCoord, data: Vec<u8>) -> Result<()> {
        self.tiles.put(coord, Arc::new(data));
        self.revision += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_cache_evicts_oldest() {
        let mut layer =
            TileLayer::openstreetmap("osm".to_string(), "OSM".to_string()).with_cache_size(2);

        for x in 0..3 {
            layer.insert_tile(TileCoord::new(x, 0, 2), vec![x as u8]).unwrap();
        }

        assert_eq!(layer.cached_tiles(), 2);
        assert!(!layer.has_tile(&TileCoord::new(0, 0, 2)));
        assert_eq!(layer.tile(&TileCoord::new(2, 0, 2)).as_deref(), Some(&vec![2u8]));
        assert_eq!(layer.revision(), 3);
    }

    #[test]
    fn test_wms_layer_urls() {
        let layer = TileLayer::wms(
            "corine".to_string(),
            "Corine".to_string(),
            "https://example.org/wms",
            WmsParams::corine(),
        )
        .with_opacity(0.6);

        assert!(layer.tile_url(TileCoord::new(0, 0, 0)).contains("LAYERS=13"));
        assert_eq!(layer.opacity(), 0.6);
        assert_eq!(layer.layer_type(), LayerType::Tile);
    }
}
