use crate::{
    core::geo::{LatLng, TileCoord},
    layers::{
        base::{LayerProperties, LayerTrait, LayerType},
        style::{resolve_style, FeatureKey, FeatureRef, ParcelStyle, RenderParams, StyleFn},
        tile::DEFAULT_CACHE_SIZE,
    },
    prelude::HashMap,
    tiles::{
        mvt::{decode_parcels, DecodedParcel},
        source::{TemplateSource, TileSource},
    },
    Result,
};
use geo::Contains;
use geo_types::MultiPolygon;
use lru::LruCache;
use std::num::NonZeroUsize;

/// One cadastral parcel (or the piece of it that falls in one tile)
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelFeature {
    pub reference: FeatureRef,
    /// Polygon rings in lng/lat (x = lng, y = lat)
    pub geometry: MultiPolygon<f64>,
}

impl ParcelFeature {
    pub fn contains(&self, point: &LatLng) -> bool {
        self.geometry
            .contains(&geo_types::Point::new(point.lng, point.lat))
    }
}

/// Vector tile layer of cadastral parcels.
///
/// Styles are resolved once per feature and cached; the cache is only
/// refreshed by [`ParcelLayer::force_repaint`], which is how the selection
/// reaches the style function. Decoded tiles live in an LRU and their styles
/// leave with them.
pub struct ParcelLayer {
    properties: LayerProperties,
    source: Box<dyn TileSource>,
    tiles: LruCache<TileCoord, Vec<ParcelFeature>>,
    styles: HashMap<FeatureKey, ParcelStyle>,
    style_fn: StyleFn,
    params: RenderParams,
    revision: u64,
}

impl ParcelLayer {
    pub fn new(id: String, name: String, template: &str) -> Self {
        Self {
            properties: LayerProperties::new(id, name, LayerType::Vector),
            source: Box::new(TemplateSource::new(template)),
            tiles: LruCache::new(NonZeroUsize::new(DEFAULT_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN)),
            styles: HashMap::default(),
            style_fn: Box::new(resolve_style),
            params: RenderParams::default(),
            revision: 0,
        }
    }

    pub fn with_style_fn<F>(mut self, style_fn: F) -> Self
    where
        F: Fn(&FeatureRef, Option<&FeatureRef>) -> ParcelStyle + Send + Sync + 'static,
    {
        self.style_fn = Box::new(style_fn);
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        if let Some(size) = NonZeroUsize::new(size) {
            while self.tiles.len() > size.get() {
                self.evict_oldest();
            }
            self.tiles.resize(size);
        }
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.set_z_index(z_index);
        self
    }

    /// Stores the parcels of one tile, replacing whatever the tile held before
    pub fn add_tile_features(&mut self, coord: TileCoord, parcels: Vec<DecodedParcel>) {
        if let Some(old) = self.tiles.pop(&coord) {
            self.forget_styles(&old);
        }

        let features: Vec<ParcelFeature> = parcels
            .into_iter()
            .enumerate()
            .map(|(index, parcel)| ParcelFeature {
                reference: FeatureRef {
                    key: FeatureKey {
                        tile: coord,
                        index: index as u32,
                    },
                    id: parcel.id,
                },
                geometry: parcel.geometry,
            })
            .collect();

        for feature in &features {
            let style = (self.style_fn)(&feature.reference, self.params.highlighted.as_ref());
            self.styles.insert(feature.reference.key, style);
        }

        if let Some((_, evicted)) = self.tiles.push(coord, features) {
            self.forget_styles(&evicted);
        }
        self.revision += 1;
    }

    fn evict_oldest(&mut self) {
        if let Some((_, evicted)) = self.tiles.pop_lru() {
            self.forget_styles(&evicted);
        }
    }

    fn forget_styles(&mut self, features: &[ParcelFeature]) {
        for feature in features {
            self.styles.remove(&feature.reference.key);
        }
    }

    /// Re-runs the style function over every feature with new parameters
    pub fn force_repaint(&mut self, params: &RenderParams) {
        self.params = params.clone();
        for (_, features) in self.tiles.iter() {
            for feature in features {
                let style = (self.style_fn)(&feature.reference, self.params.highlighted.as_ref());
                self.styles.insert(feature.reference.key, style);
            }
        }
        self.revision += 1;
    }

    /// Cached style of a feature
    pub fn style_of(&self, key: &FeatureKey) -> ParcelStyle {
        self.styles.get(key).copied().unwrap_or_default()
    }

    /// Features of the tile covering `point` at `zoom` whose polygons contain
    /// it, topmost (last drawn) first
    pub fn features_at(&self, point: &LatLng, zoom: u8) -> Vec<&ParcelFeature> {
        let coord = TileCoord::from_lat_lng(point, zoom);
        self.tiles
            .peek(&coord)
            .map(|features| features.iter().rev().filter(|f| f.contains(point)).collect())
            .unwrap_or_default()
    }

    /// Features of one tile, with their cached styles
    pub fn styled_features(&self, coord: &TileCoord) -> Vec<(&ParcelFeature, ParcelStyle)> {
        self.tiles
            .peek(coord)
            .map(|features| {
                features
                    .iter()
                    .map(|f| (f, self.style_of(&f.reference.key)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bumped on every repaint and every tile arrival
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn feature_count(&self) -> usize {
        self.tiles.iter().map(|(_, features)| features.len()).sum()
    }

    pub fn cached_tiles(&self) -> usize {
        self.tiles.len()
    }

    pub fn cached_styles(&self) -> usize {
        self.styles.len()
    }
}

impl LayerTrait for ParcelLayer {
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
        let parcels = decode_parcels(&data, coord)?;
        self.add_tile_features(coord, parcels);
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
