use crate::{
    core::{
        config::ViewConfig,
        constants::FAILED_TILE_MEMORY,
        geo::{Point, TileCoord},
        viewport::Viewport,
    },
    input::{EventManager, InputEvent, MapEvent, MapEventKind, SubscriptionId},
    layers::{
        base::{LayerTrait, LayerType},
        manager::LayerManager,
        style::FeatureRef,
        tile::TileLayer,
        vector::ParcelLayer,
    },
    prelude::HashSet,
    tiles::loader::{TileLoader, TileResult},
    Result,
};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

/// The map is shared between the view that owns its lifecycle and the canvas
/// that paints it
pub type SharedMap = Arc<Mutex<Map>>;

/// Rendering target the map is bound to. Only its size matters to the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Point {
        Point::new(self.width, self.height)
    }
}

/// Map widget: one viewport, an ordered layer stack and an event bus.
///
/// Tiles are requested for whatever the viewport covers and arrive through
/// [`Map::update`], which must be called once per frame on the UI thread.
/// A map detached from its surface (see [`Map::set_target`]) ignores input
/// and stops loading.
pub struct Map {
    viewport: Viewport,
    layers: LayerManager,
    events: EventManager,
    target: Option<Surface>,
    loader: Option<TileLoader>,
    failed: LruCache<(String, TileCoord), ()>,
    settled: bool,
}

impl Map {
    pub fn new(view: &ViewConfig, surface: Surface) -> Self {
        let mut viewport = Viewport::new(view.center, view.zoom, surface.size());
        viewport.set_zoom_limits(view.min_zoom, view.max_zoom);
        viewport.set_max_bounds(Some(view.extent.clone()));

        Self {
            viewport,
            layers: LayerManager::new(),
            events: EventManager::new(),
            target: Some(surface),
            loader: None,
            failed: LruCache::new(NonZeroUsize::new(FAILED_TILE_MEMORY).unwrap_or(NonZeroUsize::MIN)),
            settled: false,
        }
    }

    pub fn with_loader(mut self, loader: TileLoader) -> Self {
        self.attach_loader(loader);
        self
    }

    pub fn attach_loader(&mut self, loader: TileLoader) {
        self.loader = Some(loader);
        self.settled = false;
    }

    // Layers

    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        log::debug!("adding layer '{}' ({})", layer.id(), layer.layer_type());
        self.layers.add_layer(layer)?;
        self.settled = false;
        Ok(())
    }

    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.layers.remove_layer(layer_id)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get_layer(layer_id)
    }

    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layers.with_layer_mut(layer_id, f)
    }

    /// Layer ids bottom to top
    pub fn list_layers(&self) -> Vec<String> {
        self.layers.list_layers()
    }

    pub fn tile_layer(&self, layer_id: &str) -> Option<&TileLayer> {
        self.get_layer(layer_id)?.as_any().downcast_ref()
    }

    pub fn parcel_layer(&self, layer_id: &str) -> Option<&ParcelLayer> {
        self.get_layer(layer_id)?.as_any().downcast_ref()
    }

    /// Runs `f` against a parcel layer. None if the id is unknown or the
    /// layer is not a parcel layer.
    pub fn with_parcels<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut ParcelLayer) -> R,
    {
        self.layers
            .with_layer_mut(layer_id, |layer| {
                layer.as_any_mut().downcast_mut::<ParcelLayer>().map(f)
            })
            .flatten()
    }

    /// Returns false if the layer does not exist
    pub fn set_layer_visible(&mut self, layer_id: &str, visible: bool) -> bool {
        let found = self
            .layers
            .with_layer_mut(layer_id, |layer| layer.set_visible(visible))
            .is_some();
        if found && visible {
            self.settled = false;
        }
        found
    }

    pub fn is_layer_visible(&self, layer_id: &str) -> bool {
        self.get_layer(layer_id)
            .map(|layer| layer.is_visible())
            .unwrap_or(false)
    }

    // Events

    pub fn on<F>(&mut self, kind: MapEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback)
    }

    pub fn on_layer<F>(&mut self, layer_id: &str, kind: MapEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on_layer(layer_id, kind, callback)
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    pub fn emit(&self, event: &MapEvent) {
        self.events.emit(event);
    }

    pub fn listener_count(&self) -> usize {
        self.events.listener_count()
    }

    // Surface

    /// Binds the map to a surface, or detaches it with `None`
    pub fn set_target(&mut self, target: Option<Surface>) {
        match target {
            Some(surface) => {
                log::info!("map attached to {}x{} surface", surface.width, surface.height);
                self.viewport.set_size(surface.size());
                self.settled = false;
            }
            None => log::info!("map detached from its surface"),
        }
        self.target = target;
    }

    pub fn is_attached(&self) -> bool {
        self.target.is_some()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    // Interaction

    /// Stable references of the features under a pixel, across every visible
    /// vector layer, topmost first
    pub fn features_at_pixel(&self, pixel: Point) -> Vec<FeatureRef> {
        let position = self.viewport.pixel_to_lat_lng(&pixel);
        let zoom = self.viewport.tile_zoom();

        self.layers
            .layers()
            .into_iter()
            .rev()
            .filter(|layer| layer.is_visible() && layer.layer_type() == LayerType::Vector)
            .filter_map(|layer| layer.as_any().downcast_ref::<ParcelLayer>())
            .flat_map(|layer| layer.features_at(&position, zoom))
            .map(|feature| feature.reference.clone())
            .collect()
    }

    /// Raises a single-click event for `pixel`
    pub fn dispatch_click(&self, pixel: Point) {
        let lat_lng = self.viewport.pixel_to_lat_lng(&pixel);
        self.events.emit(&MapEvent::SingleClick { pixel, lat_lng });
    }

    pub fn handle_input(&mut self, input: InputEvent) {
        if !self.is_attached() {
            return;
        }

        match input {
            InputEvent::Click { position } => self.dispatch_click(position),
            InputEvent::Drag { delta } => {
                self.viewport.pan(delta);
                self.view_changed();
            }
            InputEvent::Scroll { delta, position } => {
                if delta != 0.0 {
                    let step = delta.signum();
                    let zoom = (self.viewport.zoom + step).round();
                    self.viewport.zoom_to(zoom, Some(position));
                    self.view_changed();
                }
            }
            InputEvent::Resize { size } => {
                self.viewport.set_size(size);
                if let Some(target) = self.target.as_mut() {
                    target.width = size.x;
                    target.height = size.y;
                }
                self.view_changed();
            }
        }
    }

    fn view_changed(&mut self) {
        self.settled = false;
        self.events.emit(&MapEvent::ViewChanged {
            center: self.viewport.center,
            zoom: self.viewport.zoom,
        });
    }

    // Tiles

    /// Tiles covering the current viewport at the current tile zoom
    pub fn visible_tiles(&self) -> Vec<TileCoord> {
        TileCoord::covering(&self.viewport.bounds(), self.viewport.tile_zoom())
            .into_iter()
            .filter(TileCoord::is_valid)
            .collect()
    }

    /// Applies finished tile fetches, requests missing tiles and raises
    /// render-complete once nothing is outstanding. Returns the number of
    /// tile results applied.
    pub fn update(&mut self) -> usize {
        if !self.is_attached() {
            return 0;
        }

        let results = self
            .loader
            .as_mut()
            .map(TileLoader::drain)
            .unwrap_or_default();
        let applied = results.len();
        for result in results {
            self.apply_tile_result(result);
        }

        self.request_visible_tiles();

        let pending = self.loader.as_ref().map(TileLoader::pending).unwrap_or(0);
        if pending == 0 && !self.settled {
            self.settled = true;
            log::debug!("render complete");
            self.events.emit(&MapEvent::RenderComplete);
        }

        applied
    }

    /// Hands fetched bytes to their layer; fetch or decode failures become
    /// tile-load-error events
    pub fn apply_tile_result(&mut self, result: TileResult) {
        let TileResult {
            layer_id,
            coord,
            data,
        } = result;

        let outcome = data.and_then(|bytes| {
            self.layers
                .with_layer_mut(&layer_id, |layer| layer.insert_tile(coord, bytes))
                .unwrap_or(Ok(()))
        });

        if let Err(e) = outcome {
            log::warn!("tile {} of layer '{}' failed to load: {}", coord, layer_id, e);
            self.failed.put((layer_id.clone(), coord), ());
            self.events
                .emit(&MapEvent::TileLoadError { layer_id, coord });
        }
    }

    /// Tiles remembered as failed, across all layers
    pub fn failed_tiles(&self) -> usize {
        self.failed.len()
    }

    fn request_visible_tiles(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };

        let zoom = self.viewport.tile_zoom();
        let wanted: HashSet<TileCoord> = TileCoord::covering(&self.viewport.bounds(), zoom)
            .into_iter()
            .filter(TileCoord::is_valid)
            .collect();

        let mut requested = false;
        for layer in self.layers.layers() {
            if !layer.is_visible() {
                continue;
            }
            for coord in &wanted {
                // failed tiles are not retried
                let key = (layer.id().to_string(), *coord);
                if layer.has_tile(coord) || self.failed.contains(&key) {
                    continue;
                }
                requested |= loader.request(layer.id(), *coord, layer.tile_url(*coord));
            }
        }

        loader.retain_queued(|_, coord| wanted.contains(coord));
        if requested {
            self.settled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::LatLng;
    use crate::layers::style::FeatureId;
    use crate::tiles::mvt::DecodedParcel;
    use crate::MapError;
    use geo_types::{LineString, MultiPolygon, Polygon};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_map() -> Map {
        Map::new(&ViewConfig::default(), Surface::new(1000.0, 800.0))
    }

    fn parcel_around(center: LatLng, half: f64, id: &str) -> DecodedParcel {
        let ring = LineString::from(vec![
            (center.lng - half, center.lat - half),
            (center.lng + half, center.lat - half),
            (center.lng + half, center.lat + half),
            (center.lng - half, center.lat + half),
            (center.lng - half, center.lat - half),
        ]);
        DecodedParcel {
            id: Some(FeatureId::from(id)),
            geometry: MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
        }
    }

    fn map_with_parcel(id: &str) -> Map {
        let mut map = test_map();
        let center = map.viewport().center;
        let coord = TileCoord::from_lat_lng(&center, map.viewport().tile_zoom());
        let mut layer = ParcelLayer::new("cadastral".into(), "Parcels".into(), "{z}/{x}/{y}");
        layer.add_tile_features(coord, vec![parcel_around(center, 0.0005, id)]);
        map.add_layer(Box::new(layer)).unwrap();
        map
    }

    #[test]
    fn test_map_starts_on_configured_view() {
        let map = test_map();
        let view = ViewConfig::default();
        assert_eq!(map.viewport().center, view.center);
        assert_eq!(map.viewport().zoom, 14.0);
        assert!(map.is_attached());
    }

    #[test]
    fn test_features_at_pixel() {
        let map = map_with_parcel("42");
        let hits = map.features_at_pixel(Point::new(500.0, 400.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, Some(FeatureId::from("42")));

        assert!(map.features_at_pixel(Point::new(5.0, 5.0)).is_empty());
    }

    #[test]
    fn test_hidden_layers_are_not_hit() {
        let mut map = map_with_parcel("42");
        assert!(map.set_layer_visible("cadastral", false));
        assert!(map.features_at_pixel(Point::new(500.0, 400.0)).is_empty());
        assert!(!map.set_layer_visible("missing", true));
    }

    #[test]
    fn test_click_emits_single_click() {
        let mut map = test_map();
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = clicks.clone();
        map.on(MapEventKind::SingleClick, move |event| {
            if let MapEvent::SingleClick { pixel, .. } = event {
                assert_eq!(*pixel, Point::new(10.0, 20.0));
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        map.handle_input(InputEvent::Click {
            position: Point::new(10.0, 20.0),
        });
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        map.set_target(None);
        map.handle_input(InputEvent::Click {
            position: Point::new(10.0, 20.0),
        });
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drag_stays_inside_extent() {
        let mut map = test_map();
        for _ in 0..50 {
            map.handle_input(InputEvent::Drag {
                delta: Point::new(-5000.0, 5000.0),
            });
        }
        let view = ViewConfig::default();
        let visible = map.viewport().bounds();
        assert!(visible.north_east.lat <= view.extent.north_east.lat + 1e-9);
        assert!(visible.north_east.lng <= view.extent.north_east.lng + 1e-9);
        assert!(view.extent.contains(&map.viewport().center));
    }

    #[test]
    fn test_failed_tile_emits_layer_scoped_error() {
        let mut map = test_map();
        map.add_layer(Box::new(TileLayer::openstreetmap("osm".into(), "OSM".into())))
            .unwrap();

        let errors = Arc::new(AtomicUsize::new(0));
        let counter = errors.clone();
        map.on_layer("osm", MapEventKind::TileLoadError, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        map.on_layer("corine", MapEventKind::TileLoadError, |_| {
            panic!("wrong layer notified")
        });

        map.apply_tile_result(TileResult {
            layer_id: "osm".into(),
            coord: TileCoord::new(1, 1, 2),
            data: Err(MapError::HttpStatus {
                status: 503,
                url: "http://tiles/2/1/1.png".into(),
            }),
        });
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_tile_memory_is_bounded() {
        let mut map = test_map();
        for x in 0..(FAILED_TILE_MEMORY as u32 + 200) {
            map.apply_tile_result(TileResult {
                layer_id: "osm".into(),
                coord: TileCoord::new(x, 0, 14),
                data: Err(MapError::TileDecode("empty".into())),
            });
        }
        assert_eq!(map.failed_tiles(), FAILED_TILE_MEMORY);
    }

    #[test]
    fn test_undecodable_vector_tile_is_a_load_error() {
        let mut map = map_with_parcel("42");
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = errors.clone();
        map.on(MapEventKind::TileLoadError, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        map.apply_tile_result(TileResult {
            layer_id: "cadastral".into(),
            coord: TileCoord::new(0, 0, 0),
            data: Ok(vec![0x1a, 0x7f, 0x00]),
        });
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_render_complete_once_settled() {
        let mut map = test_map();
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = renders.clone();
        let id = map.on(MapEventKind::RenderComplete, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        map.update();
        map.update();
        assert_eq!(renders.load(Ordering::SeqCst), 1);

        map.handle_input(InputEvent::Drag {
            delta: Point::new(10.0, 0.0),
        });
        map.update();
        assert_eq!(renders.load(Ordering::SeqCst), 2);

        assert!(map.off(id));
        assert_eq!(map.listener_count(), 0);
    }

    #[test]
    fn test_detached_map_does_not_update() {
        let mut map = test_map();
        map.set_target(None);
        assert!(!map.is_attached());
        assert_eq!(map.update(), 0);
    }
}
