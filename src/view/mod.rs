//! The cadastral viewer: owns the map for as long as it is mounted and turns
//! map events into UI state (loading flag, overlay toggle, toast, popup and
//! the highlighted parcel).
//!
//! Map callbacks run wherever the map emits, so they only forward
//! [`ViewMessage`]s into a channel; [`MapView::pump`] applies them on the UI
//! thread. Parcel lookups run on the async runtime and come back the same way.

pub mod popup;
pub mod toast;

pub use popup::{PopupContent, PopupData};
pub use toast::{LayerFailures, Toast};

use crate::{
    api::{ParcelApi, ParcelAttributes},
    context::MapContext,
    core::{
        config::ViewerConfig,
        constants::{BASE_LAYER_ID, CADASTRAL_LAYER_ID, WMS_LAYER_ID},
        geo::Point,
        map::{Map, SharedMap, Surface},
    },
    input::{MapEvent, MapEventKind, SubscriptionId},
    layers::{
        style::{FeatureId, FeatureRef, RenderParams},
        tile::TileLayer,
        vector::ParcelLayer,
    },
    runtime::SharedSpawner,
    tiles::loader::TileLoader,
    Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Identifies the lookup started by one parcel click
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupTicket(u64);

/// Attribute request for a clicked parcel
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelLookup {
    pub ticket: LookupTicket,
    pub id: FeatureId,
    pub pixel: Point,
}

/// Work queued for the UI thread
#[derive(Debug)]
pub enum ViewMessage {
    LayerFailed { layer_id: String },
    RenderComplete,
    Clicked { pixel: Point },
    LookupFinished {
        lookup: ParcelLookup,
        result: Result<ParcelAttributes>,
    },
}

#[derive(Debug, Clone)]
struct Highlight {
    feature: FeatureRef,
    ticket: LookupTicket,
}

pub struct MapView {
    config: ViewerConfig,
    map: SharedMap,
    context: MapContext,
    api: Arc<dyn ParcelApi>,
    spawner: SharedSpawner,
    subscriptions: Vec<SubscriptionId>,
    messages_tx: Sender<ViewMessage>,
    messages_rx: Receiver<ViewMessage>,
    map_loading: bool,
    wms_visible: bool,
    toast: Option<Toast>,
    popup: Option<PopupData>,
    highlight: Option<Highlight>,
    failures: LayerFailures,
    next_ticket: u64,
    mounted: bool,
}

impl MapView {
    /// Builds the three layers and the map, subscribes to the map's events
    /// and publishes the map to `context`
    pub fn mount(
        config: ViewerConfig,
        surface: Surface,
        context: MapContext,
        api: Arc<dyn ParcelApi>,
        runtime: SharedSpawner,
    ) -> Result<Self> {
        let base = TileLayer::openstreetmap(BASE_LAYER_ID.into(), "OpenStreetMap".into())
            .with_cache_size(config.tiles.cache_size)
            .with_z_index(0);
        let land_cover = TileLayer::wms(
            WMS_LAYER_ID.into(),
            "Corine WMS".into(),
            &config.wms_url,
            config.wms_params.clone(),
        )
        .with_cache_size(config.tiles.cache_size)
        .with_opacity(config.wms_opacity)
        .with_z_index(1);
        let parcels = ParcelLayer::new(
            CADASTRAL_LAYER_ID.into(),
            "Cadastral parcels".into(),
            &config.cadastral_template,
        )
        .with_cache_size(config.tiles.cache_size)
        .with_z_index(2);

        let loader = TileLoader::new(runtime.clone(), config.tiles.clone());
        let mut map = Map::new(&config.view, surface).with_loader(loader);
        map.add_layer(Box::new(base))?;
        map.add_layer(Box::new(land_cover))?;
        map.add_layer(Box::new(parcels))?;

        let (messages_tx, messages_rx) = unbounded();
        let subscriptions = subscribe(&mut map, &messages_tx);

        let map: SharedMap = Arc::new(Mutex::new(map));
        context.set_map(map.clone());
        log::info!(
            "map view mounted at {:.4}, {:.4} zoom {}",
            config.view.center.lat,
            config.view.center.lng,
            config.view.zoom
        );

        Ok(Self {
            config,
            map,
            context,
            api,
            spawner: runtime,
            subscriptions,
            messages_tx,
            messages_rx,
            map_loading: true,
            wms_visible: true,
            toast: None,
            popup: None,
            highlight: None,
            failures: LayerFailures::default(),
            next_ticket: 0,
            mounted: true,
        })
    }

    /// Applies every queued message. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let messages: Vec<ViewMessage> = self.messages_rx.try_iter().collect();
        let handled = messages.len();
        for message in messages {
            self.apply(message);
        }
        handled
    }

    fn apply(&mut self, message: ViewMessage) {
        match message {
            ViewMessage::LayerFailed { layer_id } => self.layer_failed(&layer_id, Instant::now()),
            ViewMessage::RenderComplete => {
                if self.map_loading {
                    log::debug!("first render complete");
                }
                self.map_loading = false;
            }
            ViewMessage::Clicked { pixel } => {
                if let Some(lookup) = self.handle_click(pixel) {
                    self.spawn_lookup(lookup);
                }
            }
            ViewMessage::LookupFinished { lookup, result } => {
                self.finish_lookup(lookup, result);
            }
        }
    }

    /// Drops the toast once its time is up
    pub fn tick(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|toast| toast.is_expired(now)) {
            self.toast = None;
        }
    }

    /// Selects the topmost parcel under `pixel`. Returns the attribute lookup
    /// to run, if the parcel has an identifier.
    pub fn handle_click(&mut self, pixel: Point) -> Option<ParcelLookup> {
        let hit = self.lock_map().features_at_pixel(pixel).into_iter().next();

        let Some(feature) = hit else {
            self.clear_selection();
            return None;
        };

        let ticket = self.mint_ticket();
        let id = feature.id.clone();
        self.highlight = Some(Highlight { feature, ticket });
        // the popup always belongs to the current highlight
        self.popup = None;
        self.repaint_parcels();

        match id {
            Some(id) => Some(ParcelLookup { ticket, id, pixel }),
            None => {
                log::warn!("clicked parcel has no identifier, skipping attribute lookup");
                None
            }
        }
    }

    /// Applies a lookup result if it still belongs to the current highlight.
    /// Returns false for stale results, which are dropped.
    pub fn finish_lookup(&mut self, lookup: ParcelLookup, result: Result<ParcelAttributes>) -> bool {
        let current = self
            .highlight
            .as_ref()
            .is_some_and(|h| h.ticket == lookup.ticket);
        if !current {
            log::debug!("dropping stale lookup for parcel {}", lookup.id);
            return false;
        }

        match result {
            Ok(attributes) => {
                self.popup = Some(PopupData {
                    pixel: lookup.pixel,
                    parcel_number: attributes.parcel_number,
                    area: attributes.area,
                });
            }
            Err(e) => {
                log::warn!("parcel {} lookup failed: {}", lookup.id, e);
                self.popup = None;
                self.show_toast(
                    format!("Error while fetching parcel data: {}", lookup.id),
                    Instant::now(),
                );
            }
        }
        true
    }

    /// Shows or hides the land-cover overlay
    pub fn toggle_wms(&mut self) {
        self.wms_visible = !self.wms_visible;
        let visible = self.wms_visible;
        self.lock_map().set_layer_visible(WMS_LAYER_ID, visible);
        self.clear_selection();
    }

    pub fn close_popup(&mut self) {
        self.clear_selection();
    }

    /// Releases every subscription, detaches the map from its surface and
    /// withdraws it from the context. Safe to call more than once.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;

        {
            let mut map = self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            for id in self.subscriptions.drain(..) {
                map.off(id);
            }
            map.set_target(None);
        }

        if self
            .context
            .map()
            .is_some_and(|published| Arc::ptr_eq(&published, &self.map))
        {
            self.context.clear();
        }
        log::info!("map view unmounted");
    }

    fn layer_failed(&mut self, layer_id: &str, now: Instant) {
        match layer_id {
            WMS_LAYER_ID => {
                self.failures.wms = true;
                self.wms_visible = false;
                self.lock_map().set_layer_visible(WMS_LAYER_ID, false);
            }
            CADASTRAL_LAYER_ID => self.failures.cadastral = true,
            other => {
                log::debug!("ignoring tile failure of layer '{}'", other);
                return;
            }
        }

        if let Some(message) = self.failures.message() {
            self.show_toast(message, now);
        }
    }

    fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast::new(message, now, self.config.toast_duration));
    }

    fn clear_selection(&mut self) {
        self.popup = None;
        if self.highlight.take().is_some() {
            self.repaint_parcels();
        }
    }

    fn mint_ticket(&mut self) -> LookupTicket {
        self.next_ticket += 1;
        LookupTicket(self.next_ticket)
    }

    fn repaint_parcels(&self) {
        let params = RenderParams::highlighting(self.highlighted().cloned());
        self.lock_map()
            .with_parcels(CADASTRAL_LAYER_ID, |layer| layer.force_repaint(&params));
    }

    fn spawn_lookup(&self, lookup: ParcelLookup) {
        let api = self.api.clone();
        let tx = self.messages_tx.clone();
        log::debug!("looking up parcel {}", lookup.id);
        self.spawner.spawn_boxed(
            async move {
                let result = api.fetch_parcel(&lookup.id).await;
                // receiver gone means the view was dropped
                let _ = tx.send(ViewMessage::LookupFinished { lookup, result });
            }
            .boxed(),
        );
    }

    fn lock_map(&self) -> MutexGuard<'_, Map> {
        self.map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn map(&self) -> SharedMap {
        self.map.clone()
    }

    pub fn context(&self) -> &MapContext {
        &self.context
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn map_loading(&self) -> bool {
        self.map_loading
    }

    pub fn wms_visible(&self) -> bool {
        self.wms_visible
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn popup(&self) -> Option<&PopupData> {
        self.popup.as_ref()
    }

    pub fn highlighted(&self) -> Option<&FeatureRef> {
        self.highlight.as_ref().map(|h| &h.feature)
    }

    pub fn failures(&self) -> LayerFailures {
        self.failures
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl Drop for MapView {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn subscribe(map: &mut Map, tx: &Sender<ViewMessage>) -> Vec<SubscriptionId> {
    let mut subscriptions = Vec::with_capacity(4);

    for layer_id in [WMS_LAYER_ID, CADASTRAL_LAYER_ID] {
        let tx = tx.clone();
        subscriptions.push(map.on_layer(layer_id, MapEventKind::TileLoadError, move |event| {
            if let MapEvent::TileLoadError { layer_id, .. } = event {
                let _ = tx.send(ViewMessage::LayerFailed {
                    layer_id: layer_id.clone(),
                });
            }
        }));
    }

    let render_tx = tx.clone();
    subscriptions.push(map.on(MapEventKind::RenderComplete, move |_| {
        let _ = render_tx.send(ViewMessage::RenderComplete);
    }));

    let click_tx = tx.clone();
    subscriptions.push(map.on(MapEventKind::SingleClick, move |event| {
        if let MapEvent::SingleClick { pixel, .. } = event {
            let _ = click_tx.send(ViewMessage::Clicked { pixel: *pixel });
        }
    }));

    subscriptions
}
