#![cfg(feature = "egui")]

use async_trait::async_trait;
use egui::{Context, FullOutput, Pos2, RawInput, Rect, Shape, Vec2};
use futures::future::BoxFuture;
use parcelmap::{
    constants::{BASE_LAYER_ID, CADASTRAL_LAYER_ID, WMS_LAYER_ID},
    AsyncHandle, AsyncSpawner, FeatureId, MapCanvas, MapContext, MapError, MapView, ParcelApi,
    ParcelAttributes, Point, Result, Surface, TileLoaderConfig, ViewerConfig,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Counts spawned tasks and drops them unrun, so no request leaves the test
#[derive(Default)]
struct CountingSpawner {
    spawned: AtomicUsize,
}

struct Dropped;

impl AsyncHandle for Dropped {
    fn is_finished(&self) -> bool {
        true
    }

    fn cancel(&self) {}
}

impl AsyncSpawner for CountingSpawner {
    fn spawn_boxed(&self, _future: BoxFuture<'static, ()>) -> Box<dyn AsyncHandle> {
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Box::new(Dropped)
    }
}

struct OfflineApi;

#[async_trait]
impl ParcelApi for OfflineApi {
    async fn fetch_parcel(&self, id: &FeatureId) -> Result<ParcelAttributes> {
        Err(MapError::Layer(format!("offline: {id}")))
    }
}

fn run_frame(ctx: &Context, canvas: &mut MapCanvas, view: &mut MapView, size: Vec2) -> FullOutput {
    let input = RawInput {
        screen_rect: Some(Rect::from_min_size(Pos2::ZERO, size)),
        ..Default::default()
    };
    ctx.run(input, |ctx| {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                canvas.show(ui, view);
            });
    })
}

#[test]
fn test_first_frame_sizes_map_and_requests_tiles() {
    let spawner = Arc::new(CountingSpawner::default());
    let mut view = MapView::mount(
        ViewerConfig::default(),
        Surface::new(640.0, 480.0),
        MapContext::new(),
        Arc::new(OfflineApi),
        spawner.clone(),
    )
    .unwrap();

    let ctx = Context::default();
    let mut canvas = MapCanvas::new();
    run_frame(&ctx, &mut canvas, &mut view, Vec2::new(1000.0, 800.0));

    let map = view.map();
    let map = map.lock().unwrap();
    assert_eq!(map.viewport().size, Point::new(1000.0, 800.0));
    assert_eq!(
        map.list_layers(),
        vec![BASE_LAYER_ID, WMS_LAYER_ID, CADASTRAL_LAYER_ID]
    );
    assert!(spawner.spawned.load(Ordering::SeqCst) > 0);
    assert!(view.map_loading());
}

#[test]
fn test_hidden_overlay_is_not_requested() {
    let spawner = Arc::new(CountingSpawner::default());
    let config = ViewerConfig::default().with_tiles(TileLoaderConfig {
        max_concurrent: 10_000,
        ..TileLoaderConfig::default()
    });
    let mut view = MapView::mount(
        config,
        Surface::new(1000.0, 800.0),
        MapContext::new(),
        Arc::new(OfflineApi),
        spawner.clone(),
    )
    .unwrap();
    view.toggle_wms();

    let ctx = Context::default();
    let mut canvas = MapCanvas::new();
    run_frame(&ctx, &mut canvas, &mut view, Vec2::new(1000.0, 800.0));

    // base and parcels only, one request per visible tile each
    let tiles = view.map().lock().unwrap().visible_tiles().len();
    assert!(tiles > 0);
    assert_eq!(spawner.spawned.load(Ordering::SeqCst), 2 * tiles);
}

#[test]
fn test_loading_veils_the_whole_map() {
    let mut view = MapView::mount(
        ViewerConfig::default(),
        Surface::new(800.0, 600.0),
        MapContext::new(),
        Arc::new(OfflineApi),
        Arc::new(CountingSpawner::default()),
    )
    .unwrap();

    let ctx = Context::default();
    let mut canvas = MapCanvas::new();
    let screen = Rect::from_min_size(Pos2::ZERO, Vec2::new(800.0, 600.0));
    let output = run_frame(&ctx, &mut canvas, &mut view, screen.size());
    assert!(view.map_loading());

    let veiled = output.shapes.iter().any(|clipped| match &clipped.shape {
        Shape::Rect(shape) => {
            shape.rect == screen && shape.fill.a() > 200 && shape.fill.a() < 255
        }
        _ => false,
    });
    assert!(veiled);
}
