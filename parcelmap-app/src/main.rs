use parcelmap::{
    ui::{MapCanvas, UiMapExt},
    HttpParcelApi, MapContext, MapView, Surface, TokioSpawner, ViewerConfig,
};
use std::sync::Arc;
use std::time::Instant;

const WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];

fn main() -> anyhow::Result<()> {
    parcelmap::init_logging();

    // network I/O runs here; the UI thread only drains results
    let runtime = tokio::runtime::Runtime::new()?;
    let spawner = TokioSpawner::new(runtime.handle().clone()).shared();

    let config = ViewerConfig::default();
    let api = Arc::new(HttpParcelApi::new(config.api_base.clone()));
    let view = MapView::mount(
        config,
        Surface::new(WINDOW_SIZE[0] as f64, WINDOW_SIZE[1] as f64),
        MapContext::new(),
        api,
        spawner,
    )?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(WINDOW_SIZE)
            .with_title("Cadastral parcels"),
        ..Default::default()
    };

    eframe::run_native(
        "parcelmap-app",
        options,
        Box::new(|_cc| Box::new(ParcelmapApp::new(view))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;

    log::info!("viewer closed");
    Ok(())
}

struct ParcelmapApp {
    view: MapView,
    canvas: MapCanvas,
}

impl ParcelmapApp {
    fn new(view: MapView) -> Self {
        Self {
            view,
            canvas: MapCanvas::new(),
        }
    }
}

impl eframe::App for ParcelmapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.view.pump();
        self.view.tick(Instant::now());

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                ui.parcel_map(&mut self.canvas, &mut self.view);
            });

        // tile and lookup results arrive between frames
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
