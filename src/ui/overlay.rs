//! Controls drawn over the map: the land-cover toggle, the loading spinner
//! and the toast.

use crate::view::MapView;
use egui::{Align2, Color32, Frame, Order, Rect, RichText, Rounding, Ui, Vec2};

const MARGIN: f32 = 10.0;

/// Near-opaque white laid over the map while tiles load
pub(crate) const LOADING_VEIL: Color32 = Color32::from_rgba_premultiplied(230, 230, 230, 230);

pub fn show(ui: &mut Ui, rect: Rect, view: &mut MapView) {
    let ctx = ui.ctx().clone();

    egui::Area::new(egui::Id::new("parcelmap_layer_toggle"))
        .order(Order::Foreground)
        .fixed_pos(rect.left_top() + Vec2::splat(MARGIN))
        .show(&ctx, |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                let mut visible = view.wms_visible();
                if ui.checkbox(&mut visible, "Corine WMS").changed() {
                    view.toggle_wms();
                }
            });
        });

    if view.map_loading() {
        ui.painter_at(rect).rect_filled(rect, 0.0, LOADING_VEIL);
        egui::Area::new(egui::Id::new("parcelmap_loading"))
            .order(Order::Foreground)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(&ctx, |ui| {
                ui.add(egui::Spinner::new().size(32.0));
            });
        ctx.request_repaint();
    }

    if let Some(toast) = view.toast() {
        let message = toast.message.clone();
        egui::Area::new(egui::Id::new("parcelmap_toast"))
            .order(Order::Tooltip)
            .fixed_pos(rect.left_bottom() + Vec2::new(MARGIN, -60.0))
            .show(&ctx, |ui| {
                Frame::none()
                    .fill(Color32::from_rgb(0xdc, 0x26, 0x26))
                    .rounding(Rounding::same(4.0))
                    .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                    .show(ui, |ui| {
                        ui.label(RichText::new(message).color(Color32::WHITE));
                    });
            });
        // keep frames coming so the toast disappears on time
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
