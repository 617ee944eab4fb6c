use crate::{
    core::{
        constants::{POPUP_HEIGHT, POPUP_WIDTH},
        geo::Point,
    },
    view::MapView,
};
use egui::{Frame, Order, Pos2, Rect, RichText, Ui, Vec2};

/// Draws the parcel popup, if any, at its clamped position inside `rect`.
/// The close button clears popup and highlight.
pub fn show(ui: &mut Ui, rect: Rect, view: &mut MapView) {
    let Some(data) = view.popup() else {
        return;
    };

    let placement = data.placement(Point::new(rect.width() as f64, rect.height() as f64));
    let content = data.content();
    let position = Pos2::new(
        rect.min.x + placement.x as f32,
        rect.min.y + placement.y as f32,
    );

    let mut close = false;
    egui::Area::new(egui::Id::new("parcelmap_popup"))
        .order(Order::Foreground)
        .fixed_pos(position)
        .show(ui.ctx(), |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                ui.set_max_size(Vec2::new(POPUP_WIDTH as f32, POPUP_HEIGHT as f32));
                ui.horizontal(|ui| {
                    ui.label(RichText::new(content.title.as_str()).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✕").clicked() {
                            close = true;
                        }
                    });
                });
                ui.label(content.number_line.as_str());
                ui.label(content.area_line.as_str());
            });
        });

    if close {
        view.close_popup();
    }
}
