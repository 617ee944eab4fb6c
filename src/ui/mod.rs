pub mod overlay;
pub mod popup;
pub mod textures;
pub mod widget;

pub use textures::{decode_tile, TileTextures};
pub use widget::MapCanvas;

use crate::view::MapView;

pub trait UiMapExt {
    /// Fills the remaining space with the map of `view`
    fn parcel_map(&mut self, canvas: &mut MapCanvas, view: &mut MapView) -> egui::Response;
}

impl UiMapExt for egui::Ui {
    fn parcel_map(&mut self, canvas: &mut MapCanvas, view: &mut MapView) -> egui::Response {
        canvas.show(self, view)
    }
}
