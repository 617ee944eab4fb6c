use crate::core::{
    constants::{POPUP_HEIGHT, POPUP_WIDTH},
    geo::Point,
};

/// Parcel popup shown next to the clicked pixel
#[derive(Debug, Clone, PartialEq)]
pub struct PopupData {
    /// Click position in surface pixels
    pub pixel: Point,
    pub parcel_number: String,
    pub area: String,
}

impl PopupData {
    /// Top-left corner of the panel. Flips to the left/up of the click when
    /// the panel would run past the right/bottom edge; nothing else is clamped.
    pub fn placement(&self, viewport: Point) -> Point {
        let mut position = self.pixel;
        if self.pixel.x > viewport.x - POPUP_WIDTH {
            position.x -= POPUP_WIDTH;
        }
        if self.pixel.y > viewport.y - POPUP_HEIGHT {
            position.y -= POPUP_HEIGHT;
        }
        position
    }

    pub fn content(&self) -> PopupContent {
        PopupContent {
            title: "Cadastral parcel".to_string(),
            number_line: format!("Number {}", self.parcel_number),
            area_line: format!("Area {} m²", self.area),
        }
    }
}

/// Text lines of the popup panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub number_line: String,
    pub area_line: String,
}
