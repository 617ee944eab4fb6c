//! Parcel styling
//!
//! The parcel layer pulls a style for every feature when it repaints. The
//! selection lives outside the layer, so the view hands it over explicitly as
//! [`RenderParams`] each time it forces a repaint.

use crate::core::geo::TileCoord;
use serde::{Deserialize, Serialize};

/// RGBA color, straight (unmultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }
}

#[cfg(feature = "egui")]
impl From<Rgba> for egui::Color32 {
    fn from(color: Rgba) -> Self {
        egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
    }
}

/// Stroke and fill of one parcel polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParcelStyle {
    pub stroke: Rgba,
    pub stroke_width: f32,
    pub fill: Rgba,
}

impl ParcelStyle {
    /// Thin stroke, light fill
    pub const DEFAULT: ParcelStyle = ParcelStyle {
        stroke: Rgba::new(0x84, 0xaf, 0xb9, 0xff),
        stroke_width: 1.0,
        fill: Rgba::new(0x8c, 0xc8, 0xe0, 0x65),
    };

    /// Thicker stroke, brighter fill
    pub const HIGHLIGHTED: ParcelStyle = ParcelStyle {
        stroke: Rgba::new(0x00, 0xb7, 0xff, 0xff),
        stroke_width: 2.0,
        fill: Rgba::new(0x00, 0xb7, 0xff, 0x65),
    };
}

impl Default for ParcelStyle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Stable identifier of a parcel, as carried by the vector tiles and used by
/// the attribute API
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for FeatureId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Position of a feature inside the layer: which tile, which slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureKey {
    pub tile: TileCoord,
    pub index: u32,
}

/// What the view remembers about a feature: its slot and its stable id, if any
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRef {
    pub key: FeatureKey,
    pub id: Option<FeatureId>,
}

/// Inputs of the style function that live outside the layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderParams {
    pub highlighted: Option<FeatureRef>,
}

impl RenderParams {
    pub fn highlighting(feature: Option<FeatureRef>) -> Self {
        Self {
            highlighted: feature,
        }
    }
}

/// Style function signature used by the parcel layer
pub type StyleFn = Box<dyn Fn(&FeatureRef, Option<&FeatureRef>) -> ParcelStyle + Send + Sync>;

/// Highlighted style iff `highlighted` is present and carries the same id.
/// The slot is ignored, so a parcel split across tiles highlights every piece.
pub fn resolve_style(feature: &FeatureRef, highlighted: Option<&FeatureRef>) -> ParcelStyle {
    match highlighted {
        Some(h) if feature.id == h.id => ParcelStyle::HIGHLIGHTED,
        _ => ParcelStyle::DEFAULT,
    }
}
