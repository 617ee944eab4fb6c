use crate::core::geo::{LatLng, Point, TileCoord};
use serde::{Deserialize, Serialize};

/// Raw pointer input forwarded from the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Single click/tap that did not turn into a drag
    Click { position: Point },
    /// Drag in progress
    Drag { delta: Point },
    /// Scroll wheel or pinch zoom
    Scroll { delta: f64, position: Point },
    /// Viewport/window resize
    Resize { size: Point },
}

impl InputEvent {
    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Click { position } => Some(*position),
            InputEvent::Scroll { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// Events emitted by the map to its subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Map view has changed (center or zoom)
    ViewChanged { center: LatLng, zoom: f64 },
    /// Click that hit the map surface without dragging
    SingleClick { pixel: Point, lat_lng: LatLng },
    /// A tile of `layer_id` could not be fetched or decoded
    TileLoadError { layer_id: String, coord: TileCoord },
    /// Every tile requested for the current view has settled
    RenderComplete,
}

/// Discriminant used to route events to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    ViewChanged,
    SingleClick,
    TileLoadError,
    RenderComplete,
}

impl MapEvent {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::ViewChanged { .. } => MapEventKind::ViewChanged,
            MapEvent::SingleClick { .. } => MapEventKind::SingleClick,
            MapEvent::TileLoadError { .. } => MapEventKind::TileLoadError,
            MapEvent::RenderComplete => MapEventKind::RenderComplete,
        }
    }

    /// Layer the event belongs to, for layer-scoped events
    pub fn layer_id(&self) -> Option<&str> {
        match self {
            MapEvent::TileLoadError { layer_id, .. } => Some(layer_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for MapEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapEventKind::ViewChanged => write!(f, "viewchanged"),
            MapEventKind::SingleClick => write!(f, "singleclick"),
            MapEventKind::TileLoadError => write!(f, "tileloaderror"),
            MapEventKind::RenderComplete => write!(f, "rendercomplete"),
        }
    }
}
