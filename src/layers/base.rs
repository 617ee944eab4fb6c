use crate::{core::geo::TileCoord, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    /// Raster tiles (XYZ or WMS)
    Tile,
    /// Vector tiles decoded into features
    Vector,
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerType::Tile => write!(f, "tile"),
            LayerType::Vector => write!(f, "vector"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub layer_type: LayerType,
    pub z_index: i32,
    pub opacity: f32,
    pub visible: bool,
}

impl LayerProperties {
    pub fn new(id: String, name: String, layer_type: LayerType) -> Self {
        Self {
            id,
            name,
            layer_type,
            z_index: 0,
            opacity: 1.0,
            visible: true,
        }
    }
}

/// A tiled map layer. Every layer in this viewer is fed tile by tile; the map
/// asks it for URLs and hands the fetched bytes back.
pub trait LayerTrait: Send + Sync {
    fn properties(&self) -> &LayerProperties;

    fn properties_mut(&mut self) -> &mut LayerProperties;

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn name(&self) -> &str {
        &self.properties().name
    }

    fn layer_type(&self) -> LayerType {
        self.properties().layer_type
    }

    fn is_visible(&self) -> bool {
        self.properties().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.properties_mut().visible = visible;
    }

    fn opacity(&self) -> f32 {
        self.properties().opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.properties_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    fn z_index(&self) -> i32 {
        self.properties().z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.properties_mut().z_index = z_index;
    }

    /// URL to fetch the tile at `coord` from
    fn tile_url(&self, coord: TileCoord) -> String;

    /// Whether the tile at `coord` is already held by the layer
    fn has_tile(&self, coord: &TileCoord) -> bool;

    /// Accept fetched bytes for a tile. Errors mean the payload was unusable.
    fn insert_tile(&mut self, coord: TileCoord, data: Vec<u8>) -> Result<()>;

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_properties() {
        let props = LayerProperties::new(
            "test".to_string(),
            "Test Layer".to_string(),
            LayerType::Vector,
        );

        assert_eq!(props.id, "test");
        assert_eq!(props.name, "Test Layer");
        assert_eq!(props.layer_type, LayerType::Vector);
        assert_eq!(props.z_index, 0);
        assert_eq!(props.opacity, 1.0);
        assert!(props.visible);
    }

    #[test]
    fn test_layer_type_display() {
        assert_eq!(LayerType::Tile.to_string(), "tile");
        assert_eq!(LayerType::Vector.to_string(), "vector");
    }
}
