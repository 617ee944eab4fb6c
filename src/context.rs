//! Shared handle to the live map.
//!
//! The view publishes its map here on mount and clears it on unmount; other
//! parts of the application (the canvas, tools) read it without owning it.

use crate::core::map::SharedMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct MapContext {
    slot: Arc<RwLock<Option<SharedMap>>>,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current map, if one is published
    pub fn map(&self) -> Option<SharedMap> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set_map(&self, map: SharedMap) {
        let mut slot = self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            log::warn!("replacing the map published in the map context");
        }
        *slot = Some(map);
    }

    pub fn clear(&self) {
        self.slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
    }

    pub fn has_map(&self) -> bool {
        self.map().is_some()
    }
}

impl std::fmt::Debug for MapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapContext")
            .field("has_map", &self.has_map())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        config::ViewConfig,
        map::{Map, Surface},
    };
    use std::sync::Mutex;

    fn shared_map() -> SharedMap {
        Arc::new(Mutex::new(Map::new(
            &ViewConfig::default(),
            Surface::new(800.0, 600.0),
        )))
    }

    #[test]
    fn test_starts_empty() {
        assert!(MapContext::new().map().is_none());
    }

    #[test]
    fn test_clones_share_the_slot() {
        let context = MapContext::new();
        let reader = context.clone();
        let map = shared_map();

        context.set_map(map.clone());
        let published = reader.map().unwrap();
        assert!(Arc::ptr_eq(&published, &map));

        context.clear();
        assert!(!reader.has_map());
    }

    #[test]
    fn test_replacing_keeps_latest() {
        let context = MapContext::new();
        let first = shared_map();
        let second = shared_map();
        context.set_map(first);
        context.set_map(second.clone());
        assert!(Arc::ptr_eq(&context.map().unwrap(), &second));
    }
}
