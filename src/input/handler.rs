use crate::input::events::{MapEvent, MapEventKind};
use crate::prelude::HashMap;

/// Type alias for event callbacks
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Handle returned by [`EventManager::on`]; pass it back to [`EventManager::off`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Listener {
    kind: MapEventKind,
    layer_id: Option<String>,
    callback: EventCallback,
}

impl Listener {
    fn matches(&self, event: &MapEvent) -> bool {
        self.kind == event.kind()
            && match &self.layer_id {
                Some(id) => event.layer_id() == Some(id.as_str()),
                None => true,
            }
    }
}

/// Dispatches map events to subscribed callbacks, in subscription order
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<SubscriptionId, Listener>,
    next_id: u64,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event of `kind`
    pub fn on<F>(&mut self, kind: MapEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.insert(kind, None, Box::new(callback))
    }

    /// Register a listener for events of `kind` raised by one layer
    pub fn on_layer<F>(&mut self, layer_id: &str, kind: MapEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.insert(kind, Some(layer_id.to_string()), Box::new(callback))
    }

    fn insert(
        &mut self,
        kind: MapEventKind,
        layer_id: Option<String>,
        callback: EventCallback,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(
            id,
            Listener {
                kind,
                layer_id,
                callback,
            },
        );
        id
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Deliver an event to every matching listener
    pub fn emit(&self, event: &MapEvent) {
        let mut matching: Vec<_> = self
            .listeners
            .iter()
            .filter(|(_, l)| l.matches(event))
            .collect();
        matching.sort_by_key(|(id, _)| id.0);

        for (_, listener) in matching {
            (listener.callback)(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::TileCoord;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn tile_error(layer: &str) -> MapEvent {
        MapEvent::TileLoadError {
            layer_id: layer.to_string(),
            coord: TileCoord::new(0, 0, 0),
        }
    }

    #[test]
    fn test_layer_scoped_listener() {
        let mut events = EventManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        events.on_layer("corine", MapEventKind::TileLoadError, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(&tile_error("cadastral"));
        events.emit(&tile_error("corine"));
        events.emit(&MapEvent::RenderComplete);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_off_releases_listener() {
        let mut events = EventManager::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let id = events.on(MapEventKind::RenderComplete, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.emit(&MapEvent::RenderComplete);
        assert!(events.off(id));
        assert!(!events.off(id));
        events.emit(&MapEvent::RenderComplete);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(events.listener_count(), 0);
    }
}
