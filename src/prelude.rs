//! Prelude module for common parcelmap types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use parcelmap::prelude::*;`

pub use crate::core::{
    config::{TileLoaderConfig, ViewConfig, ViewerConfig, WmsParams},
    geo::{LatLng, LatLngBounds, Point, TileCoord},
    map::{Map, SharedMap, Surface},
    viewport::Viewport,
};

pub use crate::layers::{
    base::LayerTrait,
    manager::LayerManager,
    style::{FeatureId, FeatureRef, ParcelStyle, RenderParams},
    tile::TileLayer,
    vector::ParcelLayer,
};

pub use crate::input::{InputEvent, MapEvent, MapEventKind, SubscriptionId};

pub use crate::api::{HttpParcelApi, ParcelApi, ParcelAttributes};
pub use crate::context::MapContext;
pub use crate::runtime::{AsyncHandle, AsyncSpawner, SharedSpawner};
pub use crate::view::{MapView, PopupData, Toast};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::tokio_impl::TokioSpawner;

#[cfg(feature = "egui")]
pub use crate::ui::MapCanvas;

pub use crate::{MapError, Result};

pub use std::{
    sync::Arc,
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
