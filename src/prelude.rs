//! Prelude module for common tilechart types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use tilechart::prelude::*;`

pub use crate::core::{
    config::{ChartOptions, ChartProfile, TileLoadingConfig},
    geo::{GridSize, LatLng, PixelOffset, PixelSize, Point, Tile, TileCoords, NULL_ISLAND},
    projection::{to_lat_lng, to_pixel, TileGrid},
    state::ChartState,
    viewport::{compute_visible_tiles, ViewportFrame},
};

pub use crate::layers::marker::{place_markers, Marker, PlacedMarker};

pub use crate::tiles::{
    Cache, LayerTileKey, LruTileCache, NoOpCache, TileDraw, TileEvent, TileImage, TileLoader,
    TileProvider, TileState,
};

#[cfg(feature = "debug-provider")]
pub use crate::tiles::DebugTileProvider;
#[cfg(feature = "http")]
pub use crate::tiles::{GoogleTileProvider, MapSpec, UrlTileProvider};

pub use crate::{ChartError, Result};

// Common external types
pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet};
pub use std::sync::{Arc, Mutex};
