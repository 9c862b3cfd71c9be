//! # tilechart
//!
//! Slippy-map style tile charts: geographic projection onto a tile grid,
//! visible-tile computation for a viewport, pan and zoom state, and
//! asynchronous tile loading through a read-through LRU cache.
//!
//! Navigation lives in [`core`], tile fetching and caching in [`tiles`], and
//! marker placement in [`layers`].

pub mod core;
pub mod layers;
pub mod prelude;
pub mod tiles;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{ChartOptions, ChartProfile, TileLoadingConfig},
    geo::{GridSize, LatLng, PixelOffset, PixelSize, Point, Tile, TileCoords, NULL_ISLAND},
    projection::TileGrid,
    state::ChartState,
    viewport::{compute_visible_tiles, ViewportFrame, ViewportInputs},
};

pub use layers::marker::{place_markers, Marker, PlacedMarker};

pub use tiles::{
    Cache, LayerTileKey, LruTileCache, NoOpCache, TileImage, TileLoader, TileProvider, TileState,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, ChartError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tile fetch failed: {reason}")]
    Fetch { reason: String },

    #[error(
        "Unsupported tile size: requested {requested_size}px, got {actual_width}x{actual_height}"
    )]
    TileSizeUnsupported {
        requested_size: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error type alias for convenience
pub type Error = ChartError;
