//! Engine-wide defaults for chart navigation and tile caching.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Default square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Lowest zoom level accepted by default.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level accepted by default.
pub const MAX_ZOOM: u8 = 22;

/// Default number of decoded tiles kept by the LRU cache.
pub const DEFAULT_CACHE_SIZE: usize = 100;

/// Default number of undelivered tile load events kept for the UI.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Latitude at which the square Web Mercator world ends.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.0511287798;
