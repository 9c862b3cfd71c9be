//! Configuration for chart navigation and tile loading
//!
//! Options can be built in code, loaded from JSON, or picked from a
//! [`ChartProfile`] preset.

use crate::core::constants::{
    DEFAULT_CACHE_SIZE, DEFAULT_EVENT_CAPACITY, MAX_ZOOM, MIN_ZOOM, TILE_SIZE,
};
use crate::core::geo::{LatLng, NULL_ISLAND};
use crate::{ChartError, Result};
use serde::{Deserialize, Serialize};

/// Construction-time options of a [`ChartState`](crate::core::state::ChartState)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub tile_size: u32,
    /// Initial zoom; clamped into `[min_zoom, max_zoom]`
    pub zoom: i32,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub focus: LatLng,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            zoom: MIN_ZOOM as i32,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            focus: NULL_ISLAND,
        }
    }
}

impl ChartOptions {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(ChartError::InvalidArgument(
                "tile size must be at least one pixel".to_string(),
            ));
        }
        if self.min_zoom > self.max_zoom {
            return Err(ChartError::InvalidArgument(format!(
                "min zoom {} is above max zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        Ok(())
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_zoom(mut self, zoom: i32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_zoom_limits(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_focus(mut self, focus: LatLng) -> Self {
        self.focus = focus;
        self
    }
}

/// Tile fetching and caching behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLoadingConfig {
    /// Maximum number of tiles kept by the LRU cache
    pub cache_size: usize,
    /// Abort fetches of tiles that scrolled out of view instead of letting
    /// them finish and populate the cache
    pub abort_offscreen: bool,
    /// Load events buffered until the UI drains them; further events are
    /// dropped while the buffer is full
    pub event_capacity: usize,
}

impl Default for TileLoadingConfig {
    fn default() -> Self {
        ChartProfile::default().resolve()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChartProfile {
    #[default]
    Balanced,
    LowMemory,
    HighCapacity,
    Custom(TileLoadingConfig),
}

impl ChartProfile {
    pub fn resolve(&self) -> TileLoadingConfig {
        match self {
            Self::Balanced => TileLoadingConfig {
                cache_size: DEFAULT_CACHE_SIZE,
                abort_offscreen: false,
                event_capacity: DEFAULT_EVENT_CAPACITY,
            },
            Self::LowMemory => TileLoadingConfig {
                cache_size: 32,
                abort_offscreen: true,
                event_capacity: DEFAULT_EVENT_CAPACITY,
            },
            Self::HighCapacity => TileLoadingConfig {
                cache_size: 1024,
                abort_offscreen: false,
                event_capacity: DEFAULT_EVENT_CAPACITY,
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ChartOptions::default();
        assert_eq!(options.tile_size, 256);
        assert_eq!((options.min_zoom, options.max_zoom), (0, 22));
        assert_eq!(options.focus, NULL_ISLAND);
        assert_eq!(TileLoadingConfig::default().cache_size, 100);
        assert_eq!(TileLoadingConfig::default().event_capacity, 256);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options = ChartOptions::from_json_str(
            r#"{"zoom": 4, "focus": {"latitude": 52.0, "longitude": 381.0}}"#,
        )
        .unwrap();
        assert_eq!(options.zoom, 4);
        assert_eq!(options.tile_size, 256);
        assert_eq!(options.focus, LatLng::new(52.0, 21.0));
    }

    #[test]
    fn test_invalid_json_options_are_rejected() {
        assert!(matches!(
            ChartOptions::from_json_str(r#"{"tile_size": 0}"#),
            Err(ChartError::InvalidArgument(_))
        ));
        assert!(matches!(
            ChartOptions::from_json_str("not json"),
            Err(ChartError::Serialization(_))
        ));
    }

    #[test]
    fn test_profiles_resolve() {
        assert_eq!(ChartProfile::LowMemory.resolve().cache_size, 32);
        let custom = TileLoadingConfig {
            cache_size: 7,
            abort_offscreen: true,
            event_capacity: 16,
        };
        assert_eq!(ChartProfile::Custom(custom.clone()).resolve(), custom);
    }
}
