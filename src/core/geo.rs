use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate with latitude and longitude.
///
/// Values are normalized when the coordinate is built: latitude is clamped
/// into `[-90, 90]` and longitude wrapped into `[-180, 180)`. Two coordinates
/// compare equal iff their normalized fields are equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawLatLng")]
pub struct LatLng {
    latitude: f64,
    longitude: f64,
}

/// Wire form of [`LatLng`], normalized on the way in.
#[derive(Deserialize)]
struct RawLatLng {
    latitude: f64,
    longitude: f64,
}

impl From<RawLatLng> for LatLng {
    fn from(raw: RawLatLng) -> Self {
        LatLng::new(raw.latitude, raw.longitude)
    }
}

/// The point where the equator crosses the prime meridian.
pub const NULL_ISLAND: LatLng = LatLng {
    latitude: 0.0,
    longitude: 0.0,
};

impl LatLng {
    /// Creates a new coordinate, clamping latitude and wrapping longitude
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Self::clamp_lat(latitude),
            longitude: Self::wrap_lng(longitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Wraps longitude to the half-open `[-180, 180)` range
    pub fn wrap_lng(lng: f64) -> f64 {
        let wrapped = (lng + 180.0).rem_euclid(360.0) - 180.0;
        // rem_euclid may round up to exactly 360 for tiny negative inputs
        if wrapped >= 180.0 {
            wrapped - 360.0
        } else {
            wrapped
        }
    }

    /// Clamps latitude to the valid range
    pub fn clamp_lat(lat: f64) -> f64 {
        lat.clamp(-90.0, 90.0)
    }
}

impl Default for LatLng {
    fn default() -> Self {
        NULL_ISLAND
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lat_direction = if self.latitude >= 0.0 { "N" } else { "S" };
        let lng_direction = if self.longitude >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.3}° {}, {:.3}° {}",
            self.latitude.abs(),
            lat_direction,
            self.longitude.abs(),
            lng_direction
        )
    }
}

/// Represents a point in world or viewport pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn floor(&self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Integer pixel offset, used for tile placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelOffset {
    pub x: i64,
    pub y: i64,
}

impl PixelOffset {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Size of the visible pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Number of tile columns and rows at one zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub columns: u32,
    pub rows: u32,
}

impl GridSize {
    /// Creates a grid size; both dimensions are raised to at least one tile
    pub fn new(columns: u32, rows: u32) -> Self {
        Self {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }

    /// Total world size in pixels for the given tile size
    pub fn map_size(&self, tile_size: u32) -> (u64, u64) {
        (
            self.columns as u64 * tile_size as u64,
            self.rows as u64 * tile_size as u64,
        )
    }
}

/// Address of a tile in the grid of one zoom level.
///
/// `x` and `y` are always wrapped into `[0, columns)` and `[0, rows)` by the
/// code that produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoords {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoords {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Checks the coordinates lie inside the given grid
    pub fn is_within(&self, grid: GridSize) -> bool {
        self.x < grid.columns && self.y < grid.rows
    }
}

impl fmt::Display for TileCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A tile placed in the current viewport. Recomputed whenever zoom, focus
/// or viewport size change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tile {
    pub coords: TileCoords,
    /// Top-left corner of the tile in viewport pixels
    pub pixel_position: PixelOffset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_is_clamped() {
        assert_eq!(LatLng::new(-100.0, 0.0).latitude(), -90.0);
        assert_eq!(LatLng::new(100.0, 0.0).latitude(), 90.0);
        assert_eq!(LatLng::new(45.0, 0.0).latitude(), 45.0);
    }

    #[test]
    fn test_longitude_is_normalized() {
        assert_eq!(LatLng::new(0.0, -180.0).longitude(), -180.0);
        assert_eq!(LatLng::new(0.0, -179.0).longitude(), -179.0);
        assert_eq!(LatLng::new(0.0, 180.0).longitude(), -180.0);
        assert_eq!(LatLng::new(0.0, 360.0).longitude(), 0.0);
        assert_eq!(LatLng::new(0.0, 540.0).longitude(), -180.0);
        assert_eq!(LatLng::new(0.0, -190.0).longitude(), 170.0);
    }

    #[test]
    fn test_longitude_range_holds_for_sweep() {
        let mut lng = -1080.0;
        while lng <= 1080.0 {
            let wrapped = LatLng::new(10.0, lng).longitude();
            assert!((-180.0..180.0).contains(&wrapped), "{lng} -> {wrapped}");
            lng += 7.3;
        }
        assert_eq!(LatLng::wrap_lng(-1e-20), 0.0);
    }

    #[test]
    fn test_equality_uses_normalized_fields() {
        assert_eq!(LatLng::new(95.0, 360.0), LatLng::new(90.0, 0.0));
        assert_ne!(LatLng::new(10.0, 20.0), LatLng::new(10.0, 21.0));
    }

    #[test]
    fn test_null_island_is_default() {
        assert_eq!(NULL_ISLAND.latitude(), 0.0);
        assert_eq!(NULL_ISLAND.longitude(), 0.0);
        assert_eq!(LatLng::default(), NULL_ISLAND);
    }

    #[test]
    fn test_display_uses_hemispheres() {
        assert_eq!(LatLng::new(52.2297, 21.0122).to_string(), "52.230° N, 21.012° E");
        assert_eq!(LatLng::new(-33.8688, -70.5).to_string(), "33.869° S, 70.500° W");
    }

    #[test]
    fn test_deserialize_normalizes() {
        let parsed: LatLng = serde_json::from_str(r#"{"latitude": 120.0, "longitude": 190.0}"#)
            .unwrap();
        assert_eq!(parsed.latitude(), 90.0);
        assert_eq!(parsed.longitude(), -170.0);
    }

    #[test]
    fn test_grid_size_is_at_least_one_tile() {
        let grid = GridSize::new(0, 0);
        assert_eq!(grid.columns, 1);
        assert_eq!(grid.rows, 1);
        assert_eq!(grid.map_size(256), (256, 256));
    }
}
