//! Web Mercator projection onto a tile raster.
//!
//! The unit Mercator square is scaled by the tile grid of a zoom level rather
//! than by a fixed `2^zoom`, so grids that are not powers of two (or not
//! square, such as planetary catalogs with twice as many columns as rows)
//! project correctly. The raster wraps horizontally and is clamped at the
//! Mercator latitude limit vertically.

use crate::core::constants::MAX_MERCATOR_LATITUDE;
use crate::core::geo::{GridSize, LatLng, Point};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

/// Projects a geographic position to world pixel coordinates.
pub fn to_pixel(position: LatLng, tile_size: u32, grid: GridSize) -> Point {
    let lat_rad = position
        .latitude()
        .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
        .to_radians();
    let lng_rad = position.longitude().to_radians();
    let scale = tile_size as f64 / (2.0 * PI);

    let world_x = scale * (lng_rad + PI);
    let world_y = scale * (PI - (PI / 4.0 + lat_rad / 2.0).tan().ln());

    Point::new(world_x * grid.columns as f64, world_y * grid.rows as f64)
}

/// Inverse of [`to_pixel`]. Latitude is clamped into `[-90, 90]` and
/// longitude wrapped into `[-180, 180)`.
pub fn to_lat_lng(pixel: Point, tile_size: u32, grid: GridSize) -> LatLng {
    let width = tile_size as f64 * grid.columns as f64;
    let height = tile_size as f64 * grid.rows as f64;

    let world_x = pixel.x / width * (2.0 * PI) - PI;
    let world_y = PI - pixel.y / height * (2.0 * PI);

    let lat = (2.0 * world_y.exp().atan() - PI / 2.0).to_degrees();
    let lng = world_x.to_degrees();
    LatLng::new(lat, lng)
}

type TileCountFn = Arc<dyn Fn(u8) -> u32 + Send + Sync>;

/// Tile-count functions of zoom for both axes.
///
/// Defaults to the standard `2^zoom × 2^zoom` slippy-map grid.
#[derive(Clone)]
pub struct TileGrid {
    columns: TileCountFn,
    rows: TileCountFn,
}

impl TileGrid {
    /// The standard square Web Mercator grid
    pub fn web_mercator() -> Self {
        Self::custom(power_of_two, power_of_two)
    }

    /// A grid with caller-supplied column and row counts per zoom level
    pub fn custom<C, R>(columns: C, rows: R) -> Self
    where
        C: Fn(u8) -> u32 + Send + Sync + 'static,
        R: Fn(u8) -> u32 + Send + Sync + 'static,
    {
        Self {
            columns: Arc::new(columns),
            rows: Arc::new(rows),
        }
    }

    /// Tile counts at `zoom`, never smaller than one tile per axis
    pub fn size_at(&self, zoom: u8) -> GridSize {
        GridSize::new((self.columns)(zoom), (self.rows)(zoom))
    }

    pub fn project(&self, position: LatLng, zoom: u8, tile_size: u32) -> Point {
        to_pixel(position, tile_size, self.size_at(zoom))
    }

    pub fn unproject(&self, pixel: Point, zoom: u8, tile_size: u32) -> LatLng {
        to_lat_lng(pixel, tile_size, self.size_at(zoom))
    }
}

fn power_of_two(zoom: u8) -> u32 {
    // 2^31 tiles is already far beyond any real catalog
    1u32 << zoom.min(31)
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::web_mercator()
    }
}

impl fmt::Debug for TileGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileGrid")
            .field("zoom_0", &self.size_at(0))
            .finish()
    }
}
