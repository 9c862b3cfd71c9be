//! Visible-tile computation for a viewport.
//!
//! Everything here is a pure function of `(viewport size, focus, zoom, tile
//! size, grid)`. [`ViewportFrame::compute`] derives all placement values in
//! one pass so callers never observe a mix of stale and fresh quantities.

use crate::core::geo::{GridSize, LatLng, PixelOffset, PixelSize, Point, Tile, TileCoords};
use crate::core::projection;

/// Everything needed to lay tiles out for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportInputs {
    pub viewport_size: PixelSize,
    pub focus: LatLng,
    pub zoom: u8,
    pub tile_size: u32,
    pub grid: GridSize,
}

/// Derived placement state for one set of [`ViewportInputs`]
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportFrame {
    pub inputs: ViewportInputs,
    /// World size in pixels (`tile count * tile size` per axis)
    pub map_size: (i64, i64),
    /// World pixel of the focus point
    pub raw_offset: PixelOffset,
    /// World pixel shown at the viewport's top-left corner; `x` is wrapped
    /// into `[0, map width)`, `y` may fall outside the map near the poles
    pub bounded_offset: PixelOffset,
    /// Translation from world pixels to viewport pixels
    pub translation_offset: PixelOffset,
    pub tiles: Vec<Tile>,
}

impl ViewportFrame {
    pub fn compute(inputs: ViewportInputs) -> Self {
        let tile_size = inputs.tile_size.max(1) as i64;
        let map_size = (
            inputs.grid.columns as i64 * tile_size,
            inputs.grid.rows as i64 * tile_size,
        );

        let raw = projection::to_pixel(inputs.focus, inputs.tile_size.max(1), inputs.grid).floor();
        let raw_offset = PixelOffset::new(raw.x as i64, raw.y as i64);
        let bounded_offset = bounded_offset(raw_offset, inputs.viewport_size, map_size.0);
        let tiles = visible_tiles(&inputs, bounded_offset);

        Self {
            inputs,
            map_size,
            raw_offset,
            bounded_offset,
            translation_offset: PixelOffset::new(-bounded_offset.x, -bounded_offset.y),
            tiles,
        }
    }

    /// Converts a world pixel to viewport pixels, wrapping horizontally onto
    /// the copy of the world that starts at the viewport's left edge
    pub fn world_to_viewport(&self, world: Point) -> Point {
        let width = self.map_size.0 as f64;
        let x = (world.x + self.translation_offset.x as f64).rem_euclid(width);
        Point::new(x, world.y + self.translation_offset.y as f64)
    }
}

/// Computes the ordered list of tiles covering the viewport.
///
/// Tiles are emitted column by column (x ascending, then y ascending). Column
/// indices wrap modulo the grid width, so a viewport wider than the world
/// yields the same coordinates more than once at different pixel positions.
/// Rows above the north edge or below the south edge of the map are skipped.
pub fn compute_visible_tiles(
    viewport_size: PixelSize,
    focus: LatLng,
    zoom: u8,
    tile_size: u32,
    grid: GridSize,
) -> Vec<Tile> {
    ViewportFrame::compute(ViewportInputs {
        viewport_size,
        focus,
        zoom,
        tile_size,
        grid,
    })
    .tiles
}

fn bounded_offset(raw: PixelOffset, viewport: PixelSize, map_width: i64) -> PixelOffset {
    PixelOffset::new(
        (raw.x - viewport.width as i64 / 2).rem_euclid(map_width),
        raw.y - viewport.height as i64 / 2,
    )
}

fn visible_tiles(inputs: &ViewportInputs, offset: PixelOffset) -> Vec<Tile> {
    let tile_size = inputs.tile_size.max(1) as i64;
    let columns = inputs.grid.columns as i64;
    let rows = inputs.grid.rows as i64;

    // One extra tile per axis covers the partially scrolled edge
    let span_x = (inputs.viewport_size.width as i64 + tile_size - 1) / tile_size + 1;
    let span_y = (inputs.viewport_size.height as i64 + tile_size - 1) / tile_size + 1;

    let first_x = offset.x.div_euclid(tile_size);
    let first_y = offset.y.div_euclid(tile_size);
    let first_row = first_y.max(0);
    let last_row = (first_y + span_y - 1).min(rows - 1);

    let mut tiles = Vec::with_capacity((span_x * span_y.max(0)) as usize);
    for index_x in first_x..first_x + span_x {
        for index_y in first_row..=last_row {
            tiles.push(Tile {
                coords: TileCoords::new(
                    index_x.rem_euclid(columns) as u32,
                    index_y as u32,
                    inputs.zoom,
                ),
                pixel_position: PixelOffset::new(
                    index_x * tile_size - offset.x,
                    index_y * tile_size - offset.y,
                ),
            });
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, focus: LatLng, zoom: u8, grid: GridSize) -> ViewportFrame {
        ViewportFrame::compute(ViewportInputs {
            viewport_size: PixelSize::new(width, height),
            focus,
            zoom,
            tile_size: 256,
            grid,
        })
    }

    #[test]
    fn test_centered_viewport_at_zoom_one() {
        let frame = frame(512, 512, LatLng::new(0.0, 0.0), 1, GridSize::new(2, 2));
        assert_eq!(frame.map_size, (512, 512));
        assert_eq!(frame.raw_offset, PixelOffset::new(256, 256));
        assert_eq!(frame.bounded_offset, PixelOffset::new(0, 0));
        assert_eq!(frame.translation_offset, PixelOffset::new(0, 0));

        // 3 columns (wrapping back to x = 0) by the 2 rows that exist
        let coords: Vec<(u32, u32)> = frame.tiles.iter().map(|t| (t.coords.x, t.coords.y)).collect();
        assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0), (1, 1), (0, 0), (0, 1)]);
        assert_eq!(frame.tiles[0].pixel_position, PixelOffset::new(0, 0));
        assert_eq!(frame.tiles[3].pixel_position, PixelOffset::new(256, 256));
        assert_eq!(frame.tiles[4].pixel_position, PixelOffset::new(512, 0));
    }

    #[test]
    fn test_wraps_across_date_line() {
        // Focus just east of the antimeridian: the left half of the
        // viewport shows the eastern edge of the world
        let frame = frame(256, 256, LatLng::new(0.0, -179.0), 2, GridSize::new(4, 4));
        let first = frame.tiles.first().unwrap();
        assert_eq!(first.coords.x, 3);
        assert!(first.pixel_position.x <= 0);
        assert!(frame.tiles.iter().any(|t| t.coords.x == 0));
    }

    #[test]
    fn test_tiles_always_inside_grid() {
        let grids = [GridSize::new(1, 1), GridSize::new(4, 4), GridSize::new(6, 3)];
        for grid in grids {
            for &(lat, lng) in &[(0.0, 0.0), (85.0, 179.9), (-85.0, -180.0), (40.0, -74.0)] {
                for &(w, h) in &[(100, 100), (800, 600), (3000, 2000)] {
                    let frame = frame(w, h, LatLng::new(lat, lng), 3, grid);
                    for tile in &frame.tiles {
                        assert!(tile.coords.is_within(grid), "{:?} outside {:?}", tile, grid);
                        assert_eq!(tile.coords.zoom, 3);
                    }
                }
            }
        }
    }

    #[test]
    fn test_viewport_wider_than_world_repeats_coordinates() {
        let frame = frame(1024, 256, LatLng::new(0.0, 0.0), 0, GridSize::new(1, 1));
        let repeats = frame.tiles.iter().filter(|t| t.coords == TileCoords::new(0, 0, 0)).count();
        assert_eq!(repeats, frame.tiles.len());
        assert!(repeats >= 4);

        let mut positions: Vec<i64> = frame.tiles.iter().map(|t| t.pixel_position.x).collect();
        positions.dedup();
        assert_eq!(positions.len(), frame.tiles.len());
    }

    #[test]
    fn test_rows_beyond_poles_are_skipped() {
        let frame = frame(256, 1024, LatLng::new(85.0, 0.0), 0, GridSize::new(1, 1));
        assert!(frame.bounded_offset.y < 0);
        assert!(frame.tiles.iter().all(|t| t.coords.y == 0));
        assert_eq!(frame.tiles.len(), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = frame(900, 700, LatLng::new(12.3, 45.6), 6, GridSize::new(64, 64));
        let b = frame(900, 700, LatLng::new(12.3, 45.6), 6, GridSize::new(64, 64));
        assert_eq!(a.tiles, b.tiles);
    }

    #[test]
    fn test_world_to_viewport_places_focus_at_center() {
        let frame = frame(800, 600, LatLng::new(48.85, 2.35), 12, GridSize::new(4096, 4096));
        let focus_world = projection::to_pixel(LatLng::new(48.85, 2.35), 256, GridSize::new(4096, 4096));
        let on_screen = frame.world_to_viewport(focus_world);
        assert!((on_screen.x - 400.0).abs() <= 1.0);
        assert!((on_screen.y - 300.0).abs() <= 1.0);
    }
}
