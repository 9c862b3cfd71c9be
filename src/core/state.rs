use crate::core::config::ChartOptions;
use crate::core::geo::{GridSize, LatLng, PixelOffset, PixelSize, Point, Tile};
use crate::core::projection::{self, TileGrid};
use crate::core::viewport::{ViewportFrame, ViewportInputs};
use crate::{ChartError, Result};

/// Owns all mutable navigation state of one chart view: zoom, focus and
/// viewport size.
///
/// Derived quantities (tile counts, visible tiles, translation offset) are
/// never stored; each read recomputes them from the full current state.
#[derive(Debug, Clone)]
pub struct ChartState {
    tile_size: u32,
    zoom: u8,
    focus: LatLng,
    viewport_size: PixelSize,
    min_zoom: u8,
    max_zoom: u8,
    grid: TileGrid,
}

impl ChartState {
    /// Creates a chart state from options using the standard slippy-map grid
    pub fn new(options: ChartOptions) -> Result<Self> {
        Self::with_grid(options, TileGrid::web_mercator())
    }

    /// Creates a chart state over a custom tile grid.
    ///
    /// An out-of-range initial zoom is clamped silently.
    pub fn with_grid(options: ChartOptions, grid: TileGrid) -> Result<Self> {
        options.validate()?;
        let zoom = clamp_zoom(options.zoom, options.min_zoom, options.max_zoom);
        log::debug!(
            "chart state created: zoom {} (requested {}), focus {}",
            zoom,
            options.zoom,
            options.focus
        );
        Ok(Self {
            tile_size: options.tile_size,
            zoom,
            focus: options.focus,
            viewport_size: PixelSize::default(),
            min_zoom: options.min_zoom,
            max_zoom: options.max_zoom,
            grid,
        })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn focus(&self) -> LatLng {
        self.focus
    }

    pub fn viewport_size(&self) -> PixelSize {
        self.viewport_size
    }

    pub fn zoom_limits(&self) -> (u8, u8) {
        (self.min_zoom, self.max_zoom)
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom_level(self.zoom as i32 + 1);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom_level(self.zoom as i32 - 1);
    }

    /// Sets the zoom level, clamping to the configured range
    pub fn set_zoom_level(&mut self, zoom: i32) {
        self.zoom = clamp_zoom(zoom, self.min_zoom, self.max_zoom);
    }

    pub fn set_viewport_size(&mut self, size: PixelSize) {
        self.viewport_size = size;
    }

    /// Moves the focus by a pixel delta, as produced by a drag gesture.
    ///
    /// Dragging content right (positive `x`) moves the focus west. The
    /// horizontal position wraps around the world; the vertical position
    /// stops at the map edges so the focus cannot pass a pole.
    pub fn shift_focus(&mut self, delta: Point) {
        let grid = self.tile_counts();
        let (width, height) = grid.map_size(self.tile_size);
        let raw = projection::to_pixel(self.focus, self.tile_size, grid);

        let shifted = Point::new(
            (raw.x - delta.x).rem_euclid(width as f64),
            (raw.y - delta.y).clamp(0.0, (height - 1) as f64),
        );
        self.focus = projection::to_lat_lng(shifted, self.tile_size, grid);
        log::trace!("focus shifted by ({}, {}) to {}", delta.x, delta.y, self.focus);
    }

    /// Tile counts at the current zoom
    pub fn tile_counts(&self) -> GridSize {
        self.grid.size_at(self.zoom)
    }

    /// Inputs of the viewport computation for the current state
    pub fn viewport_inputs(&self) -> ViewportInputs {
        ViewportInputs {
            viewport_size: self.viewport_size,
            focus: self.focus,
            zoom: self.zoom,
            tile_size: self.tile_size,
            grid: self.tile_counts(),
        }
    }

    /// Recomputes every derived placement value from the current state
    pub fn frame(&self) -> ViewportFrame {
        ViewportFrame::compute(self.viewport_inputs())
    }

    pub fn visible_tiles(&self) -> Vec<Tile> {
        self.frame().tiles
    }

    pub fn translation_offset(&self) -> PixelOffset {
        self.frame().translation_offset
    }

    /// World pixel coordinates of a position at the current zoom
    pub fn pixel_coords(&self, position: LatLng) -> Point {
        self.grid.project(position, self.zoom, self.tile_size)
    }
}

fn clamp_zoom(zoom: i32, min_zoom: u8, max_zoom: u8) -> u8 {
    zoom.clamp(min_zoom as i32, max_zoom as i32) as u8
}

impl TryFrom<ChartOptions> for ChartState {
    type Error = ChartError;

    fn try_from(options: ChartOptions) -> Result<Self> {
        Self::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(zoom: i32, min_zoom: u8, max_zoom: u8) -> ChartOptions {
        ChartOptions {
            zoom,
            min_zoom,
            max_zoom,
            ..ChartOptions::default()
        }
    }

    fn single_tile_grid() -> TileGrid {
        TileGrid::custom(|_| 1, |_| 1)
    }

    #[test]
    fn test_initial_zoom_below_min_is_clamped() {
        let state = ChartState::with_grid(options(9, 10, 20), single_tile_grid()).unwrap();
        assert_eq!(state.zoom(), 10);
    }

    #[test]
    fn test_initial_zoom_above_max_is_clamped() {
        let state = ChartState::with_grid(options(25, 0, 20), single_tile_grid()).unwrap();
        assert_eq!(state.zoom(), 20);
    }

    #[test]
    fn test_set_zoom_level_is_clamped() {
        let mut state = ChartState::with_grid(options(5, 0, 10), single_tile_grid()).unwrap();
        state.set_zoom_level(11);
        assert_eq!(state.zoom(), 10);
        state.set_zoom_level(-3);
        assert_eq!(state.zoom(), 0);
    }

    #[test]
    fn test_zoom_in_and_out_step_by_one() {
        let mut state = ChartState::with_grid(options(5, 0, 10), single_tile_grid()).unwrap();
        state.zoom_in();
        assert_eq!(state.zoom(), 6);
        state.zoom_out();
        assert_eq!(state.zoom(), 5);
    }

    #[test]
    fn test_zoom_stops_at_limits() {
        let mut state = ChartState::new(options(0, 0, 1)).unwrap();
        state.zoom_out();
        assert_eq!(state.zoom(), 0);
        state.zoom_in();
        state.zoom_in();
        assert_eq!(state.zoom(), 1);
    }

    #[test]
    fn test_inverted_zoom_limits_are_rejected() {
        let result = ChartState::new(options(5, 10, 2));
        assert!(matches!(result, Err(ChartError::InvalidArgument(_))));
    }

    #[test]
    fn test_shift_focus_moves_opposite_to_drag() {
        let mut state = ChartState::new(options(2, 0, 22)).unwrap();
        state.shift_focus(Point::new(100.0, -100.0));
        assert!(state.focus().longitude() < 0.0);
        assert!(state.focus().latitude() < 0.0);
    }

    #[test]
    fn test_shift_focus_clamps_at_poles() {
        let mut state = ChartState::new(options(0, 0, 22)).unwrap();
        state.shift_focus(Point::new(0.0, 10_000.0));
        let north = state.focus().latitude();
        assert!(north > 85.0);
        state.shift_focus(Point::new(0.0, 10_000.0));
        assert_eq!(state.focus().latitude(), north);
    }

    #[test]
    fn test_derived_values_follow_every_input() {
        let mut state = ChartState::new(options(1, 0, 22)).unwrap();
        state.set_viewport_size(PixelSize::new(256, 256));
        let before = state.visible_tiles();

        state.zoom_in();
        let zoomed = state.visible_tiles();
        assert!(zoomed.iter().all(|t| t.coords.zoom == 2));
        assert_ne!(before, zoomed);

        state.set_viewport_size(PixelSize::new(1024, 768));
        assert!(state.visible_tiles().len() > zoomed.len());

        let offset = state.translation_offset();
        state.shift_focus(Point::new(37.0, 0.0));
        assert_ne!(state.translation_offset(), offset);
    }
}
