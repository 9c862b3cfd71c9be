//! Locally rendered placeholder tiles, handy for checking tile placement
//! without a network connection.

use super::source::{TileImage, TileProvider};
use crate::core::geo::TileCoords;
use crate::{ChartError, Result};
use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use std::io::Cursor;

const BORDER: u32 = 2;
const BACKGROUND: Rgba<u8> = Rgba([51, 51, 51, 255]);
const GRID_LINE: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Renders a dark square with a red border and a coordinate-dependent
/// checker pattern, encoded as PNG
#[derive(Debug, Default, Clone, Copy)]
pub struct DebugTileProvider;

impl DebugTileProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn render(coords: TileCoords, tile_size: u32) -> Result<TileImage> {
        if tile_size == 0 {
            return Err(ChartError::TileSizeUnsupported {
                requested_size: tile_size,
                actual_width: 0,
                actual_height: 0,
            });
        }

        let accent = accent_for(coords);
        let cell = (tile_size / 8).max(1);
        let far_edge = tile_size.saturating_sub(BORDER);
        let image = RgbaImage::from_fn(tile_size, tile_size, |x, y| {
            let on_border = x < BORDER || y < BORDER || x >= far_edge || y >= far_edge;
            if on_border {
                GRID_LINE
            } else if (x / cell + y / cell) % 2 == 0 {
                accent
            } else {
                BACKGROUND
            }
        });

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(TileImage {
            bytes: bytes.into(),
            width: tile_size,
            height: tile_size,
        })
    }
}

/// Neighbouring tiles get visibly different colors
fn accent_for(coords: TileCoords) -> Rgba<u8> {
    let seed = coords
        .x
        .wrapping_mul(73_856_093)
        ^ coords.y.wrapping_mul(19_349_663)
        ^ (coords.zoom as u32).wrapping_mul(83_492_791);
    Rgba([
        64 + (seed & 0x7f) as u8,
        64 + ((seed >> 8) & 0x7f) as u8,
        64 + ((seed >> 16) & 0x7f) as u8,
        255,
    ])
}

#[async_trait]
impl TileProvider for DebugTileProvider {
    async fn get_tile(&self, coords: TileCoords, tile_size: u32) -> Result<TileImage> {
        Self::render(coords, tile_size)
    }
}
