use crate::core::geo::TileCoords;
use crate::{ChartError, Result};
use async_trait::async_trait;
use std::io::Cursor;
use std::sync::Arc;

/// Encoded tile image plus its pixel dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub bytes: Arc<Vec<u8>>,
    pub width: u32,
    pub height: u32,
}

impl TileImage {
    /// Wraps encoded image bytes, reading the dimensions from the header
    pub fn from_encoded(bytes: Vec<u8>) -> Result<Self> {
        let (width, height) = image::io::Reader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .into_dimensions()?;
        Ok(Self {
            bytes: Arc::new(bytes),
            width,
            height,
        })
    }

    /// Fails with [`ChartError::TileSizeUnsupported`] unless the image is a
    /// `tile_size × tile_size` square
    pub fn ensure_square(self, tile_size: u32) -> Result<Self> {
        if self.width != tile_size || self.height != tile_size {
            return Err(ChartError::TileSizeUnsupported {
                requested_size: tile_size,
                actual_width: self.width,
                actual_height: self.height,
            });
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Anything that can produce the image of a tile.
///
/// Implementations fail with [`ChartError::Fetch`] on transport problems and
/// with [`ChartError::TileSizeUnsupported`] when the image they obtained is
/// not a `tile_size` square. Retrying is up to the implementation.
#[async_trait]
pub trait TileProvider: Send + Sync {
    async fn get_tile(&self, coords: TileCoords, tile_size: u32) -> Result<TileImage>;
}

#[cfg(feature = "http")]
pub use http::{UrlTileProvider, HTTP_CLIENT};

#[cfg(feature = "http")]
mod http {
    use super::*;
    use once_cell::sync::Lazy;

    /// Shared async HTTP client with a custom User-Agent so that public tile
    /// servers don't reject the request. Built once to reuse the connection
    /// pool across tiles.
    pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
        reqwest::Client::builder()
            .user_agent(concat!("tilechart/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .pool_max_idle_per_host(16)
            .build()
            .expect("failed to build reqwest async client")
    });

    type UrlBuilder = Arc<dyn Fn(TileCoords, u32) -> String + Send + Sync>;

    /// Fetches tiles from URLs built out of coordinates and tile size
    #[derive(Clone)]
    pub struct UrlTileProvider {
        client: reqwest::Client,
        url_builder: UrlBuilder,
    }

    impl UrlTileProvider {
        pub fn new<B>(url_builder: B) -> Self
        where
            B: Fn(TileCoords, u32) -> String + Send + Sync + 'static,
        {
            Self::with_client(HTTP_CLIENT.clone(), url_builder)
        }

        pub fn with_client<B>(client: reqwest::Client, url_builder: B) -> Self
        where
            B: Fn(TileCoords, u32) -> String + Send + Sync + 'static,
        {
            Self {
                client,
                url_builder: Arc::new(url_builder),
            }
        }

        /// Builds URLs from a template with `{z}`, `{x}`, `{y}` and `{size}`
        /// placeholders
        pub fn from_template(template: impl Into<String>) -> Self {
            let template = template.into();
            Self::new(move |coords, tile_size| expand_template(&template, coords, tile_size))
        }

        /// The public OpenStreetMap raster tiles (256 px)
        pub fn open_street_map() -> Self {
            Self::from_template("https://tile.openstreetmap.org/{z}/{x}/{y}.png")
        }

        pub fn url(&self, coords: TileCoords, tile_size: u32) -> String {
            (self.url_builder)(coords, tile_size)
        }
    }

    pub(crate) fn expand_template(template: &str, coords: TileCoords, tile_size: u32) -> String {
        template
            .replace("{z}", &coords.zoom.to_string())
            .replace("{x}", &coords.x.to_string())
            .replace("{y}", &coords.y.to_string())
            .replace("{size}", &tile_size.to_string())
    }

    #[async_trait]
    impl TileProvider for UrlTileProvider {
        async fn get_tile(&self, coords: TileCoords, tile_size: u32) -> Result<TileImage> {
            let url = self.url(coords, tile_size);
            log::debug!("fetching tile {} from {}", coords, url);

            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(ChartError::Fetch {
                    reason: format!("HTTP {} for tile {}", response.status(), coords),
                });
            }

            let bytes = response.bytes().await?.to_vec();
            TileImage::from_encoded(bytes)?.ensure_square(tile_size)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_reads_dimensions() {
        let image = TileImage::from_encoded(png(256, 128)).unwrap();
        assert_eq!((image.width, image.height), (256, 128));
        assert!(!image.is_empty());
    }

    #[test]
    fn test_rejects_wrong_tile_size() {
        let image = TileImage::from_encoded(png(512, 512)).unwrap();
        let err = image.ensure_square(256).unwrap_err();
        assert!(matches!(
            err,
            ChartError::TileSizeUnsupported {
                requested_size: 256,
                actual_width: 512,
                actual_height: 512
            }
        ));
    }

    #[test]
    fn test_garbage_is_an_image_error() {
        let result = TileImage::from_encoded(b"definitely not a png".to_vec());
        assert!(matches!(result, Err(ChartError::Image(_))));
    }
}
