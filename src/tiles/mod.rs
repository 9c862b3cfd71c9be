pub mod cache;
#[cfg(feature = "debug-provider")]
pub mod debug;
#[cfg(feature = "http")]
pub mod google;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{Cache, CacheStats, LruTileCache, NoOpCache};
#[cfg(feature = "debug-provider")]
pub use debug::DebugTileProvider;
#[cfg(feature = "http")]
pub use google::{GoogleTileProvider, MapSpec};
pub use loader::{LayerTileKey, TileDraw, TileEvent, TileLoader, TileState};
#[cfg(feature = "http")]
pub use source::UrlTileProvider;
pub use source::{TileImage, TileProvider};
