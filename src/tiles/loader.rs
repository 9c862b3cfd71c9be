//! Background tile loading for one or more tile layers.
//!
//! [`TileLoader`] owns one task per visible `(layer, tile)` pair. Each task
//! goes through the shared cache, so a tile that scrolls out of view and back
//! in is only fetched again once it has been evicted. Finished loads are
//! announced on a bounded channel so the UI knows when to redraw; events
//! nobody drains are dropped once the channel is full.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::cache::{Cache, LruTileCache};
use super::source::{TileImage, TileProvider};
use crate::core::config::TileLoadingConfig;
use crate::core::geo::{Tile, TileCoords};
use crate::core::state::ChartState;
use crate::prelude::{Arc, HashMap, HashSet, Mutex};
use crate::{ChartError, Result};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Cache key of a tile image: the same coordinates in different layers are
/// different images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerTileKey {
    pub layer: usize,
    pub coords: TileCoords,
}

impl LayerTileKey {
    pub fn new(layer: usize, coords: TileCoords) -> Self {
        Self { layer, coords }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileState {
    Loading,
    Loaded(TileImage),
    Failed(String),
}

impl TileState {
    pub fn is_loading(&self) -> bool {
        matches!(self, TileState::Loading)
    }

    pub fn image(&self) -> Option<&TileImage> {
        match self {
            TileState::Loaded(image) => Some(image),
            _ => None,
        }
    }
}

/// Sent whenever a tile task finishes, successfully or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEvent {
    pub key: LayerTileKey,
    pub loaded: bool,
}

/// One layer's tile at its place in the viewport, in drawing order
#[derive(Debug, Clone, PartialEq)]
pub struct TileDraw {
    pub layer: usize,
    pub tile: Tile,
    pub state: TileState,
}

struct LoadEntry {
    state: Arc<Mutex<TileState>>,
    task: JoinHandle<()>,
}

type LayerVisibility = Arc<dyn Fn(usize) -> bool + Send + Sync>;

pub struct TileLoader<C = LruTileCache<LayerTileKey, TileImage>> {
    layers: Vec<Arc<dyn TileProvider>>,
    is_layer_visible: LayerVisibility,
    cache: Arc<C>,
    runtime: Handle,
    tile_size: u32,
    config: TileLoadingConfig,
    entries: HashMap<LayerTileKey, LoadEntry>,
    event_tx: Sender<TileEvent>,
    event_rx: Receiver<TileEvent>,
}

impl TileLoader<LruTileCache<LayerTileKey, TileImage>> {
    /// Creates a loader with an LRU cache sized by `config`
    pub fn new(
        layers: Vec<Arc<dyn TileProvider>>,
        tile_size: u32,
        config: TileLoadingConfig,
        runtime: Handle,
    ) -> Self {
        let cache = Arc::new(LruTileCache::new(config.cache_size));
        Self::with_cache(layers, tile_size, config, cache, runtime)
    }

    /// Like [`TileLoader::new`], spawning onto the runtime of the caller
    pub fn on_current_runtime(
        layers: Vec<Arc<dyn TileProvider>>,
        tile_size: u32,
        config: TileLoadingConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|err| {
            ChartError::InvalidArgument(format!("tile loader needs a tokio runtime: {err}"))
        })?;
        Ok(Self::new(layers, tile_size, config, runtime))
    }
}

impl<C> TileLoader<C>
where
    C: Cache<LayerTileKey, TileImage> + 'static,
{
    pub fn with_cache(
        layers: Vec<Arc<dyn TileProvider>>,
        tile_size: u32,
        config: TileLoadingConfig,
        cache: Arc<C>,
        runtime: Handle,
    ) -> Self {
        let (event_tx, event_rx) = bounded(config.event_capacity.max(1));
        Self {
            layers,
            is_layer_visible: Arc::new(|_| true),
            cache,
            runtime,
            tile_size,
            config,
            entries: HashMap::default(),
            event_tx,
            event_rx,
        }
    }

    /// Replaces the predicate deciding which layers are drawn and loaded
    pub fn with_layer_visibility<P>(mut self, is_layer_visible: P) -> Self
    where
        P: Fn(usize) -> bool + Send + Sync + 'static,
    {
        self.is_layer_visible = Arc::new(is_layer_visible);
        self
    }

    pub fn set_layer_visibility<P>(&mut self, is_layer_visible: P)
    where
        P: Fn(usize) -> bool + Send + Sync + 'static,
    {
        self.is_layer_visible = Arc::new(is_layer_visible);
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Receiving end of the load events; every clone sees each event once.
    /// At most `event_capacity` events wait here at any time.
    pub fn events(&self) -> Receiver<TileEvent> {
        self.event_rx.clone()
    }

    fn visible_layers(&self) -> Vec<usize> {
        (0..self.layers.len())
            .filter(|&layer| (self.is_layer_visible)(layer))
            .collect()
    }

    /// Loads the visible tiles of `state`. See [`TileLoader::sync`].
    pub fn update(&mut self, state: &ChartState) {
        if state.tile_size() != self.tile_size {
            log::warn!(
                "chart uses {} px tiles but the loader requests {} px tiles",
                state.tile_size(),
                self.tile_size
            );
        }
        self.sync(&state.visible_tiles());
    }

    /// Starts loading every visible layer's tile for `tiles` that is not
    /// tracked yet, and stops tracking tiles no longer in view. Fetches of
    /// dropped tiles are aborted when `abort_offscreen` is set, otherwise they
    /// run to completion and only fill the cache.
    pub fn sync(&mut self, tiles: &[Tile]) {
        let wanted: HashSet<LayerTileKey> = self
            .visible_layers()
            .into_iter()
            .flat_map(|layer| tiles.iter().map(move |tile| LayerTileKey::new(layer, tile.coords)))
            .collect();

        let abort = self.config.abort_offscreen;
        self.entries.retain(|key, entry| {
            let keep = wanted.contains(key);
            if !keep {
                log::trace!("dropping offscreen tile {:?}", key);
                if abort {
                    entry.task.abort();
                }
            }
            keep
        });

        for key in wanted {
            if !self.entries.contains_key(&key) {
                let entry = self.spawn(key);
                self.entries.insert(key, entry);
            }
        }
    }

    fn spawn(&self, key: LayerTileKey) -> LoadEntry {
        let state = Arc::new(Mutex::new(TileState::Loading));
        let provider = self.layers[key.layer].clone();
        let cache = self.cache.clone();
        let events = self.event_tx.clone();
        let task_state = state.clone();
        let tile_size = self.tile_size;

        log::trace!("loading tile {:?}", key);
        let task = self.runtime.spawn(async move {
            let fetched = cache
                .get(key, move |key: LayerTileKey| async move {
                    provider.get_tile(key.coords, tile_size).await
                })
                .await;

            let next = match fetched {
                Ok(image) => TileState::Loaded(image),
                Err(err) => {
                    log::warn!("tile {} of layer {} failed: {}", key.coords, key.layer, err);
                    TileState::Failed(err.to_string())
                }
            };
            let loaded = matches!(next, TileState::Loaded(_));
            if let Ok(mut state) = task_state.lock() {
                *state = next;
            }
            match events.try_send(TileEvent { key, loaded }) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {}
                Err(TrySendError::Full(_)) => {
                    log::trace!("event queue full, dropping load event for {:?}", key);
                }
            }
        });

        LoadEntry { state, task }
    }

    /// Current state of a tracked tile
    pub fn state(&self, key: &LayerTileKey) -> Option<TileState> {
        let entry = self.entries.get(key)?;
        entry.state.lock().ok().map(|state| state.clone())
    }

    pub fn tracked(&self) -> usize {
        self.entries.len()
    }

    /// Number of tracked tiles whose load has not finished
    pub fn loading(&self) -> usize {
        self.entries
            .values()
            .filter(|entry| {
                entry
                    .state
                    .lock()
                    .map(|state| state.is_loading())
                    .unwrap_or(false)
            })
            .count()
    }

    /// Visible layers bottom-up, each with its tiles in `tiles` order.
    /// Tiles not tracked yet are reported as loading.
    pub fn render_list(&self, tiles: &[Tile]) -> Vec<TileDraw> {
        self.visible_layers()
            .into_iter()
            .flat_map(|layer| {
                tiles.iter().map(move |tile| TileDraw {
                    layer,
                    tile: *tile,
                    state: self
                        .state(&LayerTileKey::new(layer, tile.coords))
                        .unwrap_or(TileState::Loading),
                })
            })
            .collect()
    }

    /// Stops tracking every tile, aborting unfinished loads
    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.task.abort();
        }
    }
}

impl<C> Drop for TileLoader<C> {
    fn drop(&mut self) {
        for entry in self.entries.values() {
            entry.task.abort();
        }
    }
}
