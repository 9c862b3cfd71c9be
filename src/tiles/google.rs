//! Google Map Tiles API (2D tiles).
//!
//! Tile requests need a session token, created lazily on first use and
//! dropped again when the API answers `401 Unauthorized`, so the next request
//! opens a fresh session.

use super::source::{TileImage, TileProvider, HTTP_CLIENT};
use crate::core::geo::TileCoords;
use crate::{ChartError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

const API_ROOT: &str = "https://tile.googleapis.com/v1";

/// Style of the requested map, sent when creating a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSpec {
    pub map_type: String,
    pub language: String,
    pub region: String,
}

impl Default for MapSpec {
    fn default() -> Self {
        Self {
            map_type: "roadmap".to_string(),
            language: "en-US".to_string(),
            region: "US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    #[serde(rename = "session")]
    token: String,
    #[serde(default)]
    expiry: Option<String>,
}

pub struct GoogleTileProvider {
    api_key: String,
    spec: MapSpec,
    client: reqwest::Client,
    session: Mutex<Option<Session>>,
}

impl GoogleTileProvider {
    pub fn new(api_key: impl Into<String>, spec: MapSpec) -> Self {
        Self::with_client(HTTP_CLIENT.clone(), api_key, spec)
    }

    pub fn with_client(client: reqwest::Client, api_key: impl Into<String>, spec: MapSpec) -> Self {
        Self {
            api_key: api_key.into(),
            spec,
            client,
            session: Mutex::new(None),
        }
    }

    pub fn spec(&self) -> &MapSpec {
        &self.spec
    }

    async fn session_token(&self) -> Result<String> {
        let mut session = self.session.lock().await;
        if let Some(existing) = session.as_ref() {
            return Ok(existing.token.clone());
        }

        let created = self.create_session().await?;
        log::debug!("google tiles session created, expires {:?}", created.expiry);
        let token = created.token.clone();
        *session = Some(created);
        Ok(token)
    }

    async fn create_session(&self) -> Result<Session> {
        let response = self
            .client
            .post(format!("{API_ROOT}/createSession?key={}", self.api_key))
            .json(&self.spec)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ChartError::Fetch {
                reason: format!("session request failed with HTTP {}", response.status()),
            });
        }
        Ok(response.json::<Session>().await?)
    }

    fn tile_url(&self, coords: TileCoords, token: &str) -> String {
        format!(
            "{API_ROOT}/2dtiles/{}/{}/{}?session={}&key={}&orientation=0",
            coords.zoom, coords.x, coords.y, token, self.api_key
        )
    }
}

#[async_trait]
impl TileProvider for GoogleTileProvider {
    async fn get_tile(&self, coords: TileCoords, tile_size: u32) -> Result<TileImage> {
        let token = self.session_token().await?;
        let response = self.client.get(self.tile_url(coords, &token)).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            log::warn!("google tiles session rejected, will create a new one");
            *self.session.lock().await = None;
        }
        if !status.is_success() {
            return Err(ChartError::Fetch {
                reason: format!("HTTP {} for tile {}", status, coords),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        TileImage::from_encoded(bytes)?.ensure_square(tile_size)
    }
}
