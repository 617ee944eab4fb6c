use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::FutureExt;
use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::time::Duration;

use crate::core::{config::TileLoaderConfig, geo::TileCoord};
use crate::prelude::HashSet;
use crate::runtime::SharedSpawner;
use crate::{MapError, Result};

/// Shared async HTTP client for tile and attribute requests
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("parcelmap/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

/// GET `url` and return the body, treating non-2xx as an error
pub(crate) async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    timeout: Option<Duration>,
) -> Result<Vec<u8>> {
    let mut request = client.get(url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MapError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

type TileKey = (String, TileCoord);

/// Result of a tile loading operation
#[derive(Debug)]
pub struct TileResult {
    pub layer_id: String,
    pub coord: TileCoord,
    pub data: Result<Vec<u8>>,
}

struct QueuedTile {
    key: TileKey,
    url: String,
}

/// Fetches tiles on the async runtime and hands the bytes back to the
/// UI thread through a channel
pub struct TileLoader {
    spawner: SharedSpawner,
    config: TileLoaderConfig,
    result_tx: Sender<TileResult>,
    result_rx: Receiver<TileResult>,
    queue: VecDeque<QueuedTile>,
    queued: HashSet<TileKey>,
    in_flight: HashSet<TileKey>,
}

impl TileLoader {
    pub fn new(spawner: SharedSpawner, config: TileLoaderConfig) -> Self {
        let (result_tx, result_rx) = unbounded();
        Self {
            spawner,
            config,
            result_tx,
            result_rx,
            queue: VecDeque::new(),
            queued: HashSet::default(),
            in_flight: HashSet::default(),
        }
    }

    /// Queue a tile unless it is already queued or being fetched.
    /// Returns true if the tile was newly queued.
    pub fn request(&mut self, layer_id: &str, coord: TileCoord, url: String) -> bool {
        let key = (layer_id.to_string(), coord);
        if self.in_flight.contains(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key.clone());
        self.queue.push_back(QueuedTile { key, url });
        self.start_queued();
        true
    }

    /// Drop queued (not yet started) tiles that are no longer wanted
    pub fn retain_queued<F>(&mut self, mut wanted: F)
    where
        F: FnMut(&str, &TileCoord) -> bool,
    {
        let queued = &mut self.queued;
        self.queue.retain(|tile| {
            let keep = wanted(&tile.key.0, &tile.key.1);
            if !keep {
                queued.remove(&tile.key);
            }
            keep
        });
    }

    /// Collect finished fetches and start more from the queue
    pub fn drain(&mut self) -> Vec<TileResult> {
        let results: Vec<TileResult> = self.result_rx.try_iter().collect();
        for result in &results {
            self.in_flight
                .remove(&(result.layer_id.clone(), result.coord));
        }
        self.start_queued();
        results
    }

    /// Tiles queued or in flight
    pub fn pending(&self) -> usize {
        self.queue.len() + self.in_flight.len()
    }

    fn start_queued(&mut self) {
        while self.in_flight.len() < self.config.max_concurrent {
            let Some(tile) = self.queue.pop_front() else {
                break;
            };
            self.queued.remove(&tile.key);
            self.in_flight.insert(tile.key.clone());

            let tx = self.result_tx.clone();
            let timeout = self.config.timeout;
            let (layer_id, coord) = tile.key;
            let url = tile.url;

            log::debug!("fetching {} tile {}", layer_id, coord);
            self.spawner.spawn_boxed(
                async move {
                    let data = match fetch_bytes(&HTTP_CLIENT, &url, Some(timeout)).await {
                        Ok(data) => Ok(data),
                        Err(e) => {
                            log::warn!("tile {} of {} failed: {}", coord, layer_id, e);
                            Err(e)
                        }
                    };
                    // receiver gone means the map was dropped
                    let _ = tx.send(TileResult {
                        layer_id,
                        coord,
                        data,
                    });
                }
                .boxed(),
            );
        }
    }
}
