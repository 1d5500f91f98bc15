/*
 *  artcache.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Album art acquisition, off render path decode and a small LRU of
 *  decoded covers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;

use embedded_graphics::pixelcolor::Rgb888;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use log::{debug, info, warn};
use reqwest::{header, Client};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::constants::{ART_FETCH_TIMEOUT, CONNECT_TIMEOUT, USER_AGENT};

#[derive(Debug, Error)]
pub enum ArtError {
    #[error("art download failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("art read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("image codec error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unsupported artwork reference: {0}")]
    Unsupported(String),
    #[error("art worker failed: {0}")]
    Worker(String),
}

/// Decoded cover, already scaled for the art frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtImage {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Rgb888>,
}

impl ArtImage {
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb888> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    fn from_rgb(img: &RgbImage) -> Self {
        let pixels = img.pixels().map(|Rgb([r, g, b])| Rgb888::new(*r, *g, *b)).collect();
        Self { width: img.width(), height: img.height(), pixels }
    }
}

/// What the renderer gets for the current artwork reference
#[derive(Debug, Clone, PartialEq)]
pub enum ArtHandle {
    /// track has no artwork
    None,
    Pending,
    Ready(Arc<ArtImage>),
    /// fetch or decode failed; not retried until the reference changes
    Failed,
}

impl ArtHandle {
    pub fn image(&self) -> Option<&ArtImage> {
        match self {
            ArtHandle::Ready(img) => Some(img),
            _ => None,
        }
    }
}

/// Raw bytes behind an artwork reference
pub trait ArtSource: Send + Sync + 'static {
    fn load(&self, reference: &str) -> impl Future<Output = Result<Vec<u8>, ArtError>> + Send;
}

/// http(s) through reqwest, `file://` and plain paths from disk, and
/// `demo:<n>` generated covers.
#[derive(Debug, Clone)]
pub struct DefaultArtSource {
    client: Client,
}

impl DefaultArtSource {
    pub fn new() -> Result<Self, ArtError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(ART_FETCH_TIMEOUT)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ArtError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl ArtSource for DefaultArtSource {
    fn load(&self, reference: &str) -> impl Future<Output = Result<Vec<u8>, ArtError>> + Send {
        let reference = reference.trim().to_string();
        async move {
            if reference.starts_with("http://") || reference.starts_with("https://") {
                self.download(&reference).await
            } else if let Some(path) = reference.strip_prefix("file://") {
                Ok(tokio::fs::read(path).await?)
            } else if let Some(n) = reference.strip_prefix("demo:") {
                let index = n.parse::<u32>().map_err(|_| ArtError::Unsupported(reference.clone()))?;
                demo_cover(index)
            } else if reference.contains("://") {
                Err(ArtError::Unsupported(reference))
            } else {
                Ok(tokio::fs::read(&reference).await?)
            }
        }
    }
}

/// Procedural PNG cover for demo tracks, so demo mode runs the real decode path.
pub fn demo_cover(index: u32) -> Result<Vec<u8>, ArtError> {
    const EDGE: u32 = 96;
    const TINTS: [[u8; 3]; 4] = [[214, 64, 69], [52, 120, 198], [242, 176, 53], [70, 160, 110]];
    let [r, g, b] = TINTS[(index as usize) % TINTS.len()];

    let img = RgbImage::from_fn(EDGE, EDGE, |x, y| {
        let band = ((x + y) / 12) % 2 == 0;
        let shade = |c: u8| if band { c } else { c / 2 + 40 };
        Rgb([shade(r), shade(g), shade(b)])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decode and fit within `max_edge` on its longer side. CPU bound, run off the runtime.
pub fn decode(bytes: &[u8], max_edge: u32) -> Result<ArtImage, ArtError> {
    let mut img = image::load_from_memory(bytes)?;
    if max_edge > 0 && img.width().max(img.height()) > max_edge {
        img = img.resize(max_edge, max_edge, FilterType::Triangle);
    }
    Ok(ArtImage::from_rgb(&img.to_rgb8()))
}

type Landed = (String, Result<ArtImage, ArtError>);

/// Artwork keyed by reference. `get_or_fetch` never blocks: misses spawn a
/// fetch and return `Pending`, results are picked up on later calls.
pub struct ArtCache<S: ArtSource> {
    source: Arc<S>,
    capacity: usize,
    max_edge: u32,
    /// most recently used first
    entries: VecDeque<(String, Arc<ArtImage>)>,
    current: Option<String>,
    failed: Option<String>,
    in_flight: HashMap<String, JoinHandle<()>>,
    landed_tx: mpsc::UnboundedSender<Landed>,
    landed_rx: mpsc::UnboundedReceiver<Landed>,
}

impl<S: ArtSource> ArtCache<S> {
    pub fn new(source: S, capacity: usize, max_edge: u32) -> Self {
        let (landed_tx, landed_rx) = mpsc::unbounded_channel();
        Self {
            source: Arc::new(source),
            capacity: capacity.max(1),
            max_edge,
            entries: VecDeque::new(),
            current: None,
            failed: None,
            in_flight: HashMap::new(),
            landed_tx,
            landed_rx,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == reference)
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Handle for `reference`, starting a fetch on a miss. Must run inside a tokio runtime.
    pub fn get_or_fetch(&mut self, reference: Option<&str>) -> ArtHandle {
        while let Ok((key, result)) = self.landed_rx.try_recv() {
            self.land(key, result);
        }

        // a failure only sticks while its reference stays current
        let Some(key) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            self.current = None;
            self.failed = None;
            return ArtHandle::None;
        };

        if self.current.as_deref() != Some(key) {
            debug!("art: current is now {}", key);
            self.current = Some(key.to_string());
            self.failed = None;
        }

        if let Some(pos) = self.entries.iter().position(|(k, _)| k == key) {
            if let Some(entry) = self.entries.remove(pos) {
                let img = Arc::clone(&entry.1);
                self.entries.push_front(entry);
                return ArtHandle::Ready(img);
            }
        }
        if self.failed.as_deref() == Some(key) {
            return ArtHandle::Failed;
        }
        if !self.in_flight.contains_key(key) {
            self.spawn_fetch(key.to_string());
        }
        ArtHandle::Pending
    }

    fn spawn_fetch(&mut self, key: String) {
        let source = Arc::clone(&self.source);
        let tx = self.landed_tx.clone();
        let max_edge = self.max_edge;
        let reference = key.clone();
        let handle = tokio::spawn(async move {
            let result = match source.load(&reference).await {
                Ok(bytes) => tokio::task::spawn_blocking(move || decode(&bytes, max_edge))
                    .await
                    .unwrap_or_else(|e| Err(ArtError::Worker(e.to_string()))),
                Err(e) => Err(e),
            };
            let _ = tx.send((reference, result));
        });
        self.in_flight.insert(key, handle);
    }

    fn land(&mut self, key: String, result: Result<ArtImage, ArtError>) {
        self.in_flight.remove(&key);
        let is_current = self.current.as_deref() == Some(key.as_str());
        match result {
            Ok(img) => {
                info!("art: {} ready ({}x{})", key, img.width, img.height);
                self.entries.retain(|(k, _)| *k != key);
                let entry = (key, Arc::new(img));
                if is_current || self.entries.is_empty() {
                    self.entries.push_front(entry);
                } else {
                    // superseded: kept for reuse, never promoted over current
                    let at = usize::from(self.current_is_resident());
                    self.entries.insert(at, entry);
                }
                self.evict();
            }
            Err(e) if is_current => {
                warn!("art: {} failed: {}", key, e);
                self.failed = Some(key);
            }
            Err(e) => debug!("art: stale {} failed: {}", key, e),
        }
    }

    fn current_is_resident(&self) -> bool {
        matches!((self.current.as_deref(), self.entries.front()), (Some(c), Some((k, _))) if c == k)
    }

    /// Drop least recently used entries over capacity, the current one is never evicted.
    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            let current = self.current.as_deref();
            match self.entries.iter().rposition(|(k, _)| Some(k.as_str()) != current) {
                Some(pos) => {
                    if let Some((k, _)) = self.entries.remove(pos) {
                        debug!("art: evicted {}", k);
                    }
                }
                None => break,
            }
        }
    }

    /// Wait until every outstanding fetch has landed.
    pub async fn wait_idle(&mut self) {
        while !self.in_flight.is_empty() {
            match self.landed_rx.recv().await {
                Some((key, result)) => self.land(key, result),
                None => break,
            }
        }
    }

    /// Abort outstanding fetches and release decoded covers.
    pub fn shutdown(&mut self) {
        for (key, handle) in self.in_flight.drain() {
            debug!("art: aborting fetch of {}", key);
            handle.abort();
        }
        self.entries.clear();
        self.current = None;
    }
}

impl<S: ArtSource> Drop for ArtCache<S> {
    fn drop(&mut self) {
        for handle in self.in_flight.values() {
            handle.abort();
        }
    }
}
