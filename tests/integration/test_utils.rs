//! Test utilities for integration tests.
//!
//! This module provides an in-memory object client with request tracking and
//! helpers for building deterministic synthetic rasters.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use tile_mosaic::error::IoError;
use tile_mosaic::io::ObjectClient;
use tile_mosaic::raster::{InterleavedRaster, Raster};

// =============================================================================
// In-Memory Object Client with Request Tracking
// =============================================================================

/// An object client backed by a shared in-memory map.
///
/// Clones share objects and counters, so a test can keep a handle after
/// moving a clone into a store.
#[derive(Clone, Default)]
pub struct MemoryObjectClient {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
    gets: Arc<AtomicUsize>,
    puts: Arc<AtomicUsize>,
    get_delay: Option<Duration>,
    fail_puts_after: Option<usize>,
}

impl MemoryObjectClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every get by `delay`.
    pub fn with_get_delay(mut self, delay: Duration) -> Self {
        self.get_delay = Some(delay);
        self
    }

    /// Fail every put once `n` objects have been stored.
    pub fn failing_after(mut self, n: usize) -> Self {
        self.fail_puts_after = Some(n);
        self
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn reset_tracking(&self) {
        self.gets.store(0, Ordering::SeqCst);
        self.puts.store(0, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn remove(&self, key: &str) -> Option<Bytes> {
        self.objects.write().await.remove(key)
    }

    pub async fn snapshot(&self) -> HashMap<String, Bytes> {
        self.objects.read().await.clone()
    }
}

#[async_trait]
impl ObjectClient for MemoryObjectClient {
    async fn get_object(&self, key: &str) -> Result<Bytes, IoError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.get_delay {
            tokio::time::sleep(delay).await;
        }
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| IoError::NotFound(format!("memory://{}", key)))
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), IoError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.write().await;
        if self.fail_puts_after.is_some_and(|n| objects.len() >= n) {
            return Err(IoError::Connection("connection reset by peer".to_string()));
        }
        objects.insert(key.to_string(), body);
        Ok(())
    }

    fn identifier(&self) -> &str {
        "memory://tiles"
    }
}

// =============================================================================
// Synthetic Rasters
// =============================================================================

/// Sample value at global pixel `(x, y)` of `band`.
///
/// Mixes both coordinates so that any misplaced or transposed fragment shows
/// up as a mismatch.
pub fn sample(x: u32, y: u32, band: usize) -> u8 {
    let v = x
        .wrapping_mul(31)
        .wrapping_add(y.wrapping_mul(17))
        .wrapping_add((x / 7) ^ (y / 5))
        .wrapping_add(band as u32 * 97);
    (v % 251) as u8
}

/// Full-size band raster filled with [`sample`].
pub fn synthetic_band(width: u32, height: u32, band: usize) -> Raster {
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(sample(x, y, band));
        }
    }
    Raster::from_vec(width, height, data).unwrap()
}

/// Interleaved raster whose channel `c` equals `synthetic_band(.., c)`.
pub fn synthetic_interleaved(width: u32, height: u32, channels: usize) -> InterleavedRaster {
    let mut data = Vec::with_capacity((width * height) as usize * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                data.push(sample(x, y, c));
            }
        }
    }
    InterleavedRaster::new(width, height, channels, data).unwrap()
}

/// Tile-sized raster holding the [`sample`] values of the tile at `origin`.
pub fn synthetic_tile(origin: (u32, u32), width: u32, height: u32, band: usize) -> Raster {
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            data.push(sample(origin.0 + x, origin.1 + y, band));
        }
    }
    Raster::from_vec(width, height, data).unwrap()
}
