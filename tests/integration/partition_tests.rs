//! Partition and reconstruction round-trip tests.
//!
//! Tests verify:
//! - Reconstructing the full raster from its tiles reproduces every band
//! - Arbitrary windows match a direct crop of the source
//! - Both backends and every encoding behave identically
//! - Failed partitions leave earlier tiles in place

use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};

use tile_mosaic::error::{PartitionError, StoreError};
use tile_mosaic::grid::{GridLayout, TileKey, Window};
use tile_mosaic::mosaic::{FetchMode, MosaicService, Partitioner};
use tile_mosaic::raster::{load_png, save_png, split_bands};
use tile_mosaic::store::{LocalTileStore, ObjectTileStore, TileStore};
use tile_mosaic::tile::TileEncoding;

use super::test_utils::{sample, synthetic_band, synthetic_interleaved, MemoryObjectClient};

fn bands() -> Vec<String> {
    vec!["red".to_string(), "green".to_string(), "blue".to_string()]
}

/// 50x30 raster in 8px tiles: the last column is 2px wide and the last row
/// 6px tall.
fn uneven_layout() -> Arc<GridLayout> {
    Arc::new(GridLayout::new("synthetic", 50, 30, 8, bands()).unwrap())
}

fn windows() -> Vec<Window> {
    vec![
        Window::from_corners(0, 0, 0, 0).unwrap(),
        Window::from_corners(7, 7, 8, 8).unwrap(),
        Window::from_corners(3, 5, 44, 21).unwrap(),
        Window::from_corners(48, 24, 49, 29).unwrap(),
        Window::centered(25, 15, 9),
        Window::centered(40, 20, 4),
    ]
}

async fn assert_reconstructs(store: Arc<dyn TileStore>, fetch: FetchMode) {
    let layout = store.layout().clone();
    let service = MosaicService::new(store).with_fetch_mode(fetch);

    for band in 0..layout.bands().len() {
        let source = synthetic_band(layout.width(), layout.height(), band);

        let full = service.composite(&Window::full(&layout), band).await.unwrap();
        assert_eq!(full.to_packed(), source.to_packed(), "band {band} full raster");

        for window in windows() {
            let canvas = service.composite(&window, band).await.unwrap();
            let expected = source
                .crop(
                    window.x0() as u32,
                    window.y0() as u32,
                    window.width(),
                    window.height(),
                )
                .unwrap();
            assert_eq!(
                canvas.to_packed(),
                expected.to_packed(),
                "band {band} window {window:?}"
            );
        }
    }
}

#[tokio::test]
async fn test_local_round_trip_every_encoding() {
    let source = synthetic_interleaved(50, 30, 3);

    for encoding in TileEncoding::ALL {
        let dir = tempfile::tempdir().unwrap();
        let store: Arc<dyn TileStore> =
            Arc::new(LocalTileStore::new(dir.path(), uneven_layout(), encoding));

        let report = Partitioner::new(store.clone())
            .partition_interleaved(&source)
            .await
            .unwrap();
        // 7 cols x 4 rows x 3 bands
        assert_eq!(report.tiles_per_band, 28);
        assert_eq!(report.tiles_written, 84);

        assert_reconstructs(store, FetchMode::Parallel).await;
    }
}

#[tokio::test]
async fn test_object_round_trip_every_encoding() {
    let source = synthetic_interleaved(50, 30, 4);

    for encoding in TileEncoding::ALL {
        let client = MemoryObjectClient::new();
        let store: Arc<dyn TileStore> = Arc::new(ObjectTileStore::new(
            client.clone(),
            uneven_layout(),
            encoding,
        ));

        Partitioner::new(store.clone())
            .with_concurrency(4)
            .partition_interleaved(&source)
            .await
            .unwrap();
        assert_eq!(client.len().await, 84);

        assert_reconstructs(store, FetchMode::Sequential).await;
    }
}

#[tokio::test]
async fn test_partition_to_several_encodings_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let layout = uneven_layout();
    let png: Arc<dyn TileStore> =
        Arc::new(LocalTileStore::new(dir.path(), layout.clone(), TileEncoding::Png));
    let raw: Arc<dyn TileStore> =
        Arc::new(LocalTileStore::new(dir.path(), layout.clone(), TileEncoding::Raw));
    let snappy: Arc<dyn TileStore> =
        Arc::new(LocalTileStore::new(dir.path(), layout.clone(), TileEncoding::Snappy));

    let report = Partitioner::new(png.clone())
        .with_store(raw.clone())
        .with_store(snappy.clone())
        .partition_interleaved(&synthetic_interleaved(50, 30, 3))
        .await
        .unwrap();
    assert_eq!(report.tiles_written, 84 * 3);

    // Side by side in one directory, distinguished by extension
    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 84 * 3);

    let key = TileKey::new(3, 6, 1);
    let a = png.get(&key).await.unwrap();
    let b = raw.get(&key).await.unwrap();
    let c = snappy.get(&key).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!((a.width(), a.height()), (2, 6));
    assert_eq!(a.get(1, 5), Some(sample(49, 29, 1)));
}

#[tokio::test]
async fn test_repartition_is_idempotent() {
    let client = MemoryObjectClient::new();
    let store: Arc<dyn TileStore> = Arc::new(ObjectTileStore::new(
        client.clone(),
        uneven_layout(),
        TileEncoding::Deflate,
    ));
    let partitioner = Partitioner::new(store);
    let source = synthetic_interleaved(50, 30, 3);

    partitioner.partition_interleaved(&source).await.unwrap();
    let first = client.snapshot().await;

    partitioner.partition_interleaved(&source).await.unwrap();
    assert_eq!(client.snapshot().await, first);
}

#[tokio::test]
async fn test_failed_partition_keeps_written_tiles() {
    let client = MemoryObjectClient::new().failing_after(10);
    let store: Arc<dyn TileStore> = Arc::new(ObjectTileStore::new(
        client.clone(),
        uneven_layout(),
        TileEncoding::Raw,
    ));

    let result = Partitioner::new(store.clone())
        .with_concurrency(2)
        .partition_interleaved(&synthetic_interleaved(50, 30, 3))
        .await;

    assert!(matches!(
        result,
        Err(PartitionError::Store(StoreError::Write { .. }))
    ));
    assert_eq!(client.len().await, 10);

    // Whatever was written is intact
    for key in client.keys().await {
        assert!(key.starts_with("synthetic.3x8x8."));
    }
}

#[tokio::test]
async fn test_source_size_must_match_layout() {
    let store: Arc<dyn TileStore> = Arc::new(ObjectTileStore::new(
        MemoryObjectClient::new(),
        uneven_layout(),
        TileEncoding::Raw,
    ));
    let result = Partitioner::new(store)
        .partition_interleaved(&synthetic_interleaved(49, 30, 3))
        .await;
    assert!(matches!(
        result,
        Err(PartitionError::DimensionMismatch {
            width: 50,
            actual_width: 49,
            ..
        })
    ));
}

#[tokio::test]
async fn test_png_source_to_png_canvas() {
    let dir = tempfile::tempdir().unwrap();

    // RGB source image on disk
    let source_path = dir.path().join("source.png");
    RgbImage::from_fn(50, 30, |x, y| {
        Rgb([sample(x, y, 0), sample(x, y, 1), sample(x, y, 2)])
    })
    .save_with_format(&source_path, ImageFormat::Png)
    .unwrap();

    let source = load_png(&source_path).unwrap();
    assert_eq!(source.channels(), 3);

    let store: Arc<dyn TileStore> = Arc::new(LocalTileStore::new(
        dir.path().join("tiles"),
        uneven_layout(),
        TileEncoding::Png,
    ));
    Partitioner::new(store.clone())
        .partition_interleaved(&source)
        .await
        .unwrap();

    let window = Window::centered(30, 14, 10);
    let canvas = MosaicService::new(store)
        .composite(&window, 2)
        .await
        .unwrap();

    let out_path = dir.path().join("region.png");
    save_png(&canvas, &out_path).unwrap();

    let reloaded = load_png(&out_path).unwrap();
    assert_eq!(reloaded.channels(), 1);
    let reloaded = split_bands(&reloaded, 1).unwrap().remove(0);
    assert_eq!(reloaded.to_packed(), canvas.to_packed());
    assert_eq!(reloaded.get(0, 0), Some(sample(20, 4, 2)));
    assert_eq!(reloaded.get(19, 19), Some(sample(39, 23, 2)));
}
