//! Region reconstruction tests against the default world layout.
//!
//! Only the tiles a test needs are stored, so the full 21600x10800 raster is
//! never materialized. Tile contents follow `test_utils::sample`, which makes
//! every reconstructed pixel checkable against its global position.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use tile_mosaic::error::MosaicError;
use tile_mosaic::grid::{GridLayout, TileKey, Window};
use tile_mosaic::mosaic::{FetchMode, MosaicService, RegionQuery};
use tile_mosaic::raster::Raster;
use tile_mosaic::store::{ObjectTileStore, TileStore};
use tile_mosaic::tile::TileEncoding;

use super::test_utils::{sample, synthetic_tile, MemoryObjectClient};

async fn world_store(
    client: &MemoryObjectClient,
    tiles: &[(u32, u32)],
) -> Arc<ObjectTileStore<MemoryObjectClient>> {
    let layout = Arc::new(GridLayout::default());
    let store = Arc::new(ObjectTileStore::new(
        client.clone(),
        layout.clone(),
        TileEncoding::Snappy,
    ));
    for &(row, col) in tiles {
        for band in 0..layout.bands().len() {
            let (w, h) = layout.tile_dims(row, col).unwrap();
            let tile = synthetic_tile(layout.tile_origin(row, col), w, h, band);
            store.put(&TileKey::new(row, col, band), &tile).await.unwrap();
        }
    }
    client.reset_tracking();
    store
}

fn assert_window(canvas: &Raster, window: &Window, band: usize) {
    assert_eq!((canvas.width(), canvas.height()), (window.width(), window.height()));
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let gx = window.x0() as u32 + x;
            let gy = window.y0() as u32 + y;
            assert_eq!(canvas.get(x, y), Some(sample(gx, gy, band)), "at ({x}, {y})");
        }
    }
}

#[tokio::test]
async fn test_world_center_spans_two_tiles() {
    let client = MemoryObjectClient::new();
    let store = world_store(&client, &[(13, 26), (13, 27)]).await;
    let service = MosaicService::new(store);

    let query = RegionQuery::new(0.0, 0.0, 0);
    let window = service.window_for(&query);
    assert_eq!((window.x0(), window.y0()), (10600, 5200));
    assert_eq!((window.x1(), window.y1()), (10999, 5599));

    let canvas = service.region(&query).await.unwrap();
    assert_window(&canvas, &window, 0);

    // Left half from column 26, right half from column 27
    assert_eq!(canvas.get(199, 0), Some(sample(10799, 5200, 0)));
    assert_eq!(canvas.get(200, 0), Some(sample(10800, 5200, 0)));
    assert_eq!(client.get_count(), 2);
}

#[tokio::test]
async fn test_four_tile_window() {
    let client = MemoryObjectClient::new();
    let store = world_store(&client, &[(5, 14), (5, 15), (6, 14), (6, 15)]).await;
    let service = MosaicService::new(store);

    // lon -80 -> x 6000, lat 50 -> y 2400: a tile corner
    let query = RegionQuery::new(50.0, -80.0, 1);
    let canvas = service.region(&query).await.unwrap();
    assert_window(&canvas, &service.window_for(&query), 1);
    assert_eq!(client.get_count(), 4);
}

#[tokio::test]
async fn test_fetch_modes_agree() {
    let client = MemoryObjectClient::new();
    let store = world_store(&client, &[(13, 26), (13, 27)]).await;

    let query = RegionQuery::new(0.0, 0.0, 2);
    let sequential = MosaicService::new(store.clone())
        .with_fetch_mode(FetchMode::Sequential)
        .region(&query)
        .await
        .unwrap();
    let parallel = MosaicService::new(store)
        .with_fetch_mode(FetchMode::Parallel)
        .region(&query)
        .await
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[tokio::test]
async fn test_concurrent_regions_share_one_service() {
    let client = MemoryObjectClient::new();
    let store = world_store(&client, &[(13, 26), (13, 27)]).await;
    let service = Arc::new(MosaicService::new(store));

    let mut handles = Vec::new();
    for band in 0..3 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.region(&RegionQuery::new(0.0, 0.0, band)).await
        }));
    }

    let window = Window::centered(10800, 5400, 200);
    for (band, handle) in handles.into_iter().enumerate() {
        let canvas = handle.await.unwrap().unwrap();
        assert_window(&canvas, &window, band);
    }
}

#[tokio::test]
async fn test_deleted_tile_fails_with_its_name() {
    let client = MemoryObjectClient::new();
    let store = world_store(&client, &[(13, 26), (13, 27)]).await;
    client
        .remove("world.topo.bathy.200412.3x400x400.27.13.red")
        .await
        .unwrap();

    let service = MosaicService::new(store);
    match service.region(&RegionQuery::new(0.0, 0.0, 0)).await {
        Err(MosaicError::TileNotFound { key }) => {
            assert_eq!(key, "memory://tiles/world.topo.bathy.200412.3x400x400.27.13.red");
        }
        other => panic!("Expected TileNotFound, got {:?}", other.map(|_| ())),
    }

    // Other bands are unaffected
    assert!(service.region(&RegionQuery::new(0.0, 0.0, 1)).await.is_ok());
}

#[tokio::test]
async fn test_out_of_bounds_makes_no_requests() {
    let client = MemoryObjectClient::new();
    let service = MosaicService::new(world_store(&client, &[]).await);

    // 2 degrees from the north edge: 120px, less than the 200px half-extent
    for (lat, lon) in [(88.0, 0.0), (-88.0, 0.0), (0.0, -178.0), (0.0, 178.0), (91.0, 0.0)] {
        let result = service.region(&RegionQuery::new(lat, lon, 0)).await;
        assert!(
            matches!(result, Err(MosaicError::OutOfBounds { .. })),
            "({lat}, {lon})"
        );
    }
    assert_eq!(client.get_count(), 0);
}

#[tokio::test]
async fn test_edge_window_touching_raster_corner() {
    let layout = GridLayout::default();
    let (rows, cols) = (layout.tile_rows(), layout.tile_cols());
    let client = MemoryObjectClient::new();
    let store = world_store(&client, &[(rows - 1, cols - 1)]).await;
    let service = MosaicService::new(store);

    let window = Window::from_corners(21200, 10400, 21599, 10799).unwrap();
    let canvas = service.composite(&window, 0).await.unwrap();
    assert_window(&canvas, &window, 0);
    assert_eq!(client.get_count(), 1);
}

#[tokio::test]
async fn test_invalid_band_rejected() {
    let client = MemoryObjectClient::new();
    let service = MosaicService::new(world_store(&client, &[]).await);
    let result = service.region(&RegionQuery::new(0.0, 0.0, 3)).await;
    assert!(matches!(
        result,
        Err(MosaicError::InvalidBand { band: 3, bands: 3 })
    ));
}

#[tokio::test]
async fn test_cancellation_discards_in_flight_fetches() {
    let client = MemoryObjectClient::new();
    world_store(&client, &[(13, 26), (13, 27)]).await;
    let slow: Arc<dyn TileStore> = Arc::new(ObjectTileStore::new(
        client.clone().with_get_delay(Duration::from_secs(30)),
        Arc::new(GridLayout::default()),
        TileEncoding::Snappy,
    ));

    let service = MosaicService::new(slow);
    let window = Window::centered(10800, 5400, 200);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = service.composite_cancellable(&window, 0, &cancel).await;
    assert!(matches!(result, Err(MosaicError::Cancelled)));
}

#[tokio::test]
async fn test_timeout_returns_cancelled() {
    let client = MemoryObjectClient::new().with_get_delay(Duration::from_secs(30));
    let service = MosaicService::new(world_store(&client, &[(13, 26), (13, 27)]).await);

    let result = service
        .composite_with_timeout(
            &Window::centered(10800, 5400, 200),
            0,
            Duration::from_millis(20),
        )
        .await;
    assert!(matches!(result, Err(MosaicError::Cancelled)));
}
