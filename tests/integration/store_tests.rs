//! Tile store integration tests.
//!
//! Tests verify:
//! - Tile names on disk and in object storage follow the dataset convention
//! - Stores opened from a StoreConfig behave like directly built ones
//! - Corrupt or mis-encoded payloads surface as decode errors

use std::sync::Arc;

use bytes::Bytes;

use tile_mosaic::error::{CodecError, MosaicError, StoreError};
use tile_mosaic::grid::{GridLayout, TileKey, Window};
use tile_mosaic::io::ObjectClient;
use tile_mosaic::mosaic::MosaicService;
use tile_mosaic::store::{open_store, LocalTileStore, ObjectTileStore, StoreConfig, TileStore};
use tile_mosaic::tile::TileEncoding;

use super::test_utils::{synthetic_tile, MemoryObjectClient};

fn world() -> Arc<GridLayout> {
    Arc::new(GridLayout::default())
}

#[tokio::test]
async fn test_local_file_names() {
    let dir = tempfile::tempdir().unwrap();
    let layout = world();
    let tile = synthetic_tile(layout.tile_origin(13, 27), 400, 400, 0);

    let expected = [
        (TileEncoding::Png, "world.topo.bathy.200412.3x400x400.27.13.red.png"),
        (TileEncoding::Raw, "world.topo.bathy.200412.3x400x400.27.13.red.raw"),
        (TileEncoding::Deflate, "world.topo.bathy.200412.3x400x400.27.13.red.flt"),
        (TileEncoding::Snappy, "world.topo.bathy.200412.3x400x400.27.13.red.snpy"),
        (TileEncoding::Gzip, "world.topo.bathy.200412.3x400x400.27.13.red.gzip"),
        (TileEncoding::Lzw, "world.topo.bathy.200412.3x400x400.27.13.red.lzw"),
        (TileEncoding::Lz4, "world.topo.bathy.200412.3x400x400.27.13.red.lz4"),
    ];

    for (encoding, name) in expected {
        let store = LocalTileStore::new(dir.path(), layout.clone(), encoding);
        store.put(&TileKey::new(13, 27, 0), &tile).await.unwrap();
        assert!(dir.path().join(name).is_file(), "{name}");
    }
}

#[tokio::test]
async fn test_object_keys_have_no_extension() {
    let client = MemoryObjectClient::new();
    let layout = world();
    let store = ObjectTileStore::new(client.clone(), layout.clone(), TileEncoding::Png);

    for band in 0..3 {
        let tile = synthetic_tile(layout.tile_origin(0, 5), 400, 400, band);
        store.put(&TileKey::new(0, 5, band), &tile).await.unwrap();
    }

    assert_eq!(
        client.keys().await,
        vec![
            "world.topo.bathy.200412.3x400x400.05.00.blue",
            "world.topo.bathy.200412.3x400x400.05.00.green",
            "world.topo.bathy.200412.3x400x400.05.00.red",
        ]
    );
    assert_eq!(client.put_count(), 3);
}

#[tokio::test]
async fn test_source_band_count_in_names() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Arc::new(
        GridLayout::new(
            "rgba.scene",
            16,
            16,
            8,
            vec!["red".to_string(), "green".to_string(), "blue".to_string()],
        )
        .unwrap()
        .with_source_bands(4)
        .unwrap(),
    );
    let store = LocalTileStore::new(dir.path(), layout, TileEncoding::Raw);
    assert_eq!(
        store.path(&TileKey::new(1, 0, 2)),
        dir.path().join("rgba.scene.4x8x8.00.01.blue.raw")
    );
}

#[tokio::test]
async fn test_open_local_store() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("tiles").display().to_string();
    let config = StoreConfig::local(base, TileEncoding::Deflate);

    let store = open_store(&config, world()).await;
    assert_eq!(store.encoding(), TileEncoding::Deflate);

    let key = TileKey::new(26, 53, 1);
    let tile = synthetic_tile(store.layout().tile_origin(26, 53), 400, 400, 1);
    store.put(&key, &tile).await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), tile);
    assert!(store
        .location(&key)
        .ends_with("world.topo.bathy.200412.3x400x400.53.26.green.flt"));
}

#[tokio::test]
async fn test_mis_encoded_payload_fails_reconstruction() {
    let client = MemoryObjectClient::new();
    let layout = world();

    // A raw payload where a Snappy one is expected
    let raw_store = ObjectTileStore::new(client.clone(), layout.clone(), TileEncoding::Raw);
    for col in [26, 27] {
        let tile = synthetic_tile(layout.tile_origin(13, col), 400, 400, 0);
        raw_store.put(&TileKey::new(13, col, 0), &tile).await.unwrap();
    }

    let snappy_store: Arc<dyn TileStore> =
        Arc::new(ObjectTileStore::new(client, layout, TileEncoding::Snappy));
    let result = MosaicService::new(snappy_store)
        .composite(&Window::centered(10800, 5400, 200), 0)
        .await;
    assert!(matches!(result, Err(MosaicError::Decode { .. })));
}

#[tokio::test]
async fn test_truncated_object_is_size_mismatch() {
    let client = MemoryObjectClient::new();
    client
        .put_object(
            "world.topo.bathy.200412.3x400x400.00.00.red",
            Bytes::from(vec![0u8; 1000]),
        )
        .await
        .unwrap();

    let store = ObjectTileStore::new(client, world(), TileEncoding::Raw);
    let result = store.get(&TileKey::new(0, 0, 0)).await;
    assert!(matches!(
        result,
        Err(StoreError::Decode {
            source: CodecError::SizeMismatch {
                expected: 160_000,
                actual: 1000
            },
            ..
        })
    ));
}

#[tokio::test]
async fn test_key_outside_grid_is_not_found() {
    let client = MemoryObjectClient::new();
    let store = ObjectTileStore::new(client.clone(), world(), TileEncoding::Raw);
    let result = store.get(&TileKey::new(27, 0, 0)).await;
    assert!(matches!(result, Err(StoreError::NotFound { .. })));
}
