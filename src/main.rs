//! tile-mosaic - Partition large rasters into tiles and reconstruct windows.
//!
//! This binary wires the CLI to the library's partitioner, compositor and
//! codec comparison.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_mosaic::{
    compare_encodings,
    config::{
        Cli, Command, CompareConfig, ExtractConfig, OutputFormat, PartitionConfig, RegionConfig,
    },
    grid::resolve,
    open_store,
    raster::{load_png, save_png},
    split_bands, CoordinateMapper, GridLayout, MosaicService, Partitioner, RegionQuery, Window,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.into_command();
    init_logging(command.verbose());

    let result = match command {
        Command::Partition(config) => run_partition(config).await,
        Command::Region(config) => run_region(config).await,
        Command::Extract(config) => run_extract(config),
        Command::Compare(config) => run_compare(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_mosaic=debug"
    } else {
        "tile_mosaic=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn print_report<T: Serialize>(report: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Partition Command
// =============================================================================

async fn run_partition(config: PartitionConfig) -> Result<(), String> {
    config.validate()?;
    let layout = Arc::new(config.grid.to_layout().map_err(|e| e.to_string())?);

    info!("Configuration:");
    info!("  Dataset: {}", layout.dataset());
    info!(
        "  Grid: {}x{} in {}px tiles ({} per band)",
        layout.width(),
        layout.height(),
        layout.tile_size(),
        layout.tiles_per_band()
    );
    info!("  Bands: {}", layout.bands().join(", "));
    info!("  Store: {:?} at {}", config.store.backend, config.store.base());

    let source = load_png(&config.input).map_err(|e| format!("{}: {}", config.input.display(), e))?;
    if source.width() != layout.width() || source.height() != layout.height() {
        return Err(format!(
            "Source image is {}x{}, grid expects {}x{}",
            source.width(),
            source.height(),
            layout.width(),
            layout.height()
        ));
    }

    let mut encodings = config.encodings().into_iter();
    let Some(primary) = encodings.next() else {
        return Err("No tile encoding selected".to_string());
    };
    let mut partitioner = Partitioner::new(
        open_store(&config.store.to_store_config_with(primary), layout.clone()).await,
    )
    .with_concurrency(config.concurrency);
    for encoding in encodings {
        partitioner = partitioner.with_store(
            open_store(&config.store.to_store_config_with(encoding), layout.clone()).await,
        );
    }

    let report = partitioner
        .partition_interleaved(&source)
        .await
        .map_err(|e| e.to_string())?;

    match config.format {
        OutputFormat::Json => print_report(&report)?,
        OutputFormat::Text => {
            println!("Dataset:       {}", report.dataset);
            println!("Tiles/band:    {}", report.tiles_per_band);
            println!("Tiles written: {}", report.tiles_written);
            println!(
                "Encodings:     {}",
                report
                    .encodings
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("Elapsed:       {:.2?}", report.elapsed);
        }
    }

    Ok(())
}

// =============================================================================
// Region Command
// =============================================================================

async fn run_region(config: RegionConfig) -> Result<(), String> {
    config.validate()?;
    let layout = Arc::new(config.grid.to_layout().map_err(|e| e.to_string())?);
    let band = config.grid.band_index(&config.point.band)?;

    let store = open_store(&config.store.to_store_config(), layout).await;
    let service = MosaicService::new(store)
        .with_fetch_mode(config.fetch)
        .with_rounding(config.point.rounding);

    let query = RegionQuery::with_half_extent(
        config.point.lat,
        config.point.lon,
        band,
        config.point.half_extent,
    );
    let window = service.window_for(&query);
    info!(
        "Reconstructing ({}, {}) -> ({}, {}) of band {}",
        window.x0(),
        window.y0(),
        window.x1(),
        window.y1(),
        config.point.band
    );

    let canvas = match config.timeout_ms {
        Some(ms) => {
            service
                .composite_with_timeout(&window, band, Duration::from_millis(ms))
                .await
        }
        None => service.composite(&window, band).await,
    }
    .map_err(|e| e.to_string())?;

    save_png(&canvas, &config.output)
        .map_err(|e| format!("{}: {}", config.output.display(), e))?;
    info!("Wrote {}", config.output.display());

    Ok(())
}

// =============================================================================
// Extract Command
// =============================================================================

fn run_extract(config: ExtractConfig) -> Result<(), String> {
    config.validate()?;
    let layout = config.grid.to_layout().map_err(|e| e.to_string())?;
    let band = config.grid.band_index(&config.point.band)?;

    let source = load_png(&config.input).map_err(|e| format!("{}: {}", config.input.display(), e))?;
    if source.width() != layout.width() || source.height() != layout.height() {
        return Err(format!(
            "Source image is {}x{}, grid expects {}x{}",
            source.width(),
            source.height(),
            layout.width(),
            layout.height()
        ));
    }

    let window = point_window(&layout, &config);
    resolve(&layout, &window).map_err(|e| e.to_string())?;

    let bands = split_bands(&source, band + 1).map_err(|e| e.to_string())?;
    let crop = bands[band]
        .crop(
            window.x0() as u32,
            window.y0() as u32,
            window.width(),
            window.height(),
        )
        .map_err(|e| e.to_string())?;

    save_png(&crop, &config.output).map_err(|e| format!("{}: {}", config.output.display(), e))?;
    info!("Wrote {}", config.output.display());

    Ok(())
}

fn point_window(layout: &GridLayout, config: &ExtractConfig) -> Window {
    let mapper = CoordinateMapper::new(layout).with_rounding(config.point.rounding);
    let (x, y) = mapper.to_global_pixel(config.point.lat, config.point.lon);
    Window::centered(x, y, config.point.half_extent)
}

// =============================================================================
// Compare Command
// =============================================================================

fn run_compare(config: CompareConfig) -> Result<(), String> {
    let source = load_png(&config.input).map_err(|e| format!("{}: {}", config.input.display(), e))?;
    let bands = split_bands(&source, config.channel + 1).map_err(|e| e.to_string())?;
    let band = &bands[config.channel];

    let reports = compare_encodings(band, &config.encodings()).map_err(|e| e.to_string())?;

    match config.format {
        OutputFormat::Json => print_report(&reports)?,
        OutputFormat::Text => {
            println!(
                "{}x{} channel {} ({} bytes)",
                band.width(),
                band.height(),
                config.channel,
                band.len()
            );
            println!();
            println!(
                "{:<18} {:>12} {:>8} {:>12} {:>12}",
                "encoding", "bytes", "ratio", "encode", "decode"
            );
            for r in &reports {
                println!(
                    "{:<18} {:>12} {:>8.3} {:>12.2?} {:>12.2?}",
                    r.encoding.to_string(),
                    r.payload_bytes,
                    r.ratio,
                    r.encode_time,
                    r.decode_time
                );
            }
        }
    }

    Ok(())
}
