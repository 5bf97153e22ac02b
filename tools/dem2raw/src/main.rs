//! dem2raw: GeoTIFF → 16-bit RAW heightmap converter and synthetic DEM generator.
//!
//! Usage:
//!   dem2raw convert --input dem.tif [--output dem.raw] [--config tunables.json] [--report report.json]
//!   dem2raw synthetic --output synth.tif --size 513 --padding 12
//!   dem2raw inspect --input dem.raw --width 1025 --min 112.5 --max 1321.5
//!   dem2raw zone --input dem.tif

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glam::DVec2;

use demraw_core::events::{ConsoleSink, LogSink};
use demraw_core::types::{ElevationRange, UtmZone};
use demraw_core::ConvertConfig;
use demraw_terrain::raw::{decode_elevations, read_raw, RawStats};
use demraw_terrain::synthetic::{SyntheticDem, SyntheticGeoref};
use demraw_terrain::{geotiff, Converter};

/// Convert georeferenced elevation rasters into 16-bit RAW heightmaps.
#[derive(Parser)]
#[command(name = "dem2raw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a GeoTIFF into a little-endian 16-bit RAW heightmap.
    Convert {
        /// Input GeoTIFF.
        #[arg(short, long)]
        input: PathBuf,

        /// Output RAW file. Defaults to the input path with a .raw extension.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON file with conversion tunables.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the conversion report as JSON.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Fail when no UTM zone can be resolved for the raster center.
        #[arg(long)]
        require_zone: bool,
    },

    /// Generate a synthetic GeoTIFF DEM for testing.
    Synthetic {
        /// Output GeoTIFF.
        #[arg(short, long, default_value = "synthetic.tif")]
        output: PathBuf,

        /// Raster width in pixels.
        #[arg(short, long, default_value = "256")]
        size: usize,

        /// Raster height in pixels. Defaults to the width.
        #[arg(long)]
        height: Option<usize>,

        /// Random seed for reproducible terrain.
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Lowest terrain elevation in meters.
        #[arg(long, default_value = "100.0")]
        base: f32,

        /// Height of the tallest ridge above the base.
        #[arg(long, default_value = "1200.0")]
        relief: f32,

        /// Width of the zero-filled border band in pixels.
        #[arg(long, default_value = "0")]
        padding: usize,

        /// Number of no-data holes to punch into the terrain.
        #[arg(long, default_value = "0")]
        holes: usize,

        /// Center as "lon,lat" in degrees.
        #[arg(long, default_value = "15.0,52.0", value_parser = parse_lon_lat)]
        center: DVec2,

        /// Georeference in WGS84 degrees instead of UTM meters.
        #[arg(long)]
        geographic: bool,

        /// Pixel size: meters for UTM, degrees with --geographic.
        #[arg(long)]
        pixel_size: Option<f64>,
    },

    /// Decode a RAW heightmap and print elevation statistics.
    Inspect {
        /// Input RAW file.
        #[arg(short, long)]
        input: PathBuf,

        /// Width in pixels.
        #[arg(short, long)]
        width: usize,

        /// Height in pixels. Defaults to the width.
        #[arg(long)]
        height: Option<usize>,

        /// Minimum elevation reported by the conversion.
        #[arg(long, allow_hyphen_values = true)]
        min: f32,

        /// Maximum elevation reported by the conversion.
        #[arg(long, allow_hyphen_values = true)]
        max: f32,

        /// Print statistics as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the UTM EPSG code for the center of a GeoTIFF.
    Zone {
        /// Input GeoTIFF.
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            report,
            require_zone,
        } => cmd_convert(&input, output, config.as_deref(), report.as_deref(), require_zone),
        Commands::Synthetic {
            output,
            size,
            height,
            seed,
            base,
            relief,
            padding,
            holes,
            center,
            geographic,
            pixel_size,
        } => {
            let dem = SyntheticDem::new(size, height.unwrap_or(size))
                .seed(seed)
                .elevation(base, relief)
                .padding(padding)
                .holes(holes);
            let dem = if geographic {
                dem.geographic(center.x, center.y, pixel_size.unwrap_or(0.001))
            } else {
                dem.georef(utm_georef(center, size, height.unwrap_or(size), pixel_size.unwrap_or(30.0)))
            };
            cmd_synthetic(&dem, &output)
        }
        Commands::Inspect {
            input,
            width,
            height,
            min,
            max,
            json,
        } => cmd_inspect(&input, width, height.unwrap_or(width), min, max, json),
        Commands::Zone { input } => cmd_zone(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn parse_lon_lat(s: &str) -> Result<DVec2, String> {
    let (lon, lat) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lon,lat\", got \"{s}\""))?;
    let lon: f64 = lon.trim().parse().map_err(|e| format!("bad longitude: {e}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("bad latitude: {e}"))?;
    Ok(DVec2::new(lon, lat))
}

// --- Convert command ---

fn cmd_convert(
    input: &Path,
    output: Option<PathBuf>,
    config: Option<&Path>,
    report_path: Option<&Path>,
    require_zone: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => ConvertConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConvertConfig::default(),
    };
    let output = output.unwrap_or_else(|| input.with_extension("raw"));

    let converter = Converter::new(config).require_zone(require_zone);
    let mut sink = ConsoleSink::default();
    let Some(report) = converter.try_run(input, &output, &mut sink) else {
        bail!("conversion of {} failed", input.display());
    };

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
        log::info!("report written to {}", path.display());
    }
    Ok(())
}

// --- Synthetic terrain command ---

/// UTM georeference whose center lands on `center` (lon, lat).
fn utm_georef(center: DVec2, cols: usize, rows: usize, pixel_size: f64) -> SyntheticGeoref {
    let zone = UtmZone::from_lon_lat(center.x, center.y);
    // Approximate: place the raster around the zone's central meridian easting.
    let central_meridian = (zone.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
    let easting = 500_000.0
        + (center.x - central_meridian) * 111_320.0 * center.y.to_radians().cos();
    let northing = if center.y >= 0.0 {
        center.y * 110_574.0
    } else {
        10_000_000.0 + center.y * 110_574.0
    };
    let half = DVec2::new(cols as f64, rows as f64) * pixel_size / 2.0;
    SyntheticGeoref::Utm {
        zone,
        origin: DVec2::new(easting - half.x, northing + half.y),
        pixel_size,
    }
}

fn cmd_synthetic(dem: &SyntheticDem, output: &Path) -> Result<()> {
    let raster = dem.build().context("generating synthetic terrain")?;
    eprintln!(
        "Generated {}×{} synthetic terrain ({})",
        raster.width(),
        raster.height(),
        raster.spatial_ref.display_name()
    );
    geotiff::write(&raster, output).with_context(|| format!("writing {}", output.display()))?;
    let file_size = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
    eprintln!("Done! Output: {} ({} bytes)", output.display(), file_size);
    Ok(())
}

// --- Inspect command ---

fn cmd_inspect(input: &Path, width: usize, height: usize, min: f32, max: f32, json: bool) -> Result<()> {
    let Some(range) = ElevationRange::new(min, max) else {
        bail!("--max ({max}) must not be below --min ({min})");
    };
    let values = read_raw(input, width, height)
        .with_context(|| format!("reading {}", input.display()))?;
    let Some(stats) = RawStats::compute(&values, width, height, &range) else {
        bail!("{} is empty", input.display());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let elevations = decode_elevations(&values, &range);
    let center = elevations[(height / 2) * width + width / 2];
    println!("File: {} ({width}x{height})", input.display());
    println!("Raw values: {}..{}", stats.raw_min, stats.raw_max);
    println!(
        "Elevation: {:.2}m..{:.2}m (mean {:.2}m)",
        stats.elevation_min, stats.elevation_max, stats.elevation_mean
    );
    println!("Center elevation: {center:.2}m");
    Ok(())
}

// --- Zone command ---

fn cmd_zone(input: &Path) -> Result<()> {
    let raster = geotiff::open(input).with_context(|| format!("opening {}", input.display()))?;
    let zone = Converter::default().zone(&raster, &mut LogSink::default());
    match zone {
        Some(zone) => {
            if !zone.is_standard() {
                log::warn!("zone {} is outside the standard UTM range 1-60", zone.zone);
            }
            println!("{zone}");
            Ok(())
        }
        None => bail!("could not resolve a UTM zone for {}", input.display()),
    }
}
