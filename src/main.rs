use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use findmyroute::api::OverpassProvider;
use findmyroute::config::{DEFAULT_ZOOM, FileConfig, default_tags};
use findmyroute::domain::{NetworkType, PoiCategory, TagFilter};
use findmyroute::geometry::BoundingBox;
use findmyroute::pipeline::{Pipeline, resolve, resolve_bounds};
use findmyroute::render::{GeoJsonRenderer, MapRenderer};

/// Download a street network and points of interest for a place and export
/// them as a GeoJSON map centred on the data
///
/// Examples:
///   # Walking network and default POIs for Salzburg
///   findmyroute "Salzburg, Austria"
///
///   # Drive network, cafes and museums only
///   findmyroute "Vienna, Austria" -n drive -t amenity=cafe -t tourism=museum
///
///   # Bounding box around coordinates instead of a place name
///   findmyroute --lat 47.7981 --lon 13.0465 -r 1500 -o old_town.geojson
#[derive(Parser, Debug)]
#[command(name = "findmyroute")]
#[command(version, about, long_about = None)]
struct Args {
    /// Place name (e.g. "Salzburg, Austria") or "south,west,north,east"
    place: Option<String>,

    /// Path to config file (optional, auto-searches findmyroute.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Street network type
    #[arg(short = 'n', long, value_enum)]
    network: Option<NetworkType>,

    /// POI filter as key=value1,value2 or a bare key; repeatable
    #[arg(short = 't', long = "tag")]
    tags: Vec<String>,

    /// Latitude of the area centre (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the area centre (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Radius around --lat/--lon in meters
    #[arg(short = 'r', long, default_value = "2000")]
    radius: u32,

    /// Initial map zoom level
    #[arg(short = 'z', long, value_parser = clap::value_parser!(u8).range(0..=20))]
    zoom: Option<u8>,

    /// Output GeoJSON path (defaults to {place}.geojson or map.geojson)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let file_config = match args.config {
        Some(ref config_path) => {
            if !config_path.exists() {
                bail!("Config file not found: {:?}", config_path);
            }
            Some(FileConfig::from_path(config_path)?)
        }
        None => FileConfig::load(),
    };

    let file_verbose = file_config.as_ref().is_some_and(|c| c.verbose);
    setup_logging(args.verbose.max(u8::from(file_verbose)));

    let place_name = args
        .place
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.place.clone()));
    let network = args
        .network
        .or_else(|| file_config.as_ref().map(|c| c.network))
        .unwrap_or_default();
    let zoom = args
        .zoom
        .or_else(|| file_config.as_ref().map(|c| c.zoom))
        .unwrap_or(DEFAULT_ZOOM);
    let output = args
        .output
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.output.clone()));
    let provider_config = file_config
        .as_ref()
        .and_then(|c| c.provider.clone())
        .unwrap_or_default();

    let tags = if !args.tags.is_empty() {
        parse_tag_args(&args.tags)?
    } else {
        file_config
            .as_ref()
            .and_then(FileConfig::tag_filter)
            .unwrap_or_else(default_tags)
    };

    let place = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => {
            let bbox = BoundingBox::around((lat, lon), args.radius)
                .context("Coordinates are outside the valid latitude/longitude range")?;
            resolve_bounds(bbox)
        }
        _ => {
            let Some(name) = place_name else {
                bail!("Must provide a place name, or --lat and --lon");
            };
            resolve(&name)?
        }
    };

    let output_path = output.unwrap_or_else(|| {
        if args.lat.is_some() {
            PathBuf::from("map.geojson")
        } else {
            PathBuf::from(format!("{}.geojson", slug(place.identifier())))
        }
    });

    println!("findmyroute - Street Network & POI Map");
    println!("======================================");
    println!();
    tracing::info!(
        place = %place,
        %network,
        zoom,
        output = %output_path.display(),
        mirrors = provider_config.overpass_urls.len(),
        "configuration"
    );

    let provider =
        OverpassProvider::new(provider_config).context("Failed to create HTTP client")?;
    let pipeline = Pipeline::new(provider);

    let spinner = create_spinner(&format!(
        "Downloading {} network and points of interest for {}...",
        network, place
    ));
    let start = Instant::now();
    let plan = pipeline.plan(place, network, &tags);
    spinner.finish_and_clear();
    let plan = plan.context("Failed to build map")?;

    println!(
        "Street network: {} nodes, {} edges [{:.1}s]",
        plan.graph.node_count(),
        plan.graph.edge_count(),
        start.elapsed().as_secs_f32()
    );
    match &plan.feature_error {
        Some(e) => println!("Points of interest: unavailable ({})", error_chain(e)),
        None => println!("Points of interest: {}", plan.features.len()),
    }
    print_category_counts(&plan.features);
    println!("Map centre: {} from {} points", plan.centroid, plan.centroid.count);

    let spinner = create_spinner("Writing GeoJSON...");
    let artifact = GeoJsonRenderer::pretty()
        .render(&plan.graph, &plan.features, &plan.centroid, zoom)
        .context("Failed to render map")?;
    std::fs::write(&output_path, &artifact.content)
        .with_context(|| format!("Failed to write map file: {}", output_path.display()))?;
    spinner.finish_with_message(format!(
        "Wrote {:.1} KB to {}",
        artifact.content.len() as f64 / 1024.0,
        output_path.display()
    ));

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn parse_tag_args(entries: &[String]) -> Result<TagFilter> {
    let mut tags = TagFilter::new();
    for entry in entries {
        let (key, values) = TagFilter::parse_entry(entry)
            .with_context(|| format!("Invalid --tag '{}', expected key=value1,value2", entry))?;
        tags.insert(key, values);
    }
    Ok(tags)
}

fn print_category_counts(features: &findmyroute::domain::FeatureCollection) {
    let categories = [
        PoiCategory::Attraction,
        PoiCategory::Cafe,
        PoiCategory::Park,
        PoiCategory::Other,
    ];
    for category in categories {
        let count = features
            .iter()
            .filter(|f| f.display_category() == category)
            .count();
        if count > 0 {
            println!("  {:<11} {}", category.as_str(), count);
        }
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn slug(identifier: &str) -> String {
    let slug: String = identifier
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let parts: Vec<&str> = slug.split('_').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        "map".to_string()
    } else {
        parts.join("_")
    }
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("findmyroute={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("Salzburg, Austria"), "salzburg_austria");
        assert_eq!(slug("  "), "map");
    }

    #[test]
    fn test_parse_tag_args() {
        let tags =
            parse_tag_args(&["amenity=cafe".to_string(), "amenity=bar".to_string()]).unwrap();
        let (key, values) = tags.iter().next().unwrap();
        assert_eq!(key, "amenity");
        assert_eq!(values.len(), 2);

        assert!(parse_tag_args(&["=cafe".to_string()]).is_err());
    }
}
