use chrono::NaiveDate;
use clap::Parser;
use kml_cable::convert::soil_summary;
use kml_cable::geometry::CableGeometry;
use kml_cable::store::DEFAULT_SLOT;
use kml_cable::{CableProperties, Conversion, Converter, FeatureStore, FileStore};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use walkdir::WalkDir;

/// Convert KML cable routes to GeoJSON.
#[derive(Parser)]
#[command(version)]
struct Cli {
    /// KML file, or a directory searched recursively for .kml files.
    /// A .geojson/.json file is re-classified as an existing feature collection.
    input: PathBuf,
    /// Output file (single input only). Defaults to the input with a
    /// .geojson extension.
    output: Option<PathBuf>,
    /// Also persist each result in this directory.
    #[arg(long)]
    store: Option<PathBuf>,
    /// Install date written to every feature (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Cli::parse();
    let converter = args.date.map(Converter::new).unwrap_or_else(Converter::today);
    let mut store = args.store.as_ref().map(FileStore::new);

    if args.input.is_dir() {
        if args.output.is_some() {
            log::warn!("output path is ignored for directory input");
        }
        let mut failures = 0;
        for path in kml_files(&args.input) {
            let slot = format!(
                "{}-{}",
                DEFAULT_SLOT,
                path.file_stem().unwrap_or_default().to_string_lossy()
            );
            let output = default_output(&path);
            if let Err(e) = convert_file(&converter, &path, &output, store.as_mut(), &slot) {
                eprintln!("{}: {}", path.display(), e);
                failures += 1;
            }
        }
        if failures > 0 {
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output(&args.input));
    match convert_file(&converter, &args.input, &output, store.as_mut(), DEFAULT_SLOT) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn is_geojson(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("geojson") || e.eq_ignore_ascii_case("json"))
}

fn kml_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("kml"))
        })
        .collect()
}

fn default_output(input: &Path) -> PathBuf {
    if is_geojson(input) {
        input.with_extension("cables.geojson")
    } else {
        input.with_extension("geojson")
    }
}

fn convert_file(
    converter: &Converter,
    input: &Path,
    output: &Path,
    store: Option<&mut FileStore>,
    slot: &str,
) -> kml_cable::Result<()> {
    let content = std::fs::read_to_string(input)?;
    let conversion = if is_geojson(input) {
        converter.convert_geojson(&content)?
    } else {
        converter.convert(&content)?
    };
    std::fs::write(output, serde_json::to_string_pretty(&conversion.collection)?)?;
    print_summary(&conversion);
    println!(
        "Wrote {} features to {}",
        conversion.len(),
        output.display()
    );
    if let Some(store) = store {
        store.put(slot, &conversion.collection)?;
        println!("Stored as {:?} in {}", slot, store.path(slot).display());
    }
    Ok(())
}

fn print_summary(conversion: &Conversion) {
    for (i, feature) in conversion.collection.features.iter().enumerate() {
        let points = feature
            .geometry
            .as_ref()
            .and_then(CableGeometry::from_geojson)
            .map_or(0, |g| g.point_count());
        match CableProperties::from_feature(feature) {
            Some(p) => println!(
                "{:>4}. {} ({} points, {}, {:.1} m)",
                i + 1,
                p.name,
                points,
                p.soil_type,
                p.total_distance
            ),
            None => println!("{:>4}. ? ({} points)", i + 1, points),
        }
    }
    if conversion.skipped > 0 {
        log::info!("{} placemarks skipped", conversion.skipped);
    }
    let soils: Vec<String> = soil_summary(&conversion.collection)
        .iter()
        .map(|(soil, n)| format!("{} {}", soil, n))
        .collect();
    if !soils.is_empty() {
        println!("soil: {}", soils.join(", "));
    }
    println!("total: {:.1} m", conversion.total_distance);
}
