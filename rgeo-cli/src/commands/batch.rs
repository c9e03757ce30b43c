use anyhow::{bail, Context, Result};
use geojson::{GeoJson, Value};
use indicatif::{ProgressBar, ProgressStyle};
use rgeo::geojson::{locate_geometry, place_properties};
use rgeo::GeocodeService;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::ServiceArgs;

/// Columns appended to every CSV row.
const PLACE_COLUMNS: [&str; 5] = ["country", "region", "city", "postal_code", "distance_km"];

pub fn run(
    args: &ServiceArgs,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let service = args.build_service()?;

    // Detect file format
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let output_path = match extension.as_str() {
        "csv" => {
            let output_path = output.unwrap_or_else(|| output_path_for(&input, "csv"));
            process_csv(&service, &input, &output_path, &lat_col, &lon_col)?;
            output_path
        }
        "geojson" | "json" => {
            let output_path = output.unwrap_or_else(|| output_path_for(&input, "geojson"));
            process_geojson(&service, &input, &output_path)?;
            output_path
        }
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    };

    let stats = service.stats();
    println!(
        "Located {} of {} coordinates ({:.1}%)",
        stats.matches,
        stats.queries,
        stats.match_rate() * 100.0
    );
    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn output_path_for(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_places.{}", stem, extension))
}

fn progress_bar(len: u64) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn process_csv(
    service: &GeocodeService,
    input: &Path,
    output_path: &Path,
    lat_col: &str,
    lon_col: &str,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    // Find column indices
    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    // Collect records for progress bar
    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
    let pb = progress_bar(records.len() as u64)?;

    let output_file = File::create(output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.extend(PLACE_COLUMNS);
    writer.write_record(&new_headers)?;

    for (row, record) in records.iter().enumerate() {
        let lat: f64 = record
            .get(lat_idx)
            .context("Missing latitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid latitude on row {}", row + 1))?;
        let lon: f64 = record
            .get(lon_idx)
            .context("Missing longitude")?
            .trim()
            .parse()
            .with_context(|| format!("Invalid longitude on row {}", row + 1))?;

        // Out-of-range coordinates get empty place columns, like no match
        let place_fields = match service.locate(lat, lon).ok().flatten() {
            Some(found) => [
                found.place.country,
                found.place.region,
                found.place.city,
                found.place.postal_code,
                format!("{:.3}", found.distance_km),
            ],
            None => Default::default(),
        };

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.extend(place_fields.iter().map(String::as_str));
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;
    Ok(())
}

fn process_geojson(service: &GeocodeService, input: &Path, output_path: &Path) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let reader = BufReader::new(file);

    let geojson: GeoJson = serde_json::from_reader(reader).context("Failed to parse GeoJSON")?;

    let result = match geojson {
        GeoJson::Geometry(geometry) => {
            let located = locate_geometry(service, geometry).context("Failed to locate geometry")?;
            GeoJson::FeatureCollection(located)
        }
        GeoJson::Feature(mut feature) => {
            locate_feature(service, &mut feature);
            GeoJson::Feature(feature)
        }
        GeoJson::FeatureCollection(mut fc) => {
            let pb = progress_bar(fc.features.len() as u64)?;
            for feature in &mut fc.features {
                locate_feature(service, feature);
                pb.inc(1);
            }
            pb.finish_with_message("done");
            GeoJson::FeatureCollection(fc)
        }
    };

    let output_file = File::create(output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;
    Ok(())
}

/// Merge the matched place into a Point feature's properties.
///
/// Features with other geometry types are left unchanged.
fn locate_feature(service: &GeocodeService, feature: &mut geojson::Feature) {
    let position = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coord)) if coord.len() >= 2 => (coord[1], coord[0]),
        _ => return,
    };

    if let Some(found) = service.locate(position.0, position.1).ok().flatten() {
        feature
            .properties
            .get_or_insert_with(Default::default)
            .extend(place_properties(&found));
    }
}
