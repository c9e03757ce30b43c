use anyhow::{Context, Result};
use rgeo::distance::distance_km;
use rgeo::{encode, Gazetteer, GeocodeService};
use std::io::{self, Write};

use super::ServiceArgs;

pub fn run(args: &ServiceArgs, lat: Option<f64>, lon: Option<f64>) -> Result<()> {
    let service = args.build_service()?;
    let gazetteer = service.gazetteer();
    let mut out = io::stdout().lock();

    print_summary(&mut out, args, &service, &gazetteer)?;

    if let (Some(lat), Some(lon)) = (lat, lon) {
        writeln!(out)?;
        print_search(&mut out, &service, &gazetteer, lat, lon)?;
    }

    Ok(())
}

fn print_summary(
    out: &mut impl Write,
    args: &ServiceArgs,
    service: &GeocodeService,
    gazetteer: &Gazetteer,
) -> Result<()> {
    let options = service.options();

    writeln!(out, "Data directory: {}", args.data_dir()?.display())?;
    if let Some(load) = service.last_load() {
        writeln!(
            out,
            "Loaded: {} files in {}ms ({} lines skipped, {} overwritten)",
            load.files_read, load.elapsed_ms, load.records_skipped, load.records_overwritten
        )?;
    }
    writeln!(out, "Places: {}", gazetteer.len())?;
    writeln!(out, "Window size: {}", options.window_size)?;
    match options.max_distance_km {
        Some(km) => writeln!(out, "Max distance: {} km", km)?,
        None => writeln!(out, "Max distance: unlimited")?,
    }

    if let (Some(first), Some(last)) = (gazetteer.index().first(), gazetteer.index().last()) {
        writeln!(out, "Key range: {} to {}", first, last)?;
    }

    let counts = gazetteer.country_counts();
    if !counts.is_empty() {
        writeln!(out)?;
        writeln!(out, "{:<10} {:>10}", "COUNTRY", "PLACES")?;
        writeln!(out, "{}", "-".repeat(21))?;
        for (country, count) in &counts {
            writeln!(out, "{:<10} {:>10}", country, count)?;
        }
    }

    Ok(())
}

/// Show every step of a lookup: key, insertion point, window, and candidates.
fn print_search(
    out: &mut impl Write,
    service: &GeocodeService,
    gazetteer: &Gazetteer,
    lat: f64,
    lon: f64,
) -> Result<()> {
    let options = service.options();
    let key = encode(lat, lon).context("Invalid coordinate")?;
    let (key_lat, key_lon) = key.decode();

    let index = gazetteer.index();
    let position = index.lower_bound(key);
    let window = index.window(position, options.window_size);

    writeln!(out, "Query: {}, {}", lat, lon)?;
    writeln!(out, "Key: {}", key)?;
    writeln!(out, "Key cell: {:.7}, {:.7}", key_lat, key_lon)?;
    writeln!(out, "Insertion point: {} of {}", position, index.len())?;
    writeln!(out, "Window: [{}, {})", window.start, window.end)?;
    writeln!(out)?;

    writeln!(
        out,
        "{:>8} {:<18} {:>12} {:<30}",
        "POSITION", "KEY", "DISTANCE", "PLACE"
    )?;
    writeln!(out, "{}", "-".repeat(71))?;
    for i in window {
        let Some(candidate) = index.get(i) else {
            continue;
        };
        let (cand_lat, cand_lon) = candidate.decode();
        let place = gazetteer
            .get(candidate)
            .map(|p| format!("{}, {}, {}", p.city, p.region, p.country))
            .unwrap_or_default();
        writeln!(
            out,
            "{:>8} {:<18} {:>9.2} km {:<30}",
            i,
            candidate,
            distance_km(lat, lon, cand_lat, cand_lon),
            place
        )?;
    }

    writeln!(out)?;
    match service.locate(lat, lon)? {
        Some(found) => writeln!(
            out,
            "Match: {}, {}, {} {} ({:.2} km)",
            found.place.city,
            found.place.region,
            found.place.country,
            found.place.postal_code,
            found.distance_km
        )?,
        None => writeln!(out, "Match: none")?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::{args, data_dir};

    fn search_output(args: &ServiceArgs, lat: f64, lon: f64) -> String {
        let service = args.build_service().unwrap();
        let gazetteer = service.gazetteer();
        let mut out = Vec::new();
        print_search(&mut out, &service, &gazetteer, lat, lon).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_print_summary() {
        let dir = data_dir();
        let args = args(&dir);
        let service = args.build_service().unwrap();
        let gazetteer = service.gazetteer();

        let mut out = Vec::new();
        print_summary(&mut out, &args, &service, &gazetteer).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Places: 2"));
        assert!(text.contains("Window size: 10"));
        assert!(text.contains("Max distance: 50 km"));
        assert!(text.contains("Loaded: 1 files"));
        assert!(text.lines().any(|l| l.starts_with("US") && l.ends_with('2')));
    }

    #[test]
    fn test_print_search_small_dataset_uses_whole_window() {
        let dir = data_dir();
        let text = search_output(&args(&dir), 40.75, -74.0);

        assert!(text.contains("Window: [0, 2)"));
        assert!(text.contains("New York City, New York, US"));
        assert!(text.contains("Beverly Hills, California, US"));
        assert!(text.contains("Match: New York City, New York, US 10001"));
    }

    #[test]
    fn test_print_search_window_truncated_at_edge() {
        let dir = data_dir();
        let mut args = args(&dir);
        args.window_size = 2;

        // Far south-west of both places: the query sorts first and the window keeps one key
        let text = search_output(&args, -80.0, -170.0);
        assert!(text.contains("Insertion point: 0 of 2"));
        assert!(text.contains("Window: [0, 1)"));
        assert!(text.contains("Match: none"));
    }

    #[test]
    fn test_print_search_invalid_coordinate() {
        let dir = data_dir();
        let args = args(&dir);
        let service = args.build_service().unwrap();
        let gazetteer = service.gazetteer();

        let result = print_search(&mut Vec::new(), &service, &gazetteer, 95.0, 0.0);
        assert!(result.is_err());
    }
}
