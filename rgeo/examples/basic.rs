//! Basic example demonstrating rgeo library usage.
//!
//! Run with: cargo run --example basic -- /path/to/place/files

use rgeo::{GeocodeServiceBuilder, RgeoError};
use std::env;

fn main() -> Result<(), RgeoError> {
    // Get data directory from command line
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/place/files");
        std::process::exit(1);
    });

    // Look at 20 neighboring keys and accept matches up to 25 km away
    let service = GeocodeServiceBuilder::new(&data_dir)
        .window_size(20)
        .max_distance_km(25.0)
        .build()?;

    if let Some(load) = service.last_load() {
        println!(
            "Loaded {} places from {} files in {}ms ({} lines skipped)",
            service.stats().places,
            load.files_read,
            load.elapsed_ms,
            load.records_skipped
        );
    }

    let locations = [
        ("Empire State Building", 40.7484, -73.9857),
        ("Tokyo Tower", 35.6586, 139.7454),
        ("Middle of the Atlantic", 30.0, -40.0),
    ];

    println!("Reverse geocoding:");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        match service.locate(*lat, *lon) {
            Ok(Some(found)) => {
                println!(
                    "{}: {}, {}, {} {} ({:.2} km)",
                    name,
                    found.place.city,
                    found.place.region,
                    found.place.country,
                    found.place.postal_code,
                    found.distance_km
                );
            }
            Ok(None) => {
                println!("{}: no place within 25 km", name);
            }
            Err(e) => {
                println!("{}: error - {}", name, e);
            }
        }
    }

    let stats = service.stats();
    println!("\nLookup statistics:");
    println!("  Queries: {}", stats.queries);
    println!("  Matches: {}", stats.matches);
    println!("  No match: {}", stats.no_matches);
    println!("  Match rate: {:.1}%", stats.match_rate() * 100.0);

    Ok(())
}
