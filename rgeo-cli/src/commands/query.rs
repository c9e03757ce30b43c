use anyhow::{Context, Result};
use rgeo::PlaceMatch;
use serde::Serialize;

use super::ServiceArgs;

#[derive(Serialize)]
struct PlaceResponse {
    country: String,
    region: String,
    city: String,
    postal_code: String,
    distance_km: f64,
}

#[derive(Serialize)]
struct QueryResponse {
    lat: f64,
    lon: f64,
    place: Option<PlaceResponse>,
}

impl From<&PlaceMatch> for PlaceResponse {
    fn from(found: &PlaceMatch) -> Self {
        Self {
            country: found.place.country.clone(),
            region: found.place.region.clone(),
            city: found.place.city.clone(),
            postal_code: found.place.postal_code.clone(),
            distance_km: found.distance_km,
        }
    }
}

pub fn run(args: &ServiceArgs, lat: f64, lon: f64, json: bool) -> Result<()> {
    let service = args.build_service()?;

    let found = service
        .locate(lat, lon)
        .context("Failed to locate coordinate")?;

    if json {
        let response = QueryResponse {
            lat,
            lon,
            place: found.as_ref().map(PlaceResponse::from),
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        println!("{}", format_match(found.as_ref()));
    }

    Ok(())
}

fn format_match(found: Option<&PlaceMatch>) -> String {
    match found {
        Some(found) => format!(
            "{}, {}, {} {} ({:.2} km)",
            found.place.city,
            found.place.region,
            found.place.country,
            found.place.postal_code,
            found.distance_km
        ),
        None => "no match".to_string(),
    }
}
