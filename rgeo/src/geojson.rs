//! GeoJSON reverse geocoding.
//!
//! This module turns GeoJSON geometries into located point features.
//! Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use rgeo::GeocodeServiceBuilder;
//! use rgeo::geojson::locate_geometry;
//! use geojson::Geometry;
//!
//! let service = GeocodeServiceBuilder::new("/data/places").build()?;
//!
//! let geometry: Geometry = r#"{"type": "Point", "coordinates": [-73.9972, 40.7506]}"#
//!     .parse()
//!     .unwrap();
//!
//! let located = locate_geometry(&service, geometry)?;
//! // One Point feature with {"country": "US", "city": "New York City", ...}
//! ```

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};
use serde_json::Value as JsonValue;

use crate::error::{Result, RgeoError};
use crate::locator::PlaceMatch;
use crate::service::GeocodeService;

/// Build the GeoJSON property object describing a match.
///
/// Keys: `country`, `region`, `city`, `postal_code`, `distance_km`,
/// `place_latitude`, `place_longitude`, and `key` (hexadecimal spatial key).
pub fn place_properties(found: &PlaceMatch) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("country".into(), found.place.country.clone().into());
    properties.insert("region".into(), found.place.region.clone().into());
    properties.insert("city".into(), found.place.city.clone().into());
    properties.insert("postal_code".into(), found.place.postal_code.clone().into());
    properties.insert("distance_km".into(), found.distance_km.into());
    properties.insert("place_latitude".into(), found.place.latitude.into());
    properties.insert("place_longitude".into(), found.place.longitude.into());
    properties.insert("key".into(), JsonValue::String(found.key.to_string()));
    properties
}

/// Build a Point feature for a located position.
///
/// `lat`/`lon` are the query coordinates. Properties are `None` when nothing
/// was found, which serializes as `"properties": null`.
pub fn match_feature(lat: f64, lon: f64, found: Option<&PlaceMatch>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(GeoJsonValue::Point(vec![lon, lat]))),
        id: None,
        properties: found.map(place_properties),
        foreign_members: None,
    }
}

/// Locate every position of a GeoJSON geometry.
///
/// Each position, in document order, becomes one Point feature. The input
/// coordinates are in GeoJSON order: `[longitude, latitude, ...]`.
///
/// Supported geometry types:
/// - Point
/// - MultiPoint
/// - LineString
/// - MultiLineString
/// - Polygon
/// - MultiPolygon
/// - GeometryCollection
///
/// # Errors
///
/// Returns an error if:
/// - A position has fewer than 2 elements
/// - A latitude is out of range or a longitude is not finite
pub fn locate_geometry(service: &GeocodeService, geometry: Geometry) -> Result<FeatureCollection> {
    let features = geometry_positions(&geometry)?
        .into_iter()
        .map(|(lat, lon)| {
            let found = service.locate(lat, lon)?;
            Ok(match_feature(lat, lon, found.as_ref()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Collect every position of a geometry as `(lat, lon)` pairs.
///
/// # Errors
///
/// Returns [`RgeoError::InvalidCoordinate`] for a position with fewer than 2 elements.
pub fn geometry_positions(geometry: &Geometry) -> Result<Vec<(f64, f64)>> {
    let mut positions = Vec::new();
    collect_positions(&geometry.value, &mut positions)?;
    Ok(positions)
}

fn collect_positions(value: &GeoJsonValue, out: &mut Vec<(f64, f64)>) -> Result<()> {
    match value {
        GeoJsonValue::Point(coord) => out.push(position(coord)?),
        GeoJsonValue::MultiPoint(coords) | GeoJsonValue::LineString(coords) => {
            for coord in coords {
                out.push(position(coord)?);
            }
        }
        GeoJsonValue::MultiLineString(lines) | GeoJsonValue::Polygon(lines) => {
            for coord in lines.iter().flatten() {
                out.push(position(coord)?);
            }
        }
        GeoJsonValue::MultiPolygon(polygons) => {
            for coord in polygons.iter().flatten().flatten() {
                out.push(position(coord)?);
            }
        }
        GeoJsonValue::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_positions(&geometry.value, out)?;
            }
        }
    }
    Ok(())
}

/// Convert a `[lon, lat, ...]` position to `(lat, lon)`.
fn position(coord: &[f64]) -> Result<(f64, f64)> {
    match coord {
        [lon, lat, ..] => Ok((*lat, *lon)),
        _ => Err(RgeoError::InvalidCoordinate {
            message: "Coordinate must have at least 2 elements (lon, lat)".to_string(),
        }),
    }
}
