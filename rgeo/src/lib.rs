//! # rgeo - Offline Reverse Geocoding
//!
//! Fast, dependency-light library that maps a latitude/longitude to the nearest
//! known place (country, region, city, postal code) from a local gazetteer.
//!
//! ## Features
//!
//! - **Fast**: Lookups are a binary search plus a small candidate scan
//! - **Offline**: Works with local per-country CSV files, no internet required
//! - **Hot Reload**: [`GeocodeService`] swaps in new data without blocking readers
//! - **GeoJSON**: Optional `geojson` feature locates every position of a geometry
//!
//! ## Quick Start
//!
//! ```ignore
//! use rgeo::GeocodeServiceBuilder;
//!
//! let service = GeocodeServiceBuilder::new("/data/places").build()?;
//!
//! if let Some(found) = service.locate(40.7128, -74.0060)? {
//!     println!("{} ({}), {:.1} km away", found.place.city, found.place.country, found.distance_km);
//! }
//! ```
//!
//! ## How Lookups Work
//!
//! Every place is stored under a 64-bit Z-order key: latitude and longitude are
//! each quantized to 32 bits and their bits interleaved, longitude in the odd
//! positions and latitude in the even ones. Points that are near each other on
//! the globe usually get keys that are near each other in sorted order.
//!
//! A lookup encodes the query point, binary-searches the sorted key list for its
//! insertion position, and measures the great-circle distance to a small window
//! of neighboring keys. The closest one wins if it is within the distance
//! threshold. This is approximate: the curve has jumps, so the true nearest
//! place can fall outside the window near large bit boundaries.
//!
//! ## Data Format
//!
//! A data directory holds one `<COUNTRY>.csv` (or `<COUNTRY>.csv.zip`) file per
//! country, each line being `postal,latitude,longitude,city,region`:
//!
//! ```text
//! 10001,40.7506,-73.9972,New York City,New York
//! ```
//!
//! ## Data Sources
//!
//! Postal code dumps in this shape can be derived from:
//! - <https://download.geonames.org/export/zip/>

pub mod codec;
pub mod distance;
pub mod error;
pub mod filename;
pub mod gazetteer;
pub mod index;
pub mod loader;
pub mod locator;
pub mod service;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use codec::{decode, encode, wrap_longitude, SpatialKey};
pub use error::{Result, RgeoError};
pub use gazetteer::{Gazetteer, GazetteerBuilder, Insertion, PlaceRecord};
pub use loader::{load_directory, LoadStats};
pub use locator::{locate, LocateOptions, PlaceMatch, DEFAULT_MAX_DISTANCE_KM, DEFAULT_WINDOW_SIZE};
pub use service::{GeocodeService, GeocodeServiceBuilder, LookupStats};
