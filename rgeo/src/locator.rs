//! Approximate nearest-place search.
//!
//! A lookup encodes the query point, finds its insertion position in the sorted
//! key index, and scores a fixed-size window of neighboring keys by great-circle
//! distance. Cost is O(log n + window) instead of a full scan.
//!
//! # Accuracy
//!
//! The Z-order curve jumps at high-order bit boundaries, so two points that are
//! close on the globe can be far apart in key order. The window can therefore
//! miss the true nearest place near such a boundary. A larger `window_size`
//! raises recall at the cost of more distance evaluations.

use crate::codec::{encode, SpatialKey};
use crate::distance::great_circle_angle;
use crate::distance::EARTH_RADIUS_KM;
use crate::error::{Result, RgeoError};
use crate::gazetteer::{Gazetteer, PlaceRecord};

/// Default number of candidate keys examined per lookup.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Default distance threshold in kilometers.
pub const DEFAULT_MAX_DISTANCE_KM: f64 = 50.0;

/// Search parameters for a lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocateOptions {
    /// Number of keys around the insertion point to score. Must be at least 1.
    pub window_size: usize,
    /// Reject the best candidate if it is farther than this. `None` disables the check.
    pub max_distance_km: Option<f64>,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_distance_km: Some(DEFAULT_MAX_DISTANCE_KM),
        }
    }
}

impl LocateOptions {
    /// Options with the given window and threshold.
    pub fn new(window_size: usize, max_distance_km: Option<f64>) -> Self {
        Self {
            window_size,
            max_distance_km,
        }
    }

    /// Check that the options describe a usable search.
    ///
    /// # Errors
    ///
    /// - [`RgeoError::InvalidWindowSize`] if `window_size` is 0
    /// - [`RgeoError::InvalidMaxDistance`] if the threshold is negative or NaN
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(RgeoError::InvalidWindowSize {
                size: self.window_size,
            });
        }
        if let Some(km) = self.max_distance_km {
            if km.is_nan() || km < 0.0 {
                return Err(RgeoError::InvalidMaxDistance { km });
            }
        }
        Ok(())
    }
}

/// The best place found for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceMatch {
    /// The matched record.
    pub place: PlaceRecord,
    /// Key the record is stored under.
    pub key: SpatialKey,
    /// Latitude decoded from `key`.
    pub latitude: f64,
    /// Longitude decoded from `key`.
    pub longitude: f64,
    /// Great-circle distance from the query point to the decoded key position.
    pub distance_km: f64,
}

/// Find the nearest place to `(lat, lon)` among the candidate window.
///
/// # Returns
///
/// - `Ok(Some(match))` - the closest candidate, within the threshold if one is set
/// - `Ok(None)` - empty gazetteer, or the closest candidate is beyond the threshold
///
/// # Errors
///
/// - Configuration errors from [`LocateOptions::validate`], checked first
/// - [`RgeoError::LatitudeOutOfRange`] / [`RgeoError::InvalidLongitude`] for the query
///
/// # Examples
///
/// ```
/// use rgeo::{locate, Gazetteer, LocateOptions, PlaceRecord};
///
/// let mut builder = Gazetteer::builder();
/// builder.insert(40.0, -75.0, PlaceRecord {
///     country: "US".into(),
///     region: "PA".into(),
///     city: "Philadelphia".into(),
///     postal_code: "19019".into(),
///     latitude: 40.0,
///     longitude: -75.0,
/// }).unwrap();
/// let gazetteer = builder.finalize();
///
/// let options = LocateOptions::default();
/// let found = locate(&gazetteer, 40.01, -75.01, &options).unwrap();
/// assert_eq!(found.unwrap().place.city, "Philadelphia");
///
/// // Far from everything
/// assert!(locate(&gazetteer, 0.0, 0.0, &options).unwrap().is_none());
/// ```
pub fn locate(
    gazetteer: &Gazetteer,
    lat: f64,
    lon: f64,
    options: &LocateOptions,
) -> Result<Option<PlaceMatch>> {
    options.validate()?;
    let query = encode(lat, lon)?;

    let index = gazetteer.index();
    let center = index.lower_bound(query);

    let mut best: Option<(SpatialKey, f64, f64, f64)> = None;
    for position in index.window(center, options.window_size) {
        let Some(key) = index.get(position) else {
            continue;
        };
        let (key_lat, key_lon) = key.decode();
        let angle = great_circle_angle(lat, lon, key_lat, key_lon);

        if best.map_or(true, |(_, _, _, best_angle)| angle < best_angle) {
            best = Some((key, key_lat, key_lon, angle));
        }
    }

    let Some((key, key_lat, key_lon, angle)) = best else {
        return Ok(None);
    };

    let distance_km = angle * EARTH_RADIUS_KM;
    if let Some(max) = options.max_distance_km {
        if distance_km > max {
            return Ok(None);
        }
    }

    Ok(gazetteer.get(key).map(|place| PlaceMatch {
        place: place.clone(),
        key,
        latitude: key_lat,
        longitude: key_lon,
        distance_km,
    }))
}

impl Gazetteer {
    /// Convenience wrapper around [`locate`] with inline options.
    pub fn locate(
        &self,
        lat: f64,
        lon: f64,
        window_size: usize,
        max_distance_km: Option<f64>,
    ) -> Result<Option<PlaceMatch>> {
        locate(
            self,
            lat,
            lon,
            &LocateOptions::new(window_size, max_distance_km),
        )
    }
}
