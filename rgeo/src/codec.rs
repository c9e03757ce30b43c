//! Z-order (Morton) encoding of geographic coordinates.
//!
//! This module maps a latitude/longitude pair onto a single [`SpatialKey`] such
//! that points close together on the globe usually sort close together.
//!
//! # Key Layout
//!
//! Each axis is quantized to 32 bits by linear scaling over its valid range:
//!
//! - Latitude: `[-90, 90)` → `[0, 2^32)`
//! - Longitude: `[-180, 180)` → `[0, 2^32)`
//!
//! The two integers are then bit-interleaved, most significant bits first, with
//! longitude bits in the odd positions and latitude bits in the even positions.
//! Interleaving works one nibble at a time through two 16-entry lookup tables,
//! which keeps `encode` and `decode` exact inverses of each other.
//!
//! Round-trip precision is one quantization unit per axis
//! ([`LAT_QUANTUM`] and [`LON_QUANTUM`] degrees).

use std::fmt;

use crate::error::{Result, RgeoError};

/// 2^32 as a float, the number of quantization steps per axis.
const STEPS: f64 = 4_294_967_296.0;

/// Latitude resolution of a key, in degrees (180 / 2^32).
pub const LAT_QUANTUM: f64 = 180.0 / STEPS;

/// Longitude resolution of a key, in degrees (360 / 2^32).
pub const LON_QUANTUM: f64 = 360.0 / STEPS;

/// Spreads a nibble `abcd` into the byte `0a0b0c0d`.
const INTERLEAVE_BOOST: [u8; 16] = [0, 1, 4, 5, 16, 17, 20, 21, 64, 65, 68, 69, 80, 81, 84, 85];

/// Splits an interleaved nibble `abcd` into `(ac, bd)`, i.e. `(lon_bits, lat_bits)`.
const DEINTERLEAVE_BOOST: [(u32, u32); 16] = [
    (0, 0),
    (0, 1),
    (1, 0),
    (1, 1),
    (0, 2),
    (0, 3),
    (1, 2),
    (1, 3),
    (2, 0),
    (2, 1),
    (3, 0),
    (3, 1),
    (2, 2),
    (2, 3),
    (3, 2),
    (3, 3),
];

/// A 64-bit locality-preserving key for a coordinate.
///
/// Keys order along a Z-order curve. Any `u64` is a valid key; [`SpatialKey::decode`]
/// is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpatialKey(u64);

impl SpatialKey {
    /// The smallest key, corresponding to (-90, -180).
    pub const MIN: SpatialKey = SpatialKey(0);

    /// The largest key.
    pub const MAX: SpatialKey = SpatialKey(u64::MAX);

    /// Wrap a raw interleaved value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw interleaved value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Decode this key back to `(latitude, longitude)` in degrees.
    ///
    /// The result is the south-west corner of the quantization cell the key
    /// names, so it is within one quantum of any coordinate that encodes to it.
    ///
    /// # Examples
    ///
    /// ```
    /// use rgeo::codec::encode;
    ///
    /// let key = encode(48.8566, 2.3522).unwrap();
    /// let (lat, lon) = key.decode();
    /// assert!((lat - 48.8566).abs() < 1e-7);
    /// assert!((lon - 2.3522).abs() < 1e-7);
    /// ```
    pub fn decode(self) -> (f64, f64) {
        let (qlat, qlon) = deinterleave(self.0);
        (
            qlat as f64 / STEPS * 180.0 - 90.0,
            qlon as f64 / STEPS * 360.0 - 180.0,
        )
    }
}

impl From<u64> for SpatialKey {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<SpatialKey> for u64 {
    fn from(key: SpatialKey) -> Self {
        key.0
    }
}

impl fmt::Display for SpatialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Encode a coordinate into a [`SpatialKey`].
///
/// # Arguments
///
/// * `lat` - Latitude in decimal degrees, `-90 <= lat < 90`
/// * `lon` - Longitude in decimal degrees, wrapped into `[-180, 180)`
///
/// # Errors
///
/// - [`RgeoError::LatitudeOutOfRange`] if `lat` is outside `[-90, 90)` or NaN
/// - [`RgeoError::InvalidLongitude`] if `lon` is NaN or infinite
///
/// # Examples
///
/// ```
/// use rgeo::codec::encode;
///
/// // The antimeridian wraps: both sides produce the same key
/// assert_eq!(encode(10.0, 180.0).unwrap(), encode(10.0, -180.0).unwrap());
///
/// assert!(encode(90.0, 0.0).is_err());
/// ```
pub fn encode(lat: f64, lon: f64) -> Result<SpatialKey> {
    if !(-90.0..90.0).contains(&lat) {
        return Err(RgeoError::LatitudeOutOfRange { lat });
    }
    let lon = wrap_longitude(lon)?;

    let qlat = quantize((lat + 90.0) / 180.0);
    let qlon = quantize((lon + 180.0) / 360.0);

    Ok(SpatialKey(interleave(qlat, qlon)))
}

/// Decode a key back to `(latitude, longitude)`. Same as [`SpatialKey::decode`].
pub fn decode(key: SpatialKey) -> (f64, f64) {
    key.decode()
}

/// Normalize a longitude into `[-180, 180)` by adding or subtracting multiples of 360.
///
/// # Errors
///
/// Returns [`RgeoError::InvalidLongitude`] for NaN or infinite input.
///
/// # Examples
///
/// ```
/// use rgeo::codec::wrap_longitude;
///
/// assert_eq!(wrap_longitude(190.0).unwrap(), -170.0);
/// assert_eq!(wrap_longitude(-190.0).unwrap(), 170.0);
/// assert_eq!(wrap_longitude(180.0).unwrap(), -180.0);
/// ```
pub fn wrap_longitude(lon: f64) -> Result<f64> {
    if !lon.is_finite() {
        return Err(RgeoError::InvalidLongitude { lon });
    }
    if (-180.0..180.0).contains(&lon) {
        return Ok(lon);
    }

    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to the modulus for tiny negative inputs
    Ok(if wrapped >= 180.0 { -180.0 } else { wrapped })
}

/// Scale a fraction in `[0, 1)` onto the full `u32` range.
#[inline]
fn quantize(fraction: f64) -> u32 {
    // float-to-int `as` saturates, so a fraction that rounds to 1.0 maps to u32::MAX
    (fraction * STEPS).floor() as u32
}

/// Interleave two 32-bit values, longitude bits odd, latitude bits even.
#[inline]
fn interleave(qlat: u32, qlon: u32) -> u64 {
    (0..8).fold(0u64, |acc, i| {
        let shift = 28 - i * 4;
        let lon_nibble = ((qlon >> shift) & 0xF) as usize;
        let lat_nibble = ((qlat >> shift) & 0xF) as usize;

        (acc << 8)
            | (u64::from(INTERLEAVE_BOOST[lon_nibble]) << 1)
            | u64::from(INTERLEAVE_BOOST[lat_nibble])
    })
}

/// Inverse of [`interleave`], returns `(qlat, qlon)`.
#[inline]
fn deinterleave(key: u64) -> (u32, u32) {
    let mut qlat = 0u32;
    let mut qlon = 0u32;

    for i in 0..16 {
        let shift = 60 - i * 4;
        let (lon_bits, lat_bits) = DEINTERLEAVE_BOOST[((key >> shift) & 0xF) as usize];
        qlat = (qlat << 2) | lat_bits;
        qlon = (qlon << 2) | lon_bits;
    }

    (qlat, qlon)
}
