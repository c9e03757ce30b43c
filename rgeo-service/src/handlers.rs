//! HTTP request handlers for the geocoding service.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use geojson::Geometry;
use rgeo::{geojson::locate_geometry, PlaceMatch, RgeoError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::AppState;

/// Query parameters for the locate endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LocateQuery {
    /// Latitude in decimal degrees (-90 <= lat < 90).
    pub lat: f64,
    /// Longitude in decimal degrees. Values outside [-180, 180) are wrapped.
    pub lon: f64,
    /// Override the number of neighboring keys examined.
    pub window_size: Option<usize>,
    /// Override the match threshold in kilometers.
    pub max_distance_km: Option<f64>,
}

/// Nearest place found for a coordinate.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceResponse {
    /// Latitude queried.
    pub lat: f64,
    /// Longitude queried.
    pub lon: f64,
    /// Country tag of the reference file.
    pub country: String,
    /// State, province, or other region.
    pub region: String,
    /// City or locality.
    pub city: String,
    /// Postal code.
    pub postal_code: String,
    /// Great-circle distance to the place in kilometers.
    pub distance_km: f64,
    /// Latitude of the place in the reference data.
    pub place_latitude: f64,
    /// Longitude of the place in the reference data.
    pub place_longitude: f64,
    /// Spatial key of the place (hexadecimal).
    pub key: String,
}

impl PlaceResponse {
    fn new(lat: f64, lon: f64, found: PlaceMatch) -> Self {
        Self {
            lat,
            lon,
            key: found.key.to_string(),
            distance_km: found.distance_km,
            place_latitude: found.place.latitude,
            place_longitude: found.place.longitude,
            country: found.place.country,
            region: found.place.region,
            city: found.place.city,
            postal_code: found.place.postal_code,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Number of places loaded.
    pub places: usize,
}

/// Lookup statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of places loaded.
    pub places: usize,
    /// Total lookups.
    pub queries: u64,
    /// Lookups that found a place.
    pub matches: u64,
    /// Lookups with no place within the threshold.
    pub no_matches: u64,
    /// Lookups rejected as invalid.
    pub errors: u64,
    /// Match rate (0.0 to 1.0).
    pub match_rate: f64,
    /// Candidate window size.
    pub window_size: usize,
    /// Match threshold in kilometers, `null` when unlimited.
    pub max_distance_km: Option<f64>,
}

/// Result of a data reload.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReloadResponse {
    /// Number of places now loaded.
    pub places: usize,
    /// Reference files read.
    pub files_read: usize,
    /// Lines that were rejected.
    pub records_skipped: usize,
    /// Records replaced by a later record with the same key.
    pub records_overwritten: usize,
    /// Time taken in milliseconds.
    pub elapsed_ms: u64,
}

/// Find the place nearest to a coordinate.
///
/// # Returns
///
/// - `200 OK` with the place on success
/// - `400 Bad Request` if the coordinate or options are invalid
/// - `404 Not Found` if no place is within the distance threshold
/// - `503 Service Unavailable` if no reference data is loaded
#[utoipa::path(
    get,
    path = "/locate",
    tag = "geocoding",
    params(LocateQuery),
    responses(
        (status = 200, description = "Nearest place", body = PlaceResponse),
        (status = 400, description = "Invalid coordinate or options", body = ErrorResponse),
        (status = 404, description = "No place within the distance threshold", body = ErrorResponse),
        (status = 503, description = "No reference data loaded", body = ErrorResponse)
    )
)]
pub async fn get_locate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LocateQuery>,
) -> impl IntoResponse {
    tracing::debug!(
        lat = query.lat,
        lon = query.lon,
        window_size = ?query.window_size,
        max_distance_km = ?query.max_distance_km,
        "Locate query"
    );

    let service = &state.geocode_service;
    let result = if query.window_size.is_some() || query.max_distance_km.is_some() {
        let options = service.options();
        service.locate_with(
            query.lat,
            query.lon,
            query.window_size.unwrap_or(options.window_size),
            query.max_distance_km.or(options.max_distance_km),
        )
    } else {
        service.locate(query.lat, query.lon)
    };

    match result {
        Ok(Some(found)) => {
            tracing::info!(
                lat = query.lat,
                lon = query.lon,
                country = %found.place.country,
                city = %found.place.city,
                distance_km = found.distance_km,
                "Place found"
            );
            (
                StatusCode::OK,
                Json(PlaceResponse::new(query.lat, query.lon, found)),
            )
                .into_response()
        }
        Ok(None) if service.gazetteer().is_empty() => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "No reference data loaded".to_string(),
            }),
        )
            .into_response(),
        Ok(None) => {
            tracing::info!(lat = query.lat, lon = query.lon, "No place found");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!(
                        "No place found near ({}, {}) within the distance threshold",
                        query.lat, query.lon
                    ),
                }),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Locate every position of a GeoJSON geometry.
///
/// Returns a FeatureCollection with one Point feature per input position.
/// Features with no nearby place have `null` properties.
#[utoipa::path(
    post,
    path = "/locate",
    tag = "geocoding",
    request_body(content = Object, description = "GeoJSON geometry", content_type = "application/json"),
    responses(
        (status = 200, description = "FeatureCollection of located points", body = Object),
        (status = 400, description = "Invalid position in geometry", body = ErrorResponse)
    )
)]
pub async fn post_locate(
    State(state): State<Arc<AppState>>,
    Json(geometry): Json<Geometry>,
) -> impl IntoResponse {
    match locate_geometry(&state.geocode_service, geometry) {
        Ok(collection) => {
            tracing::info!(points = collection.features.len(), "Geometry located");
            (StatusCode::OK, Json(collection)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Map a library error onto a status code and JSON body.
fn error_response(e: RgeoError) -> axum::response::Response {
    let status = match &e {
        RgeoError::LatitudeOutOfRange { .. }
        | RgeoError::InvalidLongitude { .. }
        | RgeoError::InvalidWindowSize { .. }
        | RgeoError::InvalidMaxDistance { .. }
        | RgeoError::InvalidCoordinate { .. } => StatusCode::BAD_REQUEST,
        RgeoError::DataDirNotFound { .. } => StatusCode::NOT_FOUND,
        RgeoError::MissingDataDir => StatusCode::SERVICE_UNAVAILABLE,
        RgeoError::Io(_) | RgeoError::Archive { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    tracing::warn!(error = %e, status = status.as_u16(), "Request failed");

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// Health check endpoint.
///
/// Returns service status and version.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        places: state.geocode_service.gazetteer().len(),
    })
}

/// Get lookup statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses((status = 200, description = "Lookup statistics", body = StatsResponse))
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let service = &state.geocode_service;
    let stats = service.stats();
    let options = service.options();

    Json(StatsResponse {
        places: stats.places,
        queries: stats.queries,
        matches: stats.matches,
        no_matches: stats.no_matches,
        errors: stats.errors,
        match_rate: stats.match_rate(),
        window_size: options.window_size,
        max_distance_km: options.max_distance_km,
    })
}

/// Reload reference data from the data directory.
///
/// Lookups continue against the current data while the new data is built.
/// On failure the current data stays in place.
#[utoipa::path(
    post,
    path = "/reload",
    tag = "system",
    responses(
        (status = 200, description = "Data reloaded", body = ReloadResponse),
        (status = 404, description = "Data directory not found", body = ErrorResponse),
        (status = 500, description = "A reference file could not be read", body = ErrorResponse),
        (status = 503, description = "No data directory configured", body = ErrorResponse)
    )
)]
pub async fn post_reload(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || worker_state.geocode_service.reload()).await;

    match result {
        Ok(Ok(stats)) => (
            StatusCode::OK,
            Json(ReloadResponse {
                places: state.geocode_service.gazetteer().len(),
                files_read: stats.files_read,
                records_skipped: stats.records_skipped,
                records_overwritten: stats.records_overwritten,
                elapsed_ms: stats.elapsed_ms,
            }),
        )
            .into_response(),
        Ok(Err(e)) => error_response(e),
        Err(e) => {
            tracing::error!(error = %e, "Reload task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Reload task failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rgeo::{Gazetteer, LocateOptions, PlaceRecord};

    #[test]
    fn test_locate_query_deserialize() {
        let json = r#"{"lat": 35.5, "lon": 138.7}"#;
        let query: LocateQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.lat, 35.5);
        assert_eq!(query.lon, 138.7);
        assert!(query.window_size.is_none());
        assert!(query.max_distance_km.is_none());
    }

    #[test]
    fn test_place_response_serialize() {
        let record = PlaceRecord {
            country: "JP".to_string(),
            region: "Tokyo".to_string(),
            city: "Chiyoda".to_string(),
            postal_code: "100-0001".to_string(),
            latitude: 35.6852,
            longitude: 139.7528,
        };
        let gazetteer: Gazetteer = vec![(35.6852, 139.7528, record)].into_iter().collect();
        let found = gazetteer
            .locate(35.68, 139.75, 10, None)
            .unwrap()
            .unwrap();

        let response = PlaceResponse::new(35.68, 139.75, found);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("Chiyoda"));
        assert!(json.contains("100-0001"));
        assert_eq!(response.key.len(), 16);
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (RgeoError::LatitudeOutOfRange { lat: 91.0 }, StatusCode::BAD_REQUEST),
            (RgeoError::InvalidWindowSize { size: 0 }, StatusCode::BAD_REQUEST),
            (
                RgeoError::InvalidCoordinate {
                    message: "short".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (RgeoError::MissingDataDir, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (error, status) in cases {
            assert_eq!(error_response(error).status(), status);
        }
    }

    #[test]
    fn test_health_response_serialize() {
        let response = HealthResponse {
            status: "healthy".to_string(),
            version: "0.1.0".to_string(),
            places: 0,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    fn state_with(gazetteer: Gazetteer) -> Arc<AppState> {
        Arc::new(AppState {
            geocode_service: rgeo::GeocodeService::from_gazetteer(
                gazetteer,
                LocateOptions::default(),
            ),
        })
    }

    #[tokio::test]
    async fn test_get_stats_counts_lookups() {
        let record = PlaceRecord {
            country: "JP".to_string(),
            region: "Tokyo".to_string(),
            city: "Chiyoda".to_string(),
            postal_code: "100-0001".to_string(),
            latitude: 35.6852,
            longitude: 139.7528,
        };
        let state = state_with(vec![(35.6852, 139.7528, record)].into_iter().collect());
        state.geocode_service.locate(35.68, 139.75).unwrap();
        state.geocode_service.locate(0.0, 0.0).unwrap();

        let Json(stats) = get_stats(State(state)).await;
        assert_eq!(stats.places, 1);
        assert_eq!(stats.queries, 2);
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.no_matches, 1);
        assert_eq!(stats.match_rate, 0.5);
        assert_eq!(stats.window_size, 10);
        assert_eq!(stats.max_distance_km, Some(50.0));
    }

    #[tokio::test]
    async fn test_get_locate_validates_before_empty_check() {
        let state = state_with(Gazetteer::empty());

        let query = LocateQuery {
            lat: 91.0,
            lon: 0.0,
            window_size: None,
            max_distance_km: None,
        };
        let response = get_locate(State(Arc::clone(&state)), Query(query))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let query = LocateQuery {
            lat: 10.0,
            lon: 0.0,
            window_size: None,
            max_distance_km: None,
        };
        let response = get_locate(State(state), Query(query)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
