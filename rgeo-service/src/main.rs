//! rgeo Service - HTTP microservice for offline reverse geocoding.
//!
//! A REST API mapping coordinates to the nearest place in local reference data.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RGEO_DATA_DIR` | Directory containing `<COUNTRY>.csv` files | Required |
//! | `RGEO_WINDOW_SIZE` | Candidate keys examined per lookup | 10 |
//! | `RGEO_MAX_DISTANCE_KM` | Match threshold in km, `none` to disable | 50 |
//! | `RGEO_PORT` | HTTP server port | 8080 |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `GET /locate?lat=X&lon=Y` - Nearest place to a coordinate
//! - `POST /locate` - Locate every position of a GeoJSON geometry
//! - `POST /reload` - Reload reference data from disk
//! - `GET /health` - Health check
//! - `GET /stats` - Lookup statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use rgeo::{GeocodeServiceBuilder, RgeoError};
use rgeo_service::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rgeo_service=info,rgeo=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port: u16 = std::env::var("RGEO_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    // The library reads RGEO_DATA_DIR, RGEO_WINDOW_SIZE and RGEO_MAX_DISTANCE_KM
    let builder = match GeocodeServiceBuilder::from_env() {
        Ok(builder) => builder,
        Err(RgeoError::MissingDataDir) => {
            tracing::warn!("RGEO_DATA_DIR not set, using current directory");
            GeocodeServiceBuilder::new(".")
        }
        Err(e) => return Err(e.into()),
    };
    let geocode_service = builder.build()?;

    let options = geocode_service.options();
    tracing::info!(
        data_dir = ?geocode_service.data_dir(),
        places = geocode_service.gazetteer().len(),
        window_size = options.window_size,
        max_distance_km = ?options.max_distance_km,
        port = port,
        "Starting rgeo service"
    );

    let app = rgeo_service::router(Arc::new(AppState { geocode_service }));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
