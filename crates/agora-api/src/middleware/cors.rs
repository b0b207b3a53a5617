//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use agora_core::config::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// A `"*"` origin with credentials enabled mirrors the request origin,
/// since browsers reject a literal wildcard on credentialed requests.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let wildcard = config.allowed_origins.iter().any(|o| o == "*");

    let origin = match (wildcard, config.allow_credentials) {
        (true, true) => AllowOrigin::mirror_request(),
        (true, false) => AllowOrigin::from(Any),
        (false, _) => {
            let origins: Vec<HeaderValue> = config
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            AllowOrigin::list(origins)
        }
    };

    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_credentials(config.allow_credentials)
        .max_age(Duration::from_secs(config.max_age_seconds))
}
