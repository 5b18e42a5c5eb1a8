//! Cross-origin policy for browser clients.

use crate::config::ConfigError;
use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Build the CORS layer for an explicit origin allow-list
///
/// Credentials are allowed, so methods and headers are mirrored from the
/// preflight rather than wildcarded. A trailing `/` on a configured origin is
/// dropped; browsers never send one.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ConfigError> {
    let origins = origins
        .iter()
        .map(|origin| {
            // A wildcard cannot be combined with credentials
            if origin.trim() == "*" {
                return Err(ConfigError::InvalidOrigin(origin.clone()));
            }
            HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|_| ConfigError::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
