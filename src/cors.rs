//! CORS echo (component G).
//!
//! Preflight `OPTIONS` is handled by a generic [`actix_cors::Cors`] layer
//! built from environment the way [`crate::util`] builds it for the rest of
//! this service; this module only covers the per-response echo the core's
//! state machine is responsible for on every mock or forward response.

use actix_web::HttpResponseBuilder;

/// Reflect `Origin` verbatim and allow credentials, if an origin was sent.
/// A missing origin means the caller is not a browser context; nothing is set.
pub fn echo_origin(builder: &mut HttpResponseBuilder, origin: Option<&str>) {
    if let Some(origin) = origin {
        builder.insert_header(("Access-Control-Allow-Origin", origin));
        builder.insert_header(("Access-Control-Allow-Credentials", "true"));
    }
}

/// Build the preflight CORS layer from the `CORS_ALLOWED_ORIGINS`
/// environment variable (comma-separated, default wildcard). Wildcard
/// origins and `supports_credentials` are mutually exclusive per the CORS
/// spec, so credentials are only enabled when an explicit allow-list is set.
pub fn preflight_layer_from_env() -> actix_cors::Cors {
    let mut cors = actix_cors::Cors::default()
        .allow_any_method()
        .allow_any_header();

    match std::env::var("CORS_ALLOWED_ORIGINS") {
        Ok(origins) if origins.trim() != "*" && !origins.trim().is_empty() => {
            for origin in origins.split(',').map(str::trim).filter(|o| !o.is_empty()) {
                cors = cors.allowed_origin(origin);
            }
            cors = cors.supports_credentials();
        }
        _ => cors = cors.allow_any_origin(),
    }

    cors
}
