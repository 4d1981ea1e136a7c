//! Shared ambient helpers: tracing/environment bootstrap.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize dotenv and structured tracing based on `RUST_LOG`.
///
/// Loads an explicit `ENV_FILE` path if set, otherwise the conventional
/// `.env` in the current directory. Missing either is fine: this single
/// binary has no multi-target deployment layout to search, unlike a
/// service shipped across several runtime environments.
pub fn init_tracing() {
    let env_source = match std::env::var("ENV_FILE") {
        Ok(path) if !path.trim().is_empty() && dotenvy::from_filename(path.trim()).is_ok() => {
            format!("{} (ENV_FILE)", path.trim())
        }
        _ if dotenvy::dotenv().is_ok() => ".env".to_string(),
        _ => "none".to_string(),
    };

    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = fmt().with_env_filter(EnvFilter::new(filter)).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::info!("Environment loaded from: {}", env_source);
}
