//! Runtime configuration: CLI surface plus the environment-variable knobs
//! the core reads directly. Mirrors the env-driven style of
//! [`crate::util`]'s tracing/HTTP-client setup rather than a config file.

use clap::Parser;

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Parser)]
#[command(name = "rewrite-proxy", about = "Per-client HTTP interception and mocking proxy")]
pub struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "BIND_ADDR")]
    pub bind_addr: Option<String>,

    /// Log filter passed through to `tracing_subscriber::EnvFilter`.
    #[arg(long, env = "RUST_LOG")]
    pub log: Option<String>,
}

/// Bind address for the HTTP server: CLI flag, then `BIND_ADDR`, then default.
pub fn bind_addr(cli: &Cli) -> String {
    cli.bind_addr
        .clone()
        .or_else(|| std::env::var("BIND_ADDR").ok())
        .unwrap_or_else(|| "0.0.0.0:8088".into())
}

/// Name of the cookie carrying the client id, configurable so the core does
/// not hardcode an external convention.
pub fn client_cookie_name() -> String {
    std::env::var("REWRITE_CLIENT_COOKIE_NAME").unwrap_or_else(|_| "__pmid".into())
}

/// Build the shared `reqwest::Client` used by the forwarder, honoring the
/// same proxy/timeout environment variables as the rest of this service and
/// capping redirects at the documented limit.
pub fn build_http_client() -> reqwest::Client {
    let mut builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS));

    if let Ok(secs) = std::env::var("REWRITE_HTTP_TIMEOUT_SECONDS") {
        if let Ok(n) = secs.trim().parse::<u64>() {
            builder = builder.timeout(std::time::Duration::from_secs(n));
        }
    }

    let no_proxy = std::env::var("REWRITE_NO_PROXY")
        .map(|v| v.trim().to_ascii_lowercase())
        .map(|v| v == "1" || v == "true" || v == "yes" || v == "on")
        .unwrap_or(false);

    if no_proxy {
        builder = builder.no_proxy();
    } else {
        if let Ok(url) = std::env::var("HTTP_PROXY").or_else(|_| std::env::var("http_proxy")) {
            if let Ok(p) = reqwest::Proxy::http(url.trim()) {
                builder = builder.proxy(p);
            }
        }
        if let Ok(url) = std::env::var("HTTPS_PROXY").or_else(|_| std::env::var("https_proxy")) {
            if let Ok(p) = reqwest::Proxy::https(url.trim()) {
                builder = builder.proxy(p);
            }
        }
    }

    builder = builder.user_agent(format!("rewrite-proxy/{}", env!("CARGO_PKG_VERSION")));
    builder.build().unwrap_or_else(|_| reqwest::Client::new())
}
