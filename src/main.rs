use actix_web::{web, App, HttpServer};
use clap::Parser;

use rewrite_proxy::config::{bind_addr, Cli};
use rewrite_proxy::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    if let Some(log) = &cli.log {
        std::env::set_var("RUST_LOG", log);
    }
    rewrite_proxy::util::init_tracing();

    let addr = bind_addr(&cli);

    tracing::info!(%addr, "starting rewrite proxy");

    // Built once and cloned into each worker: the rule store and publisher
    // must be shared state, not re-created per worker thread.
    let state = web::Data::new(AppState::default());

    HttpServer::new(move || {
        App::new()
            .wrap(rewrite_proxy::cors::preflight_layer_from_env())
            .app_data(state.clone())
            .configure(rewrite_proxy::config_routes)
    })
    .bind(&addr)?
    .run()
    .await
}
