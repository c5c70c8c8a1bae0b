use std::sync::Arc;

use fastest_route::config::Config;
use fastest_route::engine::Engine;
use fastest_route::error::Error;
use fastest_route::external::google_maps::GoogleMaps;
use fastest_route::server::serve;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let maps = Arc::new(GoogleMaps::new(&config));
    let engine = Engine::new(maps.clone(), maps);

    let events = engine.events();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!("event: {:?}", event);
        }
    });

    serve(engine, config.listen_addr).await
}
