mod application;
mod domain;
mod infrastructure;
mod presentation;

use infrastructure::container::AppContainer;
use presentation::http::server::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    env_logger::init();

    let container = AppContainer::new().await?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok());

    let server = HttpServer::new(
        container.query_handler.clone(),
        container.schema_handler.clone(),
        port,
    );

    tracing::info!("Starting server on port {}", port.unwrap_or(3000));
    server.run().await
}
