mod handler;
mod prompt;

use std::env;

use anyhow::Result;
use sensorquery::catalog::Catalog;
use sensorquery::store::MongoStore;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let mongodb_uri =
        env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "test".to_string());
    let mongodb_collection =
        env::var("MONGODB_COLLECTION").unwrap_or_else(|_| "matchatable_virtual".to_string());

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting sensor query server");
    info!("Document store: {}/{}", mongodb_db, mongodb_collection);

    let port = prompt::read_port("Enter the server port number: ")?;
    let catalog = Catalog::new();

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening on port {}...", port);

    // Serial accept loop: one connection is served to completion before
    // the next is accepted.
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Accept failed: {}", e);
                continue;
            }
        };
        info!("Connection established with {}", peer);

        // A fresh store handle per connection; a failed connect drops the
        // client and keeps the server accepting.
        let store = match MongoStore::connect(&mongodb_uri, &mongodb_db, &mongodb_collection).await
        {
            Ok(store) => store,
            Err(e) => {
                error!("Error connecting to database: {}", e);
                continue;
            }
        };

        match handler::serve_connection(stream, &catalog, &store).await {
            Ok(()) => info!("Connection closed by {}", peer),
            Err(e) => error!("Connection with {} dropped: {}", peer, e),
        }
    }
}
