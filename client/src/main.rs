mod prompt;

use anyhow::Result;
use sensorquery::catalog::{is_exit, Catalog};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::info;

/// Reply buffer; the server sends at most one unframed message this size.
const MAX_REPLY_BYTES: usize = 4096;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let catalog = Catalog::new();

    loop {
        let addr = prompt::read_server_addr()?;

        let mut stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(_) => {
                println!(
                    "ERROR: Unable to connect to the server. Please check the IP address and port."
                );
                continue;
            }
        };
        println!("Connected to the server.");
        info!("Connected to {}", addr);

        let mut buf = vec![0u8; MAX_REPLY_BYTES];
        loop {
            let message = prompt::read_line("Enter your message (or type 'exit' to quit): ")?;

            if is_exit(&message) {
                return Ok(());
            }

            // A catalog miss never reaches the network; print the
            // guidance locally instead.
            if catalog.match_text(&message).is_none() {
                println!("{}", catalog.guidance());
                continue;
            }

            stream.write_all(message.as_bytes()).await?;

            let n = stream.read(&mut buf).await?;
            if n == 0 {
                println!("Server closed the connection.");
                break;
            }
            println!("Server reply: {}", String::from_utf8_lossy(&buf[..n]));
        }
    }
}
