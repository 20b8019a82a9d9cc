use chrono::Utc;
use sensorquery::aggregate::aggregate;
use sensorquery::catalog::Catalog;
use sensorquery::errors::Result;
use sensorquery::store::DocumentStore;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

/// Per-message receive buffer. There is no framing; longer messages are
/// truncated.
const MAX_MESSAGE_BYTES: usize = 4096;

/// Serves one client connection to completion: receive, match, aggregate,
/// reply, until the peer closes the socket. A store-read failure ends the
/// connection with an error; the accept loop carries on.
pub async fn serve_connection<C, S>(mut conn: C, catalog: &Catalog, store: &S) -> Result<()>
where
    C: AsyncRead + AsyncWrite + Unpin,
    S: DocumentStore,
{
    let mut buf = vec![0u8; MAX_MESSAGE_BYTES];

    loop {
        let n = conn.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }

        let message = String::from_utf8_lossy(&buf[..n]).into_owned();
        info!("Received message: {}", message);

        let reply = match catalog.match_text(&message) {
            Some(query) => aggregate(query, store, Utc::now()).await?.render(),
            None => {
                warn!("Unrecognized query, replying with guidance");
                catalog.guidance()
            }
        };

        conn.write_all(reply.as_bytes()).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sensorquery::aggregate::QuerySpec;
    use sensorquery::catalog::Query;
    use sensorquery::reading::SensorReading;
    use sensorquery::store::MemoryStore;
    use std::collections::HashMap;
    use tokio::io::duplex;

    fn reading(query: Query, minutes_ago: i64, value: f64) -> SensorReading {
        let spec = QuerySpec::of(query);
        let mut fields = HashMap::new();
        fields.insert(spec.field.to_string(), value);
        SensorReading {
            topic: spec.topic.to_string(),
            asset_uid: spec.asset_uid.to_string(),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
            fields,
        }
    }

    async fn exchange(client: &mut tokio::io::DuplexStream, request: &str) -> String {
        client.write_all(request.as_bytes()).await.unwrap();
        let mut buf = vec![0u8; MAX_MESSAGE_BYTES];
        let n = client.read(&mut buf).await.unwrap();
        String::from_utf8(buf[..n].to_vec()).unwrap()
    }

    fn spawn_server(store: MemoryStore) -> (tokio::io::DuplexStream, tokio::task::JoinHandle<()>) {
        let (client, server) = duplex(MAX_MESSAGE_BYTES);
        let handle = tokio::spawn(async move {
            let catalog = Catalog::new();
            serve_connection(server, &catalog, &store).await.unwrap();
        });
        (client, handle)
    }

    #[tokio::test]
    async fn test_dishwasher_query_with_empty_store_replies_zero() {
        let (mut client, handle) = spawn_server(MemoryStore::default());

        let reply = exchange(
            &mut client,
            "What is the average water level in my dishwasher in the past three hours?",
        )
        .await;
        assert_eq!(
            reply,
            "Average water level in the dishwasher in the past 3 hours: 0.00 liters"
        );

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_recognized_query_replies_with_the_windowed_mean() {
        let store = MemoryStore::new(vec![
            reading(Query::FridgeOneHumidity, 10, 10.0),
            reading(Query::FridgeOneHumidity, 20, 20.0),
            reading(Query::FridgeOneHumidity, 30, 30.0),
        ]);
        let (mut client, handle) = spawn_server(store);

        let reply = exchange(
            &mut client,
            "What is the average humidity inside my kitchen fridge 1 in the past three hours?",
        )
        .await;
        assert_eq!(
            reply,
            "Average humidity inside Fridge1 in the past 3 hours: 20.00%"
        );

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_unrecognized_query_replies_with_guidance() {
        let (mut client, handle) = spawn_server(MemoryStore::default());

        let reply = exchange(&mut client, "tell me a joke").await;
        assert_eq!(reply, Catalog::new().guidance());

        drop(client);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_stays_open_across_requests() {
        let (mut client, handle) = spawn_server(MemoryStore::default());

        let first = exchange(
            &mut client,
            "What is the average water level in my dishwasher in the past three hours?",
        )
        .await;
        let second = exchange(
            &mut client,
            "What is the average humidity inside my kitchen fridge 2 in the past three hours?",
        )
        .await;

        assert!(first.starts_with("Average water level in the dishwasher"));
        assert_eq!(
            second,
            "Average humidity inside Fridge2 in the past 3 hours: 0.00%"
        );

        drop(client);
        handle.await.unwrap();
    }
}
