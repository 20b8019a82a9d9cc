use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::reading::SensorReading;

/// Selection criteria for readings: equality on topic and device, plus a
/// trailing-window lower bound on the timestamp.
#[derive(Debug, Clone)]
pub struct ReadingFilter {
    pub topic: String,
    pub asset_uid: String,
    pub since: DateTime<Utc>,
}

impl ReadingFilter {
    /// The lower bound is exclusive: a reading exactly at `since` does
    /// not match, one second past it does.
    pub fn matches(&self, reading: &SensorReading) -> bool {
        reading.topic == self.topic
            && reading.asset_uid == self.asset_uid
            && reading.timestamp > self.since
    }
}

/// Read-only view of the sensor-reading collection.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn find(&self, filter: &ReadingFilter) -> Result<Vec<SensorReading>>;
}

/// Production store backed by a MongoDB collection. One handle is opened
/// per accepted connection and dropped with it.
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    pub async fn connect(uri: &str, db: &str, collection: &str) -> Result<Self> {
        info!("Connecting to document store...");
        let client = Client::with_uri_str(uri).await?;
        let database = client.database(db);
        // Fail here on a bad URI rather than on the first find.
        database.run_command(doc! { "ping": 1 }).await?;
        info!("Document store connection established");

        Ok(Self {
            collection: database.collection::<Document>(collection),
        })
    }
}

impl DocumentStore for MongoStore {
    async fn find(&self, filter: &ReadingFilter) -> Result<Vec<SensorReading>> {
        // Stored timestamps are not uniformly typed, so the lower bound is
        // pushed down against every representation the collection holds,
        // then re-checked on the normalized readings. The window rule
        // itself lives only in `ReadingFilter::matches`.
        let since_epoch = filter.since.timestamp();
        let query = doc! {
            "topic": &filter.topic,
            "asset_uid": &filter.asset_uid,
            "$or": [
                { "timestamp": { "$gt": mongodb::bson::DateTime::from_chrono(filter.since) } },
                { "timestamp": { "$gt": since_epoch.to_string() } },
                { "timestamp": { "$gt": since_epoch } },
            ],
        };

        let mut cursor = self.collection.find(query).await?;
        let mut readings = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            match SensorReading::from_document(&document) {
                Ok(reading) if filter.matches(&reading) => readings.push(reading),
                Ok(reading) => {
                    debug!(
                        "Reading for {} at {} outside window, dropped",
                        reading.asset_uid, reading.timestamp
                    );
                }
                Err(e) => warn!("Skipping undecodable document: {}", e),
            }
        }

        debug!("Store returned {} matching readings", readings.len());
        Ok(readings)
    }
}

/// In-memory store over a fixed set of readings, for tests and offline
/// runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    readings: Vec<SensorReading>,
}

impl MemoryStore {
    pub fn new(readings: Vec<SensorReading>) -> Self {
        Self { readings }
    }
}

impl DocumentStore for MemoryStore {
    async fn find(&self, filter: &ReadingFilter) -> Result<Vec<SensorReading>> {
        Ok(self
            .readings
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashMap;

    fn reading(topic: &str, asset_uid: &str, timestamp: DateTime<Utc>) -> SensorReading {
        SensorReading {
            topic: topic.to_string(),
            asset_uid: asset_uid.to_string(),
            timestamp,
            fields: HashMap::new(),
        }
    }

    #[test]
    fn test_window_lower_bound_is_exclusive() {
        let since = Utc::now() - Duration::hours(3);
        let filter = ReadingFilter {
            topic: "t".to_string(),
            asset_uid: "a".to_string(),
            since,
        };

        // Exactly at the boundary: excluded.
        assert!(!filter.matches(&reading("t", "a", since)));
        // One second past the boundary: included.
        assert!(filter.matches(&reading("t", "a", since + Duration::seconds(1))));
    }

    #[test]
    fn test_filter_requires_exact_topic_and_device() {
        let since = Utc::now() - Duration::hours(3);
        let inside = since + Duration::minutes(30);
        let filter = ReadingFilter {
            topic: "t".to_string(),
            asset_uid: "a".to_string(),
            since,
        };

        assert!(filter.matches(&reading("t", "a", inside)));
        assert!(!filter.matches(&reading("other", "a", inside)));
        assert!(!filter.matches(&reading("t", "other", inside)));
    }

    #[test]
    fn test_memory_store_applies_the_filter() {
        tokio_test::block_on(async {
            let now = Utc::now();
            let store = MemoryStore::new(vec![
                reading("t", "a", now - Duration::minutes(10)),
                reading("t", "a", now - Duration::hours(4)),
                reading("t", "b", now - Duration::minutes(10)),
            ]);

            let filter = ReadingFilter {
                topic: "t".to_string(),
                asset_uid: "a".to_string(),
                since: now - Duration::hours(3),
            };

            let found = store.find(&filter).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].timestamp, now - Duration::minutes(10));
        });
    }
}
