use std::env;

use chrono::{DateTime, Duration, Utc};
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::Client;
use rand::Rng;
use tracing::{error, info};

const TOPIC: &str = "home/kitchen/fridge";

struct Device {
    asset_uid: &'static str,
    field: &'static str,
    lo: f64,
    hi: f64,
    /// Fridge1 still runs the old firmware: epoch-seconds string
    /// timestamp with the field nested under `payload`.
    legacy_shape: bool,
}

const DEVICES: [Device; 3] = [
    Device {
        asset_uid: "q9b-kb8-303-99s",
        field: "Fridge1_Humidity",
        lo: 30.0,
        hi: 80.0,
        legacy_shape: true,
    },
    Device {
        asset_uid: "f40377a7-156a-4a82-8625-f245bfaf0fee",
        field: "Fridge2_Humidity",
        lo: 30.0,
        hi: 80.0,
        legacy_shape: false,
    },
    Device {
        asset_uid: "rh6-u91-pkx-bcl",
        field: "Water Level Sensor",
        lo: 0.5,
        hi: 6.0,
        legacy_shape: false,
    },
];

#[tokio::main]
async fn main() {
    let mongodb_uri =
        env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let mongodb_db = env::var("MONGODB_DB").unwrap_or_else(|_| "test".to_string());
    let mongodb_collection =
        env::var("MONGODB_COLLECTION").unwrap_or_else(|_| "matchatable_virtual".to_string());
    let per_device: usize = env::var("READINGS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting reading seeder");
    info!("Target collection: {}/{}", mongodb_db, mongodb_collection);
    info!("Readings per device: {}", per_device);

    let client = match Client::with_uri_str(&mongodb_uri).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to document store: {}", e);
            std::process::exit(1);
        }
    };
    let collection = client
        .database(&mongodb_db)
        .collection::<Document>(&mongodb_collection);

    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let mut documents = Vec::with_capacity(per_device * DEVICES.len());

    for device in &DEVICES {
        for _ in 0..per_device {
            // Spread over the last four hours so some readings fall
            // outside the three-hour query window.
            let age = Duration::seconds(rng.gen_range(0..14_400i64));
            let value = rng.gen_range(device.lo..device.hi);
            documents.push(make_document(device, now - age, value));
        }
    }

    match collection.insert_many(&documents).await {
        Ok(result) => info!("Inserted {} readings", result.inserted_ids.len()),
        Err(e) => {
            error!("Insert failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn make_document(device: &Device, timestamp: DateTime<Utc>, value: f64) -> Document {
    let mut document = doc! {
        "topic": TOPIC,
        "asset_uid": device.asset_uid,
    };

    if device.legacy_shape {
        document.insert("timestamp", timestamp.timestamp().to_string());
        let mut payload = Document::new();
        payload.insert(device.field, value);
        document.insert("payload", payload);
    } else {
        document.insert("timestamp", BsonDateTime::from_chrono(timestamp));
        document.insert(device.field, value);
    }

    document
}
