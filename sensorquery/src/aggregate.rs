use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::catalog::Query;
use crate::errors::Result;
use crate::store::{DocumentStore, ReadingFilter};

/// How far back every query looks.
const WINDOW_HOURS: i64 = 3;

/// Per-query constants consumed by the one generic aggregation routine.
#[derive(Debug, Clone, Copy)]
pub struct QuerySpec {
    pub topic: &'static str,
    pub asset_uid: &'static str,
    /// Name of the numeric field averaged over, as stored.
    pub field: &'static str,
    pub metric: &'static str,
    pub location: &'static str,
    /// Rendered directly after the value, leading space included where
    /// the unit wants one.
    pub unit: &'static str,
}

impl QuerySpec {
    // All three devices publish under the fridge topic, the dishwasher
    // included; that is how the fleet stores its readings today.
    pub fn of(query: Query) -> QuerySpec {
        match query {
            Query::FridgeOneHumidity => QuerySpec {
                topic: "home/kitchen/fridge",
                asset_uid: "q9b-kb8-303-99s",
                field: "Fridge1_Humidity",
                metric: "humidity",
                location: "inside Fridge1",
                unit: "%",
            },
            Query::FridgeTwoHumidity => QuerySpec {
                topic: "home/kitchen/fridge",
                asset_uid: "f40377a7-156a-4a82-8625-f245bfaf0fee",
                field: "Fridge2_Humidity",
                metric: "humidity",
                location: "inside Fridge2",
                unit: "%",
            },
            Query::DishwasherWaterLevel => QuerySpec {
                topic: "home/kitchen/fridge",
                asset_uid: "rh6-u91-pkx-bcl",
                field: "Water Level Sensor",
                metric: "water level",
                location: "in the dishwasher",
                unit: " liters",
            },
        }
    }
}

/// Mean of one metric over the trailing window, plus what is needed to
/// render the reply sentence. A mean of 0 with no samples is a valid
/// result, not an error.
#[derive(Debug, Clone)]
pub struct AggregationResult {
    pub mean: f64,
    pub samples: usize,
    spec: QuerySpec,
}

impl AggregationResult {
    pub fn render(&self) -> String {
        format!(
            "Average {} {} in the past 3 hours: {:.2}{}",
            self.spec.metric, self.spec.location, self.mean, self.spec.unit
        )
    }
}

/// Runs one query against the store at time `now`. Stateless and
/// idempotent given the same store contents and `now`; readings missing
/// the target field are skipped without counting.
pub async fn aggregate<S: DocumentStore>(
    query: Query,
    store: &S,
    now: DateTime<Utc>,
) -> Result<AggregationResult> {
    let spec = QuerySpec::of(query);
    let filter = ReadingFilter {
        topic: spec.topic.to_string(),
        asset_uid: spec.asset_uid.to_string(),
        since: now - Duration::hours(WINDOW_HOURS),
    };

    let readings = store.find(&filter).await?;
    debug!("{} readings matched {:?}", readings.len(), query);

    let mut sum = 0.0;
    let mut count = 0usize;
    for reading in &readings {
        match reading.field(spec.field) {
            Some(value) => {
                sum += value;
                count += 1;
            }
            None => debug!(
                "Reading at {} has no {:?} value, skipped",
                reading.timestamp, spec.field
            ),
        }
    }

    let mean = if count > 0 { sum / count as f64 } else { 0.0 };
    Ok(AggregationResult {
        mean,
        samples: count,
        spec,
    })
}
