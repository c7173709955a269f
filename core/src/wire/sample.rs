use crate::math::stats::StatsHelper;
use crate::prelude::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One decoded, validated telemetry reading. Immutable once stored; the
/// magnitude is always recomputed at ingestion, never taken from the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub rot_alpha: f64,
    pub rot_beta: f64,
    pub rot_gamma: f64,
    pub accel_magnitude: f64,
}

impl Sample {
    /// Decodes one inbound frame. Gateways forward the six raw axes under
    /// short keys (`ax ay az` acceleration, `oa ob og` orientation), as
    /// numbers or numeric strings. Any missing or unparsable field fails the
    /// whole decode; a partially populated sample is never produced.
    pub fn decode(raw: &str, time_ms: f64) -> FeedResult<Self> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| FeedError::MalformedFrame(e.to_string()))?;

        let accel_x = numeric_field(&value, "ax")?;
        let accel_y = numeric_field(&value, "ay")?;
        let accel_z = numeric_field(&value, "az")?;
        let rot_alpha = numeric_field(&value, "oa")?;
        let rot_beta = numeric_field(&value, "ob")?;
        let rot_gamma = numeric_field(&value, "og")?;

        Ok(Self {
            time: time_ms,
            accel_x,
            accel_y,
            accel_z,
            rot_alpha,
            rot_beta,
            rot_gamma,
            accel_magnitude: StatsHelper::magnitude(accel_x, accel_y, accel_z),
        })
    }
}

fn numeric_field(value: &Value, key: &str) -> FeedResult<f64> {
    let field = value
        .get(key)
        .ok_or_else(|| FeedError::MalformedFrame(format!("missing field {}", key)))?;
    match field {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| FeedError::MalformedFrame(format!("non-finite field {}", key))),
        Value::String(text) => text
            .parse::<f64>()
            .map_err(|_| FeedError::MalformedFrame(format!("unparsable field {}", key))),
        _ => Err(FeedError::MalformedFrame(format!(
            "non-numeric field {}",
            key
        ))),
    }
}
