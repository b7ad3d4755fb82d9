use serde::Deserialize;

/// Fixed deployment topology: six water-level nodes, regardless of how many
/// distinct node ids the API actually returns.
pub const TOTAL_NODES: i64 = 6;

const STATUS_SUCCESS: &str = "success";

/// One timestamped sample from one sensor node, as transmitted.
///
/// `values` is positional: index 0 is the node's water level percentage,
/// indices 1 and 2 are the greenhouse-wide temperature and humidity that ride
/// along on every sample. `in_geofence` arrives as the strings "true"/"false",
/// not a boolean.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Reading {
    pub timestamp: i64,
    pub node_id: i64,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub in_geofence: Option<String>,
}

impl Reading {
    pub fn is_in_geofence(&self) -> bool {
        self.in_geofence.as_deref() == Some("true")
    }
}

/// Response envelope from `GET /api/sensor-data`.
#[derive(Debug, Deserialize)]
pub struct SensorEnvelope {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<ReadingPayload>,
}

/// `data` may be a single reading or a list of readings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReadingPayload {
    Many(Vec<Reading>),
    One(Reading),
}

impl SensorEnvelope {
    /// Normalizes the envelope into a reading list, wrapping a bare object
    /// into a one-element list. Returns `None` when the envelope is not a
    /// usable success payload; callers must keep their prior state.
    pub fn into_readings(self) -> Option<Vec<Reading>> {
        if self.status.as_deref() != Some(STATUS_SUCCESS) {
            return None;
        }
        match self.data? {
            ReadingPayload::Many(readings) => Some(readings),
            ReadingPayload::One(reading) => Some(vec![reading]),
        }
    }
}

/// Greenhouse-wide temperature/humidity taken from the latest sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GreenhouseSnapshot {
    pub temperature: f64,
    pub humidity: f64,
    pub timestamp: i64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorStats {
    pub total_nodes: i64,
    pub avg_water_level: f64,
    pub greenhouse_temperature: f64,
    pub greenhouse_humidity: f64,
}

impl Default for SensorStats {
    fn default() -> Self {
        Self {
            total_nodes: TOTAL_NODES,
            avg_water_level: 0.0,
            greenhouse_temperature: 0.0,
            greenhouse_humidity: 0.0,
        }
    }
}

/// Derives a snapshot from the last element of a reading collection. Samples
/// with fewer than three `values` slots carry no greenhouse data.
pub fn greenhouse_from_latest(readings: &[Reading]) -> Option<GreenhouseSnapshot> {
    let latest = readings.last()?;
    if latest.values.len() < 3 {
        return None;
    }
    Some(GreenhouseSnapshot {
        temperature: latest.values[1].unwrap_or(0.0),
        humidity: latest.values[2].unwrap_or(0.0),
        timestamp: latest.timestamp,
    })
}

/// Last reading for a node by array position, not by timestamp; the source
/// does not guarantee timestamp-sorted output.
pub fn latest_for_node(readings: &[Reading], node_id: i64) -> Option<&Reading> {
    readings.iter().rev().find(|reading| reading.node_id == node_id)
}

/// Water level for a node's latest reading. Absent readings, absent values
/// and non-positive levels all collapse to 0 by policy, not as an error.
pub fn water_level_for_node(readings: &[Reading], node_id: i64) -> f64 {
    latest_for_node(readings, node_id)
        .and_then(|reading| reading.values.first().copied().flatten())
        .filter(|level| *level > 0.0)
        .unwrap_or(0.0)
}

/// Rollup over the fixed node topology. Nodes reporting no positive water
/// level are excluded from the average but still count toward `total_nodes`.
pub fn compute_stats(readings: &[Reading], greenhouse: Option<&GreenhouseSnapshot>) -> SensorStats {
    let levels: Vec<f64> = (1..=TOTAL_NODES)
        .map(|node_id| water_level_for_node(readings, node_id))
        .filter(|level| *level > 0.0)
        .collect();

    let avg_water_level = if levels.is_empty() {
        0.0
    } else {
        (levels.iter().sum::<f64>() / levels.len() as f64).round()
    };

    SensorStats {
        total_nodes: TOTAL_NODES,
        avg_water_level,
        greenhouse_temperature: greenhouse.map(|g| g.temperature).unwrap_or(0.0),
        greenhouse_humidity: greenhouse.map(|g| g.humidity).unwrap_or(0.0),
    }
}
