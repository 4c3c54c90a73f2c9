//! NYC taxi passenger-count series loading.
//!
//! A single CSV file (no archive): passenger counts aggregated in 30-minute
//! buckets, with five known anomalies whose timestamps ship as constants.

use std::fs::{self, File};
use std::io::Read;

use chrono::NaiveDateTime;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{DataError, Result};
use crate::fetch::download_file;
use crate::io::require_file;

/// Cache directory name of the data set.
pub const DATASET_NAME: &str = "NYCTaxi";

/// Data file name, both remotely and in the cache.
const DATAFILE_NAME: &str = "nyc_taxi.csv";

/// Free-text description of the data set.
pub const DESCRIPTION: &str = "\
This data set contains the number of New York taxi passengers aggregated in \
30 minutes buckets for the period between July 2014 and January 2015. There \
are five anomalies occur during the NYC marathon, Thanksgiving, Christmas, \
New Years day, and a snow storm.

The raw data is from the NYC Taxi and Limousine Commission [1] and has been \
curated by [2].

[1]: https://www1.nyc.gov/site/tlc/about/tlc-trip-record-data.page
[2]: Ahmad, S., Lavin, A., Purdy, S., & Agha, Z. (2017). Unsupervised \
real-time anomaly detection for streaming data. Neurocomputing.
";

/// Start times of the five known anomalies.
const ANOMALY_LABELS: [&str; 5] = [
    "2014-11-01 19:00:00",
    "2014-11-27 15:30:00",
    "2014-12-25 15:00:00",
    "2015-01-01 01:00:00",
    "2015-01-27 00:00:00",
];

/// The loaded data set.
#[derive(Debug, Clone)]
pub struct NycTaxiDataset {
    /// Bucket start times, one per observation, in file order.
    pub timestamps: Vec<NaiveDateTime>,
    /// Passenger counts, parallel to `timestamps`.
    pub counts: Vec<f64>,
    /// Start times of the known anomalies.
    pub anomalies: Vec<NaiveDateTime>,
    /// Data set description.
    pub description: String,
}

/// Load the NYC taxi series, fetching the CSV into the cache on first use.
pub fn load_nyc_taxi(config: &Config) -> Result<NycTaxiDataset> {
    let store = CacheStore::new(&config.cache_home);
    let dataset_dir = store.local_path(DATASET_NAME);
    let data_path = dataset_dir.join(DATAFILE_NAME);

    if !store.is_populated(DATASET_NAME) {
        fs::create_dir_all(&dataset_dir)?;
        let url = format!("{}/{}", config.nyc_taxi_base_url, DATAFILE_NAME);
        download_file(&url, &data_path)?;
    }
    let data_path = require_file(data_path)?;

    let (timestamps, counts) = read_series(File::open(&data_path)?).map_err(|e| match e {
        DataError::Parse(msg) => DataError::Parse(format!("{}: {}", data_path.display(), msg)),
        other => other,
    })?;

    let anomalies = ANOMALY_LABELS
        .iter()
        .map(|label| parse_timestamp(label))
        .collect::<Result<Vec<_>>>()?;

    Ok(NycTaxiDataset {
        timestamps,
        counts,
        anomalies,
        description: DESCRIPTION.to_string(),
    })
}

/// Parse `timestamp,value` rows.
fn read_series<R: Read>(reader: R) -> Result<(Vec<NaiveDateTime>, Vec<f64>)> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| DataError::Parse(e.to_string()))?
        .clone();
    let timestamp_col = headers
        .iter()
        .position(|h| h.trim() == "timestamp")
        .ok_or_else(|| DataError::Parse("no `timestamp` column".to_string()))?;
    let value_col = headers
        .iter()
        .position(|h| h.trim() == "value")
        .ok_or_else(|| DataError::Parse("no `value` column".to_string()))?;

    let mut timestamps = Vec::new();
    let mut counts = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::Parse(e.to_string()))?;
        let timestamp = record
            .get(timestamp_col)
            .ok_or_else(|| DataError::Parse(format!("row {}: missing timestamp", row)))
            .and_then(parse_timestamp)?;
        let count = record
            .get(value_col)
            .unwrap_or("")
            .trim()
            .parse::<f64>()
            .map_err(|_| DataError::Parse(format!("row {}: invalid value", row)))?;
        timestamps.push(timestamp);
        counts.push(count);
    }
    Ok((timestamps, counts))
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| DataError::Parse(format!("invalid timestamp: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_parse_into_parallel_vectors() {
        let csv = "\
timestamp,value
2014-07-01 00:00:00,10844
2014-07-01 00:30:00,8127
";
        let (timestamps, counts) = read_series(csv.as_bytes()).unwrap();

        assert_eq!(timestamps.len(), 2);
        assert_eq!(counts, vec![10844.0, 8127.0]);
        assert_eq!(
            timestamps[0],
            parse_timestamp("2014-07-01 00:00:00").unwrap()
        );
    }

    #[test]
    fn a_malformed_row_aborts_the_parse() {
        let csv = "timestamp,value\n2014-07-01 00:00:00,ten\n";
        let err = read_series(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Parse(msg) if msg.contains("row 0")));
    }

    #[test]
    fn every_anomaly_label_parses() {
        for label in ANOMALY_LABELS {
            parse_timestamp(label).unwrap();
        }
    }
}
