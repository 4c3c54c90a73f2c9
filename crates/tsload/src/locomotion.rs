//! Human locomotion (gait) data set loading.
//!
//! The whole family ships as one `GaitData.zip` archive. Each trial is a
//! pair of files named by a `"{subject}-{trial}"` code: a headered CSV with
//! the inertial signal and a JSON file with step intervals plus contextual
//! metadata.

use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;

use ndarray::Array2;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{DataError, Result};
use crate::fetch::{fetch_and_unpack, ArchiveFormat};
use crate::io::require_file;

/// Cache directory name of the data set.
pub const DATASET_NAME: &str = "HumanLocomotion";

/// Archive file name on the remote host.
const DATAFILE_NAME: &str = "GaitData.zip";

/// Free-text description of the data set.
pub const DESCRIPTION: &str = "\
This data set consists of 1020 multivariate gait signals collected with two \
inertial measurement units, from 230 subjects undergoing a fixed protocol:
    - standing still,
    - walking 10 m,
    - turning around,
    - walking back,
    - stopping.

In total, there are 8.5 h of gait time series. The measured population was \
composed of healthy subjects as well as patients with neurological or \
orthopedic disorders.
The start and end time stamps of more than 40,000 footsteps are available, \
as well as a number of contextual information about each trial. This exact \
data set was used in [1] to design and evaluate a step detection procedure.

The data are thoroughly described in [2].

[1] Oudre, L., Barrois-Müller, R., Moreau, T., Truong, C., Vienne-Jumeau, \
A., Ricard, D., Vayatis, N., & Vidal, P.-P. (2018). Template-based step \
detection with inertial measurement units. Sensors, 18(11).

[2] Truong, C., Barrois-Müller, R., Moreau, T., Provost, C., \
Vienne-Jumeau, A., Moreau, A., Vidal, P.-P., Vayatis, N., Buffat, S., \
Yelnik, A., Ricard, D., & Oudre, L. (2019). A data set for the study of \
human locomotion with inertial measurements units. Image Processing On \
Line (IPOL), 9.
";

/// A multivariate gait signal, one column per sensor channel.
#[derive(Debug, Clone)]
pub struct TrialSignal {
    /// Channel names from the CSV header.
    pub columns: Vec<String>,
    /// Values, shape `(n_samples, n_channels)`.
    pub values: Array2<f64>,
}

/// Step intervals and contextual metadata of one trial, as stored on disk.
#[derive(Debug, Clone, Deserialize)]
struct TrialMetadata {
    #[serde(rename = "LeftFootActivity")]
    left_foot_activity: Vec<[usize; 2]>,
    #[serde(rename = "RightFootActivity")]
    right_foot_activity: Vec<[usize; 2]>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// One loaded trial.
#[derive(Debug, Clone)]
pub struct HumanLocomotionTrial {
    /// Trial code, `"{subject}-{trial}"`.
    pub code: String,
    /// The measured signal.
    pub signal: TrialSignal,
    /// Left-foot step intervals as `[start, end]` sample indexes.
    pub left_steps: Vec<[usize; 2]>,
    /// Right-foot step intervals as `[start, end]` sample indexes.
    pub right_steps: Vec<[usize; 2]>,
    /// Contextual metadata other than the step intervals.
    pub metadata: Map<String, Value>,
    /// Data set description.
    pub description: String,
}

/// Load one trial, fetching the archive into the cache on first use.
///
/// # Errors
///
/// [`DataError::MissingFile`] when the code has no signal or metadata file
/// in the populated directory; fetch/archive errors on first download;
/// [`DataError::Parse`] for malformed CSV or JSON.
pub fn load_human_locomotion_trial(code: &str, config: &Config) -> Result<HumanLocomotionTrial> {
    let dataset_dir = download(config)?;

    let csv_path = require_file(dataset_dir.join(format!("{code}.csv")))?;
    let json_path = require_file(dataset_dir.join(format!("{code}.json")))?;

    let signal = read_trial_signal(File::open(&csv_path)?).map_err(|e| match e {
        DataError::Parse(msg) => DataError::Parse(format!("{}: {}", csv_path.display(), msg)),
        other => other,
    })?;
    let metadata: TrialMetadata = serde_json::from_reader(File::open(&json_path)?)
        .map_err(|e| DataError::Parse(format!("{}: {}", json_path.display(), e)))?;

    Ok(HumanLocomotionTrial {
        code: code.to_string(),
        signal,
        left_steps: metadata.left_foot_activity,
        right_steps: metadata.right_foot_activity,
        metadata: metadata.extra,
        description: DESCRIPTION.to_string(),
    })
}

/// Trial codes present in the cache, sorted. Fetches the archive on first
/// use.
pub fn available_codes(config: &Config) -> Result<Vec<String>> {
    let dataset_dir = download(config)?;

    let mut codes = Vec::new();
    for entry in fs::read_dir(&dataset_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                codes.push(stem.to_string());
            }
        }
    }
    codes.sort();
    Ok(codes)
}

fn download(config: &Config) -> Result<PathBuf> {
    let store = CacheStore::new(&config.cache_home);
    let dataset_dir = store.local_path(DATASET_NAME);
    let url = format!("{}/{}", config.human_locomotion_base_url, DATAFILE_NAME);
    fetch_and_unpack(&url, &dataset_dir, ArchiveFormat::Zip)?;
    Ok(dataset_dir)
}

/// Read a headered CSV of numeric channels into `(columns, values)`.
fn read_trial_signal<R: Read>(reader: R) -> Result<TrialSignal> {
    let mut reader = csv::Reader::from_reader(reader);
    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| DataError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut cells: Vec<f64> = Vec::new();
    let mut n_rows = 0usize;
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Parse(e.to_string()))?;
        if record.len() != columns.len() {
            return Err(DataError::Parse(format!(
                "row {} has {} fields, expected {}",
                n_rows,
                record.len(),
                columns.len()
            )));
        }
        for field in record.iter() {
            let value = field
                .trim()
                .parse::<f64>()
                .map_err(|_| DataError::Parse(format!("invalid numeric value: {}", field)))?;
            cells.push(value);
        }
        n_rows += 1;
    }

    let values = Array2::from_shape_vec((n_rows, columns.len()), cells)
        .map_err(|e| DataError::Shape(e.to_string()))?;
    Ok(TrialSignal { columns, values })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_signals_keep_column_names_and_order() {
        let csv = "LAV,LAX,LAY\n0.1,0.2,0.3\n1.1,1.2,1.3\n";
        let signal = read_trial_signal(csv.as_bytes()).unwrap();

        assert_eq!(signal.columns, vec!["LAV", "LAX", "LAY"]);
        assert_eq!(signal.values.dim(), (2, 3));
        assert_eq!(signal.values[[1, 2]], 1.3);
    }

    #[test]
    fn a_short_row_is_a_parse_error() {
        let csv = "LAV,LAX\n0.1,0.2\n0.3\n";
        let err = read_trial_signal(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn metadata_splits_step_intervals_from_context() {
        let json = r#"{
            "LeftFootActivity": [[100, 220], [340, 450]],
            "RightFootActivity": [[180, 300]],
            "Age": 27,
            "PathologyGroup": "Healthy"
        }"#;
        let metadata: TrialMetadata = serde_json::from_str(json).unwrap();

        assert_eq!(metadata.left_foot_activity, vec![[100, 220], [340, 450]]);
        assert_eq!(metadata.right_foot_activity, vec![[180, 300]]);
        assert_eq!(metadata.extra["Age"], 27);
        assert_eq!(metadata.extra["PathologyGroup"], "Healthy");
    }

    #[test]
    fn missing_trial_files_surface_as_missing_file() {
        let cache = tempfile::tempdir().unwrap();
        // populated directory, but the requested code has no files
        fs::create_dir_all(cache.path().join(DATASET_NAME)).unwrap();
        let config = Config::default().with_cache_home(cache.path());

        let err = load_human_locomotion_trial("14-3", &config).unwrap_err();
        assert!(matches!(err, DataError::MissingFile(p) if p.ends_with("14-3.csv")));
    }

    #[test]
    fn available_codes_lists_csv_stems_sorted() {
        let cache = tempfile::tempdir().unwrap();
        let dir = cache.path().join(DATASET_NAME);
        fs::create_dir_all(&dir).unwrap();
        for name in ["2-1.csv", "2-1.json", "14-3.csv", "14-3.json"] {
            fs::write(dir.join(name), b"").unwrap();
        }
        let config = Config::default().with_cache_home(cache.path());

        let codes = available_codes(&config).unwrap();
        assert_eq!(codes, vec!["14-3", "2-1"]);
    }
}
