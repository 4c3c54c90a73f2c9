//! UEA/UCR time series classification repository loading.
//!
//! Each data set is a zip archive holding `{name}_TRAIN.arff`,
//! `{name}_TEST.arff` and a free-text `{name}.txt` description (ISO-8859-1).
//! Archives are fetched once into the cache; parsing happens on every load.
//!
//! # Example
//!
//! ```rust,ignore
//! use tsload::{Config, UeaUcrDataset};
//!
//! let dataset = UeaUcrDataset::load("ArrowHead", &Config::default())?;
//! println!("train shape: {:?}", dataset.x_train.shape());
//! println!("first label: {}", dataset.y_train[0]);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::arff;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{fetch_and_unpack, ArchiveFormat};
use crate::io::{read_latin1, require_file};
use crate::mask::{rectangularize, MaskedBatch};

/// A loaded UEA/UCR data set with train and test splits.
///
/// Assembled fresh on every [`load`](UeaUcrDataset::load) call; only the raw
/// downloaded bytes are cached.
#[derive(Debug)]
pub struct UeaUcrDataset {
    /// Data set name, as passed to `load`.
    pub name: String,
    /// Training values and padding mask, `(n, max_len, n_dims)`.
    pub x_train: MaskedBatch,
    /// Training labels, one per sample, in file order.
    pub y_train: Vec<String>,
    /// Test values and padding mask.
    pub x_test: MaskedBatch,
    /// Test labels, one per sample, in file order.
    pub y_test: Vec<String>,
    /// Free-text description shipped with the data set.
    pub description: String,
    /// Resolved remote archive URL.
    pub url: String,
    /// Absolute local cache directory.
    pub location: PathBuf,
}

impl UeaUcrDataset {
    /// Load a data set by name (e.g. `ArrowHead`, case-sensitive), fetching
    /// it into the cache on first use.
    ///
    /// The name is used verbatim as a URL and path segment; an unknown name
    /// fails at the network boundary, not upfront.
    ///
    /// # Errors
    ///
    /// Any of the [`crate::DataError`] variants: fetch and archive failures
    /// on first download, [`crate::DataError::MissingFile`] when a
    /// populated-looking directory lacks an expected file (interrupted
    /// earlier fetch), parse and shape errors from the split files.
    pub fn load(name: &str, config: &Config) -> Result<Self> {
        let store = CacheStore::new(&config.cache_home);
        let dataset_dir = store.local_path(name);
        let url = format!("{}/{}.zip", config.uea_ucr_base_url, name);

        fetch_and_unpack(&url, &dataset_dir, ArchiveFormat::Zip)?;

        let train_path = require_file(dataset_dir.join(format!("{name}_TRAIN.arff")))?;
        let test_path = require_file(dataset_dir.join(format!("{name}_TEST.arff")))?;
        let description_path = require_file(dataset_dir.join(format!("{name}.txt")))?;

        let (x_train, y_train) = load_split(&train_path)?;
        let (x_test, y_test) = load_split(&test_path)?;
        let description = read_latin1(&description_path)?;

        let location = fs::canonicalize(&dataset_dir)?;

        Ok(Self {
            name: name.to_string(),
            x_train,
            y_train,
            x_test,
            y_test,
            description,
            url,
            location,
        })
    }

    /// Whether the data set is already cached.
    #[must_use]
    pub fn is_cached(name: &str, config: &Config) -> bool {
        CacheStore::new(&config.cache_home).is_populated(name)
    }

    /// Delete the cached copy of the data set, if any.
    pub fn clear_cache(name: &str, config: &Config) -> Result<()> {
        let dataset_dir = CacheStore::new(&config.cache_home).local_path(name);
        if dataset_dir.exists() {
            fs::remove_dir_all(&dataset_dir)?;
        }
        Ok(())
    }
}

/// Parse one ARFF split file and rectangularize its series.
fn load_split(path: &Path) -> Result<(MaskedBatch, Vec<String>)> {
    let (series, labels) = arff::load_series(path)?;
    let batch = rectangularize(&series)?;
    Ok((batch, labels))
}
