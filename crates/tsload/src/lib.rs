//! # tsload
//!
//! Download, cache and normalize public time series data sets.
//!
//! This crate provides:
//! - idempotent fetch-and-unpack of remote archives into a local cache,
//!   with normalization of archives that wrap everything in one directory
//! - ARFF parsing of univariate and multivariate series collections
//! - rectangularization of variable-length series into one
//!   `(n, max_len, n_dims)` array plus a boolean padding mask
//! - loaders for the UEA/UCR classification repository and a few
//!   standalone data sets (human locomotion, Molene meteo, NYC taxi)
//!
//! ## Example
//!
//! ```rust,ignore
//! use tsload::{Config, UeaUcrDataset};
//!
//! let dataset = UeaUcrDataset::load("ArrowHead", &Config::default())?;
//! println!("train shape: {:?}", dataset.x_train.shape());
//! println!("first label: {}", dataset.y_train[0]);
//! ```
//!
//! All I/O is blocking and single-shot: no retries, no timeouts beyond the
//! transport defaults, no concurrent access. Cache population is not atomic;
//! see [`DataError::MissingFile`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod arff;
mod cache;
mod config;
mod error;
mod fetch;
mod io;
pub mod locomotion;
mod mask;
pub mod meteo;
pub mod taxi;
pub mod uea_ucr;

pub use cache::CacheStore;
pub use config::{default_cache_home, Config, CACHE_DIR, CACHE_HOME_ENV};
pub use error::{DataError, Result};
pub use fetch::{
    download_file, fetch_and_unpack, flatten_single_subdir, single_wrapping_dir, ArchiveFormat,
    DirChild,
};
pub use mask::{pad_at_the_end, rectangularize, rectangularize_univariate, MaskedBatch};
pub use uea_ucr::UeaUcrDataset;
