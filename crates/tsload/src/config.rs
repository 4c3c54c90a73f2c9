//! Cache location and upstream repository configuration.

use std::env;
use std::path::PathBuf;

/// Cache directory for downloaded data sets, relative to the home directory.
pub const CACHE_DIR: &str = ".cache/tsload";

/// Environment variable overriding the cache root.
pub const CACHE_HOME_ENV: &str = "TSLOAD_CACHE_HOME";

/// Base URL of the UEA/UCR time series classification repository.
const UEA_UCR_BASE_URL: &str = "http://www.timeseriesclassification.com/Downloads";

/// Base URL hosting the human locomotion archive.
const HUMAN_LOCOMOTION_BASE_URL: &str = "http://dev.ipol.im/~truong";

/// URL of the Molene meteorological observation archive.
const MOLENE_METEO_URL: &str =
    "https://www.data.gouv.fr/fr/datasets/r/3b7b47fa-a973-4878-a13a-cb0e878d49c6";

/// URL of the Molene station README file.
const MOLENE_METEO_README_URL: &str =
    "https://www.data.gouv.fr/fr/datasets/r/80fb22dc-e155-4d5d-a02e-d263fa789fda";

/// Base URL of the NYC taxi repository.
const NYC_TAXI_BASE_URL: &str =
    "https://raw.githubusercontent.com/numenta/NAB/master/data/realKnownCause";

/// Explicit configuration threaded into every loader.
///
/// There is no process-wide state: tests construct a `Config` pointing at a
/// temporary directory and everything downstream follows it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory holding one subdirectory per data set identifier.
    pub cache_home: PathBuf,
    /// Base URL of the UEA/UCR archive repository (no trailing slash).
    pub uea_ucr_base_url: String,
    /// Base URL hosting the human locomotion archive (no trailing slash).
    pub human_locomotion_base_url: String,
    /// URL of the Molene meteo observation archive.
    pub molene_meteo_url: String,
    /// URL of the Molene meteo station README.
    pub molene_meteo_readme_url: String,
    /// Base URL of the NYC taxi repository (no trailing slash).
    pub nyc_taxi_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_home: default_cache_home(),
            uea_ucr_base_url: UEA_UCR_BASE_URL.to_string(),
            human_locomotion_base_url: HUMAN_LOCOMOTION_BASE_URL.to_string(),
            molene_meteo_url: MOLENE_METEO_URL.to_string(),
            molene_meteo_readme_url: MOLENE_METEO_README_URL.to_string(),
            nyc_taxi_base_url: NYC_TAXI_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Replace the cache root, keeping the upstream locations.
    #[must_use]
    pub fn with_cache_home(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_home = dir.into();
        self
    }
}

/// Default cache root: `$TSLOAD_CACHE_HOME` if set, else `~/.cache/tsload`.
#[must_use]
pub fn default_cache_home() -> PathBuf {
    if let Some(dir) = env::var_os(CACHE_HOME_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir().unwrap_or_else(env::temp_dir).join(CACHE_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_cache_home_overrides_only_the_root() {
        let config = Config::default().with_cache_home("/tmp/elsewhere");
        assert_eq!(config.cache_home, PathBuf::from("/tmp/elsewhere"));
        assert_eq!(config.uea_ucr_base_url, UEA_UCR_BASE_URL);
    }
}
