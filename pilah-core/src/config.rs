//! Runtime configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::model::Coordinate;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_GEOLOCATION_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FACILITY_LIMIT: usize = 50;
const DEFAULT_LOG_DIR: &str = "logs";

/// Settings shared by the service, providers, and front-end.
#[derive(Debug, Clone, PartialEq)]
pub struct PilahConfig {
    /// Base URL of the facility directory and request store.
    pub api_url: String,
    /// Base URL of the reverse geocoder.
    pub geocoder_url: String,
    /// Upper bound on waiting for the device location.
    pub geolocation_timeout: Duration,
    /// Maximum number of facilities requested from the directory.
    pub facility_limit: usize,
    /// Fixed device position for hosts without positioning hardware.
    pub device_coordinate: Option<Coordinate>,
    /// Directory for log files.
    pub log_dir: PathBuf,
}

impl Default for PilahConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_owned(),
            geolocation_timeout: Duration::from_secs(DEFAULT_GEOLOCATION_TIMEOUT_SECS),
            facility_limit: DEFAULT_FACILITY_LIMIT,
            device_coordinate: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl PilahConfig {
    /// Load configuration from `PILAH_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Invalid values are
    /// logged and replaced by their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("PILAH_API_URL")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or(defaults.api_url);
        let geocoder_url = lookup("PILAH_GEOCODER_URL")
            .map(|url| url.trim_end_matches('/').to_owned())
            .unwrap_or(defaults.geocoder_url);
        let geolocation_timeout = parse_or(&lookup, "PILAH_GEOLOCATION_TIMEOUT_SECS", DEFAULT_GEOLOCATION_TIMEOUT_SECS)
            .max(1);
        let facility_limit = parse_or(&lookup, "PILAH_FACILITY_LIMIT", DEFAULT_FACILITY_LIMIT);

        let latitude = parse_optional::<f64, _>(&lookup, "PILAH_LATITUDE");
        let longitude = parse_optional::<f64, _>(&lookup, "PILAH_LONGITUDE");
        let device_coordinate = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => {
                let coordinate = Coordinate::new(latitude, longitude);
                if coordinate.is_valid() {
                    Some(coordinate)
                } else {
                    tracing::warn!(%coordinate, "PILAH_LATITUDE/PILAH_LONGITUDE out of range, ignoring");
                    None
                }
            }
            (None, None) => None,
            _ => {
                tracing::warn!("PILAH_LATITUDE and PILAH_LONGITUDE must be set together, ignoring");
                None
            }
        };

        let log_dir = lookup("PILAH_LOG_DIR").map_or(defaults.log_dir, PathBuf::from);

        Self {
            api_url,
            geocoder_url,
            geolocation_timeout: Duration::from_secs(geolocation_timeout),
            facility_limit,
            device_coordinate,
            log_dir,
        }
    }
}

fn parse_optional<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "invalid configuration value, using default");
            None
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    parse_optional(lookup, key).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> PilahConfig {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        PilahConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(config_from(&[]), PilahConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("PILAH_API_URL", "https://api.example.test/v1/"),
            ("PILAH_GEOCODER_URL", "https://geo.example.test"),
            ("PILAH_GEOLOCATION_TIMEOUT_SECS", "3"),
            ("PILAH_FACILITY_LIMIT", "20"),
            ("PILAH_LATITUDE", "-6.2"),
            ("PILAH_LONGITUDE", "106.8"),
            ("PILAH_LOG_DIR", "/tmp/pilah"),
        ]);

        assert_eq!(config.api_url, "https://api.example.test/v1");
        assert_eq!(config.geocoder_url, "https://geo.example.test");
        assert_eq!(config.geolocation_timeout, Duration::from_secs(3));
        assert_eq!(config.facility_limit, 20);
        assert_eq!(config.device_coordinate, Some(Coordinate::new(-6.2, 106.8)));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/pilah"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("PILAH_GEOLOCATION_TIMEOUT_SECS", "soon"),
            ("PILAH_FACILITY_LIMIT", "-4"),
            ("PILAH_LATITUDE", "123"),
            ("PILAH_LONGITUDE", "10"),
        ]);

        assert_eq!(config.geolocation_timeout, Duration::from_secs(DEFAULT_GEOLOCATION_TIMEOUT_SECS));
        assert_eq!(config.facility_limit, DEFAULT_FACILITY_LIMIT);
        assert_eq!(config.device_coordinate, None);
    }

    #[test]
    fn half_a_coordinate_is_ignored() {
        let config = config_from(&[("PILAH_LATITUDE", "-6.2")]);
        assert_eq!(config.device_coordinate, None);
    }
}
