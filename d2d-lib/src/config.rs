use std::time::Duration;

use log::warn;

pub fn init() {
    dotenv::dotenv().ok();
}

/**
 * Get an environment variable or a default value
 *
 * # Arguments
 * @param key: &str - The environment variable key
 * @param default: &str - The default value
 *
 * # Returns
 * @return String - The value of the environment variable or the default value
 */
pub fn get_env_var_or_default(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) => val,
        Err(_) => {
            warn!("{} not set, using default value: {}", key, default);
            default.to_string()
        }
    }
}

fn get_parsed_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val) => match val.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("{} has an unusable value '{}', using the default", key, val);
                default
            }
        },
        Err(_) => default,
    }
}

pub const DEFAULT_EXPECTED_WT_ROSETTA_SCORE: f64 = -1089.697;
pub const DEFAULT_ROSETTA_DELTA_LIMIT: f64 = 20.0;
pub const DEV_OBJECT_URL_SECRET: &str = "d2d-dev-link-secret";

/// Everything the workflow needs from the environment, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub fit_service_url: String,
    pub object_store_root: String,
    pub object_store_bucket: String,
    pub object_store_public_url: String,
    /// Key for the HMAC on download links.
    pub object_url_secret: String,
    pub enzyme_abbreviation: String,
    pub expected_wt_rosetta_score: f64,
    pub rosetta_delta_limit: f64,
    pub http_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            fit_service_url: get_env_var_or_default("FIT_SERVICE_URL", "http://127.0.0.1:5002"),
            object_store_root: get_env_var_or_default("OBJECT_STORE_ROOT", "object_store"),
            object_store_bucket: get_env_var_or_default("OBJECT_STORE_BUCKET", "d2dcurebucket"),
            object_store_public_url: get_env_var_or_default(
                "OBJECT_STORE_PUBLIC_URL",
                "http://127.0.0.1:8080/objects",
            ),
            object_url_secret: get_env_var_or_default("OBJECT_URL_SECRET", DEV_OBJECT_URL_SECRET),
            enzyme_abbreviation: get_env_var_or_default("ENZYME_ABBREVIATION", "BglB"),
            expected_wt_rosetta_score: get_parsed_or_default(
                "EXPECTED_WT_ROSETTA_SCORE",
                DEFAULT_EXPECTED_WT_ROSETTA_SCORE,
            ),
            rosetta_delta_limit: get_parsed_or_default(
                "ROSETTA_DELTA_LIMIT",
                DEFAULT_ROSETTA_DELTA_LIMIT,
            ),
            http_timeout: Duration::from_secs(get_parsed_or_default("HTTP_TIMEOUT_SECS", 30)),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            fit_service_url: "http://127.0.0.1:5002".to_string(),
            object_store_root: "object_store".to_string(),
            object_store_bucket: "d2dcurebucket".to_string(),
            object_store_public_url: "http://127.0.0.1:8080/objects".to_string(),
            object_url_secret: DEV_OBJECT_URL_SECRET.to_string(),
            enzyme_abbreviation: "BglB".to_string(),
            expected_wt_rosetta_score: DEFAULT_EXPECTED_WT_ROSETTA_SCORE,
            rosetta_delta_limit: DEFAULT_ROSETTA_DELTA_LIMIT,
            http_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn settings_read_the_environment() {
        std::env::set_var("ENZYME_ABBREVIATION", "PfBgl");
        std::env::set_var("EXPECTED_WT_ROSETTA_SCORE", "-1000.5");
        std::env::set_var("HTTP_TIMEOUT_SECS", "not-a-number");
        let settings = Settings::from_env();
        assert_eq!(settings.enzyme_abbreviation, "PfBgl");
        assert_eq!(settings.expected_wt_rosetta_score, -1000.5);
        assert_eq!(settings.http_timeout, Duration::from_secs(30));
        std::env::remove_var("ENZYME_ABBREVIATION");
        std::env::remove_var("EXPECTED_WT_ROSETTA_SCORE");
        std::env::remove_var("HTTP_TIMEOUT_SECS");
    }
}
