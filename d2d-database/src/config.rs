use log::warn;

use crate::types::DbConnectParams;

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

/**
 * Resolve the database url. `DB_URL` wins, otherwise the url is assembled from
 * the JSON object stored in `DB_CONNECT_PARAMS`.
 *
 * # Returns
 * @return Option<String> - The connection url, None when neither variable is usable
 */
pub fn get_database_url() -> Option<String> {
    if let Ok(url) = std::env::var("DB_URL") {
        return Some(url);
    }
    let raw = std::env::var("DB_CONNECT_PARAMS").ok()?;
    match serde_json::from_str::<DbConnectParams>(&raw) {
        Ok(params) => Some(params.to_url()),
        Err(e) => {
            warn!("DB_CONNECT_PARAMS could not be parsed: {}", e);
            None
        }
    }
}
