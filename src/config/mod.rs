//! Configuration module for the wardrobe backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default cap on a single uploaded image.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication
    pub api_psk: Option<String>,
    /// Path to the SQLite file backing the key-value store
    pub db_path: PathBuf,
    /// Directory that owns every catalog image
    pub image_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    /// Owner assigned to records created without an explicit one
    pub owner_id: String,
    /// Largest accepted image upload, in bytes
    pub max_image_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("WARDROBE_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("WARDROBE_DB_PATH")
            .unwrap_or_else(|_| "./data/wardrobe.sqlite".to_string())
            .into();

        let image_dir = env::var("WARDROBE_IMAGE_DIR")
            .unwrap_or_else(|_| "./data/images".to_string())
            .into();

        let raw_addr =
            env::var("WARDROBE_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr.parse().map_err(|e| {
            AppError::Validation(format!("Invalid WARDROBE_BIND_ADDR {:?}: {}", raw_addr, e))
        })?;

        let log_level = env::var("WARDROBE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("WARDROBE_LOG_JSON")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let owner_id = env::var("WARDROBE_OWNER_ID").unwrap_or_else(|_| "1".to_string());

        let max_image_bytes = match env::var("WARDROBE_MAX_IMAGE_BYTES") {
            Ok(raw) => raw.trim().parse().map_err(|e| {
                AppError::Validation(format!("Invalid WARDROBE_MAX_IMAGE_BYTES {:?}: {}", raw, e))
            })?,
            Err(_) => DEFAULT_MAX_IMAGE_BYTES,
        };

        Ok(Self {
            api_psk,
            db_path,
            image_dir,
            bind_addr,
            log_level,
            log_json,
            owner_id,
            max_image_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    // Tests in this module mutate process-wide environment variables.
    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 8] = [
        "WARDROBE_API_PSK",
        "WARDROBE_DB_PATH",
        "WARDROBE_IMAGE_DIR",
        "WARDROBE_BIND_ADDR",
        "WARDROBE_LOG_LEVEL",
        "WARDROBE_LOG_JSON",
        "WARDROBE_OWNER_ID",
        "WARDROBE_MAX_IMAGE_BYTES",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/wardrobe.sqlite"));
        assert_eq!(config.image_dir, PathBuf::from("./data/images"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert_eq!(config.owner_id, "1");
        assert_eq!(config.max_image_bytes, DEFAULT_MAX_IMAGE_BYTES);
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("WARDROBE_BIND_ADDR", "0.0.0.0:9000");
        env::set_var("WARDROBE_LOG_JSON", "TRUE");
        env::set_var("WARDROBE_OWNER_ID", "alice");
        env::set_var("WARDROBE_MAX_IMAGE_BYTES", "1024");

        let config = Config::from_env().unwrap();
        clear_env();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9000");
        assert!(config.log_json);
        assert_eq!(config.owner_id, "alice");
        assert_eq!(config.max_image_bytes, 1024);
    }

    #[test]
    fn test_invalid_bind_addr_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("WARDROBE_BIND_ADDR", "not-an-address");

        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
