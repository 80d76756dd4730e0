// Environment configuration
// Store path and bind address come from the environment (or a .env file),
// not from source. Neither default carries credentials.

use std::env;
use std::path::PathBuf;

/// Runtime configuration for the server binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path (`FIGHTERS_DB`).
    pub db_path: PathBuf,

    /// Listen address (`FIGHTERS_ADDR`).
    pub bind_addr: String,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(env::var("FIGHTERS_DB").ok(), env::var("FIGHTERS_ADDR").ok())
    }

    fn from_vars(db: Option<String>, addr: Option<String>) -> Self {
        Config {
            db_path: PathBuf::from(db.unwrap_or_else(|| "fighters.db".to_string())),
            bind_addr: addr.unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = Config::from_vars(None, None);
        assert_eq!(config.db_path, PathBuf::from("fighters.db"));
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_vars_override_defaults() {
        let config = Config::from_vars(
            Some("/var/lib/fighters/alfc.db".to_string()),
            Some("127.0.0.1:8080".to_string()),
        );
        assert_eq!(config.db_path, PathBuf::from("/var/lib/fighters/alfc.db"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }
}
