use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VaultConfig {
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_store_path() -> String {
    "vault.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            log_level: default_log_level(),
        }
    }
}

impl VaultConfig {
    pub fn load_or_default(path: &str) -> Self {
        if std::path::Path::new(path).exists() {
            match std::fs::read_to_string(path) {
                Ok(s) => match toml::from_str(&s) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("Error parsing config: {}. Using defaults.", e);
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = VaultConfig::load_or_default("/nonexistent/vault.toml");
        assert_eq!(config.store_path, "vault.json");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: VaultConfig = toml::from_str("store_path = \"/tmp/x.json\"").unwrap();
        assert_eq!(config.store_path, "/tmp/x.json");
        assert_eq!(config.log_level, "info");
    }
}
