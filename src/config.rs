use serde::Deserialize;

/// Service configuration, read from a TOML file next to the binary.
///
/// `public_url` is the externally visible base used when rendering the
/// `html_url`, `ignore`, and `ignore_permanently` links in to-do items.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: String,
    pub public_url: String,
    pub database_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9090".into(),
            public_url: "http://localhost:9090".into(),
            database_url: "sqlite:worklist.db?mode=rwc".into(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path).map_err(|e| format!("Could not read {path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| format!("Could not parse {path}: {e}"))
    }

    /// Falls back to the defaults when no config file is present.
    pub fn load_or_default(path: &str) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::info!("{e}; using default configuration");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_fields_with_defaults() {
        let config: Config = toml::from_str(r#"public_url = "https://example.edu""#).unwrap();
        assert_eq!(config.public_url, "https://example.edu");
        assert_eq!(config.bind_addr, "0.0.0.0:9090");
        assert_eq!(config.database_url, "sqlite:worklist.db?mode=rwc");
    }

    #[test]
    fn rejects_malformed_files() {
        assert!(toml::from_str::<Config>("bind_addr = 9090").is_err());
    }
}
