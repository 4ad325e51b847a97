use ::config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Server settings, read from the `[server]` table of `config.toml` and then from
/// `ATTENDANCE__SERVER__*` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Origins allowed to call the API from a browser. `*` allows any origin.
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    server: Option<Settings>,
}

fn default_listen() -> String {
    // Hosting platforms hand the port over in `PORT`.
    match env::var("PORT") {
        Ok(port) => format!("0.0.0.0:{port}"),
        Err(_) => "0.0.0.0:5000".to_string(),
    }
}

fn default_database_url() -> String {
    env::var("DATABASE_URL").unwrap_or_else(|_| "attendance.db".to_string())
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            database_url: default_database_url(),
            cors_allowed_origins: default_cors_allowed_origins(),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (without extension; a missing file is fine) and the
    /// environment. A `.env` file, if present, is loaded first.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let file: SettingsFile = settings.try_deserialize()?;
        Ok(file.server.unwrap_or_default())
    }

    /// Whether a browser request from `origin` may read our responses.
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.cors_allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_allows_any_origin() {
        let settings = Settings {
            cors_allowed_origins: vec!["*".to_string()],
            ..Settings::default()
        };
        assert!(settings.allows_origin("https://example.com"));
    }

    #[test]
    fn explicit_origins_are_matched_exactly() {
        let settings = Settings {
            cors_allowed_origins: vec!["https://school.example".to_string()],
            ..Settings::default()
        };
        assert!(settings.allows_origin("https://school.example"));
        assert!(!settings.allows_origin("https://evil.example"));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let settings = Settings::load("does-not-exist/config").unwrap();
        assert_eq!(settings.cors_allowed_origins, vec!["*".to_string()]);
    }
}
