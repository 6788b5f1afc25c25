use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Default time the results screen stays up before the exercise terminates.
pub const DEFAULT_RESULTS_DELAY_MS: u64 = 3000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub results_delay_ms: u64,
    pub catalog_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            results_delay_ms: DEFAULT_RESULTS_DELAY_MS,
            catalog_path: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let host = settings
            .get_string("server.host")
            .or_else(|_| env::var("HOST"))
            .unwrap_or(defaults.host);

        let port = settings
            .get_int("server.port")
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .or_else(|| env::var("PORT").ok().and_then(|v| v.parse().ok()))
            .unwrap_or(defaults.port);

        let results_delay_ms = settings
            .get_int("session.results_delay_ms")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .or_else(|| {
                env::var("RESULTS_DELAY_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
            })
            .filter(|v| *v > 0)
            .unwrap_or(defaults.results_delay_ms);

        let catalog_path = settings
            .get_string("content.catalog_path")
            .or_else(|_| env::var("CATALOG_PATH"))
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Config {
            host,
            port,
            results_delay_ms,
            catalog_path,
        })
    }

    pub fn results_delay(&self) -> Duration {
        Duration::from_millis(self.results_delay_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
