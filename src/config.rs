use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::{time_range::TimeRange, DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: String,
    pub port: u16,
    pub project_id: u64,
    pub mock_delay: Duration,
    pub mock_jitter: Duration,
    pub mock_seed: Option<u64>,
    pub default_time_range: TimeRange,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 8080,
            project_id: 1,
            mock_delay: Duration::from_millis(500),
            mock_jitter: Duration::ZERO,
            mock_seed: None,
            default_time_range: TimeRange::LAST_15_MINUTES,
            log_format: LogFormat::Compact,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::vars().collect())
    }

    /// Build a config from an explicit variable map. Missing keys keep their
    /// defaults; present but unparsable keys are an error.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(addr) = vars.get("DASHBOARD_ADDR") {
            config.addr = addr.clone();
        }
        if let Some(port) = parse_var(&vars, "PORT")? {
            config.port = port;
        }
        if let Some(project_id) = parse_var(&vars, "PROJECT_ID")? {
            config.project_id = project_id;
        }
        if let Some(ms) = parse_var::<u64>(&vars, "MOCK_DELAY_MS")? {
            config.mock_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&vars, "MOCK_JITTER_MS")? {
            config.mock_jitter = Duration::from_millis(ms);
        }
        config.mock_seed = parse_var(&vars, "MOCK_SEED")?;
        if let Some(range) = vars.get("DEFAULT_TIME_RANGE") {
            config.default_time_range = range
                .parse()
                .map_err(|e| DashboardError::Config(format!("DEFAULT_TIME_RANGE: {e}")))?;
        }
        if let Some(format) = vars.get("LOG_FORMAT") {
            config.log_format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" | "text" => LogFormat::Compact,
                other => {
                    return Err(DashboardError::Config(format!(
                        "LOG_FORMAT must be 'json' or 'compact', got '{other}'"
                    )))
                }
            };
        }

        if config.project_id == 0 {
            return Err(DashboardError::Config("PROJECT_ID must be non-zero".into()));
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parse_var<T: FromStr>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    vars.get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| DashboardError::Config(format!("{key}='{raw}': {e}")))
        })
        .transpose()
}
