use anyhow::Context;
use hydromon_alert::{Threshold, ThresholdTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Directory holding `parameter_logs.db`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Log entries kept in process for `/v1/alerts/history`. Older entries
    /// are served from the store via `/v1/logs`.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default)]
    pub id: IdConfig,
    /// Safe ranges in evaluation order. Empty means the built-in
    /// hydroponics defaults.
    #[serde(default)]
    pub thresholds: Vec<Threshold>,
}

/// Snowflake generator coordinates, each in `0..32`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default = "default_machine_id")]
    pub machine_id: i32,
    #[serde(default = "default_node_id")]
    pub node_id: i32,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            machine_id: default_machine_id(),
            node_id: default_node_id(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_history_capacity() -> usize {
    hydromon_alert::history::DEFAULT_HISTORY_CAPACITY
}

fn default_machine_id() -> i32 {
    1
}

fn default_node_id() -> i32 {
    1
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            history_capacity: default_history_capacity(),
            id: IdConfig::default(),
            thresholds: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file '{path}'"))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        if !(0..32).contains(&config.id.machine_id) || !(0..32).contains(&config.id.node_id) {
            anyhow::bail!(
                "id.machine_id and id.node_id must be in 0..32 (got {}/{})",
                config.id.machine_id,
                config.id.node_id
            );
        }
        Ok(config)
    }

    /// Builds the validated threshold table.
    pub fn threshold_table(&self) -> anyhow::Result<ThresholdTable> {
        if self.thresholds.is_empty() {
            return Ok(ThresholdTable::default());
        }
        Ok(ThresholdTable::new(self.thresholds.clone())?)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.http_port)
    }
}
