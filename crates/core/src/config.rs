use serde::Deserialize;

use crate::error::{InsightsError, InsightsResult};

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `CHANNEL_INSIGHTS__`; environment
/// values win.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub channels: ChannelsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Path of the export to load. Required; there is no default file.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelsConfig {
    #[serde(default = "default_paid_channels")]
    pub paid: Vec<String>,
    #[serde(default = "default_owned_channels")]
    pub owned: Vec<String>,
    /// Show channels outside both lists in their own view.
    #[serde(default = "default_surface_unclassified")]
    pub surface_unclassified: bool,
}

// Default functions
fn default_delimiter() -> String {
    ";".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_paid_channels() -> Vec<String> {
    ["Paid Search - Generic", "Paid Shopping", "Paid Social", "Performance Max"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_owned_channels() -> Vec<String> {
    [
        "Direct",
        "Display",
        "Email",
        "Organic Search",
        "Other",
        "Social",
        "Affiliates",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_surface_unclassified() -> bool {
    true
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            delimiter: default_delimiter(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            paid: default_paid_channels(),
            owned: default_owned_channels(),
            surface_unclassified: default_surface_unclassified(),
        }
    }
}

impl DataConfig {
    /// The configured export path, or a configuration error if none was given.
    pub fn require_path(&self) -> InsightsResult<&str> {
        self.path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                InsightsError::Config(
                    "no data file configured; pass --data or set CHANNEL_INSIGHTS__DATA__PATH"
                        .to_string(),
                )
            })
    }

    /// The field delimiter as a single byte.
    pub fn delimiter_byte(&self) -> InsightsResult<u8> {
        match self.delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(InsightsError::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file overlaid with
    /// environment variables.
    pub fn load_from(file: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::with_name(path).format(config::FileFormat::Toml),
            );
        }
        builder = builder.add_source(
            config::Environment::with_prefix("CHANNEL_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("channels.paid")
                .with_list_parse_key("channels.owned"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.data.delimiter_byte().unwrap(), b';');
        assert_eq!(config.api.http_port, 8080);
        assert_eq!(config.channels.paid.len(), 4);
        assert_eq!(config.channels.owned.len(), 7);
        assert!(config.channels.surface_unclassified);
    }

    #[test]
    fn test_missing_path_is_config_error() {
        let config = DataConfig::default();
        assert!(matches!(config.require_path(), Err(InsightsError::Config(_))));
    }

    #[test]
    fn test_bad_delimiter() {
        let config = DataConfig {
            path: None,
            delimiter: ";;".to_string(),
        };
        assert!(config.delimiter_byte().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[data]\npath = \"export.csv\"\n\n[api]\nhttp_port = 9000\n\n[channels]\npaid = [\"Paid Social\"]"
        )
        .unwrap();

        let config = AppConfig::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.data.require_path().unwrap(), "export.csv");
        assert_eq!(config.api.http_port, 9000);
        assert_eq!(config.channels.paid, vec!["Paid Social".to_string()]);
        assert_eq!(config.channels.owned.len(), 7);
    }
}
