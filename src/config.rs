//! Configuration for the `unready` binary.
//!
//! Defines named mocks, their simulated latency and global defaults.

use crate::resolver::MockSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Main configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct UnreadyConfig {
    /// Named mock definitions
    #[serde(default)]
    pub mocks: Vec<MockDefinition>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,
}

impl UnreadyConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for (i, mock) in self.mocks.iter().enumerate() {
            mock.validate()
                .map_err(|e| anyhow::anyhow!("Mock {}: {}", i, e))?;
            if !seen.insert(mock.id.as_str()) {
                anyhow::bail!("Mock {}: duplicate id '{}'", i, mock.id);
            }
        }
        Ok(())
    }

    /// Look up a mock by id.
    pub fn find(&self, id: &str) -> Option<&MockDefinition> {
        self.mocks.iter().find(|m| m.id == id)
    }

    /// Delay for a call against `mock`, falling back to the global default.
    pub fn delay_for(&self, mock: Option<&MockDefinition>) -> Duration {
        let delay_ms = mock
            .and_then(|m| m.delay.as_ref())
            .map(DelayConfig::calculate)
            .unwrap_or(self.settings.default_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// A single named mock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockDefinition {
    /// Unique identifier for this mock
    pub id: String,

    /// Optional name/description
    #[serde(default)]
    pub name: Option<String>,

    /// Success body
    #[serde(default)]
    pub success: Option<Value>,

    /// Error body
    #[serde(default)]
    pub error: Option<Value>,

    /// Explicit status code
    #[serde(default)]
    pub status: Option<u16>,

    /// Latency simulation
    #[serde(default)]
    pub delay: Option<DelayConfig>,
}

impl MockDefinition {
    /// Validate the mock definition.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.id.is_empty() {
            anyhow::bail!("Mock id cannot be empty");
        }
        if let Some(delay) = &self.delay {
            delay.validate()?;
        }
        Ok(())
    }

    /// The mock as a resolver spec.
    pub fn spec(&self) -> MockSpec {
        MockSpec {
            success: self.success.clone(),
            error: self.error.clone(),
            status: self.status,
        }
    }
}

/// Delay/latency simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DelayConfig {
    /// Fixed delay in milliseconds
    #[serde(default)]
    pub fixed_ms: u64,

    /// Minimum delay for random range (ms)
    #[serde(default)]
    pub min_ms: u64,

    /// Maximum delay for random range (ms)
    #[serde(default)]
    pub max_ms: u64,
}

impl DelayConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fixed_ms == 0 && self.max_ms != 0 && self.max_ms < self.min_ms {
            anyhow::bail!(
                "Invalid delay range: min_ms {} > max_ms {}",
                self.min_ms,
                self.max_ms
            );
        }
        Ok(())
    }

    /// Calculate the actual delay to apply.
    pub fn calculate(&self) -> u64 {
        if self.fixed_ms > 0 {
            return self.fixed_ms;
        }
        if self.max_ms > self.min_ms {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            return rng.gen_range(self.min_ms..=self.max_ms);
        }
        self.min_ms
    }
}

/// Which API shape the binary simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Fetch,
    Client,
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Delay for mocks without their own delay (ms)
    #[serde(default = "default_delay_ms")]
    pub default_delay_ms: u64,

    /// API shape used when the command line does not pick one
    #[serde(default)]
    pub default_style: Style,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_delay_ms: default_delay_ms(),
            default_style: Style::default(),
        }
    }
}

fn default_delay_ms() -> u64 {
    crate::scheduler::DEFAULT_DELAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_simple_mock() {
        let yaml = r#"
mocks:
  - id: user
    success:
      data:
        id: 1
        name: Test
"#;
        let config: UnreadyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mocks.len(), 1);
        assert_eq!(config.mocks[0].id, "user");
        assert_eq!(config.settings.default_delay_ms, 1000);
        assert_eq!(config.settings.default_style, Style::Fetch);

        let spec = config.mocks[0].spec();
        assert_eq!(spec.success, Some(json!({"data": {"id": 1, "name": "Test"}})));
        assert_eq!(spec.status, None);
    }

    #[test]
    fn test_parse_error_mock_with_settings() {
        let yaml = r#"
mocks:
  - id: bad-email
    name: Validation failure
    status: 422
    error:
      message: "Email is required"
settings:
  default_delay_ms: 250
  default_style: client
"#;
        let config: UnreadyConfig = serde_yaml::from_str(yaml).unwrap();
        let mock = config.find("bad-email").unwrap();
        assert_eq!(mock.status, Some(422));
        assert_eq!(mock.name.as_deref(), Some("Validation failure"));
        assert_eq!(config.settings.default_style, Style::Client);
        assert_eq!(config.delay_for(Some(mock)), Duration::from_millis(250));
        assert!(config.find("missing").is_none());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
mocks:
  - id: typo
    succes: {}
"#;
        assert!(serde_yaml::from_str::<UnreadyConfig>(yaml).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
mocks:
  - id: same
  - id: same
"#;
        let config: UnreadyConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate id"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let yaml = r#"
mocks:
  - id: ""
"#;
        let config: UnreadyConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delay_calculation() {
        let fixed = DelayConfig {
            fixed_ms: 100,
            min_ms: 0,
            max_ms: 0,
        };
        assert_eq!(fixed.calculate(), 100);

        let range = DelayConfig {
            fixed_ms: 0,
            min_ms: 50,
            max_ms: 150,
        };
        let delay = range.calculate();
        assert!((50..=150).contains(&delay));

        let inverted = DelayConfig {
            fixed_ms: 0,
            min_ms: 150,
            max_ms: 50,
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_mock_delay_overrides_default() {
        let yaml = r#"
mocks:
  - id: slow
    delay:
      fixed_ms: 3000
"#;
        let config: UnreadyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.delay_for(config.find("slow")),
            Duration::from_millis(3000)
        );
        assert_eq!(config.delay_for(None), Duration::from_millis(1000));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "mocks:\n  - id: created\n    status: 201\n    success:\n      ok: true"
        )
        .unwrap();

        let config = UnreadyConfig::from_file(file.path()).unwrap();
        assert_eq!(config.find("created").unwrap().status, Some(201));
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mocks:\n  - id: \"\"").unwrap();

        assert!(UnreadyConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_bundled_default_config_is_valid() {
        let config: UnreadyConfig =
            serde_yaml::from_str(include_str!("../demos/default-config.yaml")).unwrap();
        config.validate().unwrap();
        assert!(!config.mocks.is_empty());
    }
}
