//! Configuration loading using Figment
//!
//! Configuration is layered from:
//! 1. `config/hda_binding.toml` (or a path given on the command line)
//! 2. Environment variables prefixed with `HDA_BIND_`, with `__` between
//!    section and key, e.g. `HDA_BIND_DRIVER__SETTLE_DELAY_MS=0`
//!
//! Every field has a default, so a missing file yields a usable config.
//!
//! ```no_run
//! use hda_codec_binding::config::AppConfig;
//!
//! let config = AppConfig::load_from("config/hda_binding.toml").unwrap();
//! config.validate().unwrap();
//! println!("settle delay: {:?}", config.binding_options().settle_delay);
//! ```

use crate::binding::{BindingOptions, DEFAULT_SETTLE_DELAY};
use crate::descriptor::DRIVER_VERSION;
use crate::handle::ControllerHandle;
use crate::logging::{parse_log_level, OutputFormat};
use crate::naming::DRIVER_NAME;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "config/hda_binding.toml";

/// Environment variable prefix
pub const ENV_PREFIX: &str = "HDA_BIND_";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File or environment could not be read or deserialized
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// Unknown log level
    #[error("{0}")]
    InvalidLogLevel(String),

    /// Unknown log format
    #[error("{0}")]
    InvalidLogFormat(String),

    /// Two `[[controllers]]` entries share a handle
    #[error("duplicate controller handle: {0}")]
    DuplicateController(ControllerHandle),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Driver identity and timing
    #[serde(default)]
    pub driver: DriverConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSection,
    /// Simulated controllers for the enumeration pass
    #[serde(default)]
    pub controllers: Vec<ControllerDefinition>,
}

/// `[driver]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Name registered with the framework
    #[serde(default = "default_driver_name")]
    pub name: String,
    /// Descriptor version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Delay after a successful attach, in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: default_driver_name(),
            version: default_version(),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// trace, debug, info, warn or error
    #[serde(default = "default_log_level")]
    pub level: String,
    /// pretty, compact or json
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// One `[[controllers]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerDefinition {
    /// Controller handle
    pub handle: ControllerHandle,
    /// Codec address reported by the command interface
    #[serde(default)]
    pub address: u8,
    /// Vendor-id response word
    #[serde(default)]
    pub response: u32,
    /// Offer the codec command capability
    #[serde(default = "default_true")]
    pub expose_command: bool,
    /// Offer the location path capability
    #[serde(default = "default_true")]
    pub expose_path: bool,
    /// Fail every command with a transport error
    #[serde(default)]
    pub command_fails: bool,
    /// Location path text; derived from the handle when absent
    #[serde(default)]
    pub path: Option<String>,
}

impl ControllerDefinition {
    /// Location path text for this controller
    pub fn path_text(&self) -> String {
        self.path
            .clone()
            .unwrap_or_else(|| format!("PciRoot(0x0)/Pci(0x1B,0x{:X})", self.handle.raw()))
    }
}

fn default_driver_name() -> String {
    DRIVER_NAME.to_string()
}

fn default_version() -> u32 {
    DRIVER_VERSION
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY.as_millis() as u64
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load from `path` and the environment. A missing file is not an error.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Check values that deserialization alone cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_log_level(&self.logging.level).map_err(ConfigError::InvalidLogLevel)?;
        self.logging
            .format
            .parse::<OutputFormat>()
            .map_err(ConfigError::InvalidLogFormat)?;

        let mut handles = HashSet::new();
        for controller in &self.controllers {
            if !handles.insert(controller.handle) {
                return Err(ConfigError::DuplicateController(controller.handle));
            }
        }

        Ok(())
    }

    /// Binding tunables derived from `[driver]`
    pub fn binding_options(&self) -> BindingOptions {
        BindingOptions::default().with_settle_delay(Duration::from_millis(self.driver.settle_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();

        assert_eq!(config.driver.name, DRIVER_NAME);
        assert_eq!(config.driver.version, 0x10);
        assert_eq!(config.driver.settle_delay_ms, 10_000);
        assert_eq!(config.logging.level, "info");
        assert!(config.controllers.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_controllers_from_file() {
        let file = write_config(
            r#"
[driver]
settle_delay_ms = 0

[logging]
level = "debug"
format = "compact"

[[controllers]]
handle = 1
response = 0x10DE0040

[[controllers]]
handle = 2
expose_path = false
command_fails = true
path = "PciRoot(0x0)/Pci(0x1F,0x3)"
"#,
        );

        let config = AppConfig::load_from(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.binding_options().settle_delay, Duration::ZERO);
        assert_eq!(config.controllers.len(), 2);

        let first = &config.controllers[0];
        assert_eq!(first.handle, ControllerHandle::new(1));
        assert_eq!(first.response, 0x10DE_0040);
        assert!(first.expose_command && first.expose_path && !first.command_fails);
        assert_eq!(first.path_text(), "PciRoot(0x0)/Pci(0x1B,0x1)");

        let second = &config.controllers[1];
        assert!(!second.expose_path);
        assert!(second.command_fails);
        assert_eq!(second.path_text(), "PciRoot(0x0)/Pci(0x1F,0x3)");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let file = write_config("[driver]\nsettle_delay_ms = 500\n");

        std::env::set_var("HDA_BIND_DRIVER__SETTLE_DELAY_MS", "25");
        std::env::set_var("HDA_BIND_LOGGING__LEVEL", "trace");
        let result = AppConfig::load_from(file.path());
        std::env::remove_var("HDA_BIND_DRIVER__SETTLE_DELAY_MS");
        std::env::remove_var("HDA_BIND_LOGGING__LEVEL");

        let config = result.unwrap();
        assert_eq!(config.driver.settle_delay_ms, 25);
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    #[serial]
    fn test_malformed_file_fails_to_load() {
        let file = write_config("[driver]\nsettle_delay_ms = \"soon\"\n");
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::Load(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_logging() {
        let mut config = AppConfig::default();
        config.logging.level = "chatty".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogLevel(_))));

        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLogFormat(_))));
    }

    #[test]
    fn test_validate_rejects_duplicate_handles() {
        let controller = ControllerDefinition {
            handle: ControllerHandle::new(3),
            address: 0,
            response: 0,
            expose_command: true,
            expose_path: true,
            command_fails: false,
            path: None,
        };
        let config = AppConfig {
            controllers: vec![controller.clone(), controller],
            ..Default::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateController(h)) if h == ControllerHandle::new(3)
        ));
    }
}
