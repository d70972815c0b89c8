//! Client configuration
//!
//! Layered, lowest precedence first:
//! - built-in defaults (`ClientConfig::default()`)
//! - user file (`~/.config/omnimcp/config.yaml`)
//! - workspace file (`.config/omnimcp/config.yaml`) or an explicit path
//! - environment variables

mod settings;
mod file;

pub use settings::{ClientConfig, ConfigError, ConfigResult};
pub use file::{FileConfigProvider, ConfigFile, ConfigLevel};
