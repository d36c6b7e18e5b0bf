//! Configuration for semforge.
//!
//! Reads `semforge.toml` and converts it into the plain-data options the
//! generator and analyzer consume. The core modules never read files or
//! environment variables themselves.

mod settings;

pub use settings::{
    expand_env_vars, ConnectionSettings, GenerationSettings, ModelSettings, Settings,
    SettingsError, CONFIG_FILE_NAME,
};
