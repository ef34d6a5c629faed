//! Configuration for the roulette relay.
//!
//! Loaded from a TOML file; every field has a default so an empty or
//! missing file yields a working setup.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{DispatchConfig, LoggingConfig, RouletteConfig, ServerConfig};
pub use toml_loader::{default_config_path, load_default, load_from_path};
pub use validation::validate;
