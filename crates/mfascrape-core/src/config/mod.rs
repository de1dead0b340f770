//! Unified configuration layer.
//!
//! Every environment-variable read lives here; the rest of the workspace goes
//! through the typed structs instead of calling `std::env::var` directly.
//!
//! - `loader`: `env_or`, `env_optional`, `env_bool`, `env_list` helpers and `.env` loading
//! - `schema`: `ProjectConfig`, `StyleConfig`, `ScrapeConfig`, `ObservabilityConfig`
//! - `env_keys`: key constants (with legacy aliases)

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_list, env_optional, env_or, load_dotenv, load_dotenv_from_dir};
pub use schema::{
    ConfigError, ObservabilityConfig, ProjectConfig, ScrapeConfig, StyleConfig, VerifyPolicy,
};
