//! Client configuration loading and `${ENV_VAR}` substitution.
//!
//! Config files: `tgwire.toml`, `tgwire.yaml`, or `tgwire.json`,
//! searched in `./` then the user config directory.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{ApiMode, ClientConfig},
};
