use {
    secrecy::Secret,
    std::path::{Path, PathBuf},
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::ClientConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["tgwire.toml", "tgwire.yaml", "tgwire.yml", "tgwire.json"];

/// Environment variable overriding the configured token.
pub const TOKEN_ENV: &str = "TGWIRE_TOKEN";

/// Environment variable overriding the configured API root.
pub const API_ROOT_ENV: &str = "TGWIRE_API_ROOT";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ClientConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply
/// environment overrides.
///
/// Search order:
/// 1. `./tgwire.{toml,yaml,yml,json}` (project-local)
/// 2. `<user config dir>/tgwire/tgwire.{toml,yaml,yml,json}`
///
/// Falls back to `ClientConfig::default()` if nothing is found or the file
/// fails to parse.
pub fn discover_and_load() -> ClientConfig {
    let config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            load_config(&path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                ClientConfig::default()
            })
        },
        None => {
            debug!("no config file found, using defaults");
            ClientConfig::default()
        },
    };
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

/// Overrides token and API root from the environment when set.
pub fn apply_env_overrides(
    mut config: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
        debug!("token taken from {TOKEN_ENV}");
        config.token = Secret::new(token);
    }
    if let Some(root) = lookup(API_ROOT_ENV).filter(|r| !r.is_empty()) {
        config.api_root = root;
    }
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }
    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tgwire").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ClientConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
