use serde::Deserialize;
use sidera::EngineSettings;
use std::fs;
use std::path::{Path, PathBuf};

/// Relative locations tried when no explicit path is given, for running from
/// the workspace root or from a crate directory.
pub const ENGINE_TOML_PATHS: [&str; 2] = ["configs/engine.toml", "../../configs/engine.toml"];

#[derive(Debug, Clone, Deserialize)]
struct RootConfigToml {
    #[serde(default)]
    engine: Option<EngineSettings>,
}

/// First of the `ENGINE_TOML_PATHS`, resolved against `base`, that exists.
pub fn find_engine_toml(base: &Path) -> Option<PathBuf> {
    ENGINE_TOML_PATHS
        .iter()
        .map(|p| base.join(p))
        .find(|p| p.is_file())
}

/// Parse and validate the `[engine]` table of a config file.
pub fn parse_engine_settings(text: &str) -> anyhow::Result<EngineSettings> {
    let root: RootConfigToml = toml::from_str(text)
        .map_err(|e| anyhow::anyhow!("Failed to parse engine.toml: {e}"))?;
    let settings = root
        .engine
        .ok_or_else(|| anyhow::anyhow!("Missing [engine] table in engine.toml"))?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid [engine] settings: {e}"))?;
    Ok(settings)
}

/// Settings from the config file found under `base`, `None` when there is
/// no file. A file that exists but cannot be read, parsed or validated is an
/// error.
pub fn load_engine_settings_in(base: &Path) -> anyhow::Result<Option<EngineSettings>> {
    find_engine_toml(base)
        .map(|path| load_engine_settings_from(&path))
        .transpose()
}

pub fn load_engine_settings_from(path: &Path) -> anyhow::Result<EngineSettings> {
    if !path.exists() {
        anyhow::bail!("Engine config does not exist: {}", path.display());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    parse_engine_settings(&text)
}
