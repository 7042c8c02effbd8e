use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use super::store::{CATALOGUE_PREFIX, DEFAULT_GCS_ENDPOINT, INDEX_OBJECT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub bucket: String,
    pub endpoint: String,
    pub catalogue_prefix: String,
    pub index_object: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: DEFAULT_GCS_ENDPOINT.to_string(),
            catalogue_prefix: CATALOGUE_PREFIX.to_string(),
            index_object: INDEX_OBJECT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub local_path: String,
    pub save_local_copy: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            local_path: "./public/search-index.json".to_string(),
            save_local_copy: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScriptoriumConfig {
    pub store: StoreConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialScriptoriumConfig {
    store: Option<StoreConfig>,
    output: Option<OutputConfig>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &ScriptoriumConfig) -> Result<()> {
    if cfg.store.endpoint.trim().is_empty() {
        return Err(anyhow!("invalid store endpoint: cannot be empty"));
    }
    if !cfg.store.catalogue_prefix.ends_with('/') {
        return Err(anyhow!("invalid catalogue prefix: must end with `/`"));
    }
    if cfg.store.index_object.trim().is_empty() || cfg.store.index_object.ends_with('/') {
        return Err(anyhow!(
            "invalid index object name: must be a non-empty object path"
        ));
    }
    if cfg.output.local_path.trim().is_empty() {
        return Err(anyhow!("invalid local output path: cannot be empty"));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    super::paths::resolve_paths()
        .ok()
        .map(|paths| paths.config_file)
}

fn merge_file_config(base: &mut ScriptoriumConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialScriptoriumConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse config {}: {err}", path.display()))?;
    if let Some(store) = parsed.store {
        base.store = store;
    }
    if let Some(output) = parsed.output {
        base.output = output;
    }
    Ok(())
}

/// Layered configuration: built-in defaults, then the TOML file named by
/// `SCRIPTORIUM_CONFIG_PATH` (default `~/.scriptorium/scriptorium.toml`),
/// then environment overrides.
pub fn load_config() -> Result<ScriptoriumConfig> {
    let mut cfg = ScriptoriumConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.store.bucket = env_or_string("GCS_BUCKET_NAME", &cfg.store.bucket);
    cfg.store.endpoint = env_or_string("GCS_ENDPOINT", &cfg.store.endpoint);
    cfg.store.catalogue_prefix = env_or_string(
        "SCRIPTORIUM_CATALOGUE_PREFIX",
        &cfg.store.catalogue_prefix,
    );
    cfg.store.index_object = env_or_string("SCRIPTORIUM_INDEX_OBJECT", &cfg.store.index_object);
    cfg.output.local_path = env_or_string("INDEX_OUTPUT_PATH", &cfg.output.local_path);
    cfg.output.save_local_copy = env_or_bool("SAVE_LOCAL_COPY", cfg.output.save_local_copy);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let cfg = ScriptoriumConfig::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.store.catalogue_prefix, "catalogue/");
        assert_eq!(cfg.store.index_object, "catalogue/search-index.json");
        assert!(!cfg.output.save_local_copy);
    }

    #[test]
    fn prefix_without_trailing_slash_is_rejected() {
        let mut cfg = ScriptoriumConfig::default();
        cfg.store.catalogue_prefix = "catalogue".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn index_object_must_name_an_object() {
        let mut cfg = ScriptoriumConfig::default();
        cfg.store.index_object = "catalogue/".to_string();
        assert!(validate(&cfg).is_err());

        cfg.store.index_object = String::new();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn partial_toml_merges_section_by_section() {
        let raw = r#"
            [store]
            bucket = "manuscripts-prod"
            endpoint = "https://storage.googleapis.com"
            catalogue_prefix = "catalogue/"
            index_object = "catalogue/search-index.json"
        "#;
        let parsed: PartialScriptoriumConfig = toml::from_str(raw).unwrap();
        let mut cfg = ScriptoriumConfig::default();
        if let Some(store) = parsed.store {
            cfg.store = store;
        }
        assert_eq!(cfg.store.bucket, "manuscripts-prod");
        // Untouched sections keep their defaults.
        assert_eq!(cfg.output.local_path, "./public/search-index.json");
    }
}
