use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScriptoriumPaths {
    pub scriptorium_home: PathBuf,
    pub config_file: PathBuf,
    pub lock_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<ScriptoriumPaths> {
    // The home directory is only needed when the override is absent.
    let scriptorium_home = match env::var("SCRIPTORIUM_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".scriptorium"),
    };

    let config_file = env_or_default_path(
        "SCRIPTORIUM_CONFIG_PATH",
        scriptorium_home.join("scriptorium.toml"),
    );
    let lock_file = scriptorium_home.join("run.lock");

    Ok(ScriptoriumPaths {
        scriptorium_home,
        config_file,
        lock_file,
    })
}

#[cfg(test)]
mod tests {
    use super::env_or_default_path;
    use std::path::PathBuf;

    #[test]
    fn blank_env_value_falls_back() {
        // Key that no test environment sets.
        let got = env_or_default_path("NO_SUCH_PATH_VAR", PathBuf::from("/fallback"));
        assert_eq!(got, PathBuf::from("/fallback"));
    }
}
