pub mod build;
pub mod inspect;
pub mod merge;
pub mod mirror;
pub mod status;

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalogue::config::ScriptoriumConfig;
use crate::catalogue::index;
use crate::catalogue::pipeline;
use crate::catalogue::store::{CatalogueStore, GcsStore, LocalStore};

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Pick the store a command talks to: a local directory tree when
/// `--from-dir` is given, the configured GCS bucket otherwise.
pub fn resolve_store(
    cfg: &ScriptoriumConfig,
    from_dir: Option<&Path>,
) -> Result<Box<dyn CatalogueStore>> {
    if let Some(dir) = from_dir {
        return Ok(Box::new(LocalStore::new(dir)));
    }
    if cfg.store.bucket.is_empty() {
        bail!("no bucket configured; set GCS_BUCKET_NAME or store.bucket in scriptorium.toml");
    }
    let token = std::env::var("GCS_BEARER_TOKEN")
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let store = GcsStore::new(&cfg.store.bucket, &cfg.store.endpoint, token)
        .context("building GCS client")?;
    Ok(Box::new(store))
}

/// Held for the duration of a `build` or `merge` run. The lock releases
/// when dropped; the file itself stays behind.
#[derive(Debug)]
pub struct RunLock {
    _file: fs::File,
}

pub fn acquire_run_lock(lock_path: &Path) -> Result<RunLock> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(lock_path)
        .with_context(|| format!("opening {}", lock_path.display()))?;
    if file.try_lock_exclusive().is_err() {
        bail!(
            "another index run holds the lock at {}",
            lock_path.display()
        );
    }
    file.set_len(0)?;
    use std::io::Write;
    writeln!(&file, "{}", std::process::id())?;
    Ok(RunLock { _file: file })
}

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub output: Option<PathBuf>,
    pub save_local: bool,
    pub no_upload: bool,
}

/// Publish a serialized index: local copy first (when requested), then
/// the store upload, so a failed upload never costs the processed run.
pub fn publish_index(
    report: &mut CommandReport,
    store: &dyn CatalogueStore,
    cfg: &ScriptoriumConfig,
    opts: &PublishOptions,
    bytes: &[u8],
) -> Result<()> {
    let local_path = match &opts.output {
        Some(path) => Some(path.clone()),
        None if opts.save_local || cfg.output.save_local_copy => {
            Some(PathBuf::from(&cfg.output.local_path))
        }
        None => None,
    };
    if let Some(path) = local_path {
        index::write_local_copy(bytes, &path)?;
        report.detail(format!("local_copy={}", path.display()));
    }

    if opts.no_upload {
        report.detail("upload skipped (--no-upload)");
        return Ok(());
    }
    let stored = pipeline::upload_index(store, &cfg.store.index_object, bytes)?;
    report.detail(format!(
        "uploaded {stored} bytes to {}",
        cfg.store.index_object
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::config::ScriptoriumConfig;

    #[test]
    fn report_collects_details_and_issues() {
        let mut report = CommandReport::new("build");
        report.detail("manuscripts=3");
        assert!(report.ok);
        report.issue("no bucket configured");
        assert!(!report.ok);
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn from_dir_selects_the_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ScriptoriumConfig::default();
        let store = resolve_store(&cfg, Some(dir.path())).unwrap();
        assert!(store.describe().starts_with("local:"));
    }

    #[test]
    fn gcs_store_requires_a_bucket() {
        let cfg = ScriptoriumConfig::default();
        let err = resolve_store(&cfg, None).unwrap_err();
        assert!(err.to_string().contains("GCS_BUCKET_NAME"));
    }

    #[test]
    fn second_lock_acquisition_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("run.lock");

        let held = acquire_run_lock(&lock_path).unwrap();
        let err = acquire_run_lock(&lock_path).unwrap_err();
        assert!(err.to_string().contains("another index run"));

        drop(held);
        acquire_run_lock(&lock_path).unwrap();
    }
}
