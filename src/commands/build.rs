use anyhow::Result;
use std::path::PathBuf;

use crate::catalogue::config::load_config;
use crate::catalogue::index::assemble_index;
use crate::catalogue::paths::resolve_paths;
use crate::catalogue::pipeline::{process_entries, progress_bar};
use crate::catalogue::store::scan_catalogue;
use crate::commands::{CommandReport, PublishOptions, acquire_run_lock, publish_index, resolve_store};

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub from_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub save_local: bool,
    pub no_upload: bool,
    pub dry_run: bool,
}

pub fn run(opts: &BuildOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("build");

    let _lock = acquire_run_lock(&paths.lock_file)?;
    let store = resolve_store(&cfg, opts.from_dir.as_deref())?;
    report.detail(format!("store={}", store.describe()));
    report.detail(format!("prefix={}", cfg.store.catalogue_prefix));
    report.detail(format!("index_object={}", cfg.store.index_object));

    let entries = scan_catalogue(store.as_ref(), &cfg.store.catalogue_prefix)?;
    report.detail(format!("manuscripts={}", entries.len()));

    if opts.dry_run {
        report.detail(format!(
            "dry-run: would process {} manuscripts and publish",
            entries.len()
        ));
        return Ok(report);
    }

    let bar = progress_bar(entries.len() as u64, "processing manuscripts");
    let outcome = process_entries(store.as_ref(), &cfg.store.catalogue_prefix, &entries, &bar);
    if !outcome.failures.is_empty() {
        report.issue(format!(
            "failed to process {} of {} manuscripts: {}",
            outcome.failures.len(),
            entries.len(),
            outcome.failures.join(", ")
        ));
    }

    let index = assemble_index(outcome.processed);
    let bytes = index.to_bytes()?;
    report.detail(format!(
        "documents={} index_bytes={}",
        index.metadata.manuscript_count,
        bytes.len()
    ));

    let publish = PublishOptions {
        output: opts.output.clone(),
        save_local: opts.save_local,
        no_upload: opts.no_upload,
    };
    publish_index(&mut report, store.as_ref(), &cfg, &publish, &bytes)?;

    Ok(report)
}
