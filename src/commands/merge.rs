use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use crate::catalogue::config::load_config;
use crate::catalogue::index::{SearchIndex, assemble_index, merge_index, plan_merge};
use crate::catalogue::paths::resolve_paths;
use crate::catalogue::pipeline::{load_prior_index, process_entries, progress_bar};
use crate::catalogue::store::{ManuscriptEntry, scan_catalogue};
use crate::commands::{CommandReport, PublishOptions, acquire_run_lock, publish_index, resolve_store};

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub from_dir: Option<PathBuf>,
    pub prior: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub save_local: bool,
    pub no_upload: bool,
    pub dry_run: bool,
}

pub fn run(opts: &MergeOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("merge");

    let _lock = acquire_run_lock(&paths.lock_file)?;
    let store = resolve_store(&cfg, opts.from_dir.as_deref())?;
    report.detail(format!("store={}", store.describe()));

    let entries = scan_catalogue(store.as_ref(), &cfg.store.catalogue_prefix)?;
    report.detail(format!("manuscripts={}", entries.len()));

    let prior = match &opts.prior {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("reading prior index {}", path.display()))?;
            let index = SearchIndex::parse(&bytes)
                .with_context(|| format!("parsing prior index {}", path.display()))?;
            report.detail(format!("prior={}", path.display()));
            Some(index)
        }
        None => {
            let loaded = load_prior_index(store.as_ref(), &cfg.store.index_object)?;
            if loaded.is_some() {
                report.detail(format!("prior={}", cfg.store.index_object));
            }
            loaded
        }
    };

    let publish = PublishOptions {
        output: opts.output.clone(),
        save_local: opts.save_local,
        no_upload: opts.no_upload,
    };

    let Some(prior) = prior else {
        report.detail("no prior index; running a full build");
        if opts.dry_run {
            report.detail(format!(
                "dry-run: would process {} manuscripts and publish",
                entries.len()
            ));
            return Ok(report);
        }
        let bar = progress_bar(entries.len() as u64, "processing manuscripts");
        let outcome =
            process_entries(store.as_ref(), &cfg.store.catalogue_prefix, &entries, &bar);
        if !outcome.failures.is_empty() {
            report.issue(format!(
                "failed to process {} of {} manuscripts: {}",
                outcome.failures.len(),
                entries.len(),
                outcome.failures.join(", ")
            ));
        }
        let bytes = assemble_index(outcome.processed).to_bytes()?;
        publish_index(&mut report, store.as_ref(), &cfg, &publish, &bytes)?;
        return Ok(report);
    };

    let plan = plan_merge(&prior, &entries);
    report.detail(format!(
        "new={} changed={} removed={} unchanged={}",
        plan.new_ids.len(),
        plan.changed_ids.len(),
        plan.removed_ids.len(),
        plan.unchanged_ids.len()
    ));

    if plan.is_noop() {
        report.detail("index is already up to date; nothing to publish");
        return Ok(report);
    }
    if opts.dry_run {
        report.detail(format!(
            "dry-run: would refresh {} manuscripts and publish",
            plan.refresh_ids().len()
        ));
        return Ok(report);
    }

    let refresh_ids = plan.refresh_ids();
    let subset: Vec<ManuscriptEntry> = entries
        .into_iter()
        .filter(|entry| refresh_ids.contains(&entry.id))
        .collect();

    let bar = progress_bar(subset.len() as u64, "refreshing manuscripts");
    let outcome = process_entries(store.as_ref(), &cfg.store.catalogue_prefix, &subset, &bar);
    if !outcome.failures.is_empty() {
        report.issue(format!(
            "failed to refresh {} of {} manuscripts: {}",
            outcome.failures.len(),
            subset.len(),
            outcome.failures.join(", ")
        ));
    }

    let removed: BTreeSet<String> = plan.removed_ids.iter().cloned().collect();
    let merged = merge_index(prior, outcome.processed, &removed);
    let bytes = merged.to_bytes()?;
    report.detail(format!(
        "documents={} index_bytes={}",
        merged.metadata.manuscript_count,
        bytes.len()
    ));

    publish_index(&mut report, store.as_ref(), &cfg, &publish, &bytes)?;
    Ok(report)
}
