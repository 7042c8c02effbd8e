use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::catalogue::config::load_config;
use crate::catalogue::pipeline::progress_bar;
use crate::catalogue::store::{METADATA_FILENAME, ManuscriptEntry, scan_catalogue};
use crate::commands::{CommandReport, resolve_store};

#[derive(Debug, Clone, Default)]
pub struct MirrorOptions {
    pub from_dir: Option<PathBuf>,
    pub to: PathBuf,
}

const TREE_FILENAME: &str = "catalogue_tree.txt";

/// Render the mirrored layout in the same text form the catalogue's
/// maintenance scripts use: one connector per entry, directories with a
/// trailing slash.
fn render_tree(prefix: &str, entries: &[ManuscriptEntry]) -> String {
    let mut out = String::new();
    out.push_str(prefix.trim_end_matches('/'));
    out.push_str("/\n");
    for entry in entries {
        out.push_str(&format!("└── {}/\n", entry.id));
        out.push_str(&format!("│   └── {METADATA_FILENAME}\n"));
    }
    out
}

fn mirror_object_path(root: &Path, object_name: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in object_name.split('/') {
        path.push(segment);
    }
    path
}

/// Copy every manuscript's metadata object into a local tree that keeps
/// the store's layout, so the mirror can later serve as a `--from-dir`
/// source.
pub fn run(opts: &MirrorOptions) -> Result<CommandReport> {
    let cfg = load_config()?;
    let mut report = CommandReport::new("mirror");

    let store = resolve_store(&cfg, opts.from_dir.as_deref())?;
    report.detail(format!("store={}", store.describe()));
    report.detail(format!("to={}", opts.to.display()));

    let entries = scan_catalogue(store.as_ref(), &cfg.store.catalogue_prefix)?;
    report.detail(format!("manuscripts={}", entries.len()));

    let bar = progress_bar(entries.len() as u64, "mirroring metadata");
    let mut copied_bytes = 0u64;
    let mut failures = Vec::new();
    for entry in &entries {
        let object = ManuscriptEntry::metadata_name(&cfg.store.catalogue_prefix, &entry.id);
        match store.download(&object) {
            Ok(bytes) => {
                let path = mirror_object_path(&opts.to, &object);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                fs::write(&path, &bytes)
                    .with_context(|| format!("writing {}", path.display()))?;
                copied_bytes += bytes.len() as u64;
            }
            Err(err) => {
                error!(manuscript = %entry.id, "mirror failed: {err}");
                failures.push(entry.id.clone());
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    if !failures.is_empty() {
        report.issue(format!(
            "failed to mirror {} of {} manuscripts: {}",
            failures.len(),
            entries.len(),
            failures.join(", ")
        ));
    }

    let tree_path = opts.to.join(TREE_FILENAME);
    fs::create_dir_all(&opts.to).with_context(|| format!("creating {}", opts.to.display()))?;
    fs::write(&tree_path, render_tree(&cfg.store.catalogue_prefix, &entries))
        .with_context(|| format!("writing {}", tree_path.display()))?;

    report.detail(format!(
        "mirrored {} manuscripts ({copied_bytes} bytes)",
        entries.len() - failures.len()
    ));
    report.detail(format!("tree={}", tree_path.display()));
    Ok(report)
}
