use anyhow::Result;
use std::path::PathBuf;

use crate::catalogue::config::load_config;
use crate::catalogue::paths::resolve_paths;
use crate::commands::{CommandReport, resolve_store};

include!(concat!(env!("OUT_DIR"), "/env_allowlist.rs"));

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    pub from_dir: Option<PathBuf>,
    pub probe: bool,
}

pub fn run(opts: &StatusOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("status");

    report.detail(format!(
        "scriptorium_home={}",
        paths.scriptorium_home.display()
    ));
    report.detail(format!(
        "config_file={} ({})",
        paths.config_file.display(),
        if paths.config_file.exists() {
            "present"
        } else {
            "absent"
        }
    ));
    report.detail(format!("lock_file={}", paths.lock_file.display()));

    let bucket = if cfg.store.bucket.is_empty() {
        "<unset>"
    } else {
        cfg.store.bucket.as_str()
    };
    report.detail(format!("bucket={bucket}"));
    report.detail(format!("endpoint={}", cfg.store.endpoint));
    report.detail(format!("prefix={}", cfg.store.catalogue_prefix));
    report.detail(format!("index_object={}", cfg.store.index_object));
    report.detail(format!("local_path={}", cfg.output.local_path));
    report.detail(format!(
        "save_local_copy={}",
        cfg.output.save_local_copy
    ));

    for key in GENERATED_ENV_ALLOWLIST {
        let state = if std::env::var_os(key).is_some() {
            "set"
        } else {
            "unset"
        };
        report.detail(format!("env {key}={state}"));
    }

    if opts.probe {
        probe_store(&mut report, &cfg, opts.from_dir.as_deref());
    }

    Ok(report)
}

/// One bounded listing against the configured store: proves the bucket
/// answers and says whether an index has been published.
fn probe_store(
    report: &mut CommandReport,
    cfg: &crate::catalogue::config::ScriptoriumConfig,
    from_dir: Option<&std::path::Path>,
) {
    let store = match resolve_store(cfg, from_dir) {
        Ok(store) => store,
        Err(err) => {
            report.issue(format!("probe failed: {err:#}"));
            return;
        }
    };
    match store.list(&cfg.store.index_object) {
        Ok(objects) => {
            report.detail(format!("probe: {} answers", store.describe()));
            match objects
                .iter()
                .find(|object| object.name == cfg.store.index_object)
            {
                Some(object) => {
                    report.detail(format!("probe: index present ({} bytes)", object.size));
                }
                None => report.detail("probe: no index published yet"),
            }
        }
        Err(err) => report.issue(format!(
            "probe failed: {} did not answer: {err}",
            store.describe()
        )),
    }
}
