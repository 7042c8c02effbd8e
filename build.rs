use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// Prefixes of environment keys the status command reports on. Keys are
// harvested from the source tree so the report never goes stale.
const ENV_KEY_PREFIXES: &[&str] = &["SCRIPTORIUM_", "GCS_", "INDEX_OUTPUT", "SAVE_LOCAL"];

fn rust_sources(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut stack = vec![root.to_path_buf()];
    let mut files = Vec::new();
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                files.push(path);
            }
        }
    }
    Ok(files)
}

fn harvest_env_keys(root: &Path) -> std::io::Result<BTreeSet<String>> {
    let mut keys = BTreeSet::new();
    for file in rust_sources(root)? {
        let Ok(source) = fs::read_to_string(&file) else {
            continue;
        };
        let tokens =
            source.split(|c: char| !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'));
        for token in tokens {
            let recognized = ENV_KEY_PREFIXES
                .iter()
                .any(|prefix| token.starts_with(prefix) && token.len() > prefix.len());
            if recognized {
                keys.insert(token.to_string());
            }
        }
    }
    Ok(keys)
}

fn main() {
    let keys = harvest_env_keys(Path::new("src")).expect("scanning src for env keys");

    let mut generated = String::from("pub const GENERATED_ENV_ALLOWLIST: &[&str] = &[\n");
    for key in &keys {
        generated.push_str("    \"");
        generated.push_str(key);
        generated.push_str("\",\n");
    }
    generated.push_str("];\n");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("env_allowlist.rs"), generated)
        .expect("writing env allowlist");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
}
