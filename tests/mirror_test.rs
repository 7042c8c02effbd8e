use predicates::str::contains;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn seed_manuscript(root: &Path, id: &str, title: &str) {
    let dir = root.join("catalogue").join(id);
    fs::create_dir_all(&dir).expect("mkdir manuscript");
    let metadata = format!(
        r#"{{"title": "{title}", "languages": ["Latin"], "contents_summary": "A {title}."}}"#
    );
    fs::write(dir.join("standard_metadata.json"), metadata).expect("write metadata");
}

#[test]
fn mirror_copies_metadata_and_renders_the_tree() {
    let tmp = tempdir().expect("tempdir");
    seed_manuscript(tmp.path(), "ms-alpha", "Psalter");
    seed_manuscript(tmp.path(), "ms-beta", "Gradual");

    let mirror = tmp.path().join("mirror");
    assert_cmd::cargo::cargo_bin_cmd!("scriptorium-index")
        .current_dir(tmp.path())
        .env("SCRIPTORIUM_HOME", tmp.path().join("home"))
        .arg("mirror")
        .arg(mirror.to_str().expect("utf8 path"))
        .args(["--from-dir", tmp.path().to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(contains("mirrored 2 manuscripts"));

    let copied = mirror.join("catalogue/ms-alpha/standard_metadata.json");
    let original = tmp.path().join("catalogue/ms-alpha/standard_metadata.json");
    assert_eq!(
        fs::read(&copied).expect("read copy"),
        fs::read(&original).expect("read original")
    );

    let tree = fs::read_to_string(mirror.join("catalogue_tree.txt")).expect("read tree");
    assert!(tree.starts_with("catalogue/\n"));
    assert!(tree.contains("└── ms-alpha/"));
    assert!(tree.contains("│   └── standard_metadata.json"));
}

#[test]
fn a_mirror_is_a_valid_from_dir_source() {
    let tmp = tempdir().expect("tempdir");
    seed_manuscript(tmp.path(), "ms-alpha", "Psalter");
    seed_manuscript(tmp.path(), "ms-beta", "Gradual");

    let mirror = tmp.path().join("mirror");
    assert_cmd::cargo::cargo_bin_cmd!("scriptorium-index")
        .current_dir(tmp.path())
        .env("SCRIPTORIUM_HOME", tmp.path().join("home"))
        .arg("mirror")
        .arg(mirror.to_str().expect("utf8 path"))
        .args(["--from-dir", tmp.path().to_str().expect("utf8 path")])
        .assert()
        .success();

    let out = tmp.path().join("index.json");
    assert_cmd::cargo::cargo_bin_cmd!("scriptorium-index")
        .current_dir(tmp.path())
        .env("SCRIPTORIUM_HOME", tmp.path().join("home"))
        .arg("build")
        .args(["--from-dir", mirror.to_str().expect("utf8 path")])
        .args(["--output", out.to_str().expect("utf8 path")])
        .arg("--no-upload")
        .assert()
        .success()
        .stdout(contains("manuscripts=2"));

    let raw = fs::read_to_string(&out).expect("read index");
    let index: serde_json::Value = serde_json::from_str(&raw).expect("parse index");
    assert_eq!(index["metadata"]["manuscriptCount"], 2);
}

#[test]
fn status_reports_configuration_and_environment() {
    let tmp = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("scriptorium-index")
        .current_dir(tmp.path())
        .env("SCRIPTORIUM_HOME", tmp.path().join("home"))
        .env_remove("GCS_BUCKET_NAME")
        .arg("status")
        .assert()
        .success()
        .stdout(contains("bucket=<unset>"))
        .stdout(contains("prefix=catalogue/"))
        .stdout(contains("env GCS_BUCKET_NAME=unset"));
}

#[test]
fn status_probe_finds_a_published_index() {
    let tmp = tempdir().expect("tempdir");
    seed_manuscript(tmp.path(), "ms-alpha", "Psalter");
    seed_manuscript(tmp.path(), "ms-beta", "Gradual");
    seed_manuscript(tmp.path(), "ms-gamma", "Herbal");

    assert_cmd::cargo::cargo_bin_cmd!("scriptorium-index")
        .current_dir(tmp.path())
        .env("SCRIPTORIUM_HOME", tmp.path().join("home"))
        .arg("build")
        .args(["--from-dir", tmp.path().to_str().expect("utf8 path")])
        .assert()
        .success();

    assert_cmd::cargo::cargo_bin_cmd!("scriptorium-index")
        .current_dir(tmp.path())
        .env("SCRIPTORIUM_HOME", tmp.path().join("home"))
        .arg("status")
        .arg("--probe")
        .args(["--from-dir", tmp.path().to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(contains("probe: index present"));
}
