//! Object storage behind the catalogue: Google Cloud Storage in production,
//! a plain directory tree for offline runs and tests.
//!
//! Store operations are whole-object reads and writes; nothing here streams.
//! The GCS client talks to the JSON API directly so the endpoint can point
//! at an emulator.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::blocking::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use super::document::PageStats;
use crate::error::StoreError;

pub const CATALOGUE_PREFIX: &str = "catalogue/";
pub const METADATA_FILENAME: &str = "standard_metadata.json";
pub const TRANSCRIPTION_FILENAME: &str = "transcription.json";
pub const INDEX_OBJECT: &str = "catalogue/search-index.json";
pub const INDEX_CONTENT_TYPE: &str = "application/json";
pub const INDEX_CACHE_CONTROL: &str = "public, max-age=3600";

pub const DEFAULT_GCS_ENDPOINT: &str = "https://storage.googleapis.com";

const REQUEST_TIMEOUT_SECS: u64 = 60;
// Index uploads can be tens of megabytes on a slow uplink.
const UPLOAD_TIMEOUT_SECS: u64 = 300;

/// One listed object. `fingerprint` is the store's content identity: the
/// GCS `md5Hash`, or a SHA-256 digest for local trees. Incremental merges
/// compare fingerprints, never timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub name: String,
    pub fingerprint: String,
    pub size: u64,
}

pub trait CatalogueStore: std::fmt::Debug {
    /// Human-readable target for logs and reports, e.g. `gs://bucket`.
    fn describe(&self) -> String;

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError>;

    fn download(&self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Write an object, returning the byte count. Published objects carry
    /// the catalogue cache policy where the store supports one.
    fn upload(&self, name: &str, bytes: &[u8], content_type: &str) -> Result<u64, StoreError>;
}

// '/' must be encoded too when an object name rides in the URL path.
const OBJECT_NAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode_object_name(name: &str) -> String {
    utf8_percent_encode(name, OBJECT_NAME_SET).to_string()
}

#[derive(Debug)]
pub struct GcsStore {
    bucket: String,
    endpoint: String,
    token: Option<String>,
    client: Client,
}

impl GcsStore {
    pub fn new(bucket: &str, endpoint: &str, token: Option<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            bucket: bucket.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn authorized(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check(
        name: &str,
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, StoreError> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(StoreError::Response(format!("{name}: {status} {snippet}")));
        }
        Ok(response)
    }
}

impl CatalogueStore for GcsStore {
    fn describe(&self) -> String {
        format!("gs://{}", self.bucket)
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        let url = format!("{}/storage/v1/b/{}/o", self.endpoint, self.bucket);
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).query(&[
                ("prefix", prefix),
                ("fields", "items(name,md5Hash,size),nextPageToken"),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }
            let response = Self::check(&self.bucket, self.authorized(request).send()?)?;
            let payload: Value = response.json()?;

            if let Some(items) = payload.get("items").and_then(Value::as_array) {
                for item in items {
                    let Some(name) = item.get("name").and_then(Value::as_str) else {
                        continue;
                    };
                    let fingerprint = item
                        .get("md5Hash")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string();
                    // The JSON API serializes sizes as decimal strings.
                    let size = item
                        .get("size")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse().ok())
                        .or_else(|| item.get("size").and_then(Value::as_u64))
                        .unwrap_or(0);
                    objects.push(ObjectInfo {
                        name: name.to_string(),
                        fingerprint,
                        size,
                    });
                }
            }

            match payload.get("nextPageToken").and_then(Value::as_str) {
                Some(token) => page_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(objects)
    }

    fn download(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let url = format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            self.bucket,
            encode_object_name(name)
        );
        let request = self.client.get(&url).query(&[("alt", "media")]);
        let response = Self::check(name, self.authorized(request).send()?)?;
        Ok(response.bytes()?.to_vec())
    }

    fn upload(&self, name: &str, bytes: &[u8], content_type: &str) -> Result<u64, StoreError> {
        let url = format!("{}/upload/storage/v1/b/{}/o", self.endpoint, self.bucket);
        let request = self
            .client
            .post(&url)
            .query(&[("uploadType", "media"), ("name", name)])
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec());
        Self::check(name, self.authorized(request).send()?)?;

        let patch_url = format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            self.bucket,
            encode_object_name(name)
        );
        let patch = self
            .client
            .patch(&patch_url)
            .json(&serde_json::json!({ "cacheControl": INDEX_CACHE_CONTROL }));
        Self::check(name, self.authorized(patch).send()?)?;

        Ok(bytes.len() as u64)
    }
}

#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_files(&path, out)?;
            } else {
                out.push(path);
            }
        }
        Ok(())
    }

    fn object_name(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl CatalogueStore for LocalStore {
    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }

    fn list(&self, prefix: &str) -> Result<Vec<ObjectInfo>, StoreError> {
        let mut files = Vec::new();
        if self.root.is_dir() {
            Self::collect_files(&self.root, &mut files)?;
        }

        let mut objects = Vec::new();
        for path in files {
            let Some(name) = self.object_name(&path) else {
                continue;
            };
            if !name.starts_with(prefix) {
                continue;
            }
            let bytes = fs::read(&path)?;
            let mut hasher = Sha256::new();
            hasher.update(&bytes);
            objects.push(ObjectInfo {
                name,
                fingerprint: format!("{:x}", hasher.finalize()),
                size: bytes.len() as u64,
            });
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    fn download(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.root.join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn upload(&self, name: &str, bytes: &[u8], _content_type: &str) -> Result<u64, StoreError> {
        let path = self.root.join(name);
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        std::io::Write::write_all(&mut tmp, bytes)?;
        tmp.persist(&path).map_err(|err| StoreError::Io(err.error))?;
        Ok(bytes.len() as u64)
    }
}

/// One manuscript found by the scan: its metadata object plus what the
/// page tree says about extent and transcription coverage.
#[derive(Debug, Clone)]
pub struct ManuscriptEntry {
    pub id: String,
    pub metadata: ObjectInfo,
    pub pages: PageStats,
}

impl ManuscriptEntry {
    pub fn metadata_name(prefix: &str, id: &str) -> String {
        format!("{prefix}{id}/{METADATA_FILENAME}")
    }
}

fn is_page_dir(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

/// Scan the catalogue prefix in one listing.
///
/// Manuscript IDs are the first path segment below the prefix wherever a
/// deeper path exists. IDs without a metadata object are logged and
/// skipped. Page counts are distinct all-digit directory names under
/// `<id>/pages/`; a page counts as transcribed when the directory holds a
/// transcription file.
pub fn scan_catalogue(
    store: &dyn CatalogueStore,
    prefix: &str,
) -> Result<Vec<ManuscriptEntry>, StoreError> {
    let listing = store.list(prefix)?;

    let mut by_name: BTreeMap<&str, &ObjectInfo> = BTreeMap::new();
    let mut ids: BTreeSet<&str> = BTreeSet::new();
    let mut page_dirs: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut transcribed_dirs: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for object in &listing {
        by_name.insert(object.name.as_str(), object);
        let Some(rest) = object.name.strip_prefix(prefix) else {
            continue;
        };
        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() < 2 {
            continue;
        }
        let id = segments[0];
        ids.insert(id);

        if segments.len() >= 4 && segments[1] == "pages" && is_page_dir(segments[2]) {
            page_dirs.entry(id).or_default().insert(segments[2]);
            if segments.len() == 4 && segments[3] == TRANSCRIPTION_FILENAME {
                transcribed_dirs.entry(id).or_default().insert(segments[2]);
            }
        }
    }

    let mut entries = Vec::new();
    for id in ids {
        let metadata_name = ManuscriptEntry::metadata_name(prefix, id);
        let Some(metadata) = by_name.get(metadata_name.as_str()) else {
            warn!(manuscript = id, "no {METADATA_FILENAME}; skipping");
            continue;
        };
        let pages = PageStats {
            page_count: page_dirs.get(id).map_or(0, BTreeSet::len),
            transcribed_pages: transcribed_dirs.get(id).map_or(0, BTreeSet::len),
        };
        entries.push(ManuscriptEntry {
            id: id.to_string(),
            metadata: (*metadata).clone(),
            pages,
        });
    }

    Ok(entries)
}
