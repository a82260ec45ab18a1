//! Filesystem baseline store
//!
//! Layout:
//!
//! ```text
//! {storage_dir}/{service}/{YYYYMMDD}/run-NNN/
//!     metadata.json
//!     summary.json
//!     iteration-001/
//!         request.json|xml
//!         request-headers.json
//!         request-metadata.json
//!         response.json|xml
//!         response-headers.json
//!         response-metadata.json
//! ```
//!
//! A run is written into a hidden staging directory next to its final place
//! and renamed in one step, so a listed run is always complete.

use crate::error::{BaselineError, BaselineResult};
use crate::model::{
    BaselineIteration, BaselineRun, CaptureSummary, IterationMetadata, ResponseMetadata, RunInfo,
    RunMetadata,
};
use crate::BaselineRepository;
use async_trait::async_trait;
use dashmap::DashMap;
use drift_core::PayloadFormat;
use indexmap::IndexMap;
use regex::Regex;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

const METADATA_FILE: &str = "metadata.json";
const SUMMARY_FILE: &str = "summary.json";
const ITERATION_PREFIX: &str = "iteration-";

fn run_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^run-(\d+)$").expect("valid run id pattern"))
}

/// Baseline store backed by a directory tree
///
/// Clones share their capture locks.
#[derive(Debug, Clone)]
pub struct FileBaselineStore {
    storage_dir: PathBuf,
    /// One writer lock per `(service, date)`
    capture_locks: Arc<DashMap<(String, String), Arc<Mutex<()>>>>,
}

impl FileBaselineStore {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: storage_dir.as_ref().to_path_buf(),
            capture_locks: Arc::new(DashMap::new()),
        }
    }

    /// Root directory of the store
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Directory of a run; the run need not exist
    pub fn run_dir(&self, service: &str, date: &str, run_id: &str) -> PathBuf {
        self.storage_dir.join(service).join(date).join(run_id)
    }

    fn date_dir(&self, service: &str, date: &str) -> PathBuf {
        self.storage_dir.join(service).join(date)
    }

    /// Read `summary.json` of a stored run
    pub async fn load_summary(
        &self,
        service: &str,
        date: &str,
        run_id: &str,
    ) -> BaselineResult<CaptureSummary> {
        check_name("service", service)?;
        check_name("date", date)?;
        check_name("run", run_id)?;
        let run_dir = self.run_dir(service, date, run_id);
        if !is_dir(&run_dir).await? {
            return Err(not_found(service, date, run_id));
        }
        read_json(&run_dir.join(SUMMARY_FILE)).await
    }
}

#[async_trait]
impl BaselineRepository for FileBaselineStore {
    async fn lock_captures(&self, service: &str, date: &str) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(
            self.capture_locks
                .entry((service.to_string(), date.to_string()))
                .or_default()
                .value(),
        );
        lock.lock_owned().await
    }

    async fn generate_run_id(&self, service: &str, date: &str) -> BaselineResult<String> {
        check_name("service", service)?;
        check_name("date", date)?;

        let mut max_run = 0u32;
        for name in subdirectories(&self.date_dir(service, date)).await? {
            if name.starts_with('.') {
                continue;
            }
            let number = run_id_pattern()
                .captures(&name)
                .and_then(|caps| caps[1].parse::<u32>().ok());
            match number {
                Some(n) => max_run = max_run.max(n),
                None => warn!("Ignoring invalid run directory name: {}", name),
            }
        }

        let next = max_run
            .checked_add(1)
            .ok_or_else(|| BaselineError::RunIdsExhausted {
                service: service.to_string(),
                date: date.to_string(),
            })?;
        Ok(format!("run-{:03}", next))
    }

    async fn save(
        &self,
        metadata: &RunMetadata,
        iterations: &[BaselineIteration],
    ) -> BaselineResult<()> {
        let service = metadata.service_name.as_str();
        let date = metadata.capture_date.as_str();
        let run_id = metadata.run_id.as_str();
        check_name("service", service)?;
        check_name("date", date)?;
        check_name("run", run_id)?;
        check_iteration_numbers(iterations)?;

        let run_dir = self.run_dir(service, date, run_id);
        if fs::metadata(&run_dir).await.is_ok() {
            return Err(BaselineError::AlreadyExists {
                service: service.to_string(),
                date: date.to_string(),
                run_id: run_id.to_string(),
            });
        }

        let date_dir = self.date_dir(service, date);
        fs::create_dir_all(&date_dir).await?;

        let staging = date_dir.join(format!(".{}.tmp-{}", run_id, std::process::id()));
        if fs::metadata(&staging).await.is_ok() {
            debug!("Removing stale staging directory {:?}", staging);
            fs::remove_dir_all(&staging).await?;
        }

        let format = metadata.test_type.format();
        let written = write_run(&staging, metadata, iterations, format).await;
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_dir_all(&staging).await {
                warn!("Could not remove staging directory {:?}: {}", staging, cleanup);
            }
            return Err(e);
        }

        fs::rename(&staging, &run_dir).await?;

        info!(
            "Baseline saved: {}/{}/{} with {} iterations",
            service,
            date,
            run_id,
            iterations.len()
        );
        Ok(())
    }

    async fn load(&self, service: &str, date: &str, run_id: &str) -> BaselineResult<BaselineRun> {
        check_name("service", service)?;
        check_name("date", date)?;
        check_name("run", run_id)?;

        let run_dir = self.run_dir(service, date, run_id);
        if !is_dir(&run_dir).await? {
            return Err(not_found(service, date, run_id));
        }

        let metadata: RunMetadata = read_json(&run_dir.join(METADATA_FILE)).await?;
        let format = metadata.test_type.format();

        // Zero padded, so name order is numeric order
        let mut names: Vec<String> = subdirectories(&run_dir)
            .await?
            .into_iter()
            .filter(|name| name.starts_with(ITERATION_PREFIX))
            .collect();
        names.sort();

        let mut iterations = Vec::with_capacity(names.len());
        for name in names {
            iterations.push(read_iteration(&run_dir.join(name), format).await?);
        }

        info!(
            "Loaded baseline: {}/{}/{} with {} iterations",
            service,
            date,
            run_id,
            iterations.len()
        );
        Ok(BaselineRun {
            metadata,
            iterations,
        })
    }

    async fn list_services(&self) -> BaselineResult<Vec<String>> {
        let mut services: Vec<String> = subdirectories(&self.storage_dir)
            .await?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .collect();
        services.sort();
        Ok(services)
    }

    async fn list_dates(&self, service: &str) -> BaselineResult<Vec<String>> {
        check_name("service", service)?;
        let mut dates: Vec<String> = subdirectories(&self.storage_dir.join(service))
            .await?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .collect();
        dates.sort_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    async fn list_runs(&self, service: &str, date: &str) -> BaselineResult<Vec<RunInfo>> {
        check_name("service", service)?;
        check_name("date", date)?;

        let date_dir = self.date_dir(service, date);
        let mut runs = Vec::new();
        for name in subdirectories(&date_dir).await? {
            if !run_id_pattern().is_match(&name) {
                continue;
            }
            let metadata_path = date_dir.join(&name).join(METADATA_FILE);
            if fs::metadata(&metadata_path).await.is_err() {
                warn!("Run directory without metadata: {:?}", date_dir.join(&name));
                continue;
            }
            match read_json::<RunMetadata>(&metadata_path).await {
                Ok(metadata) => runs.push(RunInfo::from(&metadata)),
                Err(e) => warn!("Skipping unreadable run metadata {:?}: {}", metadata_path, e),
            }
        }

        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }

    fn location(&self, service: &str, date: &str, run_id: &str) -> String {
        self.run_dir(service, date, run_id).display().to_string()
    }
}

async fn write_run(
    dir: &Path,
    metadata: &RunMetadata,
    iterations: &[BaselineIteration],
    format: PayloadFormat,
) -> BaselineResult<()> {
    fs::create_dir_all(dir).await?;
    write_json(&dir.join(METADATA_FILE), metadata).await?;

    for iteration in iterations {
        let iteration_dir = dir.join(format!("{}{:03}", ITERATION_PREFIX, iteration.iteration_number));
        fs::create_dir_all(&iteration_dir).await?;
        write_iteration(&iteration_dir, iteration, format).await?;
    }

    write_json(&dir.join(SUMMARY_FILE), &CaptureSummary::from_iterations(iterations)).await?;
    Ok(())
}

async fn write_iteration(
    dir: &Path,
    iteration: &BaselineIteration,
    format: PayloadFormat,
) -> BaselineResult<()> {
    let ext = format.extension();
    fs::write(dir.join(format!("request.{}", ext)), &iteration.request_payload).await?;
    write_json(&dir.join("request-headers.json"), &iteration.request_headers).await?;
    write_json(&dir.join("request-metadata.json"), &iteration.request_metadata).await?;

    fs::write(dir.join(format!("response.{}", ext)), &iteration.response_payload).await?;
    write_json(&dir.join("response-headers.json"), &iteration.response_headers).await?;
    write_json(&dir.join("response-metadata.json"), &iteration.response_metadata).await?;
    Ok(())
}

async fn read_iteration(dir: &Path, format: PayloadFormat) -> BaselineResult<BaselineIteration> {
    let request_payload = read_payload(dir, "request", format).await?;
    let request_headers: IndexMap<String, String> =
        read_json(&dir.join("request-headers.json")).await?;
    let request_metadata: IterationMetadata = read_json(&dir.join("request-metadata.json")).await?;

    let response_payload = read_payload(dir, "response", format).await?;
    let response_headers: IndexMap<String, String> =
        read_json(&dir.join("response-headers.json")).await?;
    let response_metadata: ResponseMetadata =
        read_json(&dir.join("response-metadata.json")).await?;

    Ok(BaselineIteration {
        iteration_number: request_metadata.iteration_number,
        request_payload,
        request_headers,
        request_metadata,
        response_payload,
        response_headers,
        response_metadata,
    })
}

/// `{stem}.{ext}` for the run's format, else the other format's extension
async fn read_payload(dir: &Path, stem: &str, format: PayloadFormat) -> BaselineResult<String> {
    let other = match format {
        PayloadFormat::Json => PayloadFormat::Xml,
        PayloadFormat::Xml => PayloadFormat::Json,
    };

    for candidate in [format, other] {
        let path = dir.join(format!("{}.{}", stem, candidate.extension()));
        match fs::read_to_string(&path).await {
            Ok(content) => return Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(BaselineError::MissingFile {
        path: dir.join(format!("{}.{}", stem, format.extension())),
    })
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> BaselineResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).await?;
    Ok(())
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> BaselineResult<T> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(BaselineError::MissingFile {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

/// Names of the directories directly under `dir`; empty when `dir` is absent
async fn subdirectories(dir: &Path) -> BaselineResult<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Ok(file_type) = entry.file_type().await {
            if file_type.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
    }
    Ok(names)
}

async fn is_dir(path: &Path) -> BaselineResult<bool> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_dir()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Each iteration owns one `iteration-NNN` directory
fn check_iteration_numbers(iterations: &[BaselineIteration]) -> BaselineResult<()> {
    let mut seen = HashSet::with_capacity(iterations.len());
    for iteration in iterations {
        if !seen.insert(iteration.iteration_number) {
            return Err(BaselineError::DuplicateIteration {
                number: iteration.iteration_number,
            });
        }
    }
    Ok(())
}

/// Path components come from config and must stay inside the store
fn check_name(what: &'static str, name: &str) -> BaselineResult<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\');
    if invalid {
        return Err(BaselineError::InvalidName {
            what,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn not_found(service: &str, date: &str, run_id: &str) -> BaselineError {
    BaselineError::NotFound {
        service: service.to_string(),
        date: date.to_string(),
        run_id: run_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_run_id_when_nothing_exists() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());

        assert_eq!(
            store.generate_run_id("svc", "20260115").await.unwrap(),
            "run-001"
        );
    }

    #[tokio::test]
    async fn test_run_id_follows_highest_and_skips_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());
        let date_dir = temp_dir.path().join("svc").join("20260115");
        for name in ["run-001", "run-007", "run-abc", "notes", ".run-008.tmp-1"] {
            std::fs::create_dir_all(date_dir.join(name)).unwrap();
        }

        assert_eq!(
            store.generate_run_id("svc", "20260115").await.unwrap(),
            "run-008"
        );
    }

    #[tokio::test]
    async fn test_run_id_beyond_three_digits() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());
        std::fs::create_dir_all(temp_dir.path().join("svc/d/run-999")).unwrap();

        assert_eq!(store.generate_run_id("svc", "d").await.unwrap(), "run-1000");
    }

    #[tokio::test]
    async fn test_run_id_at_numeric_limit_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());
        std::fs::create_dir_all(temp_dir.path().join("svc/d/run-001")).unwrap();
        std::fs::create_dir_all(temp_dir.path().join("svc/d/run-4294967295")).unwrap();

        assert!(matches!(
            store.generate_run_id("svc", "d").await,
            Err(BaselineError::RunIdsExhausted { .. })
        ));
        assert_eq!(store.generate_run_id("svc", "other").await.unwrap(), "run-001");
    }

    #[tokio::test]
    async fn test_capture_lock_is_per_service_and_date() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());
        let shared = store.clone();

        let held = store.lock_captures("svc", "d").await;
        let key = ("svc".to_string(), "d".to_string());
        let lock = Arc::clone(shared.capture_locks.get(&key).unwrap().value());
        assert!(lock.try_lock().is_err());

        // A different date is not blocked
        let _other = shared.lock_captures("svc", "e").await;

        drop(held);
        let _again = shared.lock_captures("svc", "d").await;
    }

    #[tokio::test]
    async fn test_listing_absent_directories_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path().join("missing"));

        assert!(store.list_services().await.unwrap().is_empty());
        assert!(store.list_dates("svc").await.unwrap().is_empty());
        assert!(store.list_runs("svc", "20260115").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_escaping_names_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());

        assert!(matches!(
            store.generate_run_id("../etc", "20260115").await,
            Err(BaselineError::InvalidName { what: "service", .. })
        ));
        assert!(matches!(
            store.load("svc", "..", "run-001").await,
            Err(BaselineError::InvalidName { what: "date", .. })
        ));
    }

    #[tokio::test]
    async fn test_load_missing_run_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBaselineStore::new(temp_dir.path());

        let err = store.load("svc", "20260115", "run-001").await.unwrap_err();
        assert!(matches!(err, BaselineError::NotFound { .. }));
        assert_eq!(err.to_string(), "Baseline not found: svc/20260115/run-001");
    }

    #[tokio::test]
    async fn test_payload_falls_back_to_other_extension() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("request.xml"), "<a/>").unwrap();

        let payload = read_payload(temp_dir.path(), "request", PayloadFormat::Json)
            .await
            .unwrap();
        assert_eq!(payload, "<a/>");

        let missing = read_payload(temp_dir.path(), "response", PayloadFormat::Json).await;
        assert!(matches!(missing, Err(BaselineError::MissingFile { .. })));
    }
}
