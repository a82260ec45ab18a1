//! JSON report output

use crate::error::{RunnerError, RunnerResult};
use crate::result::ComparisonResult;
use std::path::Path;
use tokio::fs;
use tracing::info;

/// Write `results` as a pretty-printed JSON array, creating parent directories
pub async fn write_json_report(
    results: &[ComparisonResult],
    path: impl AsRef<Path>,
) -> RunnerResult<()> {
    let path = path.as_ref();
    let write_error = |source| RunnerError::WriteReport {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }

    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json).await.map_err(write_error)?;

    info!("Wrote {} results to {:?}", results.len(), path);
    Ok(())
}
