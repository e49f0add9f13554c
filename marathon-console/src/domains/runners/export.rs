//! CSV export of the full runner list.

use crate::infra::errors::{ConsoleError, ConsoleResult};
use crate::infra::services::api::RunnerService;

use futures::StreamExt;
use marathon_model::chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

pub fn export_file_name(date: NaiveDate) -> String {
    format!("runners-export-{}.csv", date.format("%Y-%m-%d"))
}

/// Stream `GET /runners/export` into `runners-export-YYYY-MM-DD.csv` under
/// `dir` and return the written path.
///
/// The body goes to a temporary sibling first, so a failed download never
/// leaves a truncated export behind under the final name.
pub async fn export_runners(
    service: Arc<dyn RunnerService>,
    dir: PathBuf,
    date: NaiveDate,
) -> ConsoleResult<PathBuf> {
    if !dir.is_dir() {
        return Err(ConsoleError::Io(format!(
            "Export directory {} does not exist",
            dir.display()
        )));
    }

    let target = dir.join(export_file_name(date));
    let partial = target.with_extension("csv.part");

    let written = match write_stream(service, &partial).await {
        Ok(written) => written,
        Err(err) => {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(err);
        }
    };
    tokio::fs::rename(&partial, &target).await?;

    log::info!(
        "[Runners] Exported {} bytes to {}",
        written,
        target.display()
    );
    Ok(target)
}

async fn write_stream(
    service: Arc<dyn RunnerService>,
    path: &Path,
) -> ConsoleResult<u64> {
    let mut body = service.export_runners().await?;
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
