//! Filesystem writability probe.
//!
//! Creates a small file inside the target directory and removes it again.
//! The whole create/write/remove sequence runs on the blocking pool, so an
//! aborted probe task cannot interrupt it between creation and removal.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::health::probe::{Probe, ProbeContext};
use crate::health::state::{HealthStatus, ProbeResult};

const FAILURE_MESSAGE: &str = "write failed";

#[derive(Debug, Clone)]
pub struct FileWriteProbe {
    target: PathBuf,
}

impl FileWriteProbe {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

/// Write and remove a uniquely named scratch file in `dir`.
fn write_scratch_file(dir: &Path) -> io::Result<()> {
    let path = dir.join(format!(".healthgate-{}.tmp", Uuid::new_v4()));

    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .and_then(|mut file| {
            file.write_all(b"healthgate")?;
            file.sync_all()
        });

    let removed = std::fs::remove_file(&path);

    match (written, removed) {
        (Err(e), _) => Err(e),
        (Ok(()), Err(e)) => Err(e),
        (Ok(()), Ok(())) => Ok(()),
    }
}

#[async_trait]
impl Probe for FileWriteProbe {
    async fn check(&self, ctx: &ProbeContext) -> ProbeResult {
        let dir = self.target.clone();
        let outcome = tokio::task::spawn_blocking(move || write_scratch_file(&dir))
            .await
            .unwrap_or_else(|e| Err(io::Error::other(e)));

        let path = self.target.display().to_string();
        match outcome {
            Ok(()) => ProbeResult::healthy(format!(
                "Application has read and write permissions to {}",
                path
            )),
            Err(e) => {
                tracing::debug!(probe = %ctx.name, path = %path, error = %e, "Scratch file write failed");
                let result = match ctx.failure_status {
                    // A healthy failure policy reports the message but carries no error detail.
                    HealthStatus::Healthy => ProbeResult::healthy(FAILURE_MESSAGE),
                    status => ProbeResult::failure(status, FAILURE_MESSAGE, e),
                };
                result.with_data("filePath", path)
            }
        }
    }
}
