//! Headless Chromium rasterizer.
//!
//! Converts a fully-resolved HTML string into an A4 PDF on disk. Each render
//! drives its own short-lived Chromium process: the HTML is written to a
//! temporary directory, the binary is invoked with `--print-to-pdf`, and the
//! result is moved to the caller-given path. The process never outlives the
//! call, on success or failure.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum RasterizerError {
    #[error("failed to prepare render workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("failed to launch rendering engine: {0}")]
    Launch(#[source] std::io::Error),
    #[error("rendering engine exited with status {0}")]
    EngineExit(i32),
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to collect rendered PDF: {0}")]
    Output(#[source] std::io::Error),
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render `html` to a PDF at `output`. The file at `output` exists and is
    /// complete iff the call returns `Ok`.
    async fn render_pdf(&self, html: &str, output: &Path) -> Result<(), RasterizerError>;
}

pub struct ChromiumRasterizer {
    binary: PathBuf,
    timeout: Duration,
    /// Bounds concurrent engine processes; `None` keeps the one-process-per-
    /// call isolation with no cap.
    permits: Option<Arc<Semaphore>>,
}

impl ChromiumRasterizer {
    pub fn from_config(config: &Config) -> Self {
        let permits = match config.max_concurrent_renders {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };
        Self {
            binary: config.chromium_binary.clone(),
            timeout: config.render_timeout,
            permits,
        }
    }
}

#[async_trait]
impl Rasterizer for ChromiumRasterizer {
    async fn render_pdf(&self, html: &str, output: &Path) -> Result<(), RasterizerError> {
        let _permit = match &self.permits {
            Some(semaphore) => Some(
                semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("render semaphore closed"),
            ),
            None => None,
        };

        let temp_dir = tempfile::tempdir().map_err(RasterizerError::Workspace)?;
        let input_path = temp_dir.path().join("document.html");
        let pdf_path = temp_dir.path().join("document.pdf");

        tokio::fs::write(&input_path, html)
            .await
            .map_err(RasterizerError::Workspace)?;

        // The HTML embeds its images as data URIs; the virtual time budget
        // bounds any remaining asynchronous load the same way the overall
        // timeout does, so a broken embedded resource cannot hang the render.
        let budget_ms = self.timeout.as_millis().min(i32::MAX as u128);
        let mut child = Command::new(&self.binary)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--virtual-time-budget={budget_ms}"))
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", input_path.display()))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(RasterizerError::Launch)?;

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status.map_err(RasterizerError::Launch)?,
            Err(_) => {
                // kill_on_drop reaps the engine process.
                return Err(RasterizerError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            return Err(RasterizerError::EngineExit(status.code().unwrap_or(-1)));
        }

        let pdf = tokio::fs::read(&pdf_path)
            .await
            .map_err(RasterizerError::Output)?;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(RasterizerError::Output)?;
        }
        tokio::fs::write(output, pdf)
            .await
            .map_err(RasterizerError::Output)
    }
}
