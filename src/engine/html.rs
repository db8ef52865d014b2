//! Notebook-to-HTML rendering boundary
//!
//! Rendering is delegated to `jupyter nbconvert`; the runner only cares
//! that an `.html` file appears next to the artifact it was given.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::RenderError;

/// Renders an executed notebook to HTML alongside the source artifact
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    /// Render `notebook` and return the path of the HTML file produced
    async fn render(&self, notebook: &Path) -> Result<PathBuf, RenderError>;
}

/// `jupyter nbconvert` renderer using the classic template
pub struct NbConvertCli {
    command: String,
}

impl NbConvertCli {
    pub fn new(command: Option<String>) -> Self {
        Self {
            command: command.unwrap_or_else(|| "jupyter".to_string()),
        }
    }
}

#[async_trait]
impl HtmlRenderer for NbConvertCli {
    async fn render(&self, notebook: &Path) -> Result<PathBuf, RenderError> {
        debug!("Rendering HTML copy of {}", notebook.display());

        let output = Command::new(&self.command)
            .arg("nbconvert")
            .arg("--to")
            .arg("html")
            .arg("--template")
            .arg("classic")
            .arg(notebook)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| RenderError::Spawn {
                command: self.command.clone(),
                source: err,
            })?;

        if !output.status.success() {
            return Err(RenderError::Renderer {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(notebook.with_extension("html"))
    }
}
