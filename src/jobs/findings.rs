//! Post-execution findings detection
//!
//! A notebook that detected something noteworthy leaves a truthy
//! `Findings` scrap in its executed artifact. Flagged artifacts are
//! copied into the findings store and rendered to HTML there; everything
//! else passes through untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, info};

use crate::engine::scraps::{self, FINDINGS_SCRAP};
use crate::engine::HtmlRenderer;
use crate::errors::JobError;

/// Inspects executed artifacts and archives flagged ones
pub struct FindingsDetector {
    findings_path: PathBuf,
    renderer: Arc<dyn HtmlRenderer>,
}

impl FindingsDetector {
    pub fn new(findings_path: PathBuf, renderer: Arc<dyn HtmlRenderer>) -> Self {
        Self {
            findings_path,
            renderer,
        }
    }

    /// Inspect one executed artifact
    ///
    /// `artifact_name` is the artifact's file name, used for the copy in
    /// the findings store. No `Findings` scrap (or a falsy one) is the
    /// normal outcome and a no-op.
    pub async fn inspect(&self, artifact: &Path, artifact_name: &str) -> Result<(), JobError> {
        let scraps = scraps::read_scraps(artifact).await?;
        let flagged = scraps
            .get(FINDINGS_SCRAP)
            .is_some_and(scraps::is_truthy);
        if !flagged {
            debug!("No findings in {}", artifact.display());
            return Ok(());
        }

        info!("Notebook has findings");
        fs::create_dir_all(&self.findings_path).await?;
        let copy = self.findings_path.join(artifact_name);
        fs::copy(artifact, &copy).await?;

        info!("Creating html copy in {}", self.findings_path.display());
        let html = self.renderer.render(&copy).await?;
        debug!("Rendered findings copy: {}", html.display());
        Ok(())
    }
}
