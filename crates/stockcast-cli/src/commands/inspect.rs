//! Inspect Command Implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use stockcast_serving::config::DEFAULT_ARTIFACT_PATH;
use stockcast_serving::{ArtifactBundle, ArtifactSummary};

/// Print a JSON summary of an artifact bundle
#[derive(Args, Debug, Clone)]
pub struct InspectCommand {
    /// Path to the artifact bundle
    #[arg(
        long,
        short = 'a',
        default_value = DEFAULT_ARTIFACT_PATH,
        env = "STOCKCAST_ARTIFACT_PATH"
    )]
    pub artifact_path: PathBuf,
}

impl InspectCommand {
    /// Load the bundle and summarize it.
    pub fn summary(&self) -> Result<ArtifactSummary> {
        let bundle = ArtifactBundle::load(&self.artifact_path)
            .with_context(|| format!("Failed to load {:?}", self.artifact_path))?;
        Ok(bundle.summary())
    }

    /// Execute the inspect command
    pub fn run(&self) -> Result<()> {
        let summary = self.summary()?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
        Ok(())
    }
}
