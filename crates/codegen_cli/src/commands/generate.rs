//! Generate command - Render every output task in a project.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::{error, info};

use codegen_templates::{OutputRenderer, ProjectDescriptor, RenderOptions};

#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Continue with remaining outputs after a failure
    #[arg(long)]
    keep_going: bool,

    /// Write each output through a temp file and rename it into place
    #[arg(long)]
    atomic: bool,

    /// HTML-escape values in .html, .htm and .xml templates
    #[arg(long)]
    autoescape: bool,
}

impl GenerateArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions::new()
            .keep_going(self.keep_going)
            .atomic_writes(self.atomic)
            .autoescape(self.autoescape)
    }
}

pub fn execute(project_path: &Path, args: GenerateArgs) -> Result<()> {
    info!("Loading project {}", project_path.display());
    let project = ProjectDescriptor::load(project_path)?;

    let renderer = OutputRenderer::new(args.options());
    let summary = renderer.generate(&project)?;

    let failed = summary.failures.len();
    if let Some(first) = summary.failures.into_iter().next() {
        error!("{} of {} output(s) failed", failed, project.outputs.len());
        return Err(first.error.into());
    }

    info!("Generated {} output(s)", summary.written.len());
    Ok(())
}
