//! Validate command - Check a project without writing outputs.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use tracing::info;

use codegen_templates::{IncludeMerger, OutputRenderer, ProjectDescriptor};

#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Parse includes with HTML autoescaping enabled
    #[arg(long)]
    autoescape: bool,
}

pub fn execute(project_path: &Path, args: ValidateArgs) -> Result<()> {
    info!("Validating project {}", project_path.display());

    let project = ProjectDescriptor::load(project_path)?;

    println!("📋 Checking {} include(s)...", project.includes.len());
    let base = IncludeMerger::new()
        .autoescape(args.autoescape)
        .build_base(&project.includes)?;
    println!("   ✅ {} definition(s) parsed", base.definitions().len());

    println!("📄 Checking {} output task(s)...", project.outputs.len());
    let failures = OutputRenderer::default().check_all(&base, &project.outputs);
    for failure in &failures {
        println!("   ❌ [{}] {}", failure.index, failure.error.detail());
    }

    match failures.into_iter().next() {
        Some(first) => Err(first.error.into()),
        None => {
            println!("✅ All outputs are ready to render");
            Ok(())
        }
    }
}
