//! Output rendering: per-task namespace preparation and file generation.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tera::Tera;
use tracing::{debug, info, warn};

use crate::error::{TemplateError, TemplateResult};
use crate::input::InputData;
use crate::loader::{BaseNamespace, IncludeMerger};
use crate::manifest::{duplicate_outputs, OutputTask, ProjectDescriptor};

/// Options controlling a generation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Continue past failed tasks and report every failure at the end.
    pub keep_going: bool,
    /// Render into a temporary file and rename it over the destination on success.
    pub atomic_writes: bool,
    /// Enable HTML autoescaping for `.html`, `.htm` and `.xml` templates.
    pub autoescape: bool,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    pub fn atomic_writes(mut self, atomic_writes: bool) -> Self {
        self.atomic_writes = atomic_writes;
        self
    }

    pub fn autoescape(mut self, autoescape: bool) -> Self {
        self.autoescape = autoescape;
        self
    }
}

/// A base namespace clone extended with one output template.
///
/// Created for a single task and dropped after that task renders, so
/// definitions parsed from one output template never reach another.
#[derive(Debug)]
pub struct RenderNamespace {
    tera: Tera,
    entry: String,
}

impl RenderNamespace {
    /// Clone `base` and parse the template at `template_path` into it.
    pub fn prepare(base: &BaseNamespace, template_path: &Path) -> TemplateResult<Self> {
        let source = fs::read_to_string(template_path).map_err(|source| {
            TemplateError::ReadTemplate {
                path: template_path.to_path_buf(),
                source,
            }
        })?;
        Self::from_source(base, template_path, &source)
    }

    /// Clone `base` and parse `source` into it under the name `template_path`.
    ///
    /// A template whose name matches an include replaces that include in
    /// this namespace only.
    pub fn from_source(
        base: &BaseNamespace,
        template_path: &Path,
        source: &str,
    ) -> TemplateResult<Self> {
        let mut tera = base.fork();
        let entry = template_path.to_string_lossy().into_owned();
        debug!("Parsing output template {}", entry);

        tera.add_raw_template(&entry, source)
            .map_err(|source| TemplateError::ParseTemplate {
                path: template_path.to_path_buf(),
                source,
            })?;

        Ok(Self { tera, entry })
    }

    /// Name of the entry template.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Execute the entry template against `input`, streaming into `writer`.
    pub fn render_to(&self, input: &InputData, writer: impl Write) -> tera::Result<()> {
        self.tera.render_to(&self.entry, &input.to_context(), writer)
    }

    /// Execute the entry template against `input` into a string.
    pub fn render(&self, input: &InputData) -> tera::Result<String> {
        self.tera.render(&self.entry, &input.to_context())
    }
}

/// A task that failed while running in keep-going mode.
#[derive(Debug)]
pub struct TaskFailure {
    /// Position of the task in the descriptor.
    pub index: usize,
    pub task: OutputTask,
    pub error: TemplateError,
}

/// Outcome of a generation run.
#[derive(Debug, Default)]
pub struct RenderSummary {
    /// Output files written, in task order.
    pub written: Vec<PathBuf>,
    /// Failures collected in keep-going mode.
    pub failures: Vec<TaskFailure>,
}

impl RenderSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renders output tasks against a shared base namespace.
#[derive(Debug, Clone, Default)]
pub struct OutputRenderer {
    options: RenderOptions,
}

impl OutputRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Build the base namespace from the project's includes and render every output.
    pub fn generate(&self, project: &ProjectDescriptor) -> TemplateResult<RenderSummary> {
        let base = IncludeMerger::new()
            .autoescape(self.options.autoescape)
            .build_base(&project.includes)?;
        self.render_all(&base, &project.outputs)
    }

    /// Render tasks in order.
    ///
    /// Stops at the first failure unless `keep_going` is set. Outputs written
    /// by earlier tasks are left in place either way.
    pub fn render_all(
        &self,
        base: &BaseNamespace,
        tasks: &[OutputTask],
    ) -> TemplateResult<RenderSummary> {
        warn_duplicate_outputs(tasks);

        let mut summary = RenderSummary::default();
        for (index, task) in tasks.iter().enumerate() {
            match self.render_task(base, task) {
                Ok(()) => summary.written.push(task.output.clone()),
                Err(error) if self.options.keep_going => {
                    warn!("Output task {} failed: {}", index, error.detail());
                    summary.failures.push(TaskFailure {
                        index,
                        task: task.clone(),
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            "Generated {} of {} output(s)",
            summary.written.len(),
            tasks.len()
        );
        Ok(summary)
    }

    /// Run one task end to end: load input, prepare namespace, write output.
    ///
    /// The input is decoded and the template parsed before the destination is
    /// opened, so those failures leave an existing destination untouched.
    pub fn render_task(&self, base: &BaseNamespace, task: &OutputTask) -> TemplateResult<()> {
        info!(
            "Rendering {} -> {}",
            task.template.display(),
            task.output.display()
        );

        let input = InputData::load(&task.input)?;
        let namespace = RenderNamespace::prepare(base, &task.template)?;

        if self.options.atomic_writes {
            write_atomic(&namespace, &input, task)
        } else {
            write_direct(&namespace, &input, task)
        }
    }

    /// Load input and prepare the namespace for one task without writing anything.
    pub fn check_task(&self, base: &BaseNamespace, task: &OutputTask) -> TemplateResult<()> {
        InputData::load(&task.input)?;
        RenderNamespace::prepare(base, &task.template)?;
        Ok(())
    }

    /// Check every task, collecting all failures.
    pub fn check_all(&self, base: &BaseNamespace, tasks: &[OutputTask]) -> Vec<TaskFailure> {
        warn_duplicate_outputs(tasks);

        tasks
            .iter()
            .enumerate()
            .filter_map(|(index, task)| {
                self.check_task(base, task).err().map(|error| TaskFailure {
                    index,
                    task: task.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// Truncate-or-create the destination and stream the render into it.
///
/// A render failure leaves whatever was already written on disk.
fn write_direct(
    namespace: &RenderNamespace,
    input: &InputData,
    task: &OutputTask,
) -> TemplateResult<()> {
    let file = File::create(&task.output).map_err(|source| TemplateError::CreateOutput {
        path: task.output.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    namespace
        .render_to(input, &mut writer)
        .map_err(|source| render_error(task, source))?;

    writer.flush().map_err(|source| TemplateError::WriteOutput {
        path: task.output.clone(),
        source,
    })
}

/// Render into a sibling temp file, then rename it over the destination.
fn write_atomic(
    namespace: &RenderNamespace,
    input: &InputData,
    task: &OutputTask,
) -> TemplateResult<()> {
    let dir = match task.output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = temp_output(dir, &task.output).map_err(|source| TemplateError::CreateOutput {
        path: task.output.clone(),
        source,
    })?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        namespace
            .render_to(input, &mut writer)
            .map_err(|source| render_error(task, source))?;
        writer.flush().map_err(|source| TemplateError::WriteOutput {
            path: task.output.clone(),
            source,
        })?;
    }

    temp.persist(&task.output)
        .map_err(|e| TemplateError::WriteOutput {
            path: task.output.clone(),
            source: e.error,
        })?;
    Ok(())
}

/// Temp file whose mode matches what a direct write would leave behind:
/// the existing destination's permissions, or the umask default for a new file.
fn temp_output(dir: &Path, output: &Path) -> std::io::Result<NamedTempFile> {
    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let temp = builder.tempfile_in(dir)?;

    if let Ok(metadata) = fs::metadata(output) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }
    Ok(temp)
}

fn render_error(task: &OutputTask, source: tera::Error) -> TemplateError {
    TemplateError::Render {
        template: task.template.clone(),
        output: task.output.clone(),
        source,
    }
}

fn warn_duplicate_outputs(tasks: &[OutputTask]) {
    for (path, indices) in duplicate_outputs(tasks) {
        warn!(
            "Output {} is targeted by tasks {:?}; the last one to run wins",
            path.display(),
            indices
        );
    }
}
