//! # codegen_templates
//!
//! Batch document generation from shared template fragments and JSON data.
//!
//! A project lists include fragments and output tasks. The fragments are
//! parsed once into a [`BaseNamespace`]; each output task then gets its own
//! clone of that namespace, parses its template into it, and renders it
//! against the task's JSON input.
//!
//! Templates use the [Tera](https://keats.github.io/tera/) dialect. Fragments
//! are referenced by file name through `extends`, `include` and `import`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use codegen_templates::{OutputRenderer, ProjectDescriptor, RenderOptions};
//!
//! let project = ProjectDescriptor::load("codegen.json").unwrap();
//! let renderer = OutputRenderer::new(RenderOptions::new().atomic_writes(true));
//! let summary = renderer.generate(&project).unwrap();
//! println!("wrote {} file(s)", summary.written.len());
//! ```

pub mod error;
pub mod input;
pub mod loader;
pub mod manifest;
pub mod renderer;

pub use error::{ErrorKind, Phase, TemplateError, TemplateResult};
pub use input::InputData;
pub use loader::{BaseNamespace, Definition, IncludeMerger};
pub use manifest::{duplicate_outputs, DescriptorFormat, IncludeSpec, OutputTask, ProjectDescriptor};
pub use renderer::{OutputRenderer, RenderNamespace, RenderOptions, RenderSummary, TaskFailure};
pub use serde_json::Value;
