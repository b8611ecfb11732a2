//! Error types for include merging and output rendering.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Broad failure class, used by callers to pick an exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A file could not be read, or a destination could not be created or written.
    Io,
    /// Malformed JSON, malformed template syntax, or a conflicting definition.
    Parse,
    /// Execution-time failure while binding input data to a template.
    Render,
}

/// Pipeline step that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Project,
    Read,
    ParseInclude,
    ParseOutputTemplate,
    DecodeInput,
    CreateOutput,
    Render,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Project => "project",
            Phase::Read => "read",
            Phase::ParseInclude => "parse-include",
            Phase::ParseOutputTemplate => "parse-output-template",
            Phase::DecodeInput => "decode-input",
            Phase::CreateOutput => "create-output",
            Phase::Render => "render",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while generating outputs.
///
/// Every variant names the file it concerns so a failing run can be traced
/// back to its input without extra diagnostics.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to read project file '{}'", path.display())]
    ProjectRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse project file '{}': {message}", path.display())]
    ProjectParse { path: PathBuf, message: String },

    #[error("failed to read include file '{}'", path.display())]
    ReadInclude {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("include pattern '{pattern}' matched no files")]
    NoIncludeMatches { pattern: String },

    #[error("invalid include pattern '{pattern}': {message}")]
    InvalidIncludePattern { pattern: String, message: String },

    #[error(
        "failed parsing include files: definition '{name}' is declared by both '{}' and '{}'",
        first.display(),
        second.display()
    )]
    DuplicateDefinition {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed parsing include files {}", quoted(paths))]
    ParseIncludes {
        /// Fragment files the failure is attributed to.
        paths: Vec<PathBuf>,
        source: tera::Error,
    },

    #[error("failed to read input file '{}'", path.display())]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse input file '{}'", path.display())]
    DecodeInput {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(
        "failed to parse input file '{}': root must be a JSON object, found {found}",
        path.display()
    )]
    InputNotObject { path: PathBuf, found: &'static str },

    #[error("failed to read output template '{}'", path.display())]
    ReadTemplate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse template '{}'", path.display())]
    ParseTemplate { path: PathBuf, source: tera::Error },

    #[error("failed to create output file '{}'", path.display())]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "failed to execute template '{}' for output '{}'",
        template.display(),
        output.display()
    )]
    Render {
        template: PathBuf,
        output: PathBuf,
        source: tera::Error,
    },

    #[error("failed to write output file '{}'", path.display())]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TemplateError {
    /// Failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TemplateError::ProjectRead { .. }
            | TemplateError::ReadInclude { .. }
            | TemplateError::NoIncludeMatches { .. }
            | TemplateError::ReadInput { .. }
            | TemplateError::ReadTemplate { .. }
            | TemplateError::CreateOutput { .. }
            | TemplateError::WriteOutput { .. } => ErrorKind::Io,
            TemplateError::ProjectParse { .. }
            | TemplateError::InvalidIncludePattern { .. }
            | TemplateError::DuplicateDefinition { .. }
            | TemplateError::ParseIncludes { .. }
            | TemplateError::DecodeInput { .. }
            | TemplateError::InputNotObject { .. }
            | TemplateError::ParseTemplate { .. } => ErrorKind::Parse,
            TemplateError::Render { .. } => ErrorKind::Render,
        }
    }

    /// Pipeline step that failed.
    pub fn phase(&self) -> Phase {
        match self {
            TemplateError::ProjectRead { .. } | TemplateError::ProjectParse { .. } => {
                Phase::Project
            }
            TemplateError::ReadInclude { .. }
            | TemplateError::NoIncludeMatches { .. }
            | TemplateError::ReadInput { .. }
            | TemplateError::ReadTemplate { .. } => Phase::Read,
            TemplateError::InvalidIncludePattern { .. }
            | TemplateError::DuplicateDefinition { .. }
            | TemplateError::ParseIncludes { .. } => Phase::ParseInclude,
            TemplateError::DecodeInput { .. } | TemplateError::InputNotObject { .. } => {
                Phase::DecodeInput
            }
            TemplateError::ParseTemplate { .. } => Phase::ParseOutputTemplate,
            TemplateError::CreateOutput { .. } => Phase::CreateOutput,
            TemplateError::Render { .. } | TemplateError::WriteOutput { .. } => Phase::Render,
        }
    }

    /// This error's message followed by each of its causes, on one line.
    ///
    /// Tera keeps the useful detail (line, column, missing variable) in the
    /// source chain rather than in the top-level message.
    pub fn detail(&self) -> String {
        let mut message = self.to_string();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            current = cause.source();
        }
        message
    }
}

fn quoted(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("'{}'", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}
