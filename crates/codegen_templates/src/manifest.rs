//! Project descriptor definitions.
//!
//! A project descriptor lists the shared include fragments and the output
//! tasks to generate from them. It is read from JSON by default, with YAML
//! and TOML accepted based on the file extension.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// A shared fragment file to merge into every output's namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IncludeSpec {
    /// A file path or glob pattern. Each file is registered under its file name.
    Path(PathBuf),
    /// A single file registered under an explicit definition name.
    Named { name: String, path: PathBuf },
}

impl IncludeSpec {
    /// The path (or pattern) as written in the descriptor.
    pub fn path(&self) -> &Path {
        match self {
            IncludeSpec::Path(path) => path,
            IncludeSpec::Named { path, .. } => path,
        }
    }

    /// Explicit definition name, if one was given.
    pub fn name(&self) -> Option<&str> {
        match self {
            IncludeSpec::Path(_) => None,
            IncludeSpec::Named { name, .. } => Some(name),
        }
    }
}

impl From<&str> for IncludeSpec {
    fn from(path: &str) -> Self {
        IncludeSpec::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for IncludeSpec {
    fn from(path: PathBuf) -> Self {
        IncludeSpec::Path(path)
    }
}

/// A single output generation task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputTask {
    /// Path to the template rendered for this output.
    #[serde(alias = "Template")]
    pub template: PathBuf,
    /// Path to the JSON file supplying the template context.
    #[serde(alias = "Input")]
    pub input: PathBuf,
    /// Path the rendered text is written to.
    #[serde(alias = "Output")]
    pub output: PathBuf,
}

impl OutputTask {
    pub fn new(
        template: impl Into<PathBuf>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Serialization format of a project descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
    Json,
    Yaml,
    Toml,
}

impl DescriptorFormat {
    /// Pick a format from the file extension, falling back to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => DescriptorFormat::Yaml,
            Some("toml") => DescriptorFormat::Toml,
            _ => DescriptorFormat::Json,
        }
    }
}

/// The project descriptor: shared includes plus ordered output tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Shared fragment files, parsed once into the base namespace.
    #[serde(default, alias = "Includes")]
    pub includes: Vec<IncludeSpec>,
    /// Output tasks, executed in order.
    #[serde(default, alias = "Outputs")]
    pub outputs: Vec<OutputTask>,
}

impl ProjectDescriptor {
    /// Load a descriptor from disk.
    pub fn load(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let path = path.as_ref();
        debug!("Loading project descriptor from {:?}", path);

        let content = fs::read_to_string(path).map_err(|source| TemplateError::ProjectRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, DescriptorFormat::from_path(path)).map_err(|message| {
            TemplateError::ProjectParse {
                path: path.to_path_buf(),
                message,
            }
        })
    }

    /// Parse descriptor text in the given format.
    pub fn parse(content: &str, format: DescriptorFormat) -> Result<Self, String> {
        match format {
            DescriptorFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            DescriptorFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            DescriptorFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// Group task indices by output path, keeping only paths used more than once.
///
/// Paths are compared as written; `out/a.txt` and `./out/a.txt` are distinct.
pub fn duplicate_outputs(tasks: &[OutputTask]) -> Vec<(&Path, Vec<usize>)> {
    let mut by_path: BTreeMap<&Path, Vec<usize>> = BTreeMap::new();
    for (index, task) in tasks.iter().enumerate() {
        by_path.entry(task.output.as_path()).or_default().push(index);
    }
    by_path
        .into_iter()
        .filter(|(_, indices)| indices.len() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_json_descriptor() {
        let project = ProjectDescriptor::parse(
            r#"{
                "includes": ["base.tera", {"name": "layout", "path": "shared/layout.tera"}],
                "outputs": [
                    {"template": "page.tera", "input": "data.json", "output": "page.html"}
                ]
            }"#,
            DescriptorFormat::Json,
        )
        .unwrap();

        assert_eq!(project.includes.len(), 2);
        assert_eq!(project.includes[0].path(), Path::new("base.tera"));
        assert_eq!(project.includes[0].name(), None);
        assert_eq!(project.includes[1].name(), Some("layout"));
        assert_eq!(project.outputs[0], OutputTask::new("page.tera", "data.json", "page.html"));
    }

    #[test]
    fn test_parse_capitalized_fields() {
        let project = ProjectDescriptor::parse(
            r#"{"Includes": [], "Outputs": [{"Template": "t", "Input": "i", "Output": "o"}]}"#,
            DescriptorFormat::Json,
        )
        .unwrap();
        assert_eq!(project.outputs[0].output, PathBuf::from("o"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let project = ProjectDescriptor::parse("{}", DescriptorFormat::Json).unwrap();
        assert!(project.includes.is_empty());
        assert!(project.outputs.is_empty());
    }

    #[test]
    fn test_parse_yaml_and_toml() {
        let yaml = ProjectDescriptor::parse(
            r#"
includes:
  - base.tera
outputs:
  - template: page.tera
    input: data.json
    output: page.txt
"#,
            DescriptorFormat::Yaml,
        )
        .unwrap();

        let toml = ProjectDescriptor::parse(
            r#"
includes = ["base.tera"]

[[outputs]]
template = "page.tera"
input = "data.json"
output = "page.txt"
"#,
            DescriptorFormat::Toml,
        )
        .unwrap();

        assert_eq!(yaml, toml);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DescriptorFormat::from_path(Path::new("p.yml")), DescriptorFormat::Yaml);
        assert_eq!(DescriptorFormat::from_path(Path::new("p.TOML")), DescriptorFormat::Toml);
        assert_eq!(DescriptorFormat::from_path(Path::new("codegen.proj")), DescriptorFormat::Json);
    }

    #[test]
    fn test_load_reports_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("codegen.json");
        fs::write(&path, "{ not json }").unwrap();

        let err = ProjectDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, TemplateError::ProjectParse { .. }));
        assert!(err.to_string().contains("codegen.json"));

        let err = ProjectDescriptor::load(temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, TemplateError::ProjectRead { .. }));
    }

    #[test]
    fn test_duplicate_outputs() {
        let tasks = vec![
            OutputTask::new("a.tera", "a.json", "out.txt"),
            OutputTask::new("b.tera", "b.json", "other.txt"),
            OutputTask::new("c.tera", "c.json", "out.txt"),
        ];
        let duplicates = duplicate_outputs(&tasks);
        assert_eq!(duplicates, vec![(Path::new("out.txt"), vec![0, 2])]);
    }
}
