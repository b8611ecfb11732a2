//! Include merging: parse shared fragments once into a base namespace.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tera::Tera;
use tracing::{debug, info};

use crate::error::{TemplateError, TemplateResult};
use crate::manifest::IncludeSpec;

/// A named definition registered in a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Name other templates use to reference this fragment.
    pub name: String,
    /// File the definition was read from.
    pub path: PathBuf,
}

/// Parsed shared fragments, cloned once per output task.
///
/// The base is never mutated after [`IncludeMerger::build_base`] returns;
/// renderers work on independent copies obtained through [`BaseNamespace::fork`].
#[derive(Debug, Clone)]
pub struct BaseNamespace {
    tera: Tera,
    definitions: Vec<Definition>,
}

impl BaseNamespace {
    /// A namespace with no shared definitions.
    pub fn empty(autoescape: bool) -> Self {
        Self {
            tera: new_tera(autoescape),
            definitions: Vec::new(),
        }
    }

    pub fn definitions(&self) -> &[Definition] {
        &self.definitions
    }

    /// Whether a definition with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Independent copy of the parsed templates, free to be extended.
    pub(crate) fn fork(&self) -> Tera {
        self.tera.clone()
    }
}

/// Builds the base namespace from the project's include list.
#[derive(Debug, Clone, Default)]
pub struct IncludeMerger {
    autoescape: bool,
}

impl IncludeMerger {
    /// Create a merger. Autoescaping is off unless enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable HTML autoescaping for `.html`, `.htm` and `.xml` templates.
    pub fn autoescape(mut self, enabled: bool) -> Self {
        self.autoescape = enabled;
        self
    }

    /// Read every include and parse them together into one namespace.
    ///
    /// All fragments are parsed in a single pass, so a fragment may extend,
    /// include or import any other fragment regardless of listing order.
    pub fn build_base(&self, includes: &[IncludeSpec]) -> TemplateResult<BaseNamespace> {
        let definitions = resolve_includes(includes)?;

        let mut sources = Vec::with_capacity(definitions.len());
        for definition in &definitions {
            debug!("Reading include {} from {:?}", definition.name, definition.path);
            let content =
                fs::read_to_string(&definition.path).map_err(|source| TemplateError::ReadInclude {
                    path: definition.path.clone(),
                    source,
                })?;
            sources.push((definition.name.clone(), content));
        }

        check_unique(&definitions)?;

        let mut tera = new_tera(self.autoescape);
        if !sources.is_empty() {
            let raw = sources.iter().map(|(name, content)| (name.as_str(), content.as_str()));
            tera.add_raw_templates(raw)
                .map_err(|source| TemplateError::ParseIncludes {
                    paths: failing_paths(&definitions, &sources, &source),
                    source,
                })?;
        }

        info!("Parsed {} include definition(s)", definitions.len());
        Ok(BaseNamespace { tera, definitions })
    }
}

pub(crate) fn new_tera(autoescape: bool) -> Tera {
    let mut tera = Tera::default();
    if !autoescape {
        tera.autoescape_on(Vec::new());
    }
    tera
}

/// Expand include entries into named definitions, in listing order.
fn resolve_includes(includes: &[IncludeSpec]) -> TemplateResult<Vec<Definition>> {
    let mut definitions = Vec::new();

    for include in includes {
        match include {
            IncludeSpec::Named { name, path } => definitions.push(Definition {
                name: name.clone(),
                path: path.clone(),
            }),
            IncludeSpec::Path(path) if is_pattern(path) => {
                for path in expand_pattern(path)? {
                    definitions.push(Definition {
                        name: definition_name(&path),
                        path,
                    });
                }
            }
            IncludeSpec::Path(path) => definitions.push(Definition {
                name: definition_name(path),
                path: path.clone(),
            }),
        }
    }

    Ok(definitions)
}

fn check_unique(definitions: &[Definition]) -> TemplateResult<()> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for definition in definitions {
        if let Some(first) = seen.insert(&definition.name, &definition.path) {
            return Err(TemplateError::DuplicateDefinition {
                name: definition.name.clone(),
                first: first.to_path_buf(),
                second: definition.path.clone(),
            });
        }
    }
    Ok(())
}

/// Attribute a failed batch parse to the fragment files responsible.
///
/// Syntax errors are found by reparsing each fragment on its own. Link
/// errors (a missing parent or macro file) quote the offending definition
/// name in the message. Anything else is charged to every fragment.
fn failing_paths(
    definitions: &[Definition],
    sources: &[(String, String)],
    err: &tera::Error,
) -> Vec<PathBuf> {
    let broken = definitions
        .iter()
        .zip(sources)
        .find(|(_, (name, content))| tera::Template::new(name, None, content).is_err());
    if let Some((definition, _)) = broken {
        return vec![definition.path.clone()];
    }

    let message = err.to_string();
    let named: Vec<PathBuf> = definitions
        .iter()
        .filter(|d| {
            message.contains(&format!("'{}'", d.name)) || message.contains(&format!("`{}`", d.name))
        })
        .map(|d| d.path.clone())
        .collect();
    if !named.is_empty() {
        return named;
    }

    definitions.iter().map(|d| d.path.clone()).collect()
}

/// Fragments are known by their file name, e.g. `shared/base.tera` is `base.tera`.
fn definition_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn is_pattern(path: &Path) -> bool {
    path.to_string_lossy().contains(['*', '?', '['])
}

fn expand_pattern(pattern: &Path) -> TemplateResult<Vec<PathBuf>> {
    let pattern = pattern.to_string_lossy().into_owned();
    let entries = glob::glob(&pattern).map_err(|e| TemplateError::InvalidIncludePattern {
        pattern: pattern.clone(),
        message: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TemplateError::ReadInclude {
            path: e.path().to_path_buf(),
            source: e.into_error(),
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(TemplateError::NoIncludeMatches { pattern });
    }
    paths.sort();
    debug!("Include pattern {} matched {} file(s)", pattern, paths.len());
    Ok(paths)
}
