//! Input data decoding.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tera::Context;
use tracing::debug;

use crate::error::{TemplateError, TemplateResult};

/// Keyed value tree decoded from a task's JSON input.
///
/// The root is always a JSON object, since it becomes the template's
/// execution context. A `null` document decodes to an empty root. Values
/// below the root keep their JSON shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputData {
    root: Map<String, Value>,
}

impl InputData {
    /// Read and decode the JSON file at `path`.
    pub fn load(path: &Path) -> TemplateResult<Self> {
        debug!("Loading input data from {:?}", path);
        let bytes = fs::read(path).map_err(|source| TemplateError::ReadInput {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(path, &bytes)
    }

    /// Decode JSON bytes. `path` is only used to label errors.
    pub fn from_slice(path: &Path, bytes: &[u8]) -> TemplateResult<Self> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|source| TemplateError::DecodeInput {
                path: path.to_path_buf(),
                source,
            })?;

        match value {
            Value::Object(root) => Ok(Self { root }),
            Value::Null => Ok(Self { root: Map::new() }),
            other => Err(TemplateError::InputNotObject {
                path: path.to_path_buf(),
                found: json_type_name(&other),
            }),
        }
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Look up a nested value by JSON pointer (e.g. `/items/0/name`).
    pub fn pointer(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('/')?;
        let (key, tail) = match rest.split_once('/') {
            Some((key, tail)) => (key, Some(tail)),
            None => (rest, None),
        };
        let value = self.root.get(&key.replace("~1", "/").replace("~0", "~"))?;
        match tail {
            Some(tail) => value.pointer(&format!("/{tail}")),
            None => Some(value),
        }
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Build the template execution context, one entry per top-level key.
    pub fn to_context(&self) -> Context {
        let mut context = Context::new();
        for (key, value) in &self.root {
            context.insert(key.as_str(), value);
        }
        context
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
