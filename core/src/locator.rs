//! Lang-resource discovery inside an extracted workspace.
//!
//! A source resource is a file literally named `en_us.json` sitting at
//! `assets/<owner>/lang/en_us.json` somewhere in the tree. The segment after
//! `assets` is the owning mod id. Same-named files anywhere else are ignored.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};

/// Canonical file name of the source-language resource.
pub const SOURCE_LANG_FILE: &str = "en_us.json";
/// File name the translated resource is written under.
pub const TARGET_LANG_FILE: &str = "zh_cn.json";

#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no en_us.json found, expected assets/<mod>/lang/en_us.json under {}", .0.display())]
    NoLangResources(PathBuf),

    #[error("malformed lang resource {}: {reason}", .path.display())]
    MalformedResource { path: PathBuf, reason: String },
}

/// One discovered source-language resource.
///
/// Immutable once loaded; translation produces a new file next to it, the
/// source file is never rewritten.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LangResource {
    /// Mod id taken verbatim from the path segment after `assets`.
    pub owner: String,
    /// Absolute path of the source file.
    pub path: PathBuf,
    /// Workspace-relative path, `/`-separated.
    pub relative_path: String,
    /// Key order matches the file.
    pub data: Map<String, Value>,
}

/// Walks `root` and loads every source lang resource beneath it.
///
/// The walk keeps an explicit stack of pending directories and sorts each
/// directory's entries by name, so discovery order is deterministic. Zero
/// matches is the "unsupported archive" signal and fails; a matched file
/// that does not parse as a flat JSON object fails the whole walk.
pub fn locate_lang_resources(root: &Path) -> Result<Vec<LangResource>, LocatorError> {
    let mut resources = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if entry.file_name() == SOURCE_LANG_FILE {
                if let Some(owner) = match_owner(root, &path) {
                    resources.push(load_resource(root, &path, owner)?);
                }
            }
        }
    }

    if resources.is_empty() {
        return Err(LocatorError::NoLangResources(root.to_path_buf()));
    }
    Ok(resources)
}

/// Segment-based match against `assets/<owner>/lang/<file>`. Returns the
/// owner segment, or `None` when the file sits outside that shape.
fn match_owner(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<&str> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();

    let n = segments.len();
    if n < 4 || segments[n - 1] != SOURCE_LANG_FILE {
        return None;
    }
    if segments[n - 2] != "lang" || segments[n - 4] != "assets" {
        return None;
    }
    Some(segments[n - 3].to_string())
}

fn load_resource(root: &Path, path: &Path, owner: String) -> Result<LangResource, LocatorError> {
    let content = fs::read_to_string(path)?;
    let value: Value =
        serde_json::from_str(&content).map_err(|err| LocatorError::MalformedResource {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    let data = match value {
        Value::Object(map) => map,
        other => {
            return Err(LocatorError::MalformedResource {
                path: path.to_path_buf(),
                reason: format!("expected a JSON object, got {}", json_type_name(&other)),
            })
        }
    };

    let relative_path = path
        .strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    Ok(LangResource {
        owner,
        path: path.to_path_buf(),
        relative_path,
        data,
    })
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
