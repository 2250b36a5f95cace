//! Archive extraction and repackaging for packaged mods.
//!
//! A run expands the uploaded container into a fresh workspace, lets the
//! translation layer add `zh_cn.json` files next to the sources, and then
//! serializes either the whole tree or just the translated resource back
//! into an output archive. The input archive itself is never modified.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use zip::read::ZipArchive;
use zip::write::{FileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::locator::{LangResource, TARGET_LANG_FILE};
use crate::translate::TranslationEntry;
use crate::workspace::Workspace;

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("unreadable archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Expands `archive_path` into a fresh workspace under `temp_root`.
///
/// A missing or unreadable container fails before the workspace exists; a
/// failed expansion removes the half-built workspace (best effort) and
/// returns the expansion error.
pub fn extract_archive(archive_path: &Path, temp_root: &Path) -> ArchiveResult<Workspace> {
    if !archive_path.exists() {
        return Err(ArchiveError::NotFound(archive_path.display().to_string()));
    }

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    let workspace = Workspace::create(temp_root)?;
    if let Err(err) = archive.extract(workspace.root()) {
        workspace.cleanup();
        return Err(err.into());
    }

    Ok(workspace)
}

/// Serializes the merged entries as an indented JSON object at the fixed
/// sibling filename next to the source resource; returns the written path.
///
/// An entry whose translation came back empty keeps its original text.
pub fn write_translated_resource(
    resource: &LangResource,
    entries: &[TranslationEntry],
) -> ArchiveResult<PathBuf> {
    let lang_dir = resource.path.parent().unwrap_or(Path::new("."));
    let target = lang_dir.join(TARGET_LANG_FILE);

    let mut merged = serde_json::Map::new();
    for entry in entries {
        let text = if entry.translation.is_empty() {
            entry.original.clone()
        } else {
            entry.translation.clone()
        };
        merged.insert(entry.key.clone(), serde_json::Value::String(text));
    }

    let body = serde_json::to_string_pretty(&merged)?;
    fs::write(&target, body)?;
    Ok(target)
}

/// Re-serializes the entire workspace tree into a new archive.
///
/// Every file lands at its `/`-normalized workspace-relative path, so files
/// the run never touched survive byte-for-byte. The output name splices a
/// `_zh_cn` suffix before the input name's extension.
pub fn repackage_archive(
    workspace: &Workspace,
    original_file_name: &str,
    output_dir: &Path,
) -> ArchiveResult<PathBuf> {
    fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(derive_output_name(original_file_name));

    let output = File::create(&output_path)?;
    let mut writer = ZipWriter::new(output);
    let options = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for path in collect_files(workspace.root())? {
        let entry_name = relative_entry_path(workspace.root(), &path);
        let mut content = Vec::new();
        File::open(&path)?.read_to_end(&mut content)?;
        writer.start_file(entry_name.as_str(), options.clone())?;
        writer.write_all(&content)?;
    }

    writer.finish()?;
    Ok(output_path)
}

/// Writes only the translated resource into a minimal single-entry archive
/// named `<owner>_zh_cn_lang.zip`.
pub fn package_single_resource(
    workspace: &Workspace,
    resource: &LangResource,
    output_dir: &Path,
) -> ArchiveResult<PathBuf> {
    let lang_dir = resource.path.parent().unwrap_or(Path::new("."));
    let translated_path = lang_dir.join(TARGET_LANG_FILE);
    if !translated_path.exists() {
        return Err(ArchiveError::NotFound(
            translated_path.display().to_string(),
        ));
    }

    fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join(format!("{}_zh_cn_lang.zip", resource.owner));

    let output = File::create(&output_path)?;
    let mut writer = ZipWriter::new(output);
    let options = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let entry_name = relative_entry_path(workspace.root(), &translated_path);
    let mut content = Vec::new();
    File::open(&translated_path)?.read_to_end(&mut content)?;
    writer.start_file(entry_name.as_str(), options)?;
    writer.write_all(&content)?;

    writer.finish()?;
    Ok(output_path)
}

fn derive_output_name(original: &str) -> String {
    if let Some(stem) = original.strip_suffix(".jar") {
        return format!("{stem}_zh_cn.jar");
    }
    if let Some(stem) = original.strip_suffix(".zip") {
        return format!("{stem}_zh_cn.zip");
    }
    format!("{original}_zh_cn.jar")
}

/// Every regular file under `root`, walked with an explicit pending stack
/// and name-sorted per directory so the archive layout is deterministic.
fn collect_files(root: &Path) -> ArchiveResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir)?.collect::<io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn relative_entry_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
