//! Upload-side composition: archive in, session out.

use std::collections::HashMap;
use std::path::Path;

use crate::archive::{extract_archive, ArchiveError};
use crate::locator::{locate_lang_resources, LocatorError};
use crate::session::Session;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Locator(#[from] LocatorError),
}

/// Expands the archive into a fresh workspace and discovers its lang
/// resources.
///
/// When discovery fails the workspace is already on disk; it is removed
/// best-effort so the caller never inherits an orphan directory, and the
/// discovery error propagates unchanged.
pub fn process_mod_archive(
    archive_path: &Path,
    original_file_name: &str,
    temp_root: &Path,
) -> Result<Session, PipelineError> {
    let workspace = extract_archive(archive_path, temp_root)?;

    let resources = match locate_lang_resources(workspace.root()) {
        Ok(resources) => resources,
        Err(error) => {
            workspace.cleanup();
            return Err(error.into());
        }
    };

    let lang_resources: HashMap<_, _> = resources
        .into_iter()
        .map(|resource| (resource.owner.clone(), resource))
        .collect();

    Ok(Session {
        workspace,
        original_file_name: original_file_name.to_string(),
        lang_resources,
    })
}
