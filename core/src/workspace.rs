//! Ephemeral extraction workspaces.
//!
//! One workspace holds the expanded tree of exactly one archive for one
//! processing run. The directory name embeds a millisecond timestamp and a
//! random suffix, so concurrent runs never collide and no locking is needed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::warn;
use uuid::Uuid;

/// Handle to an exclusively-owned working directory.
///
/// The handle does not delete anything on drop; the caller decides when the
/// run is over and calls [`Workspace::cleanup`].
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates a fresh, uniquely named workspace under `temp_root`.
    pub fn create(temp_root: &Path) -> io::Result<Self> {
        let suffix = Uuid::new_v4().simple().to_string();
        let name = format!("mod_{}_{}", Utc::now().timestamp_millis(), &suffix[..9]);
        let root = temp_root.join(name);
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes the workspace tree. Best effort: a failed removal is logged
    /// and never propagated, so it cannot mask an error already in flight.
    pub fn cleanup(&self) {
        if !self.root.exists() {
            return;
        }
        if let Err(err) = fs::remove_dir_all(&self.root) {
            warn!("failed to remove workspace {}: {}", self.root.display(), err);
        }
    }
}
