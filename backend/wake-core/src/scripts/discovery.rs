//! Scripts directory scanning.

use crate::error::scripts::ScriptError;

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use tokio::fs as TokioFs;

/// One script approved for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Canonical absolute path inside the scripts directory.
    pub path: PathBuf,
    pub name: String,
}

/// Create the scripts directory (and parents) if needed.
pub async fn ensure_scripts_dir(dir: &Path) -> Result<PathBuf, ScriptError> {
    TokioFs::create_dir_all(dir)
        .await
        .map_err(|e| ScriptError::directory(dir, e))?;

    info!("Startup scripts directory: {}", dir.display());
    Ok(dir.to_path_buf())
}

/// Resolve `candidate` and return its canonical form if it lies strictly
/// inside `root`. `root` must already be canonical.
pub(crate) async fn resolve_within(root: &Path, candidate: &Path) -> Option<PathBuf> {
    let resolved = TokioFs::canonicalize(candidate).await.ok()?;

    if resolved != root && resolved.starts_with(root) {
        Some(resolved)
    } else {
        None
    }
}

/// Locale-independent, deterministic name order: case-insensitive first,
/// raw bytes as tiebreak.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// List the scripts eligible to run, in dispatch order.
///
/// Keeps regular files only; symlinks, dotfiles, directories and anything
/// resolving outside `dir` are dropped.
pub async fn discover_scripts(dir: &Path) -> Result<Vec<ScriptEntry>, ScriptError> {
    TokioFs::create_dir_all(dir)
        .await
        .map_err(|e| ScriptError::directory(dir, e))?;

    let root = TokioFs::canonicalize(dir)
        .await
        .map_err(|e| ScriptError::scan(dir, e))?;

    let mut read_dir = TokioFs::read_dir(&root)
        .await
        .map_err(|e| ScriptError::scan(&root, e))?;

    let mut scripts = Vec::new();

    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => return Err(ScriptError::scan(&root, e)),
        };

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            warn!("Skipping script with non UTF-8 name: {file_name:?}");
            continue;
        };

        if name.starts_with('.') {
            debug!("Skipping dotfile {name}");
            continue;
        }

        // file_type() does not follow symlinks
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                debug!("Skipping {name}: {e}");
                continue;
            }
        };

        if file_type.is_symlink() {
            warn!("Refusing symlinked script {name}");
            continue;
        }

        if !file_type.is_file() {
            debug!("Skipping non-file entry {name}");
            continue;
        }

        let path = root.join(name);

        // Re-check right before resolving; the entry may have been swapped.
        match TokioFs::symlink_metadata(&path).await {
            Ok(meta) if meta.file_type().is_symlink() => {
                warn!("Refusing symlinked script {name}");
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                debug!("Skipping {name}: {e}");
                continue;
            }
        }

        let Some(resolved) = resolve_within(&root, &path).await else {
            warn!("Refusing script outside the scripts directory: {}", path.display());
            continue;
        };

        scripts.push(ScriptEntry {
            path: resolved,
            name: name.to_string(),
        });
    }

    scripts.sort_by(|a, b| compare_names(&a.name, &b.name));

    debug!("Discovered {} script(s) in {}", scripts.len(), root.display());
    Ok(scripts)
}
