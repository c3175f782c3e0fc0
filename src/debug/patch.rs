//! Confirmation-gated file patching with backup.
//!
//! Overwriting a user's file is the one irreversible act in the whole
//! system, so it runs as a mini-transaction: copy the current bytes to a
//! backup, then overwrite. If the backup cannot be written the original is
//! never touched; if the overwrite fails the backup survives. Only the most
//! recent backup per file is kept.

use crate::debug::files::resolve_within_root;
use crate::error::{MindError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Suffix appended to the original path for its backup.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Outcome of one apply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
    /// Relative name of the patched file.
    pub file: String,
    /// Whether the overwrite completed.
    pub applied: bool,
    /// Where the pre-patch bytes live, when a backup was written.
    pub backup_path: Option<PathBuf>,
}

/// Backup path for a target file.
#[must_use]
pub fn backup_path_for(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// Replace the contents of an existing file under the working root.
///
/// The target must already exist - this system fixes files, it never
/// creates them. On success the previous contents are at
/// `<target>.backup`, overwriting any earlier backup for the same file.
///
/// # Errors
///
/// - [`MindError::PathEscapesRoot`] if the reference leaves the root
/// - [`MindError::PatchTargetMissing`] if the target is absent (nothing
///   written)
/// - [`MindError::BackupFailed`] if the backup copy fails (original
///   untouched)
/// - [`MindError::WriteFailed`] if the overwrite fails (backup preserved)
pub fn apply_patch(root: &Path, relative: &str, new_content: &str) -> Result<PatchResult> {
    let target = resolve_within_root(root, relative).ok_or_else(|| MindError::PathEscapesRoot {
        path: relative.to_string(),
    })?;

    if !target.is_file() {
        return Err(MindError::PatchTargetMissing { path: target });
    }

    let backup = backup_path_for(&target);
    fs::copy(&target, &backup).map_err(|e| MindError::BackupFailed {
        path: target.clone(),
        message: e.to_string(),
    })?;
    debug!("Backup created: {}", backup.display());

    fs::write(&target, new_content).map_err(|e| MindError::WriteFailed {
        path: target.clone(),
        backup: backup.clone(),
        message: e.to_string(),
    })?;

    info!("Patched {} ({} bytes)", target.display(), new_content.len());
    Ok(PatchResult {
        file: relative.to_string(),
        applied: true,
        backup_path: Some(backup),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_patch_existing_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("app.py");
        fs::write(&target, "print(1)").unwrap();

        let result = apply_patch(temp.path(), "app.py", "print(2)").unwrap();

        assert!(result.applied);
        assert_eq!(result.file, "app.py");
        assert_eq!(fs::read_to_string(&target).unwrap(), "print(2)");

        let backup = result.backup_path.unwrap();
        assert_eq!(backup, temp.path().join("app.py.backup"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "print(1)");
    }

    #[test]
    fn test_missing_target_writes_nothing() {
        let temp = TempDir::new().unwrap();

        let err = apply_patch(temp.path(), "ghost.py", "print(2)").unwrap_err();
        assert!(matches!(err, MindError::PatchTargetMissing { .. }));

        // No stray files appeared
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_second_patch_overwrites_backup() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("app.py");
        fs::write(&target, "v1").unwrap();

        apply_patch(temp.path(), "app.py", "v2").unwrap();
        apply_patch(temp.path(), "app.py", "v3").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "v3");
        // Only the most recent backup is kept
        let backup = temp.path().join("app.py.backup");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "v2");
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_traversal_is_rejected_before_any_io() {
        let temp = TempDir::new().unwrap();
        let err = apply_patch(temp.path(), "../outside.py", "x").unwrap_err();
        assert!(matches!(err, MindError::PathEscapesRoot { .. }));
    }

    #[test]
    fn test_patch_preserves_bytes_exactly() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("data.json");
        let original = "{\"k\": \"v\"}\n\u{00e9}\u{4e16}";
        let replacement = "{\"k\": 2}\nwindows\r\nline";
        fs::write(&target, original).unwrap();

        let result = apply_patch(temp.path(), "data.json", replacement).unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), replacement);
        assert_eq!(
            fs::read_to_string(result.backup_path.unwrap()).unwrap(),
            original
        );
    }

    #[test]
    fn test_nested_target() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        let target = temp.path().join("src/lib.rs");
        fs::write(&target, "old").unwrap();

        let result = apply_patch(temp.path(), "src/lib.rs", "new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(
            result.backup_path.unwrap(),
            temp.path().join("src/lib.rs.backup")
        );
    }
}
