//! core::fs
//!
//! Atomic, owner-only file writes for the config record and key file.
//!
//! # Design
//!
//! Both persisted files are written the same way:
//! 1. Create parent directories
//! 2. Write to a sibling temp file and `sync_all`
//! 3. Tighten permissions to 0600 (best-effort)
//! 4. Rename over the destination
//!
//! A crash at any point leaves either the old file or the new file, never a
//! half-written one.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Write `contents` to `path` atomically.
///
/// The temp file lives next to the destination so the final rename stays on
/// one filesystem.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!("{}.tmp", file_name));

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;

        // Restrict before the content lands on disk.
        restrict_permissions(&temp_path);

        file.write_all(contents)?;
        file.sync_all()?;
    }

    fs::rename(&temp_path, path)
}

/// Set owner-only (0600) permissions on `path`.
///
/// Failure is logged and swallowed: some filesystems and platforms cannot
/// express POSIX modes, and the write must still succeed there.
pub fn restrict_permissions(path: &Path) {
    if let Err(e) = try_restrict_permissions(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not restrict file permissions");
    }
}

#[cfg(unix)]
fn try_restrict_permissions(path: &Path) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn try_restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}
