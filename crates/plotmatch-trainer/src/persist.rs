//! Atomic file replacement.

use std::io::Write;
use std::path::Path;

use plotmatch_core::{PlotMatchError, Result};
use tempfile::NamedTempFile;

/// Replaces `path` with `bytes` so that readers see either the old or the
/// new content, never a partial write.
///
/// The data is written to a temporary file in the same directory, flushed
/// to disk, then renamed over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| PlotMatchError::persistence(path, "path has no parent directory"))?;
    std::fs::create_dir_all(dir).map_err(|e| PlotMatchError::persistence(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PlotMatchError::persistence(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| PlotMatchError::persistence(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| PlotMatchError::persistence(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("model.json");

        write_atomic(&path, b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn leaves_no_temporary_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_atomic(&path, b"{}").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn unwritable_target_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let err = write_atomic(&blocker.join("model.json"), b"{}").unwrap_err();
        assert!(matches!(err, PlotMatchError::Persistence { .. }));
    }
}
