//! Atomic file writes via temp file + rename.

use std::io::Write;
use std::path::Path;

use founderwiki_shared::{FounderWikiError, Result};
use tempfile::NamedTempFile;

/// Atomically write `content` to `path`.
///
/// Writes to a temporary file in the same directory as the target, then
/// renames it over the final path, so readers never see a partially-written
/// file. The temp file must live in the target directory — rename is only
/// atomic within one filesystem.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        FounderWikiError::Storage(format!(
            "cannot determine parent directory for {}",
            path.display()
        ))
    })?;

    // An empty parent means a bare relative filename; write into cwd.
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| FounderWikiError::io(parent, e))?;
    temp.write_all(content)
        .map_err(|e| FounderWikiError::io(path, e))?;
    temp.flush().map_err(|e| FounderWikiError::io(path, e))?;

    temp.persist(path).map_err(|e| {
        FounderWikiError::Storage(format!("failed to persist {}: {}", path.display(), e.error))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_new_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        atomic_write(&path, b"{\"cursor\": 0}").expect("write");
        assert_eq!(
            std::fs::read_to_string(&path).expect("read"),
            "{\"cursor\": 0}"
        );
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        std::fs::write(&path, "old").expect("seed");
        atomic_write(&path, b"new contents").expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "new contents");
    }

    #[test]
    fn bare_filename_writes_to_cwd() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prev = std::env::current_dir().expect("cwd");
        std::env::set_current_dir(dir.path()).expect("chdir");

        let result = atomic_write(Path::new("bare.json"), b"x");
        std::env::set_current_dir(prev).expect("restore cwd");

        result.expect("write");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("bare.json")).expect("read"),
            "x"
        );
    }
}
