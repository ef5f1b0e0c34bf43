use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::OrganizeError;
use crate::types::FileEntry;

/// Regular files directly under `root`, sorted by file name.
///
/// Subdirectories (category folders from earlier runs included) and symlinks
/// are skipped. Fails only if `root` itself cannot be read.
pub fn scan_directory(root: &Path) -> Result<Vec<FileEntry>, OrganizeError> {
    let metadata = std::fs::metadata(root).map_err(|e| OrganizeError::access(root, e))?;
    if !metadata.is_dir() {
        return Err(OrganizeError::NotADirectory(root.to_path_buf()));
    }
    std::fs::read_dir(root).map_err(|e| OrganizeError::access(root, e))?;

    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!(error = %e, "skipping unreadable entry"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| FileEntry::new(entry.into_path()))
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(entries: &[FileEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn scan_lists_top_level_files_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.png"), b"png").unwrap();
        fs::write(dir.path().join("a.txt"), b"text").unwrap();
        fs::write(dir.path().join("c"), b"no extension").unwrap();

        let entries = scan_directory(dir.path()).unwrap();

        assert_eq!(names(&entries), vec!["a.txt", "b.png", "c"]);
    }

    #[test]
    fn scan_skips_subdirectories_and_their_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("Images")).unwrap();
        fs::write(dir.path().join("Images/old.png"), b"png").unwrap();
        fs::write(dir.path().join("new.png"), b"png").unwrap();

        let entries = scan_directory(dir.path()).unwrap();

        assert_eq!(names(&entries), vec!["new.png"]);
    }

    #[test]
    fn scan_includes_hidden_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), b"KEY=1").unwrap();

        let entries = scan_directory(dir.path()).unwrap();
        assert_eq!(names(&entries), vec![".env"]);
    }

    #[test]
    fn scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(scan_directory(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_missing_root_is_access_error() {
        let dir = TempDir::new().unwrap();
        let result = scan_directory(&dir.path().join("missing"));
        assert!(matches!(result, Err(OrganizeError::DirectoryAccess { .. })));
    }

    #[test]
    fn scan_file_root_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, b"text").unwrap();

        let result = scan_directory(&file);
        assert!(matches!(result, Err(OrganizeError::NotADirectory(_))));
    }
}
