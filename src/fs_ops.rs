//! Filesystem primitives used by the organizer passes.
//!
//! Every pass goes through the [`FileOps`] trait so that the matching and
//! transfer logic can be exercised against a real directory tree or a
//! wrapper that injects failures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Raw list/copy/move/delete operations.
pub trait FileOps {
    /// Regular files directly inside `dir`, sorted by name.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Every entry directly inside `dir`, sorted by name.
    fn list_entries(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copies a file, replacing `to` if it exists.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Moves a file or directory.
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Removes an empty directory.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// [`FileOps`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileOps;

impl StdFileOps {
    fn sorted_entries(dir: &Path, files_only: bool) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if files_only && !entry.file_type()?.is_file() {
                continue;
            }
            paths.push(entry.path());
        }
        paths.sort();
        Ok(paths)
    }
}

impl FileOps for StdFileOps {
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::sorted_entries(dir, true)
    }

    fn list_entries(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Self::sorted_entries(dir, false)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::copy(from, to).map(|_| ())
    }

    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            // rename cannot cross filesystems; fall back for plain files
            Err(e) if from.is_file() && e.kind() == io::ErrorKind::CrossesDevices => {
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
            Err(e) => Err(e),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}

/// The final path component as an owned string, or an empty string.
pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The file name without its last extension.
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Whether `path` ends in one of `extensions` (lowercase, without dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| extensions.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_files_skips_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("b.rom"), "b").expect("Failed to write file");
        fs::write(base_path.join("a.rom"), "a").expect("Failed to write file");
        fs::create_dir(base_path.join("cover art")).expect("Failed to create directory");

        let files = StdFileOps.list_files(base_path).expect("Failed to list files");
        let names: Vec<_> = files.iter().map(|p| file_name_string(p)).collect();
        assert_eq!(names, ["a.rom", "b.rom"]);

        let entries = StdFileOps.list_entries(base_path).expect("Failed to list entries");
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_move_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let from = temp_dir.path().join("game.rom");
        let to = temp_dir.path().join("moved.rom");
        fs::write(&from, "data").expect("Failed to write file");

        StdFileOps.move_path(&from, &to).expect("Failed to move file");
        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "data");
    }

    #[test]
    fn test_name_helpers() {
        let path = Path::new("/lib/SNES/Zelda (USA).sfc");
        assert_eq!(file_name_string(path), "Zelda (USA).sfc");
        assert_eq!(file_stem_string(path), "Zelda (USA)");
        assert!(has_extension(Path::new("patch.IPS"), &["ips", "bps"]));
        assert!(!has_extension(Path::new("game.sfc"), &["ips", "bps"]));
        assert!(!has_extension(Path::new("README"), &["ips"]));
    }
}
