//! Removable media discovery.

use std::path::{Path, PathBuf};

/// Roots of mounted drives a library can be copied to.
#[cfg(windows)]
pub fn removable_roots() -> Vec<PathBuf> {
    ('A'..='Z')
        .map(|letter| PathBuf::from(format!("{letter}:\\")))
        .filter(|root| root.exists())
        .collect()
}

/// Roots of mounted drives a library can be copied to.
#[cfg(not(windows))]
pub fn removable_roots() -> Vec<PathBuf> {
    let user = std::env::var("USER").unwrap_or_default();
    let mut mount_dirs = vec![PathBuf::from("/mnt"), PathBuf::from("/Volumes")];
    if !user.is_empty() {
        mount_dirs.push(Path::new("/media").join(&user));
        mount_dirs.push(Path::new("/run/media").join(&user));
    }

    let mut roots: Vec<PathBuf> = mount_dirs.iter().flat_map(|dir| subdirectories(dir)).collect();
    roots.sort();
    roots.dedup();
    roots
}

#[cfg_attr(windows, allow(dead_code))]
fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect()
        })
        .unwrap_or_default()
}

/// The string substituted for the `drive:` placeholder for `root`.
pub fn media_root_string(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_subdirectories_lists_only_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        std::fs::create_dir(temp_dir.path().join("USB")).expect("Failed to create directory");
        std::fs::write(temp_dir.path().join("file.txt"), "x").expect("Failed to write file");

        let found = subdirectories(temp_dir.path());
        assert_eq!(found, vec![temp_dir.path().join("USB")]);
        assert!(subdirectories(&temp_dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_media_root_string() {
        assert_eq!(media_root_string(Path::new("/media/usb")), "/media/usb");
    }
}
