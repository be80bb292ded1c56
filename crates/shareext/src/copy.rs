//! Copy of the extension sources into the platform tree.

use crate::{Error, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copy every file below `src` into `dest`, creating `dest` and any missing
/// ancestors first. Existing files at the destination are overwritten.
///
/// Returns the number of files copied.
///
/// # Errors
///
/// Returns [`Error::MissingExtensionFiles`] if `src` is not a directory.
pub fn copy_extension_files(src: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<usize> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if !src.is_dir() {
        return Err(Error::MissingExtensionFiles(src.to_path_buf()));
    }

    fs::create_dir_all(dest)?;

    // Directories first (sequential), then files in parallel
    let mut files: Vec<(PathBuf, PathBuf)> = Vec::new();
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            files.push((entry.path().to_path_buf(), target));
        }
    }

    files
        .par_iter()
        .map(|(from, to)| fs::copy(from, to).map(|_| ()))
        .collect::<std::io::Result<Vec<()>>>()?;

    log::debug!("Copied {} files to {}", files.len(), dest.display());
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_copy_creates_missing_ancestors() {
        let temp_dir = tempdir().unwrap();
        let src = temp_dir.path().join("plugin/src/ios/ShareExtension");
        fs::create_dir_all(src.join("Media.xcassets")).unwrap();
        fs::write(src.join("ShareViewController.m"), b"@implementation").unwrap();
        fs::write(src.join("Media.xcassets/Contents.json"), b"{}").unwrap();

        let dest = temp_dir.path().join("platforms/ios/ShareExtension");
        let copied = copy_extension_files(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(
            fs::read(dest.join("ShareViewController.m")).unwrap(),
            b"@implementation"
        );
        assert!(dest.join("Media.xcassets/Contents.json").is_file());
    }

    #[test]
    fn test_copy_overwrites_and_tolerates_existing_dest() {
        let temp_dir = tempdir().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(src.join("a.h"), b"new").unwrap();
        fs::write(dest.join("a.h"), b"old").unwrap();

        copy_extension_files(&src, &dest).unwrap();
        assert_eq!(fs::read(dest.join("a.h")).unwrap(), b"new");
    }

    #[test]
    fn test_copy_missing_source() {
        let temp_dir = tempdir().unwrap();
        let err = copy_extension_files(temp_dir.path().join("nope"), temp_dir.path().join("dest"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingExtensionFiles(_)));
        assert!(!temp_dir.path().join("dest").exists());
    }
}
