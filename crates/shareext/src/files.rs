//! Extension file discovery and classification
//!
//! The extension folder is flat: headers and implementation files go to the
//! Sources build phase, property lists are project inputs only, and
//! everything else (storyboards, asset catalogs, images) is a bundle resource.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Bucket a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Compiled into the extension (`.h`, `.m`)
    Source,
    /// Build configuration input, never compiled nor bundled (`.plist`)
    Plist,
    /// Copied into the extension bundle
    Resource,
}

impl FileKind {
    /// Classify by extension, without the leading dot.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "h" | "m" => FileKind::Source,
            "plist" => FileKind::Plist,
            _ => FileKind::Resource,
        }
    }
}

/// A single entry of the extension folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFile {
    /// File name, also used as the project reference name
    pub name: String,
    /// Absolute path on disk
    pub path: PathBuf,
    /// Extension without the dot, empty when there is none
    pub extension: String,
}

impl ExtensionFile {
    fn new(dir: &Path, name: &str) -> Self {
        let extension = Path::new(name)
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            path: dir.join(name),
            extension,
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_extension(&self.extension)
    }
}

/// Extension files split into three disjoint, ordered buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionFileSet {
    pub source: Vec<ExtensionFile>,
    pub plist: Vec<ExtensionFile>,
    pub resource: Vec<ExtensionFile>,
}

impl ExtensionFileSet {
    /// Classify a directory listing. Names starting with `.` are dropped.
    pub fn classify<I, S>(dir: impl AsRef<Path>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let dir = dir.as_ref();
        let mut set = Self::default();

        for name in names {
            let name = name.as_ref();
            if name.starts_with('.') {
                continue;
            }
            let file = ExtensionFile::new(dir, name);
            match file.kind() {
                FileKind::Source => set.source.push(file),
                FileKind::Plist => set.plist.push(file),
                FileKind::Resource => set.resource.push(file),
            }
        }

        set
    }

    /// List and classify the top level of `dir`, sorted by file name.
    ///
    /// Directories count as entries too: an asset catalog is a resource.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingExtensionFiles`] if `dir` is not a directory.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::MissingExtensionFiles(dir.to_path_buf()));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }

        let set = Self::classify(dir, &names);
        log::debug!(
            "Classified {} extension files: {} source, {} plist, {} resource",
            set.len(),
            set.source.len(),
            set.plist.len(),
            set.resource.len()
        );
        Ok(set)
    }

    /// Files whose content carries template tokens: plists first, then sources.
    pub fn templated(&self) -> impl Iterator<Item = &ExtensionFile> {
        self.plist.iter().chain(self.source.iter())
    }

    /// Every file with its bucket.
    pub fn iter(&self) -> impl Iterator<Item = (FileKind, &ExtensionFile)> {
        self.plist
            .iter()
            .map(|f| (FileKind::Plist, f))
            .chain(self.source.iter().map(|f| (FileKind::Source, f)))
            .chain(self.resource.iter().map(|f| (FileKind::Resource, f)))
    }

    pub fn len(&self) -> usize {
        self.source.len() + self.plist.len() + self.resource.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn names(files: &[ExtensionFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_classify_listing() {
        let set = ExtensionFileSet::classify(
            "/ext",
            ["A.h", "B.m", "C.plist", "D.png", ".hidden"],
        );

        assert_eq!(names(&set.source), ["A.h", "B.m"]);
        assert_eq!(names(&set.plist), ["C.plist"]);
        assert_eq!(names(&set.resource), ["D.png"]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.source[0].path, PathBuf::from("/ext/A.h"));
        assert_eq!(set.source[0].extension, "h");
    }

    #[test]
    fn test_classify_without_extension_is_resource() {
        let set = ExtensionFileSet::classify("/ext", ["LICENSE", "Media.xcassets"]);
        assert_eq!(names(&set.resource), ["LICENSE", "Media.xcassets"]);
        assert!(set.source.is_empty());
        assert!(set.plist.is_empty());
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = tempdir().unwrap();
        let set = ExtensionFileSet::scan(temp_dir.path()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set, ExtensionFileSet::default());
    }

    #[test]
    fn test_scan_sorted_and_skips_dotfiles() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("ShareViewController.m"), b"").unwrap();
        fs::write(dir.join("ShareViewController.h"), b"").unwrap();
        fs::write(dir.join("ShareExtension-Info.plist"), b"").unwrap();
        fs::write(dir.join("MainInterface.storyboard"), b"").unwrap();
        fs::write(dir.join(".DS_Store"), b"").unwrap();

        let set = ExtensionFileSet::scan(dir).unwrap();
        assert_eq!(
            names(&set.source),
            ["ShareViewController.h", "ShareViewController.m"]
        );
        assert_eq!(names(&set.plist), ["ShareExtension-Info.plist"]);
        assert_eq!(names(&set.resource), ["MainInterface.storyboard"]);

        let templated: Vec<_> = set.templated().map(|f| f.name.as_str()).collect();
        assert_eq!(
            templated,
            [
                "ShareExtension-Info.plist",
                "ShareViewController.h",
                "ShareViewController.m"
            ]
        );
    }

    #[test]
    fn test_scan_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let missing = temp_dir.path().join("ShareExtension");
        let err = ExtensionFileSet::scan(&missing).unwrap_err();
        assert!(matches!(err, Error::MissingExtensionFiles(p) if p == missing));
    }
}
