//! Locating, loading and saving `project.pbxproj`.

use super::graph::ProjectGraph;
use crate::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// The single `.xcodeproj` bundle in a platform folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLocation {
    /// Folder containing the `.xcodeproj` bundle
    pub folder: PathBuf,
    /// Project name, the bundle name without `.xcodeproj`
    pub name: String,
}

impl ProjectLocation {
    /// Find the one `.xcodeproj` directly inside `platform_root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] when there is none and
    /// [`Error::AmbiguousProject`] when there are several.
    pub fn find(platform_root: impl AsRef<Path>) -> Result<Self> {
        let folder = platform_root.as_ref();
        if !folder.is_dir() {
            return Err(Error::ProjectNotFound(folder.display().to_string()));
        }

        let mut candidates = Vec::new();
        for entry in WalkDir::new(folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(std::io::Error::from)?;
            let is_project = entry.file_type().is_dir()
                && entry.path().extension().is_some_and(|e| e == "xcodeproj");
            if is_project {
                candidates.push(entry.into_path());
            }
        }

        match candidates.len() {
            0 => Err(Error::ProjectNotFound(folder.display().to_string())),
            1 => {
                let name = candidates[0]
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                Ok(Self {
                    folder: folder.to_path_buf(),
                    name,
                })
            }
            _ => Err(Error::AmbiguousProject(candidates)),
        }
    }

    pub fn xcodeproj_path(&self) -> PathBuf {
        self.folder.join(format!("{}.xcodeproj", self.name))
    }

    pub fn pbxproj_path(&self) -> PathBuf {
        self.xcodeproj_path().join("project.pbxproj")
    }
}

/// Reads and writes one project file.
///
/// The graph is written back to the path it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ProjectGraph> {
        let text = fs::read_to_string(&self.path)?;
        let graph = ProjectGraph::parse(&text)?;
        log::debug!("Loaded {} objects from {}", graph.len(), self.path.display());
        Ok(graph)
    }

    /// Serialize and replace the project file.
    ///
    /// The text goes to a temporary file in the same folder first, then is
    /// renamed over the original, so a failed write leaves the old file.
    pub fn write(&self, graph: &ProjectGraph) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(graph.to_text().as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        log::debug!("Wrote {} objects to {}", graph.len(), self.path.display());
        Ok(())
    }
}

/// A project the host build tool has already parsed.
#[derive(Debug, Clone)]
pub struct ProjectHandle {
    pub store: ProjectStore,
    pub graph: ProjectGraph,
}

impl ProjectHandle {
    pub fn new(path: impl Into<PathBuf>, graph: ProjectGraph) -> Self {
        Self {
            store: ProjectStore::new(path),
            graph,
        }
    }

    /// Load the project at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = ProjectStore::new(path);
        let graph = store.load()?;
        Ok(Self { store, graph })
    }
}
