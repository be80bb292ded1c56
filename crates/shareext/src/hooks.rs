//! Lifecycle hooks
//!
//! Entry points the host build tool runs after the plugin is installed or
//! before it is removed. Each hook loads the Xcode project once, mutates it in
//! memory and writes it back once, after every other step has succeeded.

use crate::constants::*;
use crate::copy::copy_extension_files;
use crate::entitlements::patch_entitlements;
use crate::files::ExtensionFileSet;
use crate::pbx::{EnsuredGroup, EnsuredTarget, ObjectId, ProjectGraph, ProjectHandle, ProjectLocation};
use crate::prefs::{self, AppMetadata, ConfigXml, Overrides, PreferenceSet};
use crate::signing::{configure_signing, SigningIdentity};
use crate::template;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Where a hook runs and with which overrides.
///
/// # Example
///
/// ```no_run
/// use shareext::{hooks, HookContext, Overrides};
///
/// let overrides = Overrides::parse_args(std::env::args().skip(1))?;
/// let report = hooks::add_target(HookContext::new("/path/to/app").overrides(overrides))?;
/// println!("{} files attached", report.files_attached);
/// # Ok::<(), shareext::Error>(())
/// ```
#[derive(Debug)]
pub struct HookContext {
    project_root: PathBuf,
    platform_root: Option<PathBuf>,
    plugin_root: Option<PathBuf>,
    project: Option<ProjectHandle>,
    overrides: Overrides,
}

impl HookContext {
    /// Context for the Cordova project at `project_root`.
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            platform_root: None,
            plugin_root: None,
            project: None,
            overrides: Overrides::new(),
        }
    }

    /// Set the iOS platform folder. Defaults to `<project_root>/platforms/ios`.
    pub fn platform_root(mut self, path: impl AsRef<Path>) -> Self {
        self.platform_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the installed plugin folder. Defaults to `<project_root>/plugins/<plugin id>`.
    pub fn plugin_root(mut self, path: impl AsRef<Path>) -> Self {
        self.plugin_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a project the host has already parsed instead of locating one.
    pub fn project(mut self, project: ProjectHandle) -> Self {
        self.project = Some(project);
        self
    }

    /// Set the command-line overrides.
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_root
    }

    pub fn platform_dir(&self) -> PathBuf {
        self.platform_root
            .clone()
            .unwrap_or_else(|| self.project_root.join("platforms").join("ios"))
    }

    pub fn plugin_dir(&self) -> PathBuf {
        self.plugin_root
            .clone()
            .unwrap_or_else(|| self.project_root.join("plugins").join(PLUGIN_ID))
    }

    pub fn config_xml_path(&self) -> PathBuf {
        self.project_root.join("config.xml")
    }

    /// Extension files inside the platform tree.
    pub fn extension_dir(&self) -> PathBuf {
        self.platform_dir().join(EXTENSION_FOLDER)
    }

    /// Extension files shipped with the plugin.
    pub fn extension_source_dir(&self) -> PathBuf {
        self.plugin_dir().join("src").join("ios").join(EXTENSION_FOLDER)
    }
}

/// What [`add_target`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddReport {
    /// The `project.pbxproj` that was written
    pub project: PathBuf,
    pub target: ObjectId,
    pub group: ObjectId,
    pub target_created: bool,
    pub group_created: bool,
    pub files_attached: usize,
    pub signed_configurations: usize,
    pub rewritten_files: usize,
    pub preferences: PreferenceSet,
}

/// What [`remove_target`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveReport {
    pub project: PathBuf,
    /// `None` when there was no group, and nothing was written
    pub group: Option<ObjectId>,
    pub files_detached: usize,
}

struct Mutation {
    group: EnsuredGroup,
    target: EnsuredTarget,
    attached: usize,
    signed: usize,
}

/// The host's handle, or the single project found in the platform folder.
fn open_project(handle: Option<ProjectHandle>, platform: &Path) -> Result<(String, ProjectHandle)> {
    match handle {
        Some(handle) => {
            let name = handle
                .store
                .path()
                .parent()
                .and_then(Path::file_stem)
                .map(|s| s.to_string_lossy().to_string())
                .ok_or_else(|| Error::ProjectNotFound(handle.store.path().display().to_string()))?;
            Ok((name, handle))
        }
        None => {
            let location = ProjectLocation::find(platform)?;
            let handle = ProjectHandle::open(location.pbxproj_path())?;
            Ok((location.name, handle))
        }
    }
}

/// Group, then target, then files, then signing; each step needs the previous ones.
fn mutate(
    graph: &mut ProjectGraph,
    files: &ExtensionFileSet,
    signing: Option<&SigningIdentity>,
) -> Result<Mutation> {
    let group = graph.ensure_group(GROUP_NAME, Some(EXTENSION_FOLDER), PARENT_GROUP_NAME);
    let target = graph.ensure_target(TARGET_NAME);
    let attached = graph.attach_files(&group.id, &target.id, files)?;
    let signed = configure_signing(graph, signing, PRODUCT_NAME_MARKER);

    Ok(Mutation {
        group,
        target,
        attached,
        signed,
    })
}

/// Add the share extension target to the Xcode project.
///
/// Safe to run repeatedly: existing target, group and file references are
/// reused. Steps run in four phases:
///
/// 1. project, extension files and `config.xml` are read concurrently
/// 2. preferences are resolved while the project graph is mutated
/// 3. extension files are templated while both entitlement files are patched
/// 4. the project file is written
///
/// # Errors
///
/// Any failure aborts the hook before the project file is written.
pub fn add_target(mut ctx: HookContext) -> Result<AddReport> {
    log::info!("Adding target \"{PLUGIN_ID}/{GROUP_NAME}\" to XCode project");

    let platform = ctx.platform_dir();
    let extension_dir = ctx.extension_dir();
    let config_path = ctx.config_xml_path();
    let host_project = ctx.project.take();

    let (opened, (files, config)) = rayon::join(
        || open_project(host_project, &platform),
        || {
            rayon::join(
                || ExtensionFileSet::scan(&extension_dir),
                || ConfigXml::load(&config_path),
            )
        },
    );
    let (name, mut handle) = opened?;
    let files = files?;
    let config = config?;

    let signing = SigningIdentity::resolve(&config, &ctx.overrides);
    let metadata_path = AppMetadata::info_plist_path(&platform, &name);
    let overrides = &ctx.overrides;
    let graph = &mut handle.graph;
    let (preferences, mutation) = rayon::join(
        || -> Result<PreferenceSet> {
            let metadata = AppMetadata::load(&metadata_path)?;
            Ok(prefs::resolve(&name, &metadata, &config, overrides))
        },
        || mutate(graph, &files, signing.as_ref()),
    );
    let preferences = preferences?;
    let mutation = mutation?;

    let templated: Vec<PathBuf> = files.templated().map(|f| f.path.clone()).collect();
    let group_identifier = preferences.group_identifier().unwrap_or_default();
    let app_dir = platform.join(&name);
    let (rewritten, entitlements) = rayon::join(
        || template::rewrite_files(&templated, &preferences),
        || {
            patch_entitlements(
                app_dir.join(ENTITLEMENTS_DEBUG),
                app_dir.join(ENTITLEMENTS_RELEASE),
                group_identifier,
            )
        },
    );
    let rewritten = rewritten?;
    entitlements?;

    handle.store.write(&handle.graph)?;

    log::info!("Added {GROUP_NAME} to XCode project");
    Ok(AddReport {
        project: handle.store.path().to_path_buf(),
        target: mutation.target.id,
        group: mutation.group.id,
        target_created: mutation.target.created,
        group_created: mutation.group.created,
        files_attached: mutation.attached,
        signed_configurations: mutation.signed,
        rewritten_files: rewritten,
        preferences,
    })
}

/// Detach the share extension group and files from the Xcode project.
///
/// The target and its build phases are kept. Without a group there is
/// nothing to do and the project file is not written.
pub fn remove_target(mut ctx: HookContext) -> Result<RemoveReport> {
    log::info!("Removing target \"{PLUGIN_ID}/{GROUP_NAME}\" from XCode project");

    let platform = ctx.platform_dir();
    let extension_dir = ctx.extension_dir();
    let host_project = ctx.project.take();

    let (opened, files) = rayon::join(
        || open_project(host_project, &platform),
        || ExtensionFileSet::scan(&extension_dir),
    );
    let (_, mut handle) = opened?;
    let files = files?;
    let project = handle.store.path().to_path_buf();

    let Some(group) = handle.graph.remove_group(GROUP_NAME, PARENT_GROUP_NAME) else {
        return Ok(RemoveReport {
            project,
            group: None,
            files_detached: 0,
        });
    };
    let detached = handle.graph.detach_files(&group, &files);

    handle.store.write(&handle.graph)?;

    log::info!("Removed {GROUP_NAME} from XCode project");
    Ok(RemoveReport {
        project,
        group: Some(group),
        files_detached: detached,
    })
}

/// Copy the plugin's extension folder into the platform tree.
///
/// Returns the destination folder.
pub fn copy_extension(ctx: &HookContext) -> Result<PathBuf> {
    log::info!("Copying \"{PLUGIN_ID}/{GROUP_NAME}\" to ios...");

    let src = ctx.extension_source_dir();
    let dest = ctx.extension_dir();
    copy_extension_files(&src, &dest)?;

    log::info!("Copied extension to {}.", dest.display());
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_default_paths() {
        let ctx = HookContext::new("/work/app");
        assert_eq!(ctx.platform_dir(), Path::new("/work/app/platforms/ios"));
        assert_eq!(
            ctx.plugin_dir(),
            Path::new("/work/app/plugins/cc.fovea.cordova.openwith")
        );
        assert_eq!(ctx.config_xml_path(), Path::new("/work/app/config.xml"));
        assert_eq!(
            ctx.extension_dir(),
            Path::new("/work/app/platforms/ios/ShareExtension")
        );
        assert_eq!(
            ctx.extension_source_dir(),
            Path::new("/work/app/plugins/cc.fovea.cordova.openwith/src/ios/ShareExtension")
        );
    }

    #[test]
    fn test_context_overridden_paths() {
        let ctx = HookContext::new("/work/app")
            .platform_root("/build/ios")
            .plugin_root("/src/plugin");
        assert_eq!(ctx.extension_dir(), Path::new("/build/ios/ShareExtension"));
        assert_eq!(
            ctx.extension_source_dir(),
            Path::new("/src/plugin/src/ios/ShareExtension")
        );
        assert_eq!(ctx.project_dir(), Path::new("/work/app"));
    }

    #[test]
    fn test_host_handle_names_project() {
        let graph = crate::pbx::graph::tests::fixture();
        let handle = ProjectHandle::new("/ios/MyApp.xcodeproj/project.pbxproj", graph);
        let (name, _) = open_project(Some(handle), Path::new("/unused")).unwrap();
        assert_eq!(name, "MyApp");
    }
}
