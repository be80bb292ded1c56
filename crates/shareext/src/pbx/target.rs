//! Extension target creation and file attachment.
//!
//! Creating the target also creates everything Xcode needs to build and
//! embed an app extension: two empty build phases (Sources, Resources), a
//! Debug/Release configuration list, the `.appex` product reference, the
//! project's target registration, and an embed phase plus dependency on the
//! host app target. All of it happens once, together with the target, so a
//! second run finds the target and adds nothing.
//!
//! The removal path only detaches files. The target and its phases stay.

use super::graph::{
    BuildConfiguration, BuildFile, BuildPhase, FileReference, NativeTarget, Node, ObjectId,
    OpaqueNode, PhaseKind, ProjectGraph,
};
use crate::constants::*;
use crate::files::{ExtensionFile, ExtensionFileSet, FileKind};
use crate::{Error, Result};
use plist::{Dictionary, Value};

/// Outcome of [`ProjectGraph::ensure_target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredTarget {
    pub id: ObjectId,
    /// False when the target already existed
    pub created: bool,
}

fn dict(entries: &[(&str, Value)]) -> Dictionary {
    let mut dict = Dictionary::new();
    for (key, value) in entries {
        dict.insert(key.to_string(), value.clone());
    }
    dict
}

fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

fn phase_extra() -> Dictionary {
    dict(&[
        ("buildActionMask", string("2147483647")),
        ("runOnlyForDeploymentPostprocessing", string("0")),
    ])
}

impl ProjectGraph {
    /// Id of the first native target named `name`.
    pub fn find_target(&self, name: &str) -> Option<ObjectId> {
        self.iter().find_map(|(id, node)| match node {
            Node::NativeTarget(t) if t.name == name => Some(id.clone()),
            _ => None,
        })
    }

    /// Create the app extension target `name` unless it exists.
    pub fn ensure_target(&mut self, name: &str) -> EnsuredTarget {
        if let Some(id) = self.find_target(name) {
            log::info!("    {name} target already exists.");
            return EnsuredTarget { id, created: false };
        }

        let id = self.create_extension_target(name);
        EnsuredTarget { id, created: true }
    }

    fn create_extension_target(&mut self, name: &str) -> ObjectId {
        let settings = dict(&[
            ("INFOPLIST_FILE", string(EXTENSION_INFO_PLIST)),
            (
                "LD_RUNPATH_SEARCH_PATHS",
                string("$(inherited) @executable_path/Frameworks @executable_path/../../Frameworks"),
            ),
            ("PRODUCT_NAME", string(name)),
            ("SKIP_INSTALL", string("YES")),
        ]);
        let configurations: Vec<Value> = ["Debug", "Release"]
            .iter()
            .map(|config| {
                Value::String(self.insert(Node::BuildConfiguration(BuildConfiguration {
                    name: Some(config.to_string()),
                    build_settings: settings.clone(),
                    extra: Dictionary::new(),
                })))
            })
            .collect();
        let configuration_list = self.insert(Node::Other(
            OpaqueNode::new("XCConfigurationList")
                .with("buildConfigurations", Value::Array(configurations))
                .with("defaultConfigurationIsVisible", "0")
                .with("defaultConfigurationName", "Release"),
        ));

        let product = self.insert(Node::FileReference(FileReference {
            name: None,
            path: Some(format!("{name}.appex")),
            extra: dict(&[
                ("explicitFileType", string(last_known_file_type("appex"))),
                ("includeInIndex", string("0")),
                ("sourceTree", string("BUILT_PRODUCTS_DIR")),
            ]),
        }));
        if let Some(products) = self.find_group(PRODUCTS_GROUP_NAME) {
            self.link_child(&products, &product);
        }

        let sources = self.insert(Node::BuildPhase(BuildPhase {
            kind: PhaseKind::Sources,
            files: Vec::new(),
            extra: phase_extra(),
        }));
        let resources = self.insert(Node::BuildPhase(BuildPhase {
            kind: PhaseKind::Resources,
            files: Vec::new(),
            extra: phase_extra(),
        }));

        let target = self.insert(Node::NativeTarget(NativeTarget {
            name: name.to_string(),
            build_phases: vec![sources, resources],
            extra: dict(&[
                ("buildConfigurationList", Value::String(configuration_list)),
                ("buildRules", Value::Array(Vec::new())),
                ("dependencies", Value::Array(Vec::new())),
                ("productName", string(name)),
                ("productReference", Value::String(product.clone())),
                ("productType", string(APP_EXTENSION_PRODUCT_TYPE)),
            ]),
        }));

        if let Some(host) = self.register_target(&target) {
            self.embed_in_host(&host, &target, &product, name);
        }

        log::debug!("Created target {name} ({target})");
        target
    }

    /// Append `target` to the project's targets; returns the first (host) target.
    fn register_target(&mut self, target: &str) -> Option<ObjectId> {
        let Some(project) = self.project_mut() else {
            log::warn!("No PBXProject root object, target {target} is not registered");
            return None;
        };

        if !project.props.contains_key("targets") {
            project
                .props
                .insert("targets".to_string(), Value::Array(Vec::new()));
        }
        let Some(Value::Array(targets)) = project.props.get_mut("targets") else {
            log::warn!("PBXProject targets is not a list, target {target} is not registered");
            return None;
        };

        let host = targets
            .first()
            .and_then(Value::as_string)
            .map(str::to_string);
        targets.push(Value::String(target.to_string()));
        if host.is_none() {
            log::warn!("No host app target found, {target} is not embedded");
        }
        host
    }

    /// Copy the extension product into the host's `PlugIns/` and make the
    /// host depend on the extension target.
    fn embed_in_host(&mut self, host: &str, target: &str, product: &str, name: &str) {
        let attributes = dict(&[("ATTRIBUTES", Value::Array(vec![string("RemoveHeadersOnCopy")]))]);
        let embedded = self.insert(Node::BuildFile(BuildFile {
            file_ref: Some(product.to_string()),
            extra: dict(&[("settings", Value::Dictionary(attributes))]),
        }));

        let mut extra = phase_extra();
        extra.insert("dstPath".to_string(), string(""));
        extra.insert("dstSubfolderSpec".to_string(), string(PLUGINS_SUBFOLDER_SPEC));
        extra.insert("name".to_string(), string("Embed App Extensions"));
        let embed_phase = self.insert(Node::BuildPhase(BuildPhase {
            kind: PhaseKind::CopyFiles,
            files: vec![embedded],
            extra,
        }));

        let project = self.root_object_id().unwrap_or_default().to_string();
        let proxy = self.insert(Node::Other(
            OpaqueNode::new("PBXContainerItemProxy")
                .with("containerPortal", project)
                .with("proxyType", "1")
                .with("remoteGlobalIDString", target)
                .with("remoteInfo", name),
        ));
        let dependency = self.insert(Node::Other(
            OpaqueNode::new("PBXTargetDependency")
                .with("target", target)
                .with("targetProxy", proxy),
        ));

        let Some(host) = self.target_mut(host) else {
            log::warn!("Host target {host} not found, {name} is not embedded");
            return;
        };
        host.build_phases.push(embed_phase);
        if !host.extra.contains_key("dependencies") {
            host.extra
                .insert("dependencies".to_string(), Value::Array(Vec::new()));
        }
        if let Some(Value::Array(dependencies)) = host.extra.get_mut("dependencies") {
            dependencies.push(Value::String(dependency));
        }
    }

    /// The first phase of `kind` in the target's build phases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if the target is missing, references a
    /// phase that does not exist, or has no phase of that kind.
    pub fn target_phase(&self, target_id: &str, kind: &PhaseKind) -> Result<ObjectId> {
        let target = self
            .target(target_id)
            .ok_or_else(|| Error::Graph(format!("target {target_id} not found")))?;

        for phase_id in &target.build_phases {
            let phase = self.phase(phase_id).ok_or_else(|| {
                Error::Graph(format!(
                    "target {} references missing build phase {phase_id}",
                    target.name
                ))
            })?;
            if &phase.kind == kind {
                return Ok(phase_id.clone());
            }
        }

        Err(Error::Graph(format!(
            "target {} has no {} phase",
            target.name,
            kind.display_name()
        )))
    }

    /// The file reference for `file_name` directly inside the group.
    pub fn group_file(&self, group_id: &str, file_name: &str) -> Option<ObjectId> {
        self.group(group_id)?
            .children
            .iter()
            .find(|child| {
                self.file_reference(child)
                    .is_some_and(|f| f.path.as_deref() == Some(file_name))
            })
            .cloned()
    }

    fn add_file_reference(&mut self, group_id: &str, file: &ExtensionFile) -> Option<ObjectId> {
        if self.group_file(group_id, &file.name).is_some() {
            log::debug!("{} already in group, skipped", file.name);
            return None;
        }

        let mut extra = dict(&[
            ("lastKnownFileType", string(last_known_file_type(&file.extension))),
            ("sourceTree", string("<group>")),
        ]);
        if file.kind() != FileKind::Resource {
            extra.insert("fileEncoding".to_string(), string("4"));
        }

        let id = self.insert(Node::FileReference(FileReference {
            name: Some(file.name.clone()),
            path: Some(file.name.clone()),
            extra,
        }));
        self.link_child(group_id, &id);
        Some(id)
    }

    /// Register the extension files under the group and the target's phases.
    ///
    /// Plists only get a file reference. Sources and resources also get a
    /// build file in the Sources or Resources phase. Files already in the
    /// group are skipped. Returns the number of files added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] if the group or either phase is missing.
    pub fn attach_files(
        &mut self,
        group_id: &str,
        target_id: &str,
        files: &ExtensionFileSet,
    ) -> Result<usize> {
        if self.group(group_id).is_none() {
            return Err(Error::Graph(format!("group {group_id} not found")));
        }
        let sources = self.target_phase(target_id, &PhaseKind::Sources)?;
        let resources = self.target_phase(target_id, &PhaseKind::Resources)?;

        let mut attached = 0;
        for (kind, file) in files.iter() {
            let Some(file_ref) = self.add_file_reference(group_id, file) else {
                continue;
            };
            attached += 1;

            let phase = match kind {
                FileKind::Plist => continue,
                FileKind::Source => &sources,
                FileKind::Resource => &resources,
            };
            let build_file = self.insert(Node::BuildFile(BuildFile {
                file_ref: Some(file_ref),
                extra: Dictionary::new(),
            }));
            if let Some(phase) = self.phase_mut(phase) {
                phase.files.push(build_file);
            }
        }

        Ok(attached)
    }

    /// Remove the extension files from the group and from every build phase.
    ///
    /// Deletes each matching file reference, the build files pointing at it
    /// and their phase entries. Returns the number of files removed.
    pub fn detach_files(&mut self, group_id: &str, files: &ExtensionFileSet) -> usize {
        let mut removed = 0;

        for (_, file) in files.iter() {
            let Some(file_ref) = self.group_file(group_id, &file.name) else {
                continue;
            };
            self.unlink_child(group_id, &file_ref);
            self.remove(&file_ref);

            let build_files: Vec<ObjectId> = self
                .iter()
                .filter_map(|(id, node)| match node {
                    Node::BuildFile(b) if b.file_ref.as_deref() == Some(file_ref.as_str()) => {
                        Some(id.clone())
                    }
                    _ => None,
                })
                .collect();
            for build_file in &build_files {
                self.remove(build_file);
            }
            for (_, node) in self.iter_mut() {
                if let Node::BuildPhase(phase) = node {
                    phase.files.retain(|f| !build_files.contains(f));
                }
            }

            removed += 1;
        }

        removed
    }
}
