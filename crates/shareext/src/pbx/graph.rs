//! Typed, UUID-keyed project graph
//!
//! A decoded `project.pbxproj` is a dictionary of objects, each identified by
//! a 24-digit hexadecimal id and typed by its `isa` property. The node kinds
//! the hooks reason about get a typed view; every other object is kept
//! as an [`OpaqueNode`] and written back unchanged.
//!
//! Properties a typed node does not model are kept in its `extra`
//! dictionary, so decoding and re-encoding loses nothing.

use super::ascii;
use crate::{Error, Result};
use plist::{Dictionary, Value};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Object identifier (24 uppercase hex digits in files Xcode writes).
pub type ObjectId = String;

/// Kind of a build phase, from its `isa`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseKind {
    Sources,
    Resources,
    Frameworks,
    CopyFiles,
    /// Any other `PBX*BuildPhase`, holding the full `isa`
    Other(String),
}

impl PhaseKind {
    fn from_isa(isa: &str) -> Self {
        match isa {
            "PBXSourcesBuildPhase" => PhaseKind::Sources,
            "PBXResourcesBuildPhase" => PhaseKind::Resources,
            "PBXFrameworksBuildPhase" => PhaseKind::Frameworks,
            "PBXCopyFilesBuildPhase" => PhaseKind::CopyFiles,
            other => PhaseKind::Other(other.to_string()),
        }
    }

    pub fn isa(&self) -> &str {
        match self {
            PhaseKind::Sources => "PBXSourcesBuildPhase",
            PhaseKind::Resources => "PBXResourcesBuildPhase",
            PhaseKind::Frameworks => "PBXFrameworksBuildPhase",
            PhaseKind::CopyFiles => "PBXCopyFilesBuildPhase",
            PhaseKind::Other(isa) => isa,
        }
    }

    /// Name Xcode shows for the phase when it has no explicit `name`.
    pub fn display_name(&self) -> &str {
        match self {
            PhaseKind::Sources => "Sources",
            PhaseKind::Resources => "Resources",
            PhaseKind::Frameworks => "Frameworks",
            PhaseKind::CopyFiles => "CopyFiles",
            PhaseKind::Other(isa) => isa
                .strip_prefix("PBX")
                .and_then(|s| s.strip_suffix("BuildPhase"))
                .unwrap_or(isa),
        }
    }
}

/// `PBXNativeTarget`
#[derive(Debug, Clone, PartialEq)]
pub struct NativeTarget {
    pub name: String,
    pub build_phases: Vec<ObjectId>,
    pub extra: Dictionary,
}

/// `PBX*BuildPhase`
#[derive(Debug, Clone, PartialEq)]
pub struct BuildPhase {
    pub kind: PhaseKind,
    /// `PBXBuildFile` ids, in build order
    pub files: Vec<ObjectId>,
    pub extra: Dictionary,
}

/// `PBXGroup`
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: Option<String>,
    pub path: Option<String>,
    /// File references and subgroups, in display order
    pub children: Vec<ObjectId>,
    pub extra: Dictionary,
}

/// `PBXFileReference`
#[derive(Debug, Clone, PartialEq)]
pub struct FileReference {
    pub name: Option<String>,
    pub path: Option<String>,
    pub extra: Dictionary,
}

impl FileReference {
    /// `name`, falling back to `path`.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.path.as_deref())
    }
}

/// `PBXBuildFile`: membership of a file reference in a build phase
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFile {
    pub file_ref: Option<ObjectId>,
    pub extra: Dictionary,
}

/// `XCBuildConfiguration`
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfiguration {
    pub name: Option<String>,
    pub build_settings: Dictionary,
    pub extra: Dictionary,
}

impl BuildConfiguration {
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.build_settings.get(key).and_then(Value::as_string)
    }

    pub fn set_setting(&mut self, key: &str, value: impl Into<String>) {
        self.build_settings
            .insert(key.to_string(), Value::String(value.into()));
    }
}

/// Any object the hooks do not model
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueNode {
    pub isa: String,
    pub props: Dictionary,
}

impl OpaqueNode {
    pub fn new(isa: impl Into<String>) -> Self {
        Self {
            isa: isa.into(),
            props: Dictionary::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.props.insert(key.to_string(), value.into());
        self
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_string)
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    NativeTarget(NativeTarget),
    BuildPhase(BuildPhase),
    Group(Group),
    FileReference(FileReference),
    BuildFile(BuildFile),
    BuildConfiguration(BuildConfiguration),
    Other(OpaqueNode),
}

fn take_string(dict: &mut Dictionary, key: &str) -> Option<String> {
    dict.remove(key).and_then(Value::into_string)
}

fn take_ids(dict: &mut Dictionary, key: &str, owner: &str) -> Result<Vec<ObjectId>> {
    match dict.remove(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|v| {
                v.into_string()
                    .ok_or_else(|| Error::Graph(format!("{owner}: non-string entry in {key}")))
            })
            .collect(),
        Some(_) => Err(Error::Graph(format!("{owner}: {key} is not a list"))),
    }
}

fn ids_value(ids: &[ObjectId]) -> Value {
    Value::Array(ids.iter().cloned().map(Value::String).collect())
}

/// `isa` first, then every property sorted by key, as Xcode writes objects.
fn assemble(isa: &str, fields: Vec<(&str, Value)>, extra: &Dictionary) -> Dictionary {
    let mut entries: Vec<(String, Value)> = extra
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .chain(fields.into_iter().map(|(k, v)| (k.to_string(), v)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut dict = Dictionary::new();
    dict.insert("isa".to_string(), Value::String(isa.to_string()));
    for (key, value) in entries {
        dict.insert(key, value);
    }
    dict
}

impl Node {
    /// Decode one object dictionary.
    pub fn from_dictionary(id: &str, mut dict: Dictionary) -> Result<Self> {
        let isa = take_string(&mut dict, "isa")
            .ok_or_else(|| Error::Graph(format!("object {id} has no isa")))?;

        let node = match isa.as_str() {
            "PBXNativeTarget" => Node::NativeTarget(NativeTarget {
                name: take_string(&mut dict, "name").unwrap_or_default(),
                build_phases: take_ids(&mut dict, "buildPhases", id)?,
                extra: dict,
            }),
            "PBXGroup" => Node::Group(Group {
                name: take_string(&mut dict, "name"),
                path: take_string(&mut dict, "path"),
                children: take_ids(&mut dict, "children", id)?,
                extra: dict,
            }),
            "PBXFileReference" => Node::FileReference(FileReference {
                name: take_string(&mut dict, "name"),
                path: take_string(&mut dict, "path"),
                extra: dict,
            }),
            "PBXBuildFile" => Node::BuildFile(BuildFile {
                file_ref: take_string(&mut dict, "fileRef"),
                extra: dict,
            }),
            "XCBuildConfiguration" => {
                let build_settings = match dict.remove("buildSettings") {
                    None => Dictionary::new(),
                    Some(Value::Dictionary(settings)) => settings,
                    Some(_) => {
                        return Err(Error::Graph(format!("{id}: buildSettings is not a dictionary")))
                    }
                };
                Node::BuildConfiguration(BuildConfiguration {
                    name: take_string(&mut dict, "name"),
                    build_settings,
                    extra: dict,
                })
            }
            phase if phase.starts_with("PBX") && phase.ends_with("BuildPhase") => {
                Node::BuildPhase(BuildPhase {
                    kind: PhaseKind::from_isa(phase),
                    files: take_ids(&mut dict, "files", id)?,
                    extra: dict,
                })
            }
            _ => Node::Other(OpaqueNode { isa, props: dict }),
        };

        Ok(node)
    }

    /// Encode back to an object dictionary.
    pub fn to_dictionary(&self) -> Dictionary {
        let opt = |key, value: &Option<String>| value.clone().map(|v| (key, Value::String(v)));

        match self {
            Node::NativeTarget(t) => assemble(
                "PBXNativeTarget",
                vec![
                    ("name", Value::String(t.name.clone())),
                    ("buildPhases", ids_value(&t.build_phases)),
                ],
                &t.extra,
            ),
            Node::BuildPhase(p) => {
                assemble(p.kind.isa(), vec![("files", ids_value(&p.files))], &p.extra)
            }
            Node::Group(g) => {
                let mut fields = vec![("children", ids_value(&g.children))];
                fields.extend(opt("name", &g.name));
                fields.extend(opt("path", &g.path));
                assemble("PBXGroup", fields, &g.extra)
            }
            Node::FileReference(f) => {
                let mut fields = Vec::new();
                fields.extend(opt("name", &f.name));
                fields.extend(opt("path", &f.path));
                assemble("PBXFileReference", fields, &f.extra)
            }
            Node::BuildFile(b) => {
                let fields = opt("fileRef", &b.file_ref).into_iter().collect();
                assemble("PBXBuildFile", fields, &b.extra)
            }
            Node::BuildConfiguration(c) => {
                let mut fields = vec![("buildSettings", Value::Dictionary(c.build_settings.clone()))];
                fields.extend(opt("name", &c.name));
                assemble("XCBuildConfiguration", fields, &c.extra)
            }
            Node::Other(o) => assemble(&o.isa, Vec::new(), &o.props),
        }
    }

    pub fn isa(&self) -> &str {
        match self {
            Node::NativeTarget(_) => "PBXNativeTarget",
            Node::BuildPhase(p) => p.kind.isa(),
            Node::Group(_) => "PBXGroup",
            Node::FileReference(_) => "PBXFileReference",
            Node::BuildFile(_) => "PBXBuildFile",
            Node::BuildConfiguration(_) => "XCBuildConfiguration",
            Node::Other(o) => &o.isa,
        }
    }
}

/// In-memory project: header properties plus the object table.
///
/// Loaded once, mutated in memory by the group/target/signing passes, and
/// serialized once.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectGraph {
    /// Root dictionary; its `objects` entry is a placeholder filled on encode
    root: Dictionary,
    objects: BTreeMap<ObjectId, Node>,
}

impl ProjectGraph {
    /// Decode a parsed document.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = value
            .into_dictionary()
            .ok_or_else(|| Error::Graph("project root is not a dictionary".into()))?;

        let raw_objects = match root.insert("objects".to_string(), Value::Dictionary(Dictionary::new())) {
            Some(Value::Dictionary(objects)) => objects,
            Some(_) => return Err(Error::Graph("objects is not a dictionary".into())),
            None => return Err(Error::Graph("project has no objects".into())),
        };

        let mut objects = BTreeMap::new();
        for (id, value) in raw_objects {
            let dict = value
                .into_dictionary()
                .ok_or_else(|| Error::Graph(format!("object {id} is not a dictionary")))?;
            let node = Node::from_dictionary(&id, dict)?;
            objects.insert(id, node);
        }

        Ok(Self { root, objects })
    }

    /// Parse `project.pbxproj` text.
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_value(ascii::parse(text)?)
    }

    fn to_dictionary(&self) -> Dictionary {
        let mut objects = Dictionary::new();
        for (id, node) in &self.objects {
            objects.insert(id.clone(), Value::Dictionary(node.to_dictionary()));
        }
        let mut root = self.root.clone();
        root.insert("objects".to_string(), Value::Dictionary(objects));
        root
    }

    /// Encode to a document value.
    pub fn to_value(&self) -> Value {
        Value::Dictionary(self.to_dictionary())
    }

    /// Serialize to `project.pbxproj` text.
    pub fn to_text(&self) -> String {
        let comments = self.comments();
        ascii::Writer::new(&comments).write_document(&self.to_dictionary())
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &Node)> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ObjectId, &mut Node)> {
        self.objects.iter_mut()
    }

    /// A fresh id not present in the graph.
    pub fn generate_id(&self) -> ObjectId {
        loop {
            let id: String = Uuid::new_v4()
                .simple()
                .to_string()
                .to_uppercase()
                .chars()
                .take(24)
                .collect();
            if !self.objects.contains_key(&id) {
                return id;
            }
        }
    }

    /// Insert a node under a fresh id.
    pub fn insert(&mut self, node: Node) -> ObjectId {
        let id = self.generate_id();
        log::debug!("Created {} {}", node.isa(), id);
        self.objects.insert(id.clone(), node);
        id
    }

    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let node = self.objects.remove(id);
        if let Some(ref n) = node {
            log::debug!("Removed {} {}", n.isa(), id);
        }
        node
    }

    pub fn root_object_id(&self) -> Option<&str> {
        self.root.get("rootObject").and_then(Value::as_string)
    }

    /// The `PBXProject` node.
    pub fn project(&self) -> Option<&OpaqueNode> {
        match self.get(self.root_object_id()?)? {
            Node::Other(o) if o.isa == "PBXProject" => Some(o),
            _ => None,
        }
    }

    pub fn project_mut(&mut self) -> Option<&mut OpaqueNode> {
        let id = self.root_object_id()?.to_string();
        match self.get_mut(&id)? {
            Node::Other(o) if o.isa == "PBXProject" => Some(o),
            _ => None,
        }
    }

    pub fn target(&self, id: &str) -> Option<&NativeTarget> {
        match self.get(id)? {
            Node::NativeTarget(t) => Some(t),
            _ => None,
        }
    }

    pub fn target_mut(&mut self, id: &str) -> Option<&mut NativeTarget> {
        match self.get_mut(id)? {
            Node::NativeTarget(t) => Some(t),
            _ => None,
        }
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        match self.get(id)? {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        match self.get_mut(id)? {
            Node::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn phase(&self, id: &str) -> Option<&BuildPhase> {
        match self.get(id)? {
            Node::BuildPhase(p) => Some(p),
            _ => None,
        }
    }

    pub fn phase_mut(&mut self, id: &str) -> Option<&mut BuildPhase> {
        match self.get_mut(id)? {
            Node::BuildPhase(p) => Some(p),
            _ => None,
        }
    }

    pub fn file_reference(&self, id: &str) -> Option<&FileReference> {
        match self.get(id)? {
            Node::FileReference(f) => Some(f),
            _ => None,
        }
    }

    /// Every `XCBuildConfiguration`, mutably.
    pub fn build_configurations_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ObjectId, &mut BuildConfiguration)> {
        self.objects.iter_mut().filter_map(|(id, node)| match node {
            Node::BuildConfiguration(c) => Some((id, c)),
            _ => None,
        })
    }

    pub fn build_configurations(&self) -> impl Iterator<Item = (&ObjectId, &BuildConfiguration)> {
        self.objects.iter().filter_map(|(id, node)| match node {
            Node::BuildConfiguration(c) => Some((id, c)),
            _ => None,
        })
    }

    /// Check referential integrity of targets, phases and groups.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Graph`] naming the first dangling reference.
    pub fn validate(&self) -> Result<()> {
        for (id, node) in &self.objects {
            match node {
                Node::NativeTarget(t) => {
                    for phase in &t.build_phases {
                        if self.phase(phase).is_none() {
                            return Err(Error::Graph(format!(
                                "target {} ({id}) references missing build phase {phase}",
                                t.name
                            )));
                        }
                    }
                }
                Node::BuildPhase(p) => {
                    for file in &p.files {
                        if !self.contains(file) {
                            return Err(Error::Graph(format!(
                                "build phase {id} references missing build file {file}"
                            )));
                        }
                    }
                }
                Node::Group(g) => {
                    for child in &g.children {
                        if !self.contains(child) {
                            return Err(Error::Graph(format!(
                                "group {id} references missing child {child}"
                            )));
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Name of the first target, which Xcode also gives the project.
    pub fn project_name(&self) -> Option<&str> {
        let first = self
            .project()?
            .props
            .get("targets")?
            .as_array()?
            .first()?
            .as_string()?;
        self.target(first).map(|t| t.name.as_str())
    }

    /// Annotations written after object ids.
    fn comments(&self) -> HashMap<String, String> {
        let mut comments = HashMap::new();
        let mut phase_names: HashMap<&str, String> = HashMap::new();

        for (id, node) in &self.objects {
            let comment = match node {
                Node::NativeTarget(t) => Some(t.name.clone()),
                Node::BuildPhase(p) => {
                    let name = p
                        .extra
                        .get("name")
                        .and_then(Value::as_string)
                        .unwrap_or_else(|| p.kind.display_name())
                        .to_string();
                    for file in &p.files {
                        phase_names.insert(file, name.clone());
                    }
                    Some(name)
                }
                Node::Group(g) => g.name.clone().or_else(|| g.path.clone()),
                Node::FileReference(f) => f.display_name().map(str::to_string),
                Node::BuildConfiguration(c) => c.name.clone(),
                Node::BuildFile(_) => None,
                Node::Other(o) => match o.isa.as_str() {
                    "PBXProject" => Some("Project object".to_string()),
                    "PBXContainerItemProxy" | "PBXTargetDependency" => Some(o.isa.clone()),
                    _ => o.string("name").map(str::to_string),
                },
            };
            if let Some(comment) = comment {
                comments.insert(id.clone(), comment);
            }
        }

        for (id, node) in &self.objects {
            match node {
                Node::BuildFile(b) => {
                    let file = b
                        .file_ref
                        .as_deref()
                        .and_then(|r| self.file_reference(r))
                        .and_then(FileReference::display_name);
                    if let (Some(file), Some(phase)) = (file, phase_names.get(id.as_str())) {
                        comments.insert(id.clone(), format!("{file} in {phase}"));
                    }
                }
                Node::NativeTarget(t) => {
                    if let Some(list) = t.extra.get("buildConfigurationList").and_then(Value::as_string) {
                        comments.insert(
                            list.to_string(),
                            format!("Build configuration list for PBXNativeTarget \"{}\"", t.name),
                        );
                    }
                }
                Node::Other(o) if o.isa == "PBXProject" => {
                    if let Some(list) = o.string("buildConfigurationList") {
                        let comment = match self.project_name() {
                            Some(name) => format!("Build configuration list for PBXProject \"{name}\""),
                            None => "Build configuration list for PBXProject".to_string(),
                        };
                        comments.insert(list.to_string(), comment);
                    }
                }
                _ => {}
            }
        }

        comments
    }
}
