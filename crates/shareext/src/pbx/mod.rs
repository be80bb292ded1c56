//! Xcode project file support.
//!
//! - [`ascii`]: the old-style ASCII plist codec `project.pbxproj` is written in
//! - [`graph`]: typed view of the object table
//! - [`group`] and [`target`]: the idempotent mutations the hooks apply
//! - [`store`]: finding the project in a platform folder and persisting it

pub mod ascii;
pub mod graph;
pub mod group;
pub mod store;
pub mod target;

pub use graph::{
    BuildConfiguration, BuildFile, BuildPhase, FileReference, Group, NativeTarget, Node, ObjectId,
    OpaqueNode, PhaseKind, ProjectGraph,
};
pub use group::EnsuredGroup;
pub use store::{ProjectHandle, ProjectLocation, ProjectStore};
pub use target::EnsuredTarget;
