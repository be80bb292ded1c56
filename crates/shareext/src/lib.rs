pub mod constants;
pub mod copy;
pub mod entitlements;
pub mod error;
pub mod files;
pub mod hooks;
pub mod pbx;
pub mod prefs;
pub mod signing;
pub mod template;

pub use error::Error;
pub use files::{ExtensionFile, ExtensionFileSet, FileKind};
pub use hooks::{add_target, copy_extension, remove_target, AddReport, HookContext, RemoveReport};
pub use pbx::{ProjectGraph, ProjectHandle};
pub use prefs::{Overrides, PreferenceSet};
pub use signing::SigningIdentity;

pub type Result<T> = std::result::Result<T, Error>;
