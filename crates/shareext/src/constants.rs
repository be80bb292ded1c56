//! Names, tokens and file-type tables shared by the hooks
//!
//! These constants pin the identity of the share extension inside the
//! Xcode project (target, group, product) and the placeholder tokens that
//! appear in the extension's template files.

// =============================================================================
// Plugin identity
// =============================================================================

/// Plugin identifier, used as the diagnostic prefix and plugin folder name
pub const PLUGIN_ID: &str = "cc.fovea.cordova.openwith";

/// Appended to the host app bundle identifier to form the extension's
pub const BUNDLE_SUFFIX: &str = ".shareextension";

/// Name of the native extension target
pub const TARGET_NAME: &str = "ShareExt";

/// Name (and path) of the group holding the extension files
pub const GROUP_NAME: &str = "ShareExtension";

/// Cordova's top-level group that receives the extension group
pub const PARENT_GROUP_NAME: &str = "CustomTemplate";

/// Group receiving built products
pub const PRODUCTS_GROUP_NAME: &str = "Products";

/// Folder of extension files, both in the plugin and the platform tree
pub const EXTENSION_FOLDER: &str = "ShareExtension";

/// Substring of `PRODUCT_NAME` identifying the extension's build configurations
pub const PRODUCT_NAME_MARKER: &str = "ShareExt";

/// Info.plist of the extension, relative to the project directory
pub const EXTENSION_INFO_PLIST: &str = "ShareExtension/ShareExtension-Info.plist";

/// Product type of an application extension target
pub const APP_EXTENSION_PRODUCT_TYPE: &str = "com.apple.product-type.app-extension";

/// `dstSubfolderSpec` of a copy-files phase targeting `PlugIns/`
pub const PLUGINS_SUBFOLDER_SPEC: &str = "13";

// =============================================================================
// Entitlements
// =============================================================================

/// Application group sharing capability
pub const APP_GROUPS_ENTITLEMENT: &str = "com.apple.security.application-groups";

/// Debug signing entitlements, relative to `<platform>/<App>/`
pub const ENTITLEMENTS_DEBUG: &str = "Entitlements-Debug.plist";

/// Release signing entitlements, relative to `<platform>/<App>/`
pub const ENTITLEMENTS_RELEASE: &str = "Entitlements-Release.plist";

// =============================================================================
// Preference names (config.xml / command line)
// =============================================================================

pub const PREF_URL_SCHEME: &str = "IOS_URL_SCHEME";
pub const PREF_UNIFORM_TYPE_IDENTIFIER: &str = "IOS_UNIFORM_TYPE_IDENTIFIER";
pub const PREF_PROVISIONING_PROFILE: &str = "SHAREEXT_PROVISIONING_PROFILE";
pub const PREF_DEVELOPMENT_TEAM: &str = "SHAREEXT_DEVELOPMENT_TEAM";

/// Fallback uniform type identifier when none is configured
pub const DEFAULT_UNIFORM_TYPE_IDENTIFIER: &str = "public.data";

// =============================================================================
// Template tokens
// =============================================================================

pub const TOKEN_DISPLAY_NAME: &str = "__DISPLAY_NAME__";
pub const TOKEN_BUNDLE_IDENTIFIER: &str = "__BUNDLE_IDENTIFIER__";
pub const TOKEN_GROUP_IDENTIFIER: &str = "__GROUP_IDENTIFIER__";
pub const TOKEN_BUNDLE_SHORT_VERSION_STRING: &str = "__BUNDLE_SHORT_VERSION_STRING__";
pub const TOKEN_BUNDLE_VERSION: &str = "__BUNDLE_VERSION__";
pub const TOKEN_URL_SCHEME: &str = "__URL_SCHEME__";
pub const TOKEN_UNIFORM_TYPE_IDENTIFIER: &str = "__UNIFORM_TYPE_IDENTIFIER__";

/// Prefix of an app group identifier
pub const GROUP_PREFIX: &str = "group.";

// =============================================================================
// File types
// =============================================================================

/// Xcode `lastKnownFileType` for a file extension (without the dot).
pub fn last_known_file_type(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "h" | "pch" => "sourcecode.c.h",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "c" => "sourcecode.c.c",
        "swift" => "sourcecode.swift",
        "plist" => "text.plist.xml",
        "entitlements" => "text.plist.entitlements",
        "strings" => "text.plist.strings",
        "storyboard" => "file.storyboard",
        "xib" => "file.xib",
        "xcassets" => "folder.assetcatalog",
        "png" => "image.png",
        "jpg" | "jpeg" => "image.jpeg",
        "json" => "text.json",
        "appex" => "wrapper.app-extension",
        _ => "file",
    }
}
