//! Host application metadata from `<App>/<App>-Info.plist`.

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// The parts of the host app's Info.plist the extension is derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppMetadata {
    /// `CFBundleIdentifier`
    pub bundle_identifier: String,
    /// `CFBundleShortVersionString`
    pub short_version: Option<String>,
    /// `CFBundleVersion`
    pub version: Option<String>,
}

impl AppMetadata {
    /// Location of the host Info.plist for project `name` below `platform_root`.
    pub fn info_plist_path(platform_root: impl AsRef<Path>, name: &str) -> PathBuf {
        platform_root
            .as_ref()
            .join(name)
            .join(format!("{name}-Info.plist"))
    }

    /// Read metadata from an Info.plist file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMetadata`] if the file cannot be read or parsed,
    /// is not a dictionary, or lacks `CFBundleIdentifier`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let plist = plist::Value::from_file(path)
            .map_err(|e| Error::MissingMetadata(format!("{}: {}", path.display(), e)))?;
        Self::from_value(&plist)
            .map_err(|msg| Error::MissingMetadata(format!("{}: {}", path.display(), msg)))
    }

    fn from_value(plist: &plist::Value) -> std::result::Result<Self, String> {
        let dict = plist
            .as_dictionary()
            .ok_or_else(|| "Info.plist is not a dictionary".to_string())?;

        let string = |key: &str| dict.get(key).and_then(|v| v.as_string()).map(str::to_string);

        let bundle_identifier =
            string("CFBundleIdentifier").ok_or_else(|| "no CFBundleIdentifier".to_string())?;

        Ok(Self {
            bundle_identifier,
            short_version: string("CFBundleShortVersionString"),
            version: string("CFBundleVersion"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_info_plist() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("App-Info.plist");
        fs::write(
            &path,
            br#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleIdentifier</key>
    <string>com.example.app</string>
    <key>CFBundleShortVersionString</key>
    <string>1.2.3</string>
    <key>CFBundleVersion</key>
    <string>10203</string>
</dict>
</plist>"#,
        )
        .unwrap();

        let metadata = AppMetadata::load(&path).unwrap();
        assert_eq!(metadata.bundle_identifier, "com.example.app");
        assert_eq!(metadata.short_version.as_deref(), Some("1.2.3"));
        assert_eq!(metadata.version.as_deref(), Some("10203"));
    }

    #[test]
    fn test_info_plist_path() {
        assert_eq!(
            AppMetadata::info_plist_path("/p/platforms/ios", "App"),
            PathBuf::from("/p/platforms/ios/App/App-Info.plist")
        );
    }

    #[test]
    fn test_missing_file() {
        let err = AppMetadata::load("/nope/App-Info.plist").unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(_)));
    }

    #[test]
    fn test_missing_bundle_identifier() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("App-Info.plist");
        fs::write(
            &path,
            br#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict><key>CFBundleVersion</key><string>1</string></dict></plist>"#,
        )
        .unwrap();

        let err = AppMetadata::load(&path).unwrap_err();
        match err {
            Error::MissingMetadata(msg) => assert!(msg.contains("CFBundleIdentifier")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
