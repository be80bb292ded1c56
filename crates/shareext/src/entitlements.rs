//! App group entitlement for the host app's signing manifests.

use crate::constants::APP_GROUPS_ENTITLEMENT;
use crate::{Error, Result};
use plist::Value;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Set `com.apple.security.application-groups` to `[group]` in `path`.
///
/// Other entitlements are kept; an existing group list is replaced.
///
/// # Errors
///
/// Returns [`Error::ManifestParse`] if the file is missing, malformed or not
/// a dictionary.
pub fn set_group_entitlement(path: impl AsRef<Path>, group: &str) -> Result<()> {
    let path = path.as_ref();
    let manifest_error = |message: String| Error::ManifestParse {
        path: path.to_path_buf(),
        message,
    };

    let value = Value::from_file(path).map_err(|e| manifest_error(e.to_string()))?;
    let mut dict = value
        .into_dictionary()
        .ok_or_else(|| manifest_error("root is not a dictionary".into()))?;

    dict.insert(
        APP_GROUPS_ENTITLEMENT.to_string(),
        Value::Array(vec![Value::String(group.to_string())]),
    );

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        plist::to_writer_xml(&mut writer, &Value::Dictionary(dict))?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    log::debug!("Set {APP_GROUPS_ENTITLEMENT} = [{group}] in {}", path.display());
    Ok(())
}

/// Patch the debug and release manifests concurrently.
///
/// Both must succeed; the debug error is reported first.
pub fn patch_entitlements(
    debug: impl AsRef<Path> + Send,
    release: impl AsRef<Path> + Send,
    group: &str,
) -> Result<()> {
    let (debug, release) = rayon::join(
        || set_group_entitlement(debug, group),
        || set_group_entitlement(release, group),
    );
    debug?;
    release
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ENTITLEMENTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>aps-environment</key>
	<string>development</string>
	<key>com.apple.security.application-groups</key>
	<array>
		<string>group.old</string>
		<string>group.other</string>
	</array>
</dict>
</plist>
"#;

    fn groups(path: &Path) -> Vec<String> {
        let value = Value::from_file(path).unwrap();
        value
            .as_dictionary()
            .unwrap()
            .get(APP_GROUPS_ENTITLEMENT)
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_string().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_group_replaces_existing_list() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("Entitlements-Debug.plist");
        fs::write(&path, ENTITLEMENTS).unwrap();

        set_group_entitlement(&path, "group.com.example.app.shareextension").unwrap();

        assert_eq!(groups(&path), ["group.com.example.app.shareextension"]);
        let value = Value::from_file(&path).unwrap();
        assert_eq!(
            value.as_dictionary().unwrap().get("aps-environment").and_then(Value::as_string),
            Some("development")
        );
    }

    #[test]
    fn test_rewrite_leaves_no_staging_files() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("Entitlements-Release.plist");
        fs::write(&path, ENTITLEMENTS).unwrap();

        set_group_entitlement(&path, "group.x").unwrap();

        let entries: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, ["Entitlements-Release.plist"]);
        assert_eq!(groups(&path), ["group.x"]);
    }

    #[test]
    fn test_failed_parse_keeps_manifest() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("Entitlements-Debug.plist");
        fs::write(&path, "<plist><array>").unwrap();

        assert!(set_group_entitlement(&path, "group.x").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "<plist><array>");
    }

    #[test]
    fn test_patch_both_manifests() {
        let temp_dir = tempdir().unwrap();
        let debug = temp_dir.path().join("Entitlements-Debug.plist");
        let release = temp_dir.path().join("Entitlements-Release.plist");
        fs::write(&debug, ENTITLEMENTS).unwrap();
        fs::write(&release, ENTITLEMENTS).unwrap();

        patch_entitlements(&debug, &release, "group.x").unwrap();
        assert_eq!(groups(&debug), ["group.x"]);
        assert_eq!(groups(&release), ["group.x"]);

        patch_entitlements(&debug, &release, "group.x").unwrap();
        assert_eq!(groups(&release), ["group.x"]);
    }

    #[test]
    fn test_missing_manifest_fails() {
        let temp_dir = tempdir().unwrap();
        let debug = temp_dir.path().join("Entitlements-Debug.plist");
        fs::write(&debug, ENTITLEMENTS).unwrap();

        let err = patch_entitlements(&debug, temp_dir.path().join("missing.plist"), "group.x")
            .unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
    }

    #[test]
    fn test_malformed_manifest_fails() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("Entitlements-Release.plist");
        fs::write(&path, "<plist><dict><key>").unwrap();
        let err = set_group_entitlement(&path, "group.x").unwrap_err();
        assert!(matches!(err, Error::ManifestParse { ref path, .. } if path.ends_with("Entitlements-Release.plist")));
    }
}
