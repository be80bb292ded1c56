//! Placeholder substitution in the extension's generated files.
//!
//! Tokens are replaced as literal text. A value containing regex or `$`
//! syntax is written verbatim.

use crate::prefs::PreferenceSet;
use crate::Result;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Replace every occurrence of every token, in preference order.
pub fn substitute(content: &str, prefs: &PreferenceSet) -> String {
    prefs
        .iter()
        .filter(|p| !p.token.is_empty())
        .fold(content.to_string(), |acc, p| acc.replace(&p.token, &p.value))
}

/// Rewrite `path` in place. The file is left untouched when no token occurs.
///
/// Returns `true` if the content changed.
pub fn rewrite_file(path: impl AsRef<Path>, prefs: &PreferenceSet) -> Result<bool> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let replaced = substitute(&content, prefs);

    if replaced == content {
        return Ok(false);
    }

    fs::write(path, replaced)?;
    log::debug!("Replaced preferences in {}", path.display());
    Ok(true)
}

/// Rewrite several files concurrently; each task owns a distinct file.
///
/// Returns the number of files that changed.
pub fn rewrite_files(paths: &[PathBuf], prefs: &PreferenceSet) -> Result<usize> {
    let changed = paths
        .par_iter()
        .map(|path| rewrite_file(path, prefs))
        .collect::<Result<Vec<bool>>>()?;

    Ok(changed.into_iter().filter(|c| *c).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn prefs() -> PreferenceSet {
        let mut prefs = PreferenceSet::new();
        prefs.insert("__DISPLAY_NAME__", "Example");
        prefs.insert("__BUNDLE_IDENTIFIER__", "com.example.app.shareextension");
        prefs.insert("__URL_SCHEME__", "$1.*");
        prefs
    }

    #[test]
    fn test_substitute_every_occurrence() {
        let out = substitute(
            "__DISPLAY_NAME__ / __BUNDLE_IDENTIFIER__ / __DISPLAY_NAME__",
            &prefs(),
        );
        assert_eq!(out, "Example / com.example.app.shareextension / Example");
    }

    #[test]
    fn test_values_are_literal() {
        let out = substitute("scheme=__URL_SCHEME__", &prefs());
        assert_eq!(out, "scheme=$1.*");
    }

    #[test]
    fn test_second_pass_is_noop() {
        let once = substitute("<string>__DISPLAY_NAME__</string>", &prefs());
        let twice = substitute(&once, &prefs());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_file_in_place() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("ShareViewController.m");
        fs::write(&path, "NSString *name = @\"__DISPLAY_NAME__\";").unwrap();

        assert!(rewrite_file(&path, &prefs()).unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "NSString *name = @\"Example\";"
        );
        assert!(!rewrite_file(&path, &prefs()).unwrap());
    }

    #[test]
    fn test_rewrite_files_counts_changes() {
        let temp_dir = tempdir().unwrap();
        let a = temp_dir.path().join("a.h");
        let b = temp_dir.path().join("b.plist");
        fs::write(&a, "__BUNDLE_IDENTIFIER__").unwrap();
        fs::write(&b, "no tokens here").unwrap();

        let changed = rewrite_files(&[a.clone(), b], &prefs()).unwrap();
        assert_eq!(changed, 1);
        assert!(!fs::read_to_string(&a).unwrap().contains("__"));
    }

    #[test]
    fn test_rewrite_missing_file_fails() {
        let temp_dir = tempdir().unwrap();
        let result = rewrite_file(temp_dir.path().join("missing.m"), &prefs());
        assert!(result.is_err());
    }
}
