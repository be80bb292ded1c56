//! Preference resolution for the extension templates.
//!
//! Preferences are computed once per hook run from three sources:
//!
//! | Source | Supplies |
//! |--------|----------|
//! | [`AppMetadata`] (host Info.plist) | bundle identifier, version strings |
//! | [`Overrides`] (command line `NAME=value`) | URL scheme, type identifier, signing |
//! | [`ConfigXml`] (`config.xml` preferences) | same names as overrides, lower precedence |
//!
//! The result is a [`PreferenceSet`] of placeholder tokens and their values,
//! consumed by [`crate::template`] and by the entitlements patch.

pub mod config_xml;
pub mod metadata;
pub mod overrides;

pub use config_xml::ConfigXml;
pub use metadata::AppMetadata;
pub use overrides::Overrides;

use crate::constants::*;

/// A placeholder token and its replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    pub token: String,
    pub value: String,
}

/// Ordered token/value pairs with unique tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceSet {
    entries: Vec<Preference>,
}

impl PreferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `token` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|p| p.token == token) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Preference { token, value }),
        }
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.token == token)
            .map(|p| p.value.as_str())
    }

    /// The resolved app group identifier (`group.<extension bundle id>`).
    pub fn group_identifier(&self) -> Option<&str> {
        self.get(TOKEN_GROUP_IDENTIFIER)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Preference> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Command-line override first, then the `config.xml` preference.
pub fn parameter(name: &str, config: &ConfigXml, overrides: &Overrides) -> Option<String> {
    overrides
        .get(name)
        .map(str::to_string)
        .or_else(|| config.preference(name))
}

/// Compute the template preferences for the project named `display_name`.
///
/// Tokens without a value (no URL scheme configured, no version string in the
/// Info.plist) are left out of the set, so their placeholders stay untouched.
pub fn resolve(
    display_name: &str,
    metadata: &AppMetadata,
    config: &ConfigXml,
    overrides: &Overrides,
) -> PreferenceSet {
    let bundle_identifier = format!("{}{}", metadata.bundle_identifier, BUNDLE_SUFFIX);
    let group_identifier = format!("{GROUP_PREFIX}{bundle_identifier}");

    let mut prefs = PreferenceSet::new();
    prefs.insert(TOKEN_DISPLAY_NAME, display_name);
    prefs.insert(TOKEN_BUNDLE_IDENTIFIER, bundle_identifier);
    prefs.insert(TOKEN_GROUP_IDENTIFIER, group_identifier);

    if let Some(ref v) = metadata.short_version {
        prefs.insert(TOKEN_BUNDLE_SHORT_VERSION_STRING, v.as_str());
    }
    if let Some(ref v) = metadata.version {
        prefs.insert(TOKEN_BUNDLE_VERSION, v.as_str());
    }

    match parameter(PREF_URL_SCHEME, config, overrides) {
        Some(scheme) => prefs.insert(TOKEN_URL_SCHEME, scheme),
        None => log::warn!("No {PREF_URL_SCHEME} configured, {TOKEN_URL_SCHEME} is left as is"),
    }

    let uti = parameter(PREF_UNIFORM_TYPE_IDENTIFIER, config, overrides)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_UNIFORM_TYPE_IDENTIFIER.to_string());
    prefs.insert(TOKEN_UNIFORM_TYPE_IDENTIFIER, uti);

    prefs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> AppMetadata {
        AppMetadata {
            bundle_identifier: "com.example.app".into(),
            short_version: Some("1.2.3".into()),
            version: Some("42".into()),
        }
    }

    #[test]
    fn test_resolve_all_tokens() {
        let config = ConfigXml::from_text(
            r#"<widget><preference name="IOS_URL_SCHEME" value="example" /></widget>"#,
        );
        let prefs = resolve("Example", &metadata(), &config, &Overrides::new());

        assert_eq!(prefs.get(TOKEN_DISPLAY_NAME), Some("Example"));
        assert_eq!(
            prefs.get(TOKEN_BUNDLE_IDENTIFIER),
            Some("com.example.app.shareextension")
        );
        assert_eq!(
            prefs.group_identifier(),
            Some("group.com.example.app.shareextension")
        );
        assert_eq!(prefs.get(TOKEN_BUNDLE_SHORT_VERSION_STRING), Some("1.2.3"));
        assert_eq!(prefs.get(TOKEN_BUNDLE_VERSION), Some("42"));
        assert_eq!(prefs.get(TOKEN_URL_SCHEME), Some("example"));
        assert_eq!(prefs.get(TOKEN_UNIFORM_TYPE_IDENTIFIER), Some("public.data"));
        assert_eq!(prefs.len(), 7);
    }

    #[test]
    fn test_override_wins_over_config() {
        let config = ConfigXml::from_text(
            r#"<widget><preference name="IOS_URL_SCHEME" value="bar" /></widget>"#,
        );
        let overrides = Overrides::new().with("IOS_URL_SCHEME", "foo");

        assert_eq!(
            parameter(PREF_URL_SCHEME, &config, &overrides).as_deref(),
            Some("foo")
        );
        let prefs = resolve("Example", &metadata(), &config, &overrides);
        assert_eq!(prefs.get(TOKEN_URL_SCHEME), Some("foo"));
    }

    #[test]
    fn test_unset_url_scheme_is_absent() {
        let prefs = resolve("Example", &metadata(), &ConfigXml::default(), &Overrides::new());
        assert_eq!(prefs.get(TOKEN_URL_SCHEME), None);
        assert_eq!(prefs.len(), 6);
    }

    #[test]
    fn test_configured_type_identifier() {
        let overrides = Overrides::new().with("IOS_UNIFORM_TYPE_IDENTIFIER", "public.image");
        let prefs = resolve("Example", &metadata(), &ConfigXml::default(), &overrides);
        assert_eq!(prefs.get(TOKEN_UNIFORM_TYPE_IDENTIFIER), Some("public.image"));
    }

    #[test]
    fn test_missing_versions_are_absent() {
        let metadata = AppMetadata {
            bundle_identifier: "com.example.app".into(),
            short_version: None,
            version: None,
        };
        let prefs = resolve("Example", &metadata, &ConfigXml::default(), &Overrides::new());
        assert_eq!(prefs.get(TOKEN_BUNDLE_VERSION), None);
        assert_eq!(prefs.get(TOKEN_BUNDLE_SHORT_VERSION_STRING), None);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut prefs = PreferenceSet::new();
        prefs.insert("__A__", "1");
        prefs.insert("__B__", "2");
        prefs.insert("__A__", "3");
        let tokens: Vec<_> = prefs.iter().map(|p| (p.token.as_str(), p.value.as_str())).collect();
        assert_eq!(tokens, [("__A__", "3"), ("__B__", "2")]);
    }
}
