//! Command-line `NAME=value` overrides.

use crate::{Error, Result};

/// Explicit override channel, built once by the caller from its arguments.
///
/// Overrides take precedence over `config.xml` preferences of the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    entries: Vec<(String, String)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect every `NAME=value` argument, ignoring anything else.
    ///
    /// Host tools forward their whole argv, so flags such as `--verbose` are
    /// skipped rather than rejected. Everything after the first `=` is the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an argument with an empty name (`=value`).
    pub fn parse_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let Some((name, value)) = arg.split_once('=') else {
                continue;
            };
            if name.is_empty() {
                return Err(Error::Config(format!("Override without a name: {arg:?}")));
            }
            if name.starts_with('-') {
                continue;
            }
            overrides.entries.push((name.to_string(), value.to_string()));
        }
        Ok(overrides)
    }

    /// Add an override; earlier entries for the same name keep precedence.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// Value of the first override named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args_skips_flags_and_positionals() {
        let overrides = Overrides::parse_args([
            "cordova",
            "build",
            "--release",
            "--buildFlag=-quiet",
            "IOS_URL_SCHEME=myapp",
        ])
        .unwrap();

        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.get("IOS_URL_SCHEME"), Some("myapp"));
        assert_eq!(overrides.get("--buildFlag"), None);
    }

    #[test]
    fn test_value_keeps_later_equals_signs() {
        let overrides = Overrides::parse_args(["SHAREEXT_PROVISIONING_PROFILE=a=b"]).unwrap();
        assert_eq!(overrides.get("SHAREEXT_PROVISIONING_PROFILE"), Some("a=b"));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let overrides = Overrides::parse_args(["X=1", "X=2"]).unwrap().with("X", "3");
        assert_eq!(overrides.get("X"), Some("1"));
    }

    #[test]
    fn test_empty_value_is_kept() {
        let overrides = Overrides::parse_args(["IOS_URL_SCHEME="]).unwrap();
        assert_eq!(overrides.get("IOS_URL_SCHEME"), Some(""));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = Overrides::parse_args(["=oops"]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
