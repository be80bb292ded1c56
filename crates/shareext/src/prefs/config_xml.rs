//! Declarative preferences from Cordova's `config.xml`.

use crate::{Error, Result};
use regex::RegexBuilder;
use std::fs;
use std::path::Path;

/// Raw `config.xml` text, queried for `<preference name="X" value="Y"/>` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigXml {
    content: String,
}

impl ConfigXml {
    /// Wrap already loaded text. Anything before the first `<` (a BOM, stray
    /// bytes) is discarded.
    pub fn from_text(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        let start = text.find('<').unwrap_or(text.len());
        Self {
            content: text[start..].to_string(),
        }
    }

    /// Read `config.xml` from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingMetadata`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::MissingMetadata(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_text(text))
    }

    /// Value of the preference `name`, matched case-insensitively.
    ///
    /// An empty value counts as unset.
    pub fn preference(&self, name: &str) -> Option<String> {
        let pattern = format!(r#"name="{}" value="(.*?)""#, regex::escape(name));
        let re = RegexBuilder::new(&pattern)
            .case_insensitive(true)
            .build()
            .ok()?;

        re.captures(&self.content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}
