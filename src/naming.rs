//! Component naming collaborator.
//!
//! Answers "what is this driver called" for diagnostics, in either language
//! code style the framework may ask with: ISO 639-2 three-letter codes
//! (`eng`) or RFC 4646 tags (`en`, `en-US`).

use crate::handle::ControllerHandle;

/// Default English driver name
pub const DRIVER_NAME: &str = "HDA Codec Driver";

/// One localized driver name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    /// ISO 639-2 code, e.g. `eng`
    pub iso639_2: String,
    /// RFC 4646 primary language subtag, e.g. `en`
    pub rfc4646: String,
    /// Localized name
    pub name: String,
}

/// Localized names for a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentName {
    entries: Vec<NameEntry>,
}

impl Default for ComponentName {
    fn default() -> Self {
        Self::english(DRIVER_NAME)
    }
}

impl ComponentName {
    /// Names table with a single English entry
    pub fn english(name: impl Into<String>) -> Self {
        Self {
            entries: vec![NameEntry {
                iso639_2: "eng".to_string(),
                rfc4646: "en".to_string(),
                name: name.into(),
            }],
        }
    }

    /// Add a localized entry
    pub fn with_entry(
        mut self,
        iso639_2: impl Into<String>,
        rfc4646: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.entries.push(NameEntry {
            iso639_2: iso639_2.into(),
            rfc4646: rfc4646.into(),
            name: name.into(),
        });
        self
    }

    /// Languages supported, as RFC 4646 subtags
    pub fn languages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.rfc4646.as_str()).collect()
    }

    /// Driver name for `language`.
    ///
    /// Three-letter codes match ISO 639-2 exactly. Anything else is treated
    /// as an RFC 4646 tag and matched on its primary subtag.
    pub fn driver_name(&self, language: &str) -> Option<&str> {
        let language = language.trim();
        let entry = if language.len() == 3 && !language.contains('-') {
            self.entries
                .iter()
                .find(|e| e.iso639_2.eq_ignore_ascii_case(language))
        } else {
            let primary = language.split('-').next().unwrap_or(language);
            self.entries
                .iter()
                .find(|e| e.rfc4646.eq_ignore_ascii_case(primary))
        };
        entry.map(|e| e.name.as_str())
    }

    /// Name of a managed controller. This driver does not name controllers.
    pub fn controller_name(&self, _controller: ControllerHandle, _language: &str) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_language_styles_resolve() {
        let names = ComponentName::default();
        assert_eq!(names.driver_name("eng"), Some(DRIVER_NAME));
        assert_eq!(names.driver_name("en"), Some(DRIVER_NAME));
        assert_eq!(names.driver_name("en-US"), Some(DRIVER_NAME));
        assert_eq!(names.driver_name("EN"), Some(DRIVER_NAME));
    }

    #[test]
    fn test_unknown_language() {
        let names = ComponentName::default();
        assert_eq!(names.driver_name("fra"), None);
        assert_eq!(names.driver_name("de-DE"), None);
    }

    #[test]
    fn test_additional_entry() {
        let names = ComponentName::default().with_entry("fra", "fr", "Pilote de codec HDA");
        assert_eq!(names.driver_name("fr-CA"), Some("Pilote de codec HDA"));
        assert_eq!(names.languages(), vec!["en", "fr"]);
    }

    #[test]
    fn test_controllers_are_not_named() {
        let names = ComponentName::default();
        assert_eq!(names.controller_name(ControllerHandle::new(1), "en"), None);
    }
}
