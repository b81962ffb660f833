use std::fmt;

use crate::domain::ConditionTag;

/// Separator placed between condition labels in a narrative.
pub const NARRATIVE_SEPARATOR: &str = " | ";

/// Output language for narratives. `Primary` is French, `Secondary` English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "String", into = "String")
)]
pub enum Language {
    #[default]
    Primary,
    Secondary,
}

impl Language {
    /// Resolve a caller-supplied locale code. Unknown codes fall back to `Primary`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "secondary" => Language::Secondary,
            _ => Language::Primary,
        }
    }

    /// Voice code handed to the narration layer.
    pub fn code(self) -> &'static str {
        match self {
            Language::Primary => "fr",
            Language::Secondary => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        Language::from_code(&code)
    }
}

impl From<Language> for String {
    fn from(language: Language) -> Self {
        language.code().to_string()
    }
}

/// A label pair for one condition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Labels {
    pub primary: String,
    pub secondary: String,
}

impl Labels {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    pub fn pick(&self, language: Language) -> &str {
        match language {
            Language::Primary => &self.primary,
            Language::Secondary => &self.secondary,
        }
    }
}

/// Label for a built-in condition, `None` for custom tags.
pub fn builtin_label(tag: &ConditionTag, language: Language) -> Option<&'static str> {
    let label = match (tag, language) {
        (ConditionTag::FraudSuspected, Language::Primary) => "Fraude suspectée",
        (ConditionTag::FraudSuspected, Language::Secondary) => "Fraud suspected",
        (ConditionTag::Overload, Language::Primary) => "Surcharge (délestage imminent)",
        (ConditionTag::Overload, Language::Secondary) => "Overload (shedding imminent)",
        (ConditionTag::Overheating, Language::Primary) => "Surchauffe huile",
        (ConditionTag::Overheating, Language::Secondary) => "Oil overheating",
        (ConditionTag::Custom(_), _) => return None,
    };
    Some(label)
}

pub fn stable_label(language: Language) -> &'static str {
    match language {
        Language::Primary => "Stable",
        Language::Secondary => "Clear",
    }
}
