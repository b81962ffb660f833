use std::{fmt, str::FromStr};

use crate::{error::ParseConditionError, locale::Language};

/// A condition raised by one of the engine's rules.
///
/// Built-in tags render as `FRAUD_SUSPECTED`, `OVERLOAD` and `OVERHEATING`;
/// any other tag comes from a configured rule and renders verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum ConditionTag {
    FraudSuspected,
    Overload,
    Overheating,
    Custom(String),
}

impl ConditionTag {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionTag::FraudSuspected => "FRAUD_SUSPECTED",
            ConditionTag::Overload => "OVERLOAD",
            ConditionTag::Overheating => "OVERHEATING",
            ConditionTag::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionTag {
    type Err = ParseConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(ParseConditionError),
            "FRAUD_SUSPECTED" => Ok(ConditionTag::FraudSuspected),
            "OVERLOAD" => Ok(ConditionTag::Overload),
            "OVERHEATING" => Ok(ConditionTag::Overheating),
            other => Ok(ConditionTag::Custom(other.to_string())),
        }
    }
}

impl TryFrom<String> for ConditionTag {
    type Error = ParseConditionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ConditionTag> for String {
    fn from(tag: ConditionTag) -> Self {
        tag.as_str().to_string()
    }
}

/// Maintenance dispatch tier. `High` sorts above `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Priority {
    Normal,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
        }
    }

    pub fn label(self, language: Language) -> &'static str {
        match (self, language) {
            (Priority::Normal, Language::Primary) => "NORMALE",
            (Priority::High, Language::Primary) => "HAUTE",
            (Priority::Normal, Language::Secondary) => "NORMAL",
            (Priority::High, Language::Secondary) => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The engine's verdict for one reading.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnosis {
    pub reading_id: String,
    pub triggered_conditions: Vec<ConditionTag>,
    pub priority: Priority,
    pub narrative: String,
}

impl Diagnosis {
    pub fn is_stable(&self) -> bool {
        self.triggered_conditions.is_empty()
    }

    pub fn has(&self, tag: &ConditionTag) -> bool {
        self.triggered_conditions.contains(tag)
    }
}
