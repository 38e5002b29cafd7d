//! Entities returned by the server

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Lifecycle status shared by projects and iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityStatus {
    /// Open for translation
    Active,
    /// Visible but not editable
    #[serde(rename = "READONLY")]
    ReadOnly,
    /// Retired, kept for reference
    Archived,
    /// Superseded and hidden from default listings
    Obsolete,
    /// A status this client does not recognize
    Unknown,
}

impl EntityStatus {
    /// Parse a wire status, ignoring case
    ///
    /// Values outside the known set map to [`EntityStatus::Unknown`].
    pub fn from_wire(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "active" => EntityStatus::Active,
            "readonly" => EntityStatus::ReadOnly,
            "archived" => EntityStatus::Archived,
            "obsolete" => EntityStatus::Obsolete,
            _ => EntityStatus::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for EntityStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(EntityStatus::from_wire(&value))
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Active => write!(f, "ACTIVE"),
            EntityStatus::ReadOnly => write!(f, "READONLY"),
            EntityStatus::Archived => write!(f, "ARCHIVED"),
            EntityStatus::Obsolete => write!(f, "OBSOLETE"),
            EntityStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Translation project snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// URL slug, unique on the server
    pub id: String,
    /// Display name
    pub name: String,
    /// Lifecycle status
    pub status: EntityStatus,
}

/// Versioned snapshot of a project's content
///
/// Refers to its project by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Iteration {
    /// Version slug, unique within the project
    pub id: String,
    /// Lifecycle status
    pub status: EntityStatus,
    /// Id of the owning project
    #[serde(default)]
    pub project_id: String,
}

/// Translation-memory match for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Source text, one entry per plural form
    #[serde(alias = "sourceContents", deserialize_with = "one_or_many")]
    pub source_contents: Vec<String>,
    /// Target text, one entry per plural form
    #[serde(alias = "targetContents", deserialize_with = "one_or_many")]
    pub target_contents: Vec<String>,
}

impl Suggestion {
    /// First source form
    pub fn source(&self) -> &str {
        self.source_contents.first().map(String::as_str).unwrap_or_default()
    }

    /// First target form
    pub fn target(&self) -> &str {
        self.target_contents.first().map(String::as_str).unwrap_or_default()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_is_case_insensitive() {
        assert_eq!(EntityStatus::from_wire("ACTIVE"), EntityStatus::Active);
        assert_eq!(EntityStatus::from_wire("ReadOnly"), EntityStatus::ReadOnly);
        assert_eq!(EntityStatus::from_wire("archived"), EntityStatus::Archived);
        assert_eq!(EntityStatus::from_wire("OBSOLETE"), EntityStatus::Obsolete);
        assert_eq!(EntityStatus::from_wire("frozen"), EntityStatus::Unknown);
    }

    #[test]
    fn test_status_display_matches_wire() {
        for status in [
            EntityStatus::Active,
            EntityStatus::ReadOnly,
            EntityStatus::Archived,
            EntityStatus::Obsolete,
        ] {
            assert_eq!(EntityStatus::from_wire(&status.to_string()), status);
        }
    }

    #[test]
    fn test_suggestion_accepts_string_or_list() {
        let s: Suggestion = serde_json::from_str(
            r#"{"sourceContents": ["file", "files"], "targetContents": "ファイル"}"#,
        )
        .unwrap();
        assert_eq!(s.source_contents, vec!["file", "files"]);
        assert_eq!(s.target_contents, vec!["ファイル"]);
        assert_eq!(s.source(), "file");
        assert_eq!(s.target(), "ファイル");
    }
}
