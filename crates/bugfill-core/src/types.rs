//! Shared types used across bugfill.
//!
//! The `IssueRecord` is the unit of work handed to the form engine. It is a
//! plain mapping from `FieldKey` to text, borrowed immutably by the engine.

use crate::error::BugfillError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Keys of the issue-creation form, in the vocabulary the callers use.
///
/// Serialized names match the short keys of the desktop form; the aliases
/// accept the column headers of the batch spreadsheet export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FieldKey {
    /// One-line issue title
    #[serde(rename = "summary", alias = "Summary")]
    Summary,
    /// Owning team; selecting it unlocks dependent fields
    #[serde(rename = "team", alias = "Team")]
    Team,
    /// Reviewer user name
    #[serde(rename = "reviewer", alias = "Reviewer")]
    Reviewer,
    /// Link type for linked issues (e.g. "relates to")
    #[serde(rename = "linkedIssues", alias = "linked_issues", alias = "Linked Issues")]
    LinkedIssues,
    /// Issue key the link points at
    #[serde(rename = "issue", alias = "target_issue", alias = "Issue")]
    TargetIssue,
    /// Parent issue key
    #[serde(rename = "parent", alias = "Parent")]
    Parent,
    /// Affected branch names
    #[serde(rename = "branch", alias = "Branch")]
    Branch,
    /// Build identifiers
    #[serde(rename = "build", alias = "Build")]
    Build,
    /// Fix versions
    #[serde(rename = "fixversion", alias = "fix_version", alias = "Fix Version")]
    FixVersion,
    /// Components
    #[serde(rename = "component", alias = "Component")]
    Component,
    /// Labels
    #[serde(rename = "label", alias = "Label")]
    Label,
    /// Priority
    #[serde(rename = "priority", alias = "Priority")]
    Priority,
    /// Severity
    #[serde(rename = "severity", alias = "Severity")]
    Severity,
    /// Prevalence among users
    #[serde(rename = "prevalence", alias = "Prevalence")]
    Prevalence,
    /// Reproduction rate
    #[serde(rename = "repro_rate", alias = "Repro Rate")]
    ReproRate,
    /// Reproduction steps
    #[serde(rename = "steps", alias = "Steps")]
    Steps,
    /// Long-form description
    #[serde(rename = "description", alias = "Description")]
    Description,
}

impl FieldKey {
    /// Every key, in the order the form lays them out.
    pub const ALL: [FieldKey; 17] = [
        Self::Team,
        Self::Summary,
        Self::Reviewer,
        Self::LinkedIssues,
        Self::TargetIssue,
        Self::Parent,
        Self::Branch,
        Self::Build,
        Self::FixVersion,
        Self::Component,
        Self::Label,
        Self::Priority,
        Self::Severity,
        Self::Prevalence,
        Self::ReproRate,
        Self::Steps,
        Self::Description,
    ];

    /// The short key used in records and logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Team => "team",
            Self::Reviewer => "reviewer",
            Self::LinkedIssues => "linkedIssues",
            Self::TargetIssue => "issue",
            Self::Parent => "parent",
            Self::Branch => "branch",
            Self::Build => "build",
            Self::FixVersion => "fixversion",
            Self::Component => "component",
            Self::Label => "label",
            Self::Priority => "priority",
            Self::Severity => "severity",
            Self::Prevalence => "prevalence",
            Self::ReproRate => "repro_rate",
            Self::Steps => "steps",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cell value as it may arrive from a spreadsheet-derived feed.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Flag(bool),
    Empty(()),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(text) => text,
            RawValue::Integer(n) => n.to_string(),
            RawValue::Float(n) => n.to_string(),
            RawValue::Flag(b) => b.to_string(),
            RawValue::Empty(()) => String::new(),
        }
    }
}

/// Full set of field values describing one bug report.
///
/// Missing keys read as empty text. Once built, the record is only ever
/// borrowed by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueRecord {
    values: BTreeMap<FieldKey, String>,
}

impl IssueRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, key: FieldKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Value for `key`, or `""` when absent.
    #[must_use]
    pub fn get(&self, key: FieldKey) -> &str {
        self.values.get(&key).map_or("", String::as_str)
    }

    /// Whether `key` holds any non-whitespace text.
    #[must_use]
    pub fn has(&self, key: FieldKey) -> bool {
        !self.get(key).trim().is_empty()
    }

    /// Summary line, used for progress logging.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.get(FieldKey::Summary)
    }

    /// Iterate over the populated entries.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Whether no key holds any text, as with trailing spreadsheet rows.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.trim().is_empty())
    }

    /// Reject records with nothing to fill.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.is_blank() {
            return Err(BugfillError::Record("record has no field values".to_string()));
        }
        Ok(())
    }
}

/// Column name, which may be one the form has no field for.
#[derive(Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
enum RawKey {
    Known(FieldKey),
    Unknown(String),
}

impl<'de> Deserialize<'de> for IssueRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<RawKey, RawValue>::deserialize(deserializer)?;
        let values = raw
            .into_iter()
            .filter_map(|(key, value)| match key {
                RawKey::Known(key) => Some((key, value.into_text())),
                RawKey::Unknown(column) => {
                    tracing::debug!(column = %column, "ignoring column with no form field");
                    None
                }
            })
            .collect();
        Ok(Self { values })
    }
}

impl FromIterator<(FieldKey, String)> for IssueRecord {
    fn from_iter<I: IntoIterator<Item = (FieldKey, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Serialize for IssueRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_empty() {
        let record = IssueRecord::new().with(FieldKey::Summary, "Crash");
        assert_eq!(record.get(FieldKey::Summary), "Crash");
        assert_eq!(record.get(FieldKey::Parent), "");
        assert!(!record.has(FieldKey::Parent));
    }

    #[test]
    fn test_whitespace_is_not_a_value() {
        let record = IssueRecord::new().with(FieldKey::Label, "   ");
        assert!(!record.has(FieldKey::Label));
        assert!(record.is_blank());
    }

    #[test]
    fn test_blank_record_fails_validation() {
        let blank = IssueRecord::new().with(FieldKey::Summary, " ");
        assert!(matches!(blank.validate(), Err(BugfillError::Record(_))));

        let filled = blank.with(FieldKey::Priority, "High");
        assert!(filled.validate().is_ok());
    }

    #[test]
    fn test_deserialize_short_keys() {
        let json = r#"{
            "summary": "Client crashes on login",
            "linkedIssues": "relates to",
            "issue": "P2-55506",
            "fixversion": "CBT",
            "repro_rate": "100%"
        }"#;
        let record: IssueRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.get(FieldKey::LinkedIssues), "relates to");
        assert_eq!(record.get(FieldKey::TargetIssue), "P2-55506");
        assert_eq!(record.get(FieldKey::FixVersion), "CBT");
        assert_eq!(record.get(FieldKey::ReproRate), "100%");
    }

    #[test]
    fn test_deserialize_spreadsheet_headers() {
        let json = r#"{
            "Summary": "Crash",
            "Linked Issues": "blocks",
            "Fix Version": "CBT",
            "Repro Rate": 100,
            "Parent": null
        }"#;
        let record: IssueRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.summary(), "Crash");
        assert_eq!(record.get(FieldKey::LinkedIssues), "blocks");
        assert_eq!(record.get(FieldKey::ReproRate), "100");
        assert_eq!(record.get(FieldKey::Parent), "");
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let json = r#"{"Summary": "Crash", "Assignee": "me", "Row Id": 7}"#;
        let record: IssueRecord = serde_json::from_str(json).expect("parse record");
        assert_eq!(record.summary(), "Crash");
        assert_eq!(record.iter().count(), 1);
    }

    #[test]
    fn test_only_extra_columns_is_blank() {
        let record: IssueRecord =
            serde_json::from_str(r#"{"assignee": "me"}"#).expect("parse record");
        assert!(record.is_blank());
    }

    #[test]
    fn test_serialize_uses_short_keys() {
        let record = IssueRecord::new()
            .with(FieldKey::ReproRate, "Rare")
            .with(FieldKey::LinkedIssues, "relates to");
        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["repro_rate"], "Rare");
        assert_eq!(json["linkedIssues"], "relates to");
    }

    #[test]
    fn test_display_matches_serialized_name() {
        for key in FieldKey::ALL {
            let json = serde_json::to_string(&key).expect("serialize key");
            assert_eq!(json.trim_matches('"'), key.to_string());
        }
    }
}
