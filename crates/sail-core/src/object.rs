//! Object records extracted from an application export.

use serde::{Deserialize, Serialize};

/// Kind of a design object in an Appian export.
///
/// Only some kinds carry a SAIL definition; the rest are still indexed so
/// references to them resolve (record types, sites, data stores).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Interface,
    ExpressionRule,
    Constant,
    Decision,
    Integration,
    ProcessModel,
    RecordType,
    WebApi,
    ConnectedSystem,
    Site,
    DataStore,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Interface => "interface",
            ObjectKind::ExpressionRule => "expression_rule",
            ObjectKind::Constant => "constant",
            ObjectKind::Decision => "decision",
            ObjectKind::Integration => "integration",
            ObjectKind::ProcessModel => "process_model",
            ObjectKind::RecordType => "record_type",
            ObjectKind::WebApi => "web_api",
            ObjectKind::ConnectedSystem => "connected_system",
            ObjectKind::Site => "site",
            ObjectKind::DataStore => "data_store",
        }
    }

    /// Human-readable label matching the platform's design-object names.
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectKind::Interface => "Interface",
            ObjectKind::ExpressionRule => "Expression Rule",
            ObjectKind::Constant => "Constant",
            ObjectKind::Decision => "Decision",
            ObjectKind::Integration => "Integration",
            ObjectKind::ProcessModel => "Process Model",
            ObjectKind::RecordType => "Record Type",
            ObjectKind::WebApi => "Web API",
            ObjectKind::ConnectedSystem => "Connected System",
            ObjectKind::Site => "Site",
            ObjectKind::DataStore => "Data Store",
        }
    }

    /// Parse either the snake_case form or the display name,
    /// case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "interface" => Some(ObjectKind::Interface),
            "expression_rule" | "rule" => Some(ObjectKind::ExpressionRule),
            "constant" => Some(ObjectKind::Constant),
            "decision" => Some(ObjectKind::Decision),
            "integration" | "outbound_integration" => Some(ObjectKind::Integration),
            "process_model" => Some(ObjectKind::ProcessModel),
            "record_type" => Some(ObjectKind::RecordType),
            "web_api" => Some(ObjectKind::WebApi),
            "connected_system" => Some(ObjectKind::ConnectedSystem),
            "site" => Some(ObjectKind::Site),
            "data_store" => Some(ObjectKind::DataStore),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One named source definition extracted from an export archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Export uuid, assigned by the platform, immutable once created.
    pub id: String,
    pub kind: ObjectKind,
    /// Display name; not guaranteed unique across kinds.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Verbatim SAIL definition as exported. Absent for non-code kinds.
    /// Never normalized: downstream audits diff this byte-for-byte.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_text: Option<String>,
    /// Archive entry this record came from, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
}

impl ObjectRecord {
    pub fn summary(&self) -> ObjectSummary {
        ObjectSummary {
            id: self.id.clone(),
            kind: self.kind,
            name: self.name.clone(),
            has_source: self.source_text.is_some(),
        }
    }
}

/// Lightweight listing entry: identity without the source payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub id: String,
    pub kind: ObjectKind,
    pub name: String,
    pub has_source: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            ObjectKind::Interface,
            ObjectKind::ExpressionRule,
            ObjectKind::Constant,
            ObjectKind::Decision,
            ObjectKind::Integration,
            ObjectKind::ProcessModel,
            ObjectKind::RecordType,
            ObjectKind::WebApi,
            ObjectKind::ConnectedSystem,
            ObjectKind::Site,
            ObjectKind::DataStore,
        ] {
            assert_eq!(ObjectKind::from_str(kind.as_str()), Some(kind));
            assert_eq!(ObjectKind::from_str(kind.display_name()), Some(kind));
        }
    }

    #[test]
    fn test_kind_unknown() {
        assert_eq!(ObjectKind::from_str("knowledge center"), None);
    }

    #[test]
    fn test_summary_reports_source_presence() {
        let record = ObjectRecord {
            id: "_a-1".into(),
            kind: ObjectKind::Interface,
            name: "HomePage".into(),
            description: None,
            source_text: Some("a!headerContentLayout()".into()),
            entry: None,
        };
        assert!(record.summary().has_source);
    }
}
