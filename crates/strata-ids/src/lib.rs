//! Shared UUID-backed identifier wrappers for the lineage discovery core.
//!
//! Every entity in `spec.md` §3 ("Asset UUIDs are the only stable identity
//! surfaced to clients") is keyed by one of these. They are plain
//! string-backed newtypes so they round-trip through `sqlx` TEXT columns
//! and `serde_json` without conversion boilerplate at call sites.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error returned when parsing a UUID-backed identifier fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParseError {
    message: String,
}

impl IdParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for IdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IdParseError {}

macro_rules! define_uuid_id {
    ($name:ident, $label:expr) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id.to_string())
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                Uuid::parse_str(value)
                    .map_err(|e| IdParseError::new(format!("Invalid {}: {}", $label, e)))?;
                Ok(Self(value.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

define_uuid_id!(SolutionId, "solution ID");
define_uuid_id!(JobId, "job ID");
define_uuid_id!(QueueEntryId, "queue entry ID");
define_uuid_id!(PlanId, "plan ID");
define_uuid_id!(PlanAreaId, "plan area ID");
define_uuid_id!(PlanItemId, "plan item ID");
define_uuid_id!(AssetId, "asset ID");
define_uuid_id!(EdgeId, "edge ID");
define_uuid_id!(EvidenceId, "evidence ID");
define_uuid_id!(PackageId, "package ID");
define_uuid_id!(ComponentId, "component ID");
define_uuid_id!(TransformationId, "transformation ID");
define_uuid_id!(ColumnLineageId, "column lineage ID");
define_uuid_id!(FileLogId, "file processing log ID");
define_uuid_id!(AuditSnapshotId, "audit snapshot ID");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_valid_uuids() {
        let id = JobId::new();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn parse_rejects_non_uuid() {
        assert!(AssetId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn display_matches_inner_string() {
        let id = PlanId::new();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn distinct_ids_of_same_type_differ() {
        assert_ne!(AssetId::new(), AssetId::new());
    }
}
