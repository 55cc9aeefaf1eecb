//! Canonical enums shared across every component (`spec.md` §3).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("invalid ", stringify!($name), ": {}"),
                        other
                    )),
                }
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <str as sqlx::Type<sqlx::Sqlite>>::type_info()
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                <&str as sqlx::Encode<'q, sqlx::Sqlite>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                let raw = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                raw.parse::<Self>().map_err(|e| e.into())
            }
        }
    };
}

string_enum! {
    /// Solution (workspace/project) lifecycle status.
    SolutionStatus {
        Pending => "pending",
        Queued => "queued",
        Processing => "processing",
        Ready => "ready",
        Error => "error",
    }
}

string_enum! {
    /// Job lifecycle status (`spec.md` §3 Job, §4.H state machine).
    JobStatus {
        Queued => "queued",
        Running => "running",
        PlanningReady => "planning_ready",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

string_enum! {
    /// Queue entry claim status (`spec.md` §4.G).
    QueueStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
    }
}

string_enum! {
    /// Plan lifecycle status (`spec.md` §3 Plan).
    PlanStatus {
        Draft => "draft",
        Ready => "ready",
        Approved => "approved",
        Rejected => "rejected",
        Superseded => "superseded",
    }
}

string_enum! {
    /// Plan execution mode.
    PlanMode {
        LowCost => "low_cost",
        DeepScan => "deep_scan",
        Standard => "standard",
    }
}

string_enum! {
    /// The four plan areas, executed in this declared order
    /// (`spec.md` §3: "items execute in `(area.order_index, item.order_index)`").
    Area {
        Foundation => "foundation",
        Packages => "packages",
        Docs => "docs",
        Aux => "aux",
    }
}

impl Area {
    /// Fixed ordering used to assign `order_index` to a freshly planned area.
    pub const ORDER: [Area; 4] = [Area::Foundation, Area::Packages, Area::Docs, Area::Aux];

    pub fn order_index(&self) -> i64 {
        Self::ORDER.iter().position(|a| a == self).unwrap() as i64
    }
}

string_enum! {
    /// Per-item extraction strategy (`spec.md` GLOSSARY: Strategy).
    Strategy {
        ParserOnly => "parser_only",
        ParserPlusLlm => "parser_plus_llm",
        LlmOnly => "llm_only",
        VlmExtract => "vlm_extract",
        Skip => "skip",
    }
}

string_enum! {
    /// Policy engine recommendation for a single file.
    RecommendedAction {
        Process => "process",
        Skip => "skip",
        Review => "review",
    }
}

string_enum! {
    /// Plan item execution status.
    PlanItemStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

string_enum! {
    /// Asset (node) type. Kept as an open-ish string per `spec.md` Design
    /// Notes ("reimplement with explicit tagged sum types ... structural
    /// variants are cleaner than an open `asset_type` string" is the
    /// *suggested* redesign; `spec.md` §3 itself still lists concrete
    /// examples, which this enum captures, plus an `Other` escape hatch for
    /// `COMPONENT_*` and any future type the extractors emit).
    AssetType {
        Table => "TABLE",
        View => "VIEW",
        File => "FILE",
        Pipeline => "PIPELINE",
        Package => "PACKAGE",
        Process => "PROCESS",
        Script => "SCRIPT",
        StoredProcedure => "STORED_PROCEDURE",
        ComponentSource => "COMPONENT_SOURCE",
        ComponentSink => "COMPONENT_SINK",
        ComponentTransform => "COMPONENT_TRANSFORM",
        ComponentContainer => "COMPONENT_CONTAINER",
        Unknown => "unknown",
    }
}

impl AssetType {
    /// "Functional" assets for coverage scoring (`spec.md` §4.I).
    pub fn is_functional(&self) -> bool {
        matches!(
            self,
            Self::Table
                | Self::View
                | Self::Pipeline
                | Self::Script
                | Self::Package
                | Self::StoredProcedure
        )
    }

    /// An asset type for an SSIS/DataStage pipeline component.
    pub fn for_component(component_type: ComponentType) -> Self {
        match component_type {
            ComponentType::Source => Self::ComponentSource,
            ComponentType::Sink => Self::ComponentSink,
            ComponentType::Transform => Self::ComponentTransform,
            ComponentType::Container => Self::ComponentContainer,
        }
    }
}

string_enum! {
    /// Typed edge relationship (`spec.md` §3 Edge).
    EdgeType {
        ReadsFrom => "READS_FROM",
        WritesTo => "WRITES_TO",
        DependsOn => "DEPENDS_ON",
        Contains => "CONTAINS",
        Creates => "CREATES",
        DetailedLineage => "DETAILED_LINEAGE",
    }
}

string_enum! {
    /// Evidence excerpt kind.
    EvidenceKind {
        Code => "code",
        Xml => "xml",
        Log => "log",
        Config => "config",
        RegexMatch => "regex_match",
        SqlglotParse => "sqlglot_parse",
    }
}

string_enum! {
    /// Deep-dive package component type.
    ComponentType {
        Source => "SOURCE",
        Sink => "SINK",
        Transform => "TRANSFORM",
        Container => "CONTAINER",
    }
}

string_enum! {
    /// Deep-dive transformation IR operation.
    Operation {
        Read => "READ",
        Write => "WRITE",
        Select => "SELECT",
        Filter => "FILTER",
        Join => "JOIN",
        Aggregate => "AGGREGATE",
        Lookup => "LOOKUP",
        Derive => "DERIVE",
        Scd => "SCD",
        SqlQuery => "SQL_QUERY",
    }
}

string_enum! {
    /// File processing log outcome (`spec.md` §3 File Processing Log).
    FileLogStatus {
        Pending => "pending",
        Success => "success",
        Failed => "failed",
        FallbackExhausted => "fallback_exhausted",
    }
}

string_enum! {
    /// Error kinds surfaced into `error_type` (`spec.md` §7).
    ErrorKind {
        IngestError => "ingest_error",
        PlannerError => "planner_error",
        LlmError => "llm_error",
        JsonParseError => "json_parse_error",
        ValidationError => "validation_error",
        FallbackExhausted => "fallback_exhausted",
        ModelExecutionError => "model_execution_error",
        ActionExecutionError => "action_execution_error",
    }
}

string_enum! {
    /// Named layer scopes for prompt composition (`spec.md` §3 Prompt Layer).
    PromptLayerType {
        Base => "base",
        Domain => "domain",
        Org => "org",
        Solution => "solution",
        Reasoner => "reasoner",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        assert_eq!(Strategy::from_str("parser_plus_llm"), Ok(Strategy::ParserPlusLlm));
        assert_eq!(Strategy::ParserPlusLlm.as_str(), "parser_plus_llm");
    }

    #[test]
    fn area_order_index_is_stable() {
        assert_eq!(Area::Foundation.order_index(), 0);
        assert_eq!(Area::Packages.order_index(), 1);
        assert_eq!(Area::Docs.order_index(), 2);
        assert_eq!(Area::Aux.order_index(), 3);
    }

    #[test]
    fn job_status_terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn asset_type_functional_classification() {
        assert!(AssetType::Table.is_functional());
        assert!(!AssetType::ComponentSource.is_functional());
    }

    #[test]
    fn invalid_variant_is_rejected() {
        assert!(Strategy::from_str("bogus").is_err());
    }

    #[test]
    fn serde_round_trip() {
        let json = serde_json::to_string(&EdgeType::ReadsFrom).unwrap();
        let back: EdgeType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EdgeType::ReadsFrom);
    }
}
