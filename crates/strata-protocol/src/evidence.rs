//! Evidence: a supporting excerpt (`spec.md` §3 Evidence).

use crate::enums::EvidenceKind;
use serde::{Deserialize, Serialize};
use strata_ids::{EvidenceId, SolutionId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Locator {
    pub file: String,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
    pub xpath: Option<String>,
    pub byte_start: Option<u64>,
    pub byte_end: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: EvidenceId,
    pub project_id: SolutionId,
    pub file_path: String,
    pub kind: EvidenceKind,
    pub locator: Locator,
    pub snippet: String,
    pub hash: Option<String>,
}

impl Evidence {
    pub fn new(
        project_id: SolutionId,
        file_path: impl Into<String>,
        kind: EvidenceKind,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            id: EvidenceId::new(),
            project_id,
            file_path: file_path.into(),
            kind,
            locator: Locator::default(),
            snippet: snippet.into(),
            hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_locator(mut self, locator: Locator) -> Self {
        self.locator = locator;
        self
    }
}
