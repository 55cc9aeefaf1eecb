//! File classification and the PROCESS/SKIP/REVIEW decision
//! (`spec.md` §4.D, §4.E).

use regex::Regex;
use std::sync::OnceLock;
use strata_protocol::{Area, RecommendedAction, Strategy};

/// The subset of a walked file's metadata the policy needs to decide.
/// Caller-supplied, not read from disk by this crate — `strata-planner`
/// owns the filesystem walk.
#[derive(Debug, Clone)]
pub struct FileMeta {
    pub path: String,
    pub size_bytes: u64,
}

impl FileMeta {
    pub fn extension(&self) -> String {
        self.path
            .rsplit('.')
            .next()
            .filter(|_| self.path.contains('.'))
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub action: RecommendedAction,
    pub reason: String,
}

/// Files larger than this are flagged for human REVIEW rather than
/// processed automatically — an oversized file is disproportionately
/// expensive to run through an LLM action and often not source code at
/// all (e.g. a checked-in data export).
pub const OVERSIZE_BYTES: u64 = 10 * 1024 * 1024;

const LOCKFILE_NAMES: &[&str] = &[
    "cargo.lock",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "gemfile.lock",
    "composer.lock",
];

const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "dylib", "bin", "zip", "tar", "gz", "7z", "jar", "class", "pyc", "whl",
    "parquet", "db", "sqlite",
];

fn test_data_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(^|/)(test_data|fixtures|__pycache__|\.git)(/|$)").unwrap()
    })
}

/// The extensions `spec.md` §4.D overrides to always PROCESS regardless
/// of size or name pattern.
const ALWAYS_PROCESS_EXTENSIONS: &[&str] = &["sql", "dtsx", "dsx"];

/// Decide PROCESS/SKIP/REVIEW for one file.
///
/// `already_processed` is true when a matching `(project_id, file_path,
/// file_hash)` already exists in Evidence (`strata-db` lookup, done by the
/// caller) — the spec's rerun-idempotence rule.
pub fn decide_action(file: &FileMeta, already_processed: bool) -> PolicyDecision {
    if ALWAYS_PROCESS_EXTENSIONS.contains(&file.extension().as_str()) {
        return PolicyDecision {
            action: RecommendedAction::Process,
            reason: "always-process extension".to_string(),
        };
    }

    if already_processed {
        return PolicyDecision {
            action: RecommendedAction::Skip,
            reason: "Unchanged (already processed)".to_string(),
        };
    }

    let name_lower = file.file_name().to_ascii_lowercase();
    if LOCKFILE_NAMES.contains(&name_lower.as_str()) {
        return PolicyDecision {
            action: RecommendedAction::Skip,
            reason: "lockfile".to_string(),
        };
    }
    if BINARY_EXTENSIONS.contains(&file.extension().as_str()) {
        return PolicyDecision {
            action: RecommendedAction::Skip,
            reason: "binary file".to_string(),
        };
    }
    if test_data_pattern().is_match(&file.path) {
        return PolicyDecision {
            action: RecommendedAction::Skip,
            reason: "test fixture or VCS metadata".to_string(),
        };
    }

    if file.size_bytes > OVERSIZE_BYTES {
        return PolicyDecision {
            action: RecommendedAction::Review,
            reason: "file exceeds size threshold".to_string(),
        };
    }

    PolicyDecision {
        action: RecommendedAction::Process,
        reason: "default".to_string(),
    }
}

/// Classify into `(area, strategy)` (`spec.md` §4.D table, first match wins).
pub fn classify(file: &FileMeta, action: RecommendedAction) -> (Area, Strategy) {
    if action == RecommendedAction::Skip {
        return (Area::Aux, Strategy::Skip);
    }

    let ext = file.extension();
    let path_lower = file.path.to_ascii_lowercase();

    if matches!(ext.as_str(), "sql" | "ddl")
        || path_lower.contains("schema")
        || path_lower.contains("migration")
    {
        return (Area::Foundation, Strategy::ParserPlusLlm);
    }
    if matches!(ext.as_str(), "md" | "json" | "txt")
        && (path_lower.contains("readme")
            || path_lower.contains("contract")
            || path_lower.contains("docs"))
    {
        return (Area::Docs, Strategy::LlmOnly);
    }
    if matches!(ext.as_str(), "jpg" | "jpeg" | "png" | "gif" | "webp") {
        return (Area::Docs, Strategy::VlmExtract);
    }
    if matches!(ext.as_str(), "dtsx" | "dsx") {
        return (Area::Packages, Strategy::ParserPlusLlm);
    }
    if path_lower.contains("jobs") || path_lower.contains("pipelines") {
        return (Area::Packages, Strategy::LlmOnly);
    }
    if matches!(ext.as_str(), "py" | "sh" | "bat" | "ps1") {
        return (Area::Aux, Strategy::LlmOnly);
    }
    if matches!(ext.as_str(), "xml" | "config" | "yaml" | "yml" | "env") {
        return (Area::Aux, Strategy::ParserOnly);
    }
    (Area::Aux, Strategy::LlmOnly)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, size_bytes: u64) -> FileMeta {
        FileMeta { path: path.to_string(), size_bytes }
    }

    #[test]
    fn sql_always_processes_even_if_oversize_or_seen_before() {
        let f = file("etl/legacy.sql", OVERSIZE_BYTES + 1);
        let decision = decide_action(&f, true);
        assert_eq!(decision.action, RecommendedAction::Process);
    }

    #[test]
    fn rerun_of_unchanged_file_is_skipped() {
        let f = file("docs/readme.md", 100);
        let decision = decide_action(&f, true);
        assert_eq!(decision.action, RecommendedAction::Skip);
        assert_eq!(decision.reason, "Unchanged (already processed)");
    }

    #[test]
    fn lockfile_is_skipped() {
        let f = file("app/Cargo.lock", 4096);
        assert_eq!(decide_action(&f, false).action, RecommendedAction::Skip);
    }

    #[test]
    fn oversize_non_override_file_is_reviewed() {
        let f = file("data/export.csv", OVERSIZE_BYTES + 1);
        assert_eq!(decide_action(&f, false).action, RecommendedAction::Review);
    }

    #[test]
    fn classify_skip_action_forces_aux_skip() {
        assert_eq!(
            classify(&file("x.sql", 1), RecommendedAction::Skip),
            (Area::Aux, Strategy::Skip)
        );
    }

    #[test]
    fn classify_sql_is_foundation_parser_plus_llm() {
        assert_eq!(
            classify(&file("db/create_customers.sql", 1), RecommendedAction::Process),
            (Area::Foundation, Strategy::ParserPlusLlm)
        );
    }

    #[test]
    fn classify_dtsx_is_packages() {
        assert_eq!(
            classify(&file("pkgs/LoadCustomers.dtsx", 1), RecommendedAction::Process),
            (Area::Packages, Strategy::ParserPlusLlm)
        );
    }

    #[test]
    fn classify_falls_through_to_aux_llm_only() {
        assert_eq!(
            classify(&file("notes.adoc", 1), RecommendedAction::Process),
            (Area::Aux, Strategy::LlmOnly)
        );
    }
}
