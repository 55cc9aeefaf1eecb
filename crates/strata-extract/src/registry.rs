//! Extractor Registry (`spec.md` §4.B): dispatches a file to a
//! deterministic parser or names the LLM/VLM action that must run
//! instead.

use crate::error::Result;
use crate::extractors::{dbt, dsx, dtsx, sql};
use strata_protocol::{DeepDiveResult, ExtractionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    SqlOrDdl,
    Dtsx,
    Dsx,
    PythonNotebook,
    Image,
    DbtManifest,
    OtherText,
}

pub fn classify_file(path: &str) -> FileClass {
    let lower = path.to_ascii_lowercase();
    let basename = lower.rsplit('/').next().unwrap_or(&lower);

    if basename == "manifest.json" {
        return FileClass::DbtManifest;
    }
    let ext = basename.rsplit('.').next().unwrap_or("");
    match ext {
        "sql" | "ddl" => FileClass::SqlOrDdl,
        "dtsx" => FileClass::Dtsx,
        "dsx" => FileClass::Dsx,
        "py" | "ipynb" => FileClass::PythonNotebook,
        "jpg" | "jpeg" | "png" | "webp" | "gif" => FileClass::Image,
        _ => FileClass::OtherText,
    }
}

pub enum RegistryResult {
    Extraction(ExtractionResult),
    ExtractionWithDeepDive(ExtractionResult, DeepDiveResult),
    LlmAction { action: &'static str, vision: bool },
}

/// Run the deterministic extractor for `file_path`, or name the LLM/VLM
/// action the caller must invoke instead (`spec.md` §4.B table).
pub fn extract(file_path: &str, text: &str) -> Result<RegistryResult> {
    match classify_file(file_path) {
        FileClass::SqlOrDdl => Ok(RegistryResult::Extraction(sql::extract(file_path, text))),
        FileClass::Dtsx => {
            let (macro_result, deep_dive) = dtsx::extract(file_path, text)?;
            Ok(RegistryResult::ExtractionWithDeepDive(macro_result, deep_dive))
        }
        FileClass::Dsx => Ok(RegistryResult::Extraction(dsx::extract(file_path, text))),
        FileClass::DbtManifest => Ok(RegistryResult::Extraction(dbt::extract(file_path, text)?)),
        FileClass::PythonNotebook => Ok(RegistryResult::LlmAction { action: "extract.python", vision: false }),
        FileClass::Image => Ok(RegistryResult::LlmAction { action: "extract.diagram", vision: true }),
        FileClass::OtherText => Ok(RegistryResult::LlmAction { action: "extract.strict", vision: false }),
    }
}

/// Applies the uniform normalization rules to every node in `result`
/// (`spec.md` §4.B): missing `node_id`/`node_type`/`system` default,
/// present values pass through.
pub fn normalize(result: &mut ExtractionResult, job_prefix: &str) {
    let nodes = std::mem::take(&mut result.nodes);
    result.nodes = nodes
        .into_iter()
        .enumerate()
        .map(|(i, node)| node.normalize(i, job_prefix))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_extensions() {
        assert_eq!(classify_file("a/b.sql"), FileClass::SqlOrDdl);
        assert_eq!(classify_file("a/b.dtsx"), FileClass::Dtsx);
        assert_eq!(classify_file("a/b.dsx"), FileClass::Dsx);
        assert_eq!(classify_file("a/b.py"), FileClass::PythonNotebook);
        assert_eq!(classify_file("a/b.png"), FileClass::Image);
        assert_eq!(classify_file("target/manifest.json"), FileClass::DbtManifest);
        assert_eq!(classify_file("a/README.md"), FileClass::OtherText);
    }

    #[test]
    fn dispatches_sql_to_deterministic_extractor() {
        let result = extract("x.sql", "SELECT * FROM t;").unwrap();
        assert!(matches!(result, RegistryResult::Extraction(_)));
    }

    #[test]
    fn dispatches_python_to_llm_action() {
        let result = extract("x.py", "import pandas").unwrap();
        assert!(matches!(
            result,
            RegistryResult::LlmAction { action: "extract.python", vision: false }
        ));
    }
}
