//! Shallow git clone via the `git` subprocess (`spec.md` §4.A).

use crate::error::{FetchError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Clone `url` shallowly into `dest` (created fresh by the caller).
///
/// If `git` exits with 128 but a `.git` subdirectory was nonetheless
/// created, treat the clone as a partial success and continue — this
/// covers hosts that serve the initial objects but then drop the
/// connection on a large repository (`spec.md` §4.A).
pub fn shallow_clone(url: &str, dest: &Path) -> Result<PathBuf> {
    info!(%url, dest = %dest.display(), "cloning repository");
    let output = Command::new("git")
        .args(["clone", "--depth", "1", url])
        .arg(dest)
        .output()
        .map_err(|e| FetchError::NetworkError(format!("failed to spawn git: {e}")))?;

    if output.status.success() {
        return Ok(dest.to_path_buf());
    }

    let code = output.status.code();
    let has_git_dir = dest.join(".git").is_dir();
    if code == Some(128) && has_git_dir {
        warn!(%url, "git clone exited 128 but .git exists, treating as partial success");
        return Ok(dest.to_path_buf());
    }

    Err(FetchError::NetworkError(format!(
        "git clone failed (exit {:?}): {}",
        code,
        String::from_utf8_lossy(&output.stderr)
    )))
}

/// Rewrite a Git-host "blob" URL (e.g. GitHub
/// `https://github.com/org/repo/blob/main/path/file.sql`) into its raw
/// content URL.
pub fn rewrite_blob_url(url: &str) -> Option<String> {
    if !url.contains("/blob/") {
        return None;
    }
    if let Some(rest) = url.strip_prefix("https://github.com/") {
        let mut parts = rest.splitn(4, '/');
        let org = parts.next()?;
        let repo = parts.next()?;
        let blob_marker = parts.next()?;
        let path = parts.next()?;
        if blob_marker != "blob" {
            return None;
        }
        let mut path_parts = path.splitn(2, '/');
        let branch = path_parts.next()?;
        let file_path = path_parts.next()?;
        return Some(format!(
            "https://raw.githubusercontent.com/{org}/{repo}/{branch}/{file_path}"
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_github_blob_url_to_raw() {
        let raw = rewrite_blob_url(
            "https://github.com/acme/etl/blob/main/scripts/ingest.sql",
        )
        .unwrap();
        assert_eq!(
            raw,
            "https://raw.githubusercontent.com/acme/etl/main/scripts/ingest.sql"
        );
    }

    #[test]
    fn non_blob_url_is_not_rewritten() {
        assert!(rewrite_blob_url("https://github.com/acme/etl").is_none());
    }
}
