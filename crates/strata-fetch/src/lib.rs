//! Artifact Fetcher (`spec.md` §4.A): turns a `storage_path` string into
//! a local directory root.

pub mod blob;
pub mod error;
pub mod git;

pub use blob::{BlobStore, LocalBlobStore};
pub use error::{FetchError, Result};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub struct ArtifactFetcher {
    tmp_root: PathBuf,
    blob_store: Arc<dyn BlobStore>,
}

impl ArtifactFetcher {
    pub fn new(tmp_root: impl Into<PathBuf>, blob_store: Arc<dyn BlobStore>) -> Self {
        Self { tmp_root: tmp_root.into(), blob_store }
    }

    /// Fetch `storage_path` for `solution_id`, returning an existing
    /// local directory. Every fresh working directory is
    /// timestamp-suffixed: `{tmp_root}/{solution_id}-{unix_ts}`.
    pub fn fetch(&self, solution_id: &str, storage_path: &str) -> Result<PathBuf> {
        let dest = self.fresh_dir(solution_id)?;

        if let Some(raw_url) = git::rewrite_blob_url(storage_path) {
            return self.download_single_file(&raw_url, &dest);
        }
        if storage_path.starts_with("http://") || storage_path.starts_with("https://") {
            return git::shallow_clone(storage_path, &dest);
        }
        if let Some(path) = storage_path.strip_prefix("local://") {
            return self.use_local(Path::new(path), &dest);
        }
        if Path::new(storage_path).is_absolute() {
            return self.use_local(Path::new(storage_path), &dest);
        }

        self.fetch_from_bucket(storage_path, &dest)
    }

    fn fresh_dir(&self, solution_id: &str) -> Result<PathBuf> {
        let ts = chrono::Utc::now().timestamp();
        let dir = self.tmp_root.join(format!("{solution_id}-{ts}"));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn use_local(&self, path: &Path, dest: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(FetchError::NotFound(path.display().to_string()));
        }
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        let file_name = path
            .file_name()
            .ok_or_else(|| FetchError::FormatError(format!("no file name in {}", path.display())))?;
        let copied = dest.join(file_name);
        std::fs::copy(path, &copied)?;
        Ok(dest.to_path_buf())
    }

    fn download_single_file(&self, url: &str, dest: &Path) -> Result<PathBuf> {
        info!(%url, "downloading raw file");
        let response = reqwest::blocking::get(url)
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError::NotFound(format!("{url} returned {}", response.status())));
        }
        let bytes = response.bytes().map_err(|e| FetchError::NetworkError(e.to_string()))?;
        let file_name = url.rsplit('/').next().unwrap_or("artifact");
        std::fs::write(dest.join(file_name), &bytes)?;
        Ok(dest.to_path_buf())
    }

    fn fetch_from_bucket(&self, storage_path: &str, dest: &Path) -> Result<PathBuf> {
        let key = format!("source-code/{storage_path}");
        let downloaded = self.blob_store.fetch_to(&key, dest)?;
        if downloaded.extension().and_then(|e| e.to_str()) == Some("zip") {
            return self.unzip(&downloaded, dest);
        }
        Ok(dest.to_path_buf())
    }

    fn unzip(&self, archive_path: &Path, dest: &Path) -> Result<PathBuf> {
        let file = std::fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file)
            .map_err(|e| FetchError::FormatError(format!("not a valid zip archive: {e}")))?;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| FetchError::FormatError(e.to_string()))?;
            let Some(relative) = entry.enclosed_name() else { continue };
            let out_path = dest.join(relative);
            if entry.is_dir() {
                std::fs::create_dir_all(&out_path)?;
                continue;
            }
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out_file = std::fs::File::create(&out_path)?;
            std::io::copy(&mut entry, &mut out_file)?;
        }
        Ok(dest.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fetcher_with_tmp() -> (ArtifactFetcher, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = ArtifactFetcher::new(tmp.path(), Arc::new(LocalBlobStore::new()));
        (fetcher, tmp)
    }

    #[test]
    fn local_directory_is_used_in_place() {
        let (fetcher, tmp) = fetcher_with_tmp();
        let source_dir = tmp.path().join("repo");
        std::fs::create_dir_all(&source_dir).unwrap();
        let result = fetcher
            .fetch("sol-1", &format!("local://{}", source_dir.display()))
            .unwrap();
        assert_eq!(result, source_dir);
    }

    #[test]
    fn missing_local_path_is_not_found() {
        let (fetcher, _tmp) = fetcher_with_tmp();
        let err = fetcher.fetch("sol-1", "local:///nonexistent/path/xyz").unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
    }

    #[test]
    fn bucket_zip_is_decompressed_into_fresh_dir() {
        let (fetcher, tmp) = fetcher_with_tmp();
        let blob_store = LocalBlobStore::new();

        let mut zip_bytes = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut zip_bytes));
            writer.start_file::<_, ()>("ingest.sql", Default::default()).unwrap();
            writer.write_all(b"SELECT 1;").unwrap();
            writer.finish().unwrap();
        }
        blob_store.put("source-code/acme/etl.zip", zip_bytes);

        let fetcher = ArtifactFetcher::new(tmp.path(), Arc::new(blob_store));
        let result = fetcher.fetch("sol-1", "acme/etl.zip").unwrap();
        assert!(result.join("ingest.sql").exists());
    }
}
