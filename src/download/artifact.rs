//! Scoped temporary download files
//!
//! yt-dlp picks the final extension itself, so a download is identified by
//! a unique stem (`media_<uuid>`) inside the temp directory. Every file with
//! that stem, including `.part` leftovers, is removed when the guard is
//! dropped, whichever way the request ended.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Extensions of partial files yt-dlp writes while downloading.
const PARTIAL_EXTENSIONS: &[&str] = &["part", "ytdl"];

#[derive(Debug)]
pub struct TempArtifact {
    dir: PathBuf,
    stem: String,
}

impl TempArtifact {
    /// Creates a guard for a new, unique artifact in `dir`. Nothing is
    /// written until yt-dlp runs.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stem: format!("media_{}", Uuid::new_v4().simple()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// `-o` template handed to yt-dlp.
    pub fn output_template(&self) -> String {
        self.dir.join(format!("{}.%(ext)s", self.stem)).to_string_lossy().into_owned()
    }

    /// The finished download, ignoring partial files.
    pub fn find_file(&self) -> Option<PathBuf> {
        self.owned_files()
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(true, |ext| !PARTIAL_EXTENSIONS.contains(&ext))
            })
            .max_by_key(|path| fs_err::metadata(path).map(|m| m.len()).unwrap_or(0))
    }

    /// Removes every file belonging to this artifact. Safe to call repeatedly.
    pub fn cleanup(&self) {
        for path in self.owned_files() {
            match fs_err::remove_file(&path) {
                Ok(()) => log::debug!("Removed temporary file {}", path.display()),
                Err(e) => log::warn!("Failed to remove temporary file: {}", e),
            }
        }
    }

    fn owned_files(&self) -> Vec<PathBuf> {
        let prefix = format!("{}.", self.stem);
        let entries = match fs_err::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
            .map(|entry| entry.path())
            .collect()
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn template_uses_unique_stem() {
        let dir = TempDir::new().unwrap();
        let a = TempArtifact::new(dir.path());
        let b = TempArtifact::new(dir.path());

        assert_ne!(a.stem(), b.stem());
        assert!(a.output_template().ends_with(&format!("{}.%(ext)s", a.stem())));
    }

    #[test]
    fn finds_finished_file_and_skips_partials() {
        let dir = TempDir::new().unwrap();
        let artifact = TempArtifact::new(dir.path());
        std::fs::write(dir.path().join(format!("{}.mp4.part", artifact.stem())), b"partial data").unwrap();
        assert!(artifact.find_file().is_none());

        std::fs::write(dir.path().join(format!("{}.mp4", artifact.stem())), b"video").unwrap();
        let found = artifact.find_file().unwrap();
        assert_eq!(found.extension().unwrap(), "mp4");
    }

    #[test]
    fn drop_removes_only_own_files() {
        let dir = TempDir::new().unwrap();
        let unrelated = dir.path().join("keep.txt");
        std::fs::write(&unrelated, b"x").unwrap();

        let artifact = TempArtifact::new(dir.path());
        let own = dir.path().join(format!("{}.jpg", artifact.stem()));
        let partial = dir.path().join(format!("{}.jpg.part", artifact.stem()));
        std::fs::write(&own, b"img").unwrap();
        std::fs::write(&partial, b"i").unwrap();

        drop(artifact);

        assert!(!own.exists());
        assert!(!partial.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn missing_directory_is_harmless() {
        let artifact = TempArtifact::new("/nonexistent/mediagrab-test");
        assert!(artifact.find_file().is_none());
        artifact.cleanup();
    }
}
