//! Materializes change sets as files in the library directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::domain::{Change, ChangeSet, ContentMode, TrackedId};

/// Extension used when an identifier does not carry a known mode
const FALLBACK_EXTENSION: &str = "txt";

/// Counts of what [`Library::apply`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub written: usize,
    pub removed: usize,
}

/// Directory holding one file per materialized identifier
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for an identifier: `<root>/<tracked-id>.<ext>`
    pub fn path_for(&self, id: &TrackedId) -> PathBuf {
        let extension = id
            .parts()
            .and_then(|parts| parts.mode.parse::<ContentMode>().ok())
            .map(|mode| mode.file_extension())
            .unwrap_or(FALLBACK_EXTENSION);

        self.root.join(format!("{}.{}", id.as_str(), extension))
    }

    /// Read the stored content for an identifier, if any
    pub async fn read(&self, id: &TrackedId) -> Result<Option<String>> {
        let path = self.path_for(id);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Write every addition and remove every deletion
    pub async fn apply(&self, changes: &ChangeSet) -> Result<ApplySummary> {
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create library dir: {}", self.root.display()))?;

        let mut summary = ApplySummary::default();

        for (id, change) in changes.iter() {
            let path = self.path_for(id);
            match change {
                Change::Add { content } => {
                    fs::write(&path, content)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    debug!(%id, path = %path.display(), "Wrote content");
                    summary.written += 1;
                }
                Change::Delete => match fs::remove_file(&path).await {
                    Ok(()) => {
                        debug!(%id, path = %path.display(), "Removed content");
                        summary.removed += 1;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        debug!(%id, "Content already absent");
                    }
                    Err(e) => {
                        return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
                    }
                },
            }
        }

        info!(
            root = %self.root.display(),
            written = summary.written,
            removed = summary.removed,
            "Applied changes to library"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{identify, SOURCE_YOUTUBE};
    use tempfile::TempDir;

    #[test]
    fn test_path_for_uses_mode_extension() {
        let library = Library::new("/lib");

        let meta = identify(SOURCE_YOUTUBE, "UCchan", "v1", ContentMode::Metadata);
        assert_eq!(
            library.path_for(&meta),
            PathBuf::from("/lib/youtube-UCchan-v1-metadata.json")
        );

        let transcript = identify(SOURCE_YOUTUBE, "UCchan", "v1", ContentMode::Transcript);
        assert!(library.path_for(&transcript).to_string_lossy().ends_with(".txt"));

        let foreign = TrackedId::from_raw("something");
        assert_eq!(library.path_for(&foreign), PathBuf::from("/lib/something.txt"));
    }

    #[tokio::test]
    async fn test_apply_writes_and_removes() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path().join("library"));

        let keep = identify(SOURCE_YOUTUBE, "UCchan", "v1", ContentMode::Video);
        let gone = identify(SOURCE_YOUTUBE, "UCchan", "v2", ContentMode::Video);

        let mut first = ChangeSet::new();
        first.add(keep.clone(), "https://www.youtube.com/watch?v=v1");
        first.add(gone.clone(), "https://www.youtube.com/watch?v=v2");
        let summary = library.apply(&first).await.unwrap();
        assert_eq!(summary, ApplySummary { written: 2, removed: 0 });

        let mut second = ChangeSet::new();
        second.delete(gone.clone());
        let summary = library.apply(&second).await.unwrap();
        assert_eq!(summary, ApplySummary { written: 0, removed: 1 });

        assert_eq!(
            library.read(&keep).await.unwrap().as_deref(),
            Some("https://www.youtube.com/watch?v=v1")
        );
        assert!(library.read(&gone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_of_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let library = Library::new(dir.path());

        let mut changes = ChangeSet::new();
        changes.delete(identify(SOURCE_YOUTUBE, "UCchan", "never", ContentMode::Video));

        let summary = library.apply(&changes).await.unwrap();
        assert_eq!(summary, ApplySummary::default());
    }
}
