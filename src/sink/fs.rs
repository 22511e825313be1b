use std::{
    collections::HashSet,
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use tokio::io::AsyncWriteExt as _;

use crate::{
    error::{ItemError, RunError},
    item::{ExecutionResult, WorkItem},
    sink::{
        artifact::{self, Artifact, Status},
        Sink,
    },
};

pub const ITEMS_DIR: &str = "items";
const TEMP_EXTENSION: &str = "tmp";

/// One file per item under `<output>/items`.
#[derive(Clone, Debug)]
pub struct FsSink {
    dir: PathBuf,
}

impl FsSink {
    /// Creates the items directory and clears temporaries left by an interrupted run.
    pub async fn open(output: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = output.as_ref().join(ITEMS_DIR);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|extension| extension == TEMP_EXTENSION) {
                tracing::debug!(path = %path.display(), "removing stale temporary");
                tokio::fs::remove_file(&path).await?;
            }
        }

        Ok(Self { dir })
    }

    /// Opens the items directory of a previous run without creating anything.
    pub fn existing(output: impl AsRef<Path>) -> Result<Self, RunError> {
        let dir = output.as_ref().join(ITEMS_DIR);
        if !dir.is_dir() {
            return Err(RunError::SourceUnavailable {
                path: dir,
                source: std::io::Error::new(ErrorKind::NotFound, "no items directory"),
            });
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self, id: &str, status: Status) -> PathBuf {
        self.dir.join(format!("{}.{}", artifact::file_stem(id), status.extension()))
    }

    /// Every artifact in the directory, sorted by identifier.
    ///
    /// Files without a valid header are ignored. If an item has both a success and a
    /// failure file, only the success is kept.
    pub async fn artifacts(&self) -> anyhow::Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .with_context(|| format!("failed to list {}", self.dir.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let known = path
                .extension()
                .is_some_and(|extension| extension == artifact::SUCCESS_EXTENSION || extension == artifact::FAILURE_EXTENSION);
            if !known {
                continue;
            }

            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            match artifact::parse(&contents, path.clone()) {
                Some((artifact, _)) => artifacts.push(artifact),
                None => tracing::warn!(path = %path.display(), "ignoring file without artifact header"),
            }
        }

        artifacts.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| status_rank(a.status).cmp(&status_rank(b.status))));
        artifacts.dedup_by(|later, earlier| later.id == earlier.id);

        Ok(artifacts)
    }

    pub async fn payload(&self, artifact: &Artifact) -> anyhow::Result<String> {
        let contents = tokio::fs::read_to_string(&artifact.path)
            .await
            .with_context(|| format!("failed to read {}", artifact.path.display()))?;
        let (_, payload) = artifact::parse(&contents, artifact.path.clone())
            .with_context(|| format!("{} lost its header", artifact.path.display()))?;

        Ok(payload.to_string())
    }

    /// Identifiers that already have a success artifact.
    pub async fn completed(&self) -> anyhow::Result<HashSet<String>> {
        Ok(self
            .artifacts()
            .await?
            .into_iter()
            .filter(|artifact| artifact.status == Status::Success)
            .map(|artifact| artifact.id)
            .collect())
    }
}

impl Sink for FsSink {
    #[tracing::instrument(skip_all, fields(item = %item.id))]
    async fn persist(&self, item: &WorkItem, result: &ExecutionResult) -> Result<PathBuf, ItemError> {
        let (status, superseded) = if result.is_success() {
            (Status::Success, Status::Failed)
        } else {
            (Status::Failed, Status::Success)
        };
        let path = self.artifact_path(&item.id, status);

        write_atomic(&path, artifact::render(item, result).as_bytes())
            .await
            .map_err(|source| ItemError::WriteFailed { path: path.clone(), source })?;

        let superseded = self.artifact_path(&item.id, superseded);
        match tokio::fs::remove_file(&superseded).await {
            Ok(()) => tracing::debug!(path = %superseded.display(), "removed superseded artifact"),
            Err(err) if err.kind() == ErrorKind::NotFound => {},
            Err(err) => tracing::warn!(path = %superseded.display(), "failed to remove superseded artifact: {err}"),
        }

        Ok(path)
    }
}

fn status_rank(status: Status) -> u8 {
    match status {
        Status::Success => 0,
        Status::Failed => 1,
    }
}

/// Writes to a temporary sibling, syncs it and renames it over `path`.
///
/// Readers see either the previous file or the complete new one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(".{TEMP_EXTENSION}"));
    let temp = path.with_file_name(name);

    let result = async {
        let mut file = tokio::fs::File::create(&temp).await?;
        file.write_all(contents).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp).await;
    }

    result
}

#[cfg(test)]
mod tests {
    use crate::{
        error::{ItemError, RunError},
        item::{ExecutionResult, WorkItem},
        sink::{artifact::Status, fs::{write_atomic, FsSink, ITEMS_DIR}, Sink},
    };

    fn item(id: &str) -> WorkItem {
        WorkItem {
            id: id.to_string(),
            index: 1,
            line: id.to_string(),
        }
    }

    fn success(payload: &str) -> ExecutionResult {
        ExecutionResult::Success { payload: payload.to_string() }
    }

    #[tokio::test]
    async fn persist() {
        let output = tempfile::tempdir().unwrap();
        let sink = FsSink::open(output.path()).await.unwrap();

        let path = sink.persist(&item("a"), &success("payload a")).await.unwrap();

        assert_eq!(path, output.path().join(ITEMS_DIR).join("a.txt"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Item: a\n"));
        assert!(contents.ends_with("\n\npayload a"));
        assert_eq!(std::fs::read_dir(sink.dir()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn persist_replaces_previous_outcome() {
        let output = tempfile::tempdir().unwrap();
        let sink = FsSink::open(output.path()).await.unwrap();

        sink.persist(&item("a"), &ExecutionResult::Failure { reason: "rate limited".to_string() }).await.unwrap();
        assert!(sink.artifact_path("a", Status::Failed).exists());

        sink.persist(&item("a"), &success("ok")).await.unwrap();
        assert!(sink.artifact_path("a", Status::Success).exists());
        assert!(!sink.artifact_path("a", Status::Failed).exists());
    }

    #[tokio::test]
    async fn persist_write_failed() {
        let output = tempfile::tempdir().unwrap();
        let sink = FsSink::open(output.path()).await.unwrap();
        std::fs::remove_dir(sink.dir()).unwrap();

        let result = sink.persist(&item("a"), &success("lost")).await;

        assert!(matches!(result, Err(ItemError::WriteFailed { .. })));
    }

    #[tokio::test]
    async fn artifacts() {
        let output = tempfile::tempdir().unwrap();
        let sink = FsSink::open(output.path()).await.unwrap();
        sink.persist(&item("c"), &success("c")).await.unwrap();
        sink.persist(&item("a"), &success("a")).await.unwrap();
        sink.persist(&item("b"), &ExecutionResult::Failure { reason: "boom".to_string() }).await.unwrap();
        std::fs::write(sink.dir().join("notes.txt"), "not an artifact").unwrap();

        let artifacts = sink.artifacts().await.unwrap();
        let summary = artifacts.iter().map(|a| (a.id.as_str(), a.status)).collect::<Vec<_>>();

        assert_eq!(summary, [("a", Status::Success), ("b", Status::Failed), ("c", Status::Success)]);
        assert_eq!(sink.payload(&artifacts[2]).await.unwrap(), "c");
        assert_eq!(sink.completed().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn open_removes_stale_temporaries() {
        let output = tempfile::tempdir().unwrap();
        let dir = output.path().join(ITEMS_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.txt.tmp"), "half written").unwrap();

        FsSink::open(output.path()).await.unwrap();

        assert!(!dir.join("a.txt.tmp").exists());
    }

    #[tokio::test]
    async fn write_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn existing_requires_items_directory() {
        let output = tempfile::tempdir().unwrap();

        assert!(matches!(FsSink::existing(output.path()), Err(RunError::SourceUnavailable { .. })));
    }
}
