//! Artifact delivery
//!
//! An [`ExportArtifact`] is produced once per export call and handed to a
//! [`FileDelivery`] by value.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::{ExportError, Result};

/// Final payload of one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Target file name, e.g. `MyDocument.pdf`
    pub file_name: String,
    /// MIME type
    pub mime: String,
    /// Content
    pub bytes: Vec<u8>,
}

/// Hands finished artifacts to the user
pub trait FileDelivery: Send + Sync {
    /// Deliver `artifact` and return where it went
    fn deliver(&self, artifact: ExportArtifact) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Writes artifacts into a directory.
///
/// Content goes to a hidden `.partial` file first and is renamed into
/// place, so a failed write never leaves a truncated artifact. Every
/// delivery gets its own partial file, so overlapping exports of the same
/// name never share one; the last rename wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    /// Deliver into `dir`, created on first use
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Sequence for partial file names within this process
static NEXT_PARTIAL: AtomicU64 = AtomicU64::new(0);

fn partial_name(file_name: &str) -> String {
    let seq = NEXT_PARTIAL.fetch_add(1, Ordering::Relaxed);
    format!(".{}.{}-{}.partial", file_name, std::process::id(), seq)
}

impl FileDelivery for DirectoryDelivery {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<PathBuf> {
        let target = self.dir.join(&artifact.file_name);
        let partial = self.dir.join(partial_name(&artifact.file_name));
        let delivery_error = |source| ExportError::Delivery {
            path: target.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(delivery_error)?;
        if let Err(e) = tokio::fs::write(&partial, &artifact.bytes).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(delivery_error(e));
        }
        if let Err(e) = tokio::fs::rename(&partial, &target).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(delivery_error(e));
        }
        Ok(target)
    }
}

/// Keeps delivered artifacts in memory
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    artifacts: Mutex<Vec<ExportArtifact>>,
}

impl MemoryDelivery {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything delivered so far
    pub fn take(&self) -> Vec<ExportArtifact> {
        std::mem::take(
            &mut *self
                .artifacts
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }

    /// Number of artifacts held
    pub fn len(&self) -> usize {
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether nothing has been delivered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileDelivery for MemoryDelivery {
    async fn deliver(&self, artifact: ExportArtifact) -> Result<PathBuf> {
        let path = PathBuf::from(&artifact.file_name);
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(artifact);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, bytes: &[u8]) -> ExportArtifact {
        ExportArtifact {
            file_name: name.to_string(),
            mime: "application/octet-stream".to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_directory_delivery_creates_dir() {
        let temp = tempfile::tempdir().unwrap();
        let delivery = DirectoryDelivery::new(temp.path().join("out/nested"));

        let path = delivery.deliver(artifact("a.bin", b"abc")).await.unwrap();
        assert_eq!(path, temp.path().join("out/nested/a.bin"));
        assert_eq!(std::fs::read(&path).unwrap(), b"abc");

        let leftovers: Vec<_> = std::fs::read_dir(delivery.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_directory_delivery_overwrites() {
        let temp = tempfile::tempdir().unwrap();
        let delivery = DirectoryDelivery::new(temp.path());
        delivery.deliver(artifact("a.bin", b"first")).await.unwrap();
        let path = delivery.deliver(artifact("a.bin", b"second")).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_directory_delivery_failure() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let delivery = DirectoryDelivery::new(&blocker);
        let err = delivery.deliver(artifact("a.bin", b"abc")).await.unwrap_err();
        assert!(matches!(err, ExportError::Delivery { .. }));
    }

    #[test]
    fn test_partial_names_are_unique() {
        let first = partial_name("a.bin");
        let second = partial_name("a.bin");
        assert_ne!(first, second);
        assert!(first.starts_with(".a.bin."));
        assert!(first.ends_with(".partial"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_overlapping_deliveries_of_one_name() {
        let temp = tempfile::tempdir().unwrap();
        let delivery = DirectoryDelivery::new(temp.path());
        let body_a = vec![b'a'; 8 << 20];
        let body_b = vec![b'b'; 8 << 20];

        for _ in 0..20 {
            let (a, b) = tokio::join!(
                delivery.deliver(artifact("MyDocument.pdf", &body_a)),
                delivery.deliver(artifact("MyDocument.pdf", &body_b)),
            );
            let target = temp.path().join("MyDocument.pdf");
            assert_eq!(a.unwrap(), target);
            assert_eq!(b.unwrap(), target);

            let written = std::fs::read(&target).unwrap();
            assert!(written == body_a || written == body_b);
        }

        let names: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["MyDocument.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_delivery() {
        let delivery = MemoryDelivery::new();
        assert!(delivery.is_empty());
        delivery.deliver(artifact("a.bin", b"1")).await.unwrap();
        assert_eq!(delivery.len(), 1);
        assert_eq!(delivery.take()[0].file_name, "a.bin");
        assert!(delivery.is_empty());
    }
}
