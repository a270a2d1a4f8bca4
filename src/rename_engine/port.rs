use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::warn;

use crate::error::MutationError;
use super::model::FileRef;

pub trait FileMutationPort: Send + Sync {
    fn rename_file(
        &self,
        file: &FileRef,
        new_name: &str,
    ) -> impl Future<Output = Result<FileRef, MutationError>> + Send;

    fn name_exists(&self, location: &Path, candidate: &str) -> impl Future<Output = bool> + Send;
}

fn renamed(file: &FileRef, new_name: &str, id: String) -> FileRef {
    FileRef {
        id,
        name: new_name.to_string(),
        ..file.clone()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFsPort;

impl FileMutationPort for LocalFsPort {
    async fn rename_file(&self, file: &FileRef, new_name: &str) -> Result<FileRef, MutationError> {
        let source = file.location.join(&file.name);
        let target = file.location.join(new_name);

        if !tokio::fs::try_exists(&source).await? {
            return Err(MutationError::NotFound);
        }

        tokio::fs::rename(&source, &target).await?;
        Ok(renamed(file, new_name, target.to_string_lossy().into_owned()))
    }

    async fn name_exists(&self, location: &Path, candidate: &str) -> bool {
        let path = location.join(candidate);
        match tokio::fs::try_exists(&path).await {
            Ok(exists) => exists,
            Err(e) => {
                // Unknown counts as taken.
                warn!(path = %path.display(), error = %e, "existence check failed");
                true
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory directory listing, used for dry runs and as a test double.
#[derive(Debug, Default)]
pub struct MemoryPort {
    dirs: Mutex<HashMap<PathBuf, BTreeSet<String>>>,
    failures: Mutex<HashMap<String, MutationError>>,
    log: Mutex<Vec<(String, String)>>,
    case_insensitive: bool,
    latency: Option<Duration>,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: &[FileRef]) -> Self {
        let port = Self::new();
        for file in files {
            port.insert(&file.location, &file.name);
        }
        port
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn key(&self, name: &str) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name.to_string()
        }
    }

    pub fn insert(&self, location: &Path, name: &str) {
        lock(&self.dirs)
            .entry(location.to_path_buf())
            .or_default()
            .insert(self.key(name));
    }

    /// Makes every rename of the file currently called `name` fail with `error`.
    pub fn fail_on(&self, name: &str, error: MutationError) {
        lock(&self.failures).insert(name.to_string(), error);
    }

    pub fn names(&self, location: &Path) -> Vec<String> {
        lock(&self.dirs)
            .get(location)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn renames(&self) -> Vec<(String, String)> {
        lock(&self.log).clone()
    }
}

impl FileMutationPort for MemoryPort {
    async fn rename_file(&self, file: &FileRef, new_name: &str) -> Result<FileRef, MutationError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(error) = lock(&self.failures).get(&file.name) {
            return Err(error.clone());
        }

        let mut dirs = lock(&self.dirs);
        let names = dirs.get_mut(&file.location).ok_or(MutationError::NotFound)?;
        if !names.remove(&self.key(&file.name)) {
            return Err(MutationError::NotFound);
        }
        names.insert(self.key(new_name));
        drop(dirs);

        lock(&self.log).push((file.name.clone(), new_name.to_string()));
        let id = file.location.join(new_name).to_string_lossy().into_owned();
        Ok(renamed(file, new_name, id))
    }

    async fn name_exists(&self, location: &Path, candidate: &str) -> bool {
        lock(&self.dirs)
            .get(location)
            .is_some_and(|names| names.contains(&self.key(candidate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn local_ref(dir: &Path, name: &str) -> FileRef {
        FileRef::new(dir.join(name).to_string_lossy(), name, dir)
    }

    #[tokio::test]
    async fn local_rename_moves_the_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.jpg"), "x").unwrap();

        let port = LocalFsPort;
        let file = local_ref(tmp.path(), "a.jpg");
        let updated = port.rename_file(&file, "trip_001.jpg").await.unwrap();

        assert_eq!(updated.name, "trip_001.jpg");
        assert_eq!(updated.location, file.location);
        assert!(tmp.path().join("trip_001.jpg").exists());
        assert!(!tmp.path().join("a.jpg").exists());
        assert!(port.name_exists(tmp.path(), "trip_001.jpg").await);
        assert!(!port.name_exists(tmp.path(), "a.jpg").await);
    }

    #[tokio::test]
    async fn local_rename_of_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = LocalFsPort
            .rename_file(&local_ref(tmp.path(), "ghost.jpg"), "x.jpg")
            .await;
        assert_eq!(result, Err(MutationError::NotFound));
    }

    #[tokio::test]
    async fn memory_port_tracks_names_and_injected_failures() {
        let files = vec![
            FileRef::new("/d/a", "a", "/d"),
            FileRef::new("/d/b", "b", "/d"),
        ];
        let port = MemoryPort::with_files(&files);
        port.fail_on("b", MutationError::PermissionDenied);

        assert!(port.rename_file(&files[0], "x").await.is_ok());
        assert_eq!(
            port.rename_file(&files[1], "y").await,
            Err(MutationError::PermissionDenied)
        );
        assert_eq!(port.names(Path::new("/d")), ["b", "x"]);
        assert_eq!(port.renames(), [("a".to_string(), "x".to_string())]);
        assert_eq!(
            port.rename_file(&files[0], "z").await,
            Err(MutationError::NotFound)
        );
    }

    #[tokio::test]
    async fn memory_port_can_ignore_case() {
        let port = MemoryPort::new().case_insensitive();
        port.insert(Path::new("/d"), "IMG_001.jpg");
        assert!(port.name_exists(Path::new("/d"), "img_001.JPG").await);
    }
}
