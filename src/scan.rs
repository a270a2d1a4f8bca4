use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{EngineResult, RenameError};
use crate::rename_engine::FileRef;

const MEDIA_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
    ("svg", "image/svg+xml"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("mp3", "audio/mpeg"),
    ("flac", "audio/flac"),
    ("wav", "audio/wav"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
];

fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Builds a `FileRef` for a regular file on disk.
pub fn file_ref(path: &Path) -> EngineResult<FileRef> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(RenameError::NotAFile(path.to_path_buf()));
    }

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let location = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    let mut file = FileRef::new(path.to_string_lossy(), name, location)
        .with_size(metadata.len())
        .with_modified(modified);
    if let Some(mime) = media_type(path) {
        file = file.with_mime_type(mime);
    }
    Ok(file)
}

/// Lists the regular, non-hidden files directly inside `dir`.
pub fn scan_directory(dir: &Path) -> EngineResult<Vec<FileRef>> {
    if !dir.is_dir() {
        return Err(RenameError::MissingDirectory(dir.to_path_buf()));
    }

    let files: Vec<FileRef> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|entry| {
            let path = entry.path();
            match file_ref(&path) {
                Ok(file) => Some(file),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "ignoring path");
                    None
                }
            }
        })
        .collect();

    debug!(dir = %dir.display(), files = files.len(), "scanned directory");
    Ok(files)
}

/// Builds references for an explicit list of paths, skipping anything that
/// is not a regular file.
pub fn file_refs(paths: &[PathBuf]) -> Vec<FileRef> {
    paths
        .iter()
        .filter_map(|path| match file_ref(path) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring path");
                None
            }
        })
        .collect()
}
