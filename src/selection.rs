//! Selected video files and the local preview references created for them

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::{AnalyzerError, Result};

/// Scheme of preview references handed out by [`PreviewRegistry`]
const PREVIEW_SCHEME: &str = "preview:";

/// The video chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    path: PathBuf,
    name: String,
    mime: String,
}

impl SelectedFile {
    /// Create a selection with an explicitly declared content type
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            mime: mime.into(),
        }
    }

    /// Create a selection from a file on disk, declaring its content type
    /// from the file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AnalyzerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("not a readable file: {}", path.display()),
            )));
        }

        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        Ok(Self::new(path, name, mime_for_extension(extension)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name sent with the upload
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared content type
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Whether the declared content type is a video type
    pub fn is_video(&self) -> bool {
        self.mime.to_ascii_lowercase().starts_with("video/")
    }
}

/// Content type for a file extension
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "mov" | "qt" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "mpeg" | "mpg" => "video/mpeg",
        "ogv" => "video/ogg",
        "3gp" => "video/3gpp",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    live: HashMap<u64, PathBuf>,
}

/// Table of live preview references.
///
/// A reference resolves to the selected file only while the
/// [`PreviewSource`] that created it is alive.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a preview reference for a selected file
    pub fn create(&self, file: &SelectedFile) -> PreviewSource {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.live.insert(id, file.path().to_path_buf());
        debug!("Created preview {}{} for {}", PREVIEW_SCHEME, id, file.name());

        PreviewSource {
            id,
            name: file.name().to_string(),
            registry: self.clone(),
        }
    }

    /// Resolve a reference to the file behind it, if it has not been revoked
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let id = reference.strip_prefix(PREVIEW_SCHEME)?.parse::<u64>().ok()?;
        self.lock().live.get(&id).cloned()
    }

    /// Number of references not yet revoked
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    fn revoke(&self, id: u64) {
        if self.lock().live.remove(&id).is_some() {
            debug!("Revoked preview {}{}", PREVIEW_SCHEME, id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Locally resolvable reference to a selected file's bytes.
///
/// The reference is revoked when this value is released or dropped.
#[derive(Debug)]
pub struct PreviewSource {
    id: u64,
    name: String,
    registry: PreviewRegistry,
}

impl PreviewSource {
    /// Reference string, e.g. `preview:3`
    pub fn reference(&self) -> String {
        format!("{}{}", PREVIEW_SCHEME, self.id)
    }

    /// Name of the file being previewed
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Revoke the reference now
    pub fn release(self) {}
}

impl Drop for PreviewSource {
    fn drop(&mut self) {
        self.registry.revoke(self.id);
    }
}
