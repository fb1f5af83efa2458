//! Conversion sources: remote pages and staged uploads.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;

/// Extension used when an upload arrives without one.
const DEFAULT_UPLOAD_EXTENSION: &str = "html";

/// An uploaded document written to a temporary file so the renderer can open it.
///
/// The file is removed when the value is dropped.
#[derive(Debug)]
pub struct StagedUpload {
    file: NamedTempFile,
}

impl StagedUpload {
    /// Writes `data` to a new temporary file under `dir`.
    ///
    /// The extension is kept because the renderer picks its loader from it.
    /// This performs blocking file I/O.
    pub fn stage(dir: &Path, data: &[u8], extension: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;

        let extension = extension.trim_start_matches('.');
        let extension = if extension.is_empty() {
            DEFAULT_UPLOAD_EXTENSION
        } else {
            extension
        };

        let mut file = tempfile::Builder::new()
            .prefix("weaver-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(dir)?;
        file.write_all(data)?;
        file.flush()?;

        Ok(Self { file })
    }

    /// Path of the staged file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `file://` URI handed to the renderer.
    pub fn uri(&self) -> String {
        format!("file://{}", self.path().display())
    }
}

/// Where the document to convert comes from.
#[derive(Debug, Clone)]
pub enum ConversionSource {
    /// A page the renderer fetches itself.
    Remote { uri: String },
    /// Bytes uploaded by the client and staged on local disk.
    Staged(Arc<StagedUpload>),
}

impl ConversionSource {
    /// Creates a remote source.
    pub fn remote(uri: impl Into<String>) -> Self {
        Self::Remote { uri: uri.into() }
    }

    /// Wraps a staged upload.
    pub fn staged(upload: StagedUpload) -> Self {
        Self::Staged(Arc::new(upload))
    }

    /// Locator passed to the renderer on its command line.
    pub fn locator(&self) -> String {
        match self {
            Self::Remote { uri } => uri.clone(),
            Self::Staged(upload) => upload.uri(),
        }
    }

    /// Whether the source lives on local disk.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Staged(_))
    }
}

impl fmt::Display for ConversionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { uri } => f.write_str(uri),
            Self::Staged(upload) => write!(
                f,
                "upload:{}",
                upload
                    .path()
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default()
            ),
        }
    }
}
