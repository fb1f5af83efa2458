//! Types for the converter module.

use serde::{Deserialize, Serialize};

use crate::storage::StoredObject;

use super::source::ConversionSource;

/// Page orientation of the produced PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Rendering options forwarded to the renderer as flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Aggressive content extraction (clutter-free reading view).
    #[serde(default)]
    pub aggressive: bool,
    /// Wait until the page signals it is ready via `window.status`.
    #[serde(default)]
    pub wait_for_status: bool,
    /// Output orientation.
    #[serde(default)]
    pub orientation: Orientation,
    /// Page size name understood by the renderer (e.g. "A4", "Letter").
    #[serde(default)]
    pub page_size: Option<String>,
}

impl RenderOptions {
    /// Enables aggressive extraction.
    pub fn aggressive(mut self) -> Self {
        self.aggressive = true;
        self
    }

    /// Waits for the page's ready signal.
    pub fn wait_for_status(mut self) -> Self {
        self.wait_for_status = true;
        self
    }

    /// Sets the orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: impl Into<String>) -> Self {
        self.page_size = Some(page_size.into());
        self
    }
}

/// What to convert and how. Never modified once built.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Document to render.
    pub source: ConversionSource,
    /// Rendering flags.
    pub options: RenderOptions,
    /// Object key to store the result under, when uploading is enabled.
    pub upload_key: Option<String>,
}

impl ConversionRequest {
    /// Creates a request with default options.
    pub fn new(source: ConversionSource) -> Self {
        Self {
            source,
            options: RenderOptions::default(),
            upload_key: None,
        }
    }

    /// Creates a request for a remote page.
    pub fn from_url(uri: impl Into<String>) -> Self {
        Self::new(ConversionSource::remote(uri))
    }

    /// Sets the rendering options.
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets an explicit upload key.
    pub fn with_upload_key(mut self, key: impl Into<String>) -> Self {
        self.upload_key = Some(key.into());
        self
    }
}

/// Successful result of a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    /// Raw PDF bytes.
    Pdf(Vec<u8>),
    /// The PDF was uploaded; only a reference is returned.
    Stored(StoredObject),
}

impl ConversionOutput {
    /// PDF bytes, if they were returned inline.
    pub fn as_pdf(&self) -> Option<&[u8]> {
        match self {
            Self::Pdf(bytes) => Some(bytes),
            Self::Stored(_) => None,
        }
    }

    /// Stored object reference, if the PDF was uploaded.
    pub fn as_stored(&self) -> Option<&StoredObject> {
        match self {
            Self::Pdf(_) => None,
            Self::Stored(object) => Some(object),
        }
    }

    /// Size of the produced PDF in bytes.
    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::Pdf(bytes) => bytes.len() as u64,
            Self::Stored(object) => object.size_bytes,
        }
    }
}
