//! Converter decorator that uploads the rendered PDF.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::storage::ObjectStore;

use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConversionOutput, ConversionRequest};

/// Content type of every uploaded object.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Wraps another converter and stores its PDF in an object store.
///
/// Without a store the decorator is transparent. Once the inner converter
/// has succeeded, the upload runs to completion even if `cancel` fires.
pub struct UploadingConverter<C> {
    inner: C,
    store: Option<Arc<dyn ObjectStore>>,
    key_prefix: String,
}

impl<C: Converter> UploadingConverter<C> {
    /// Creates a decorator that uploads to `store`.
    pub fn new(inner: C, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            inner,
            store: Some(store),
            key_prefix: String::new(),
        }
    }

    /// Creates a decorator that passes results through unchanged.
    pub fn passthrough(inner: C) -> Self {
        Self {
            inner,
            store: None,
            key_prefix: String::new(),
        }
    }

    /// Sets the prefix for generated keys.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Whether uploads are enabled.
    pub fn is_uploading(&self) -> bool {
        self.store.is_some()
    }

    fn object_key(&self, request: &ConversionRequest) -> String {
        match request.upload_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => key.to_string(),
            None => format!("{}{}.pdf", self.key_prefix, Uuid::new_v4()),
        }
    }
}

#[async_trait]
impl<C: Converter> Converter for UploadingConverter<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
        cancel: &CancellationToken,
    ) -> Result<ConversionOutput, ConverterError> {
        let output = self.inner.convert(request, cancel).await?;

        let Some(store) = &self.store else {
            return Ok(output);
        };
        let pdf = match output {
            ConversionOutput::Pdf(pdf) => pdf,
            stored @ ConversionOutput::Stored(_) => return Ok(stored),
        };

        let key = self.object_key(request);
        // put() consumes the body, so a copy is kept for the failure path.
        match store.put(&key, pdf.clone(), PDF_CONTENT_TYPE).await {
            Ok(object) => {
                info!("Uploaded {} to {}", request.source, object.location);
                Ok(ConversionOutput::Stored(object))
            }
            Err(e) => {
                warn!("Upload to {} failed for {}: {}", store.name(), key, e);
                Err(ConverterError::upload_failed(key, e.to_string(), pdf))
            }
        }
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        self.inner.validate().await
    }
}
