//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the renderer-facing traits,
//! allowing scheduler and decorator tests without launching real processes
//! or talking to S3.
//!
//! # Example
//!
//! ```rust,ignore
//! use weaver_core::testing::{MockConverter, MockObjectStore};
//!
//! let converter = MockConverter::new().with_delay(Duration::from_millis(20));
//! let store = MockObjectStore::new("pdfs");
//! store.set_unreachable(true);
//! ```

mod mock_converter;
mod mock_runner;
mod mock_store;

pub use mock_converter::MockConverter;
pub use mock_runner::MockRunner;
pub use mock_store::{MockObjectStore, RecordedPut};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::converter::{ConversionRequest, RenderOptions};

    /// A request for `https://example.com/<name>` with default options.
    pub fn url_request(name: &str) -> ConversionRequest {
        ConversionRequest::from_url(format!("https://example.com/{}", name))
    }

    /// A request with every rendering option enabled.
    pub fn full_options_request(uri: &str) -> ConversionRequest {
        ConversionRequest::from_url(uri).with_options(
            RenderOptions::default()
                .aggressive()
                .wait_for_status()
                .with_orientation(crate::converter::Orientation::Landscape)
                .with_page_size("A4"),
        )
    }
}
