//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the athenapdf-backed renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Base renderer command line; the source and option flags are appended.
    #[serde(default = "default_command")]
    pub command: String,

    /// Milliseconds between SIGTERM and SIGKILL when a render is cancelled.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// X display for the renderer (e.g. ":99"). Inherited when unset.
    #[serde(default)]
    pub display: Option<String>,

    /// Directory where uploaded documents are staged before rendering.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

fn default_command() -> String {
    "athenapdf -S -T 120".to_string()
}

fn default_kill_grace_ms() -> u64 {
    2000
}

fn default_staging_dir() -> PathBuf {
    std::env::temp_dir().join("weaver-uploads")
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            kill_grace_ms: default_kill_grace_ms(),
            display: None,
            staging_dir: default_staging_dir(),
        }
    }
}

impl RendererConfig {
    /// Creates a config with a custom base command.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Sets the kill grace period in milliseconds.
    pub fn with_kill_grace_ms(mut self, kill_grace_ms: u64) -> Self {
        self.kill_grace_ms = kill_grace_ms;
        self
    }

    /// Sets the X display.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Sets the staging directory.
    pub fn with_staging_dir(mut self, staging_dir: PathBuf) -> Self {
        self.staging_dir = staging_dir;
        self
    }

    /// Grace period between SIGTERM and SIGKILL.
    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}
