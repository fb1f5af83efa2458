//! Command-line surface for `weaver`.

use std::path::PathBuf;

use clap::Parser;

use weaver_core::converter::{Orientation, RenderOptions};

#[derive(Parser, Debug)]
#[command(
    name = "weaver",
    version,
    about = "Convert a web page or document to PDF",
    long_about = None
)]
pub struct Cli {
    /// Page URL, or path to a local document to upload to the renderer
    pub source: String,

    /// Configuration file (TOML). Defaults plus WEAVER_* variables when unset
    #[arg(long, env = "WEAVER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where to write the PDF (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Aggressive extraction: strip clutter and keep the main content
    #[arg(long)]
    pub aggressive: bool,

    /// Wait for the page to set `window.status` before printing
    #[arg(long)]
    pub wait_for_status: bool,

    /// Landscape instead of portrait pages
    #[arg(long)]
    pub landscape: bool,

    /// Page size, e.g. A4 or Letter
    #[arg(long)]
    pub page_size: Option<String>,

    /// Object key for the upload (generated when omitted)
    #[arg(long)]
    pub upload_key: Option<String>,

    /// Job timeout in seconds (overrides pool.worker_timeout_secs)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, env = "WEAVER_LOG_JSON")]
    pub log_json: bool,
}

impl Cli {
    /// Rendering options selected by the flags.
    pub fn render_options(&self) -> RenderOptions {
        let mut options = RenderOptions::default();
        if self.aggressive {
            options = options.aggressive();
        }
        if self.wait_for_status {
            options = options.wait_for_status();
        }
        if self.landscape {
            options = options.with_orientation(Orientation::Landscape);
        }
        if let Some(size) = &self.page_size {
            options = options.with_page_size(size.clone());
        }
        options
    }

    /// Whether the source is fetched by the renderer rather than uploaded.
    pub fn is_remote_source(&self) -> bool {
        ["http://", "https://", "file://"]
            .iter()
            .any(|scheme| self.source.starts_with(scheme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "weaver",
            "https://example.com",
            "--aggressive",
            "--landscape",
            "--page-size",
            "A4",
            "-o",
            "out.pdf",
        ])
        .unwrap();

        assert!(cli.is_remote_source());
        assert_eq!(cli.output, Some(PathBuf::from("out.pdf")));
        let options = cli.render_options();
        assert!(options.aggressive);
        assert!(!options.wait_for_status);
        assert_eq!(options.orientation, Orientation::Landscape);
        assert_eq!(options.page_size.as_deref(), Some("A4"));
    }

    #[test]
    fn test_local_source() {
        let cli = Cli::try_parse_from(["weaver", "./report.html"]).unwrap();
        assert!(!cli.is_remote_source());
        assert_eq!(cli.render_options(), RenderOptions::default());
    }

    #[test]
    fn test_source_required() {
        assert!(Cli::try_parse_from(["weaver"]).is_err());
    }
}
