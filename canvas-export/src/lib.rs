//! # Canvas Export
//!
//! Command-line host for the canvas editor core: load a stored canvas
//! document, fetch the remote images it references, export it to PDF and
//! optionally upload the result.
//!
//! ## Usage
//!
//! ```bash
//! canvas-export --input canvas.json --output page.pdf
//! canvas-export --input canvas.json --upload-url https://example.com/api/upload
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap (env fallbacks)
//! - `ExportSettings` - Validated configuration
//! - `fetch` - Sequential remote image prefetch
//! - `upload` - Single multipart upload of the finished PDF

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

pub mod error;
pub mod fetch;
pub mod upload;

pub use error::{HostError, HostResult};

use std::path::{Path, PathBuf};
use std::time::Duration;

use canvas_core::CanvasDocument;
use canvas_renderer::{ExportConfig, PdfExporter};
use clap::Parser;
use reqwest::Client;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

/// Input path that means standard input.
pub const STDIN_PATH: &str = "-";

/// Command-line arguments for canvas-export.
#[derive(Debug, Clone, Parser)]
#[command(name = "canvas-export")]
#[command(about = "Export a stored canvas document to PDF")]
#[command(version)]
pub struct CliArgs {
    /// Canvas document JSON file (`-` for stdin)
    #[arg(long, short, env = "CANVAS_INPUT")]
    pub input: PathBuf,

    /// Output PDF path (default: canvas-export-<millis>.pdf)
    #[arg(long, short, env = "CANVAS_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Upload endpoint receiving the PDF as multipart `file`
    #[arg(long, env = "CANVAS_UPLOAD_URL")]
    pub upload_url: Option<String>,

    /// Raster resolution multiplier for shapes and images
    #[arg(long, env = "CANVAS_EXPORT_SCALE", default_value = "2.0")]
    pub scale: f32,

    /// Timeout for each remote request, in seconds
    #[arg(long, env = "CANVAS_FETCH_TIMEOUT_SECS", default_value = "30")]
    pub fetch_timeout_secs: u64,

    /// PDF document title
    #[arg(long, default_value = "Canvas Export")]
    pub title: String,
}

/// Validated export configuration.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    /// Document source.
    pub input: PathBuf,
    /// PDF destination.
    pub output: PathBuf,
    /// Upload endpoint, if any.
    pub upload_url: Option<Url>,
    /// Raster resolution multiplier.
    pub scale: f32,
    /// Per-request timeout.
    pub fetch_timeout: Duration,
    /// PDF title.
    pub title: String,
}

impl ExportSettings {
    /// Settings for exporting `input` to `output` with defaults otherwise.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        let defaults = ExportConfig::default();
        Self {
            input: input.into(),
            output: output.into(),
            upload_url: None,
            scale: defaults.scale,
            fetch_timeout: Duration::from_secs(30),
            title: defaults.title,
        }
    }
}

impl TryFrom<CliArgs> for ExportSettings {
    type Error = HostError;

    fn try_from(args: CliArgs) -> HostResult<Self> {
        let upload_url = args
            .upload_url
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| Url::parse(&raw).map_err(|e| HostError::InvalidUrl(format!("{raw}: {e}"))))
            .transpose()?;
        let output = args.output.unwrap_or_else(|| {
            PathBuf::from(format!("canvas-export-{}.pdf", upload::now_millis()))
        });
        Ok(Self {
            input: args.input,
            output,
            upload_url,
            scale: args.scale,
            fetch_timeout: Duration::from_secs(args.fetch_timeout_secs.max(1)),
            title: args.title,
        })
    }
}

/// What an export run produced.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the PDF was written.
    pub output: PathBuf,
    /// PDF size in bytes.
    pub bytes: usize,
    /// Remote images fetched successfully.
    pub fetched: usize,
    /// Remote images referenced by the document.
    pub remote: usize,
    /// Location returned by the upload endpoint.
    pub uploaded_url: Option<String>,
}

/// Build the HTTP client used for prefetch and upload.
///
/// # Errors
///
/// Returns [`HostError::Http`] if the client cannot be built.
pub fn http_client(timeout: Duration) -> HostResult<Client> {
    Ok(Client::builder()
        .user_agent(concat!("canvas-export/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .no_proxy()
        .build()?)
}

async fn read_input(path: &Path) -> HostResult<String> {
    let io_error = |source: std::io::Error| HostError::Io {
        path: path.to_path_buf(),
        source,
    };
    if path.as_os_str() == STDIN_PATH {
        use tokio::io::AsyncReadExt;
        let mut json = String::new();
        tokio::io::stdin()
            .read_to_string(&mut json)
            .await
            .map_err(io_error)?;
        return Ok(json);
    }
    tokio::fs::read_to_string(path).await.map_err(io_error)
}

/// Run one export.
///
/// A malformed document exports as an empty page. Remote images that cannot
/// be fetched are drawn as placeholders.
///
/// # Errors
///
/// Returns the first I/O, export or upload error.
pub async fn run(settings: &ExportSettings) -> HostResult<ExportReport> {
    let json = read_input(&settings.input).await?;
    let document = CanvasDocument::from_json_lenient(&json);
    tracing::info!(
        "Loaded canvas document: {} elements, page {}x{}",
        document.elements.len(),
        document.page.width,
        document.page.height
    );

    let client = http_client(settings.fetch_timeout)?;
    let remote = document.remote_sources();
    let remote_count = remote.len();
    let assets = fetch::prefetch(&client, remote.as_slice()).await;
    if remote_count > 0 {
        tracing::info!("Prefetched {}/{remote_count} remote images", assets.len());
    }

    let config = ExportConfig {
        scale: settings.scale,
        title: settings.title.clone(),
    };
    let fetched = assets.len();
    let pdf = tokio::task::spawn_blocking(move || PdfExporter::new(config).export(&document, &assets))
        .await
        .map_err(|e| HostError::Task(e.to_string()))??;

    tokio::fs::write(&settings.output, &pdf)
        .await
        .map_err(|source| HostError::Io {
            path: settings.output.clone(),
            source,
        })?;
    tracing::info!("Wrote {} ({} bytes)", settings.output.display(), pdf.len());

    let bytes = pdf.len();
    let uploaded_url = match &settings.upload_url {
        Some(endpoint) => {
            let name = upload::file_name(upload::now_millis());
            let url = upload::upload_pdf(&client, endpoint, pdf, &name).await?;
            tracing::info!("PDF uploaded successfully: {url}");
            Some(url)
        }
        None => None,
    };

    Ok(ExportReport {
        output: settings.output.clone(),
        bytes,
        fetched,
        remote: remote_count,
        uploaded_url,
    })
}

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,canvas_export=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,canvas_export=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = CliArgs::try_parse_from(["canvas-export", "--input", "doc.json"]).expect("args");
        assert!((args.scale - 2.0).abs() < f32::EPSILON);
        assert_eq!(args.fetch_timeout_secs, 30);

        let settings = ExportSettings::try_from(args).expect("settings");
        assert_eq!(settings.input, PathBuf::from("doc.json"));
        let name = settings.output.to_string_lossy().to_string();
        assert!(name.starts_with("canvas-export-") && name.ends_with(".pdf"));
        assert!(settings.upload_url.is_none());
    }

    #[test]
    fn test_cli_rejects_bad_upload_url() {
        let args = CliArgs::try_parse_from([
            "canvas-export",
            "-i",
            "doc.json",
            "--upload-url",
            "not a url",
        ])
        .expect("args");
        assert!(matches!(
            ExportSettings::try_from(args),
            Err(HostError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_missing_input_is_a_usage_error() {
        assert!(CliArgs::try_parse_from(["canvas-export"]).is_err());
    }
}
