//! # Canvas Export
//!
//! Export a stored canvas document to PDF from the command line.

use canvas_export::{init_tracing, run, CliArgs, ExportSettings};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let settings = ExportSettings::try_from(args)?;
    tracing::debug!("Export settings: {settings:?}");

    let report = run(&settings).await?;
    tracing::info!(
        "Exported {} ({} bytes, {}/{} remote images)",
        report.output.display(),
        report.bytes,
        report.fetched,
        report.remote
    );
    if let Some(url) = report.uploaded_url {
        println!("{url}");
    }
    Ok(())
}
