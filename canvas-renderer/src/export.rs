//! Canvas document export to PDF.
//!
//! Text is written as native, selectable PDF text. Shapes, images and image
//! backgrounds are rasterized with tiny-skia and embedded as images, stacked
//! with the text in z-order.

use std::sync::atomic::{AtomicBool, Ordering};

use canvas_core::{CanvasDocument, Element};

use crate::assets::{AssetSource, InlineAssets};
use crate::error::{RenderError, RenderResult};
use crate::layout::{self, ExportPlan};
use crate::pdf;

/// Largest raster edge in device pixels; higher scales are reduced to fit.
pub const MAX_RASTER_EDGE: f32 = 8192.0;

/// Configuration for PDF export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Raster resolution multiplier (e.g. 2.0 for retina).
    pub scale: f32,
    /// PDF document title.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            title: "Canvas Export".to_string(),
        }
    }
}

impl ExportConfig {
    /// The raster scale to use for a `width` x `height` pixel page.
    #[must_use]
    pub fn effective_scale(&self, width: f32, height: f32) -> f32 {
        let requested = if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        };
        requested.min(MAX_RASTER_EDGE / width.max(height).max(1.0))
    }
}

/// Exports canvas documents to PDF. One export runs at a time.
#[derive(Debug, Default)]
pub struct PdfExporter {
    config: ExportConfig,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag on drop, including on early return.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PdfExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self {
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The exporter configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Whether an export is currently running.
    #[must_use]
    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn begin(&self) -> RenderResult<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RenderError::ExportInProgress)?;
        Ok(InFlight(&self.in_flight))
    }

    /// Build the layer plan for `document` without writing a PDF.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidPage`] for an unusable page size and
    /// [`RenderError::Export`] if rasterization cannot allocate.
    pub fn plan(
        &self,
        document: &CanvasDocument,
        assets: &dyn AssetSource,
    ) -> RenderResult<ExportPlan> {
        let page = &document.page;
        let scale = self.config.effective_scale(page.width, page.height);
        layout::plan(document, assets, scale)
    }

    /// Export `document` to PDF bytes.
    ///
    /// Images that cannot be loaded never fail the export: backgrounds fall
    /// back to white and element images to a grey placeholder.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExportInProgress`] if another export on this
    /// exporter has not finished, or the first planning or PDF error.
    pub fn export(
        &self,
        document: &CanvasDocument,
        assets: &dyn AssetSource,
    ) -> RenderResult<Vec<u8>> {
        let _guard = self.begin()?;
        tracing::debug!(
            "Exporting {} elements to PDF",
            document.elements.len()
        );
        let plan = self.plan(document, assets)?;
        let bytes = pdf::write_pdf(&plan, &self.config.title)?;
        tracing::debug!("PDF export finished: {} bytes", bytes.len());
        Ok(bytes)
    }
}

/// Export a snapshot on the default A4 page with default settings.
///
/// Only inline image sources (data URIs, local files) are resolved.
///
/// # Errors
///
/// Returns the first planning or PDF error; see [`PdfExporter::export`].
pub fn render_to_pdf(elements: &[Element], background: &str, blur: f32) -> RenderResult<Vec<u8>> {
    let document = CanvasDocument::new(elements.to_vec(), background, blur);
    PdfExporter::with_defaults().export(&document, &InlineAssets)
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use canvas_core::ElementKind;

    #[test]
    fn test_effective_scale() {
        let config = ExportConfig::default();
        assert_eq!(config.effective_scale(794.0, 1123.0), 2.0);
        assert_eq!(config.effective_scale(8192.0, 100.0), 1.0);

        let broken = ExportConfig {
            scale: f32::NAN,
            ..ExportConfig::default()
        };
        assert_eq!(broken.effective_scale(100.0, 100.0), 1.0);
    }

    #[test]
    fn test_render_to_pdf_bytes() {
        let elements = vec![
            Element::text("Hello"),
            Element::new(ElementKind::Rectangle).with_bounds(100.0, 300.0, 120.0, 80.0),
        ];
        let bytes = render_to_pdf(&elements, "#ffffff", 0.0).expect("pdf");
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_second_export_while_running_fails_fast() {
        let exporter = PdfExporter::with_defaults();
        let guard = exporter.begin().expect("first");
        assert!(exporter.is_exporting());
        let result = exporter.export(&CanvasDocument::default(), &InlineAssets);
        assert!(matches!(result, Err(RenderError::ExportInProgress)));

        drop(guard);
        assert!(!exporter.is_exporting());
        assert!(exporter
            .export(&CanvasDocument::default(), &InlineAssets)
            .is_ok());
    }

    #[test]
    fn test_flag_cleared_after_error() {
        let exporter = PdfExporter::with_defaults();
        let mut document = CanvasDocument::default();
        document.page.width = -1.0;
        assert!(matches!(
            exporter.export(&document, &InlineAssets),
            Err(RenderError::InvalidPage { .. })
        ));
        assert!(!exporter.is_exporting());
    }
}
