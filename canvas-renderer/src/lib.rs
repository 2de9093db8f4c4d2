//! # Canvas Renderer
//!
//! PDF export for canvas documents. Text stays text; everything else is
//! flattened with tiny-skia and layered in z-order.
//!
//! ## Export Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        CanvasDocument snapshot              │
//! ├─────────────────────────────────────────────┤
//! │  layout::plan                               │
//! │  - text blocks  │ scratch canvas (raster)   │
//! │  (AFM metrics)  │ shapes, images, bg blur   │
//! ├─────────────────────────────────────────────┤
//! │  pdf::write_pdf (printpdf lopdf objects)    │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod color;
pub mod error;
pub mod export;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod text;

pub use assets::{AssetSource, InlineAssets, PreloadedAssets};
pub use color::Rgba;
pub use error::{RenderError, RenderResult};
pub use export::{render_to_pdf, ExportConfig, PdfExporter};
pub use layout::{ExportPlan, Layer, PlacedLine, TextBlock};
pub use raster::{RasterTile, ScratchCanvas};
