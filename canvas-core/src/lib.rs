//! # Canvas Core
//!
//! Editor state for a fixed-size graphic page: positioned text, shape and
//! image elements, direct manipulation, inline rich text and the persisted
//! canvas document. Nothing here touches a window system; hosts translate
//! their native input into [`InputEvent`]s and render [`CanvasDocument`]
//! snapshots.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                EditorSession                │
//! ├─────────────────────────────────────────────┤
//! │  ElementStore    │  InteractionController   │
//! │  - Paint order   │  - Select / drag         │
//! │  - Selection     │  - Resize handles        │
//! │  - Snapshots     │  - Keyboard shortcuts    │
//! ├─────────────────────────────────────────────┤
//! │  TextFormatter   │  CanvasDocument          │
//! │  - Saved range   │  - Persisted JSON        │
//! │  - RichText runs │  - Page & background     │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod formatter;
pub mod interaction;
pub mod richtext;
pub mod session;
pub mod store;

pub use document::{CanvasDocument, PageSettings};
pub use element::{
    Element, ElementId, ElementKind, ElementPatch, ElementStyle, FontStyle, FontWeight,
    FrameType, ListStyle, TextAlign, TextDecoration, Transform,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{InputEvent, KeyModifiers, PointerPhase, PointerTarget, ResizeHandle};
pub use formatter::{FormatCommand, FormatOutcome, TextFormatter};
pub use interaction::{Interaction, InteractionController};
pub use richtext::{InlineFormat, RichText, RunStyle, TextRange, TextRun};
pub use session::{EditorConfig, EditorSession};
pub use store::{Direction, ElementStore};

/// Canvas core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
