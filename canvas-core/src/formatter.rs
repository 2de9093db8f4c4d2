//! Toolbar formatting for text elements.
//!
//! The host reports the live text selection with [`TextFormatter::capture`]
//! while the user edits the selected element. A toolbar command then formats
//! just that range, or, when there is no usable range, the whole element.

use serde::{Deserialize, Serialize};

use crate::richtext::{InlineFormat, RichText, TextRange};
use crate::{ElementId, ElementKind, ElementPatch, ElementStore, FontStyle, FontWeight, TextDecoration};

/// A toolbar formatting command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "snake_case")]
pub enum FormatCommand {
    /// Toggle bold.
    Bold,
    /// Toggle italic.
    Italic,
    /// Toggle underline.
    Underline,
    /// Set the text colour.
    ForeColor(String),
}

impl FormatCommand {
    fn inline(&self) -> InlineFormat {
        match self {
            Self::Bold => InlineFormat::Bold,
            Self::Italic => InlineFormat::Italic,
            Self::Underline => InlineFormat::Underline,
            Self::ForeColor(color) => InlineFormat::Color(color.clone()),
        }
    }
}

/// How a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatOutcome {
    /// Applied to the saved range; the element HTML was rewritten.
    Inline,
    /// Applied to the element's own style.
    ElementLevel,
    /// Nothing is selected.
    NoSelection,
}

/// Saved text selection of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SavedSelection {
    element: ElementId,
    range: TextRange,
}

/// Applies toolbar commands to the selected element.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    saved: Option<SavedSelection>,
}

impl TextFormatter {
    /// Create a formatter with no saved selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the live selection inside `element`.
    ///
    /// Selections reported for an element other than the store's selected
    /// one are ignored, mirroring a selection that lies outside the editor.
    pub fn capture(&mut self, store: &ElementStore, element: &ElementId, range: TextRange) {
        if store.selected() != Some(element) {
            tracing::debug!("Ignoring text selection outside selected element {element}");
            return;
        }
        self.saved = Some(SavedSelection {
            element: element.clone(),
            range,
        });
    }

    /// Forget the saved selection.
    pub fn clear(&mut self) {
        self.saved = None;
    }

    /// The saved range for `element`, if any.
    #[must_use]
    pub fn saved_range(&self, element: &ElementId) -> Option<TextRange> {
        self.saved
            .as_ref()
            .filter(|saved| &saved.element == element)
            .map(|saved| saved.range)
    }

    /// Apply `command` to the selected element.
    ///
    /// A saved, non-collapsed range that still fits the text of the selected
    /// text element is formatted inline and stays saved, so consecutive
    /// commands compose. Otherwise the command falls back to the element
    /// style.
    pub fn apply(&mut self, store: &mut ElementStore, command: &FormatCommand) -> FormatOutcome {
        let Some(element) = store.selected_element() else {
            return FormatOutcome::NoSelection;
        };
        let id = element.id.clone();
        let kind = element.kind;
        let text = element.text.clone().unwrap_or_default();
        let style = element.style.clone();

        if kind == ElementKind::Text {
            if let Some(range) = self.saved_range(&id) {
                let mut rich = RichText::from_html(&text);
                if rich.apply(range, &command.inline()) {
                    store.update(&id, &ElementPatch::text(rich.to_html()));
                    return FormatOutcome::Inline;
                }
                tracing::debug!("Saved range {range:?} no longer fits element {id}, formatting whole element");
            }
        }

        let patch = match command {
            FormatCommand::Bold => ElementPatch {
                font_weight: Some(match style.font_weight {
                    FontWeight::Bold => FontWeight::Normal,
                    FontWeight::Normal => FontWeight::Bold,
                }),
                ..ElementPatch::default()
            },
            FormatCommand::Italic => ElementPatch {
                font_style: Some(match style.font_style {
                    FontStyle::Italic => FontStyle::Normal,
                    FontStyle::Normal => FontStyle::Italic,
                }),
                ..ElementPatch::default()
            },
            FormatCommand::Underline => ElementPatch {
                text_decoration: Some(match style.text_decoration {
                    TextDecoration::Underline => TextDecoration::None,
                    TextDecoration::None => TextDecoration::Underline,
                }),
                ..ElementPatch::default()
            },
            FormatCommand::ForeColor(color) => ElementPatch {
                color: Some(color.clone()),
                ..ElementPatch::default()
            },
        };
        store.update(&id, &patch);
        FormatOutcome::ElementLevel
    }
}
