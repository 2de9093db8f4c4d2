//! Editor session: the host-facing facade.
//!
//! An [`EditorSession`] owns the element store, the interaction controller
//! and the text formatter for one open canvas, plus the page background and
//! size. Hosts feed it input and toolbar commands and read back immutable
//! snapshots for rendering, export and saving.

use std::sync::Arc;

use crate::document::{CanvasDocument, PageSettings, A4_HEIGHT, A4_WIDTH, MAX_BLUR};
use crate::event::InputEvent;
use crate::formatter::{FormatCommand, FormatOutcome, TextFormatter};
use crate::interaction::{Interaction, InteractionController};
use crate::richtext::TextRange;
use crate::store::{Direction, ElementStore};
use crate::{CanvasError, CanvasResult, Element, ElementId, ElementKind, ElementPatch, ListStyle};

/// Configuration for opening an editor session.
#[derive(Debug, Clone, Default)]
pub struct EditorConfig {
    /// Elements to start with.
    pub elements: Vec<Element>,
    /// Page background.
    pub background: String,
    /// Background blur radius in pixels.
    pub blur_amount: f32,
    /// Page size and border.
    pub page: PageSettings,
    /// Ignore all edits.
    pub read_only: bool,
}

impl EditorConfig {
    /// Configuration that reopens a stored document.
    #[must_use]
    pub fn from_document(document: CanvasDocument) -> Self {
        Self {
            elements: document.elements,
            background: document.background,
            blur_amount: document.blur_amount,
            page: document.page,
            read_only: false,
        }
    }

    /// Open read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// One open canvas.
#[derive(Debug, Clone)]
pub struct EditorSession {
    store: ElementStore,
    controller: InteractionController,
    formatter: TextFormatter,
    background: String,
    blur_amount: f32,
    page: PageSettings,
    read_only: bool,
}

impl EditorSession {
    /// Open a session.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidPageSize`] if the configured page is
    /// unusable.
    pub fn new(config: EditorConfig) -> CanvasResult<Self> {
        PageSettings::validate_size(config.page.width, config.page.height)?;
        let controller = if config.read_only {
            InteractionController::read_only()
        } else {
            InteractionController::new()
        };
        tracing::debug!(
            "Opening editor session with {} elements (read_only={})",
            config.elements.len(),
            config.read_only
        );
        Ok(Self {
            store: ElementStore::from_elements(config.elements),
            controller,
            formatter: TextFormatter::new(),
            background: config.background,
            blur_amount: clamp_blur(config.blur_amount),
            page: config.page,
            read_only: config.read_only,
        })
    }

    fn writable(&self) -> CanvasResult<()> {
        if self.read_only {
            Err(CanvasError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// The element store.
    #[must_use]
    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// Whether edits are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Route a pointer or key event to the interaction controller.
    ///
    /// A change of selection forgets the saved text range.
    pub fn handle_event(&mut self, event: &InputEvent) -> Interaction {
        let before = self.store.selected().cloned();
        let outcome = self.controller.handle(&mut self.store, event);
        if self.store.selected() != before.as_ref() {
            self.formatter.clear();
        }
        outcome
    }

    /// Report the live text selection inside `element`.
    pub fn capture_selection(&mut self, element: &ElementId, range: TextRange) {
        self.formatter.capture(&self.store, element, range);
    }

    /// Apply a toolbar formatting command to the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn apply_format(&mut self, command: &FormatCommand) -> CanvasResult<FormatOutcome> {
        self.writable()?;
        Ok(self.formatter.apply(&mut self.store, command))
    }

    /// Add an element of `kind` with its defaults and select it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn add(&mut self, kind: ElementKind) -> CanvasResult<ElementId> {
        self.writable()?;
        self.formatter.clear();
        Ok(self.store.add(kind))
    }

    /// Add an image element and select it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn add_image(&mut self, src: impl Into<String>) -> CanvasResult<ElementId> {
        self.writable()?;
        self.formatter.clear();
        Ok(self.store.add_image(src))
    }

    /// Merge `patch` into element `id` (style panel edits).
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions and
    /// [`CanvasError::ElementNotFound`] for unknown ids.
    pub fn update_element(&mut self, id: &ElementId, patch: &ElementPatch) -> CanvasResult<()> {
        self.writable()?;
        if self.store.update(id, patch) {
            Ok(())
        } else {
            Err(CanvasError::ElementNotFound(id.to_string()))
        }
    }

    /// Delete the selected element. Returns it, if there was one.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn remove_selected(&mut self) -> CanvasResult<Option<Element>> {
        self.writable()?;
        let Some(id) = self.store.selected().cloned() else {
            return Ok(None);
        };
        self.formatter.clear();
        Ok(self.store.remove(&id))
    }

    /// Duplicate the selected element; the copy becomes the selection.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn duplicate_selected(&mut self) -> CanvasResult<Option<ElementId>> {
        self.writable()?;
        let Some(id) = self.store.selected().cloned() else {
            return Ok(None);
        };
        self.formatter.clear();
        Ok(self.store.duplicate(&id))
    }

    /// Move the selected element one step in `direction`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn reorder_selected(&mut self, direction: Direction) -> CanvasResult<bool> {
        self.writable()?;
        let Some(id) = self.store.selected().cloned() else {
            return Ok(false);
        };
        Ok(self.store.reorder(&id, direction))
    }

    /// Flip the lock of element `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions and
    /// [`CanvasError::ElementNotFound`] for unknown ids.
    pub fn toggle_locked(&mut self, id: &ElementId) -> CanvasResult<bool> {
        self.writable()?;
        self.store
            .toggle_locked(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))
    }

    /// Flip the visibility of element `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions and
    /// [`CanvasError::ElementNotFound`] for unknown ids.
    pub fn toggle_visible(&mut self, id: &ElementId) -> CanvasResult<bool> {
        self.writable()?;
        self.store
            .toggle_visible(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))
    }

    /// Toggle the list marker of text element `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions, otherwise
    /// whatever [`ElementStore::toggle_list_style`] returns.
    pub fn toggle_list_style(&mut self, id: &ElementId, style: ListStyle) -> CanvasResult<ListStyle> {
        self.writable()?;
        self.store.toggle_list_style(id, style)
    }

    /// Replace the page background (colour, data URI, path or URL; empty
    /// clears it).
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn set_background(&mut self, background: impl Into<String>) -> CanvasResult<()> {
        self.writable()?;
        self.background = background.into();
        Ok(())
    }

    /// Set the background blur radius, clamped to `0..=10` pixels.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn set_blur_amount(&mut self, blur_amount: f32) -> CanvasResult<()> {
        self.writable()?;
        self.blur_amount = clamp_blur(blur_amount);
        Ok(())
    }

    /// Resize the page.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions and
    /// [`CanvasError::InvalidPageSize`] for unusable sizes.
    pub fn set_page_size(&mut self, width: f32, height: f32) -> CanvasResult<()> {
        self.writable()?;
        PageSettings::validate_size(width, height)?;
        self.page.width = width;
        self.page.height = height;
        Ok(())
    }

    /// Restore the A4 page size.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn reset_page_to_a4(&mut self) -> CanvasResult<()> {
        self.set_page_size(A4_WIDTH, A4_HEIGHT)
    }

    /// Set the page border; a zero width removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ReadOnly`] for read-only sessions.
    pub fn set_page_border(&mut self, color: impl Into<String>, width: f32) -> CanvasResult<()> {
        self.writable()?;
        self.page.border_color = color.into();
        self.page.border_width = width.max(0.0);
        Ok(())
    }

    /// Page background.
    #[must_use]
    pub fn background(&self) -> &str {
        &self.background
    }

    /// Background blur radius.
    #[must_use]
    pub fn blur_amount(&self) -> f32 {
        self.blur_amount
    }

    /// Page settings.
    #[must_use]
    pub fn page(&self) -> &PageSettings {
        &self.page
    }

    /// Immutable snapshot of the elements in paint order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Element>> {
        self.store.snapshot()
    }

    /// The current state as a persistable document.
    #[must_use]
    pub fn document(&self) -> CanvasDocument {
        CanvasDocument {
            elements: self.store.elements().to_vec(),
            background: self.background.clone(),
            blur_amount: self.blur_amount,
            page: self.page.clone(),
        }
    }

    /// Hand the current elements, background and blur to the host's save
    /// callback and return what it returns.
    pub fn save<F, R>(&self, on_save: F) -> R
    where
        F: FnOnce(&[Element], &str, f32) -> R,
    {
        tracing::debug!("Saving {} elements", self.store.len());
        on_save(self.store.elements(), &self.background, self.blur_amount)
    }
}

/// Blur radius limited to `0..=MAX_BLUR`; NaN means no blur.
fn clamp_blur(blur_amount: f32) -> f32 {
    if blur_amount.is_nan() {
        0.0
    } else {
        blur_amount.clamp(0.0, MAX_BLUR)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::event::{KeyModifiers, PointerTarget};

    fn session() -> EditorSession {
        EditorSession::new(EditorConfig::default()).expect("session")
    }

    #[test]
    fn test_add_style_delete_scenario() {
        let mut session = session();
        let id = session.add(ElementKind::Rectangle).expect("add");
        let patch = ElementPatch {
            background_color: Some("#3b82f6".to_string()),
            ..ElementPatch::default()
        };
        session.update_element(&id, &patch).expect("update");

        let removed = session
            .handle_event(&InputEvent::key_down("Delete", KeyModifiers::default()));
        assert_eq!(removed, Interaction::Removed(id));
        assert!(session.store().is_empty());
        assert!(session.store().selected().is_none());
    }

    #[test]
    fn test_read_only_rejects_edits() {
        let mut session =
            EditorSession::new(EditorConfig::default().read_only()).expect("session");
        assert!(matches!(session.add(ElementKind::Text), Err(CanvasError::ReadOnly)));
        assert!(matches!(session.set_background("#000"), Err(CanvasError::ReadOnly)));
        assert!(matches!(
            session.apply_format(&FormatCommand::Bold),
            Err(CanvasError::ReadOnly)
        ));
        assert_eq!(
            session.handle_event(&InputEvent::pointer_down(1.0, 1.0, PointerTarget::Canvas)),
            Interaction::None
        );
    }

    #[test]
    fn test_page_settings() {
        let mut session = session();
        session.set_page_size(1123.0, 794.0).expect("landscape");
        assert!(session.page().is_landscape());
        assert!(matches!(
            session.set_page_size(-1.0, 10.0),
            Err(CanvasError::InvalidPageSize { .. })
        ));
        session.reset_page_to_a4().expect("a4");
        assert_eq!(session.page().width, A4_WIDTH);
        assert_eq!(session.page().height, A4_HEIGHT);
    }

    #[test]
    fn test_blur_is_clamped() {
        let mut session = session();
        session.set_blur_amount(25.0).expect("blur");
        assert_eq!(session.blur_amount(), MAX_BLUR);
        session.set_blur_amount(-3.0).expect("blur");
        assert_eq!(session.blur_amount(), 0.0);
        session.set_blur_amount(f32::NAN).expect("blur");
        assert_eq!(session.blur_amount(), 0.0);
    }

    #[test]
    fn test_nan_blur_from_config_is_zero() {
        let config = EditorConfig {
            blur_amount: f32::NAN,
            ..EditorConfig::default()
        };
        let session = EditorSession::new(config).expect("session");
        assert_eq!(session.blur_amount(), 0.0);
        assert_eq!(session.document().blur_amount, 0.0);
    }

    #[test]
    fn test_selection_change_forgets_text_range() {
        let mut session = session();
        let text = session.add(ElementKind::Text).expect("add");
        session.capture_selection(&text, TextRange::new(0, 3));

        session.handle_event(&InputEvent::pointer_down(1.0, 1.0, PointerTarget::Canvas));
        session.handle_event(&InputEvent::pointer_down(
            60.0,
            60.0,
            PointerTarget::Element(text.clone()),
        ));
        session.handle_event(&InputEvent::pointer_up(60.0, 60.0));

        let outcome = session.apply_format(&FormatCommand::Bold).expect("format");
        assert_eq!(outcome, FormatOutcome::ElementLevel);
    }

    #[test]
    fn test_save_hands_over_state() {
        let mut session = session();
        session.add(ElementKind::Star).expect("add");
        session.set_background("#fafafa").expect("background");
        session.set_blur_amount(2.0).expect("blur");

        let (count, background, blur) =
            session.save(|elements, background, blur| (elements.len(), background.to_string(), blur));
        assert_eq!(count, 1);
        assert_eq!(background, "#fafafa");
        assert_eq!(blur, 2.0);

        let document = session.document();
        let reopened =
            EditorSession::new(EditorConfig::from_document(document.clone())).expect("reopen");
        assert_eq!(reopened.document(), document);
    }
}
