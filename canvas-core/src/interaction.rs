//! Direct manipulation: selection, drag, resize and keyboard shortcuts.
//!
//! [`InteractionController`] is a small state machine fed with
//! [`InputEvent`]s. It owns only transient gesture state; every effect is
//! applied to the [`ElementStore`] passed into [`InteractionController::handle`].
//!
//! ```text
//! Idle --down(element body)--------------------> PendingDrag
//! PendingDrag --move, travel > 5px-------------> Dragging
//! Idle --down(move handle)---------------------> Dragging
//! Idle --down(resize handle of the selection)--> Resizing
//! any --up / cancel / target gone or locked----> Idle
//! ```

use serde::Serialize;

use crate::element::{MIN_HEIGHT, MIN_WIDTH};
use crate::event::{InputEvent, KeyModifiers, PointerPhase, PointerTarget, ResizeHandle};
use crate::{ElementId, ElementPatch, ElementStore};

/// Pointer travel (Euclidean, page pixels) a press must exceed before it
/// becomes a drag.
pub const DRAG_THRESHOLD: f32 = 5.0;

/// Element geometry captured when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StartGeometry {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

/// Where the gesture started.
#[derive(Debug, Clone, PartialEq)]
struct Gesture {
    element: ElementId,
    pointer_x: f32,
    pointer_y: f32,
    start: StartGeometry,
}

impl Gesture {
    fn delta(&self, x: f32, y: f32) -> (f32, f32) {
        (x - self.pointer_x, y - self.pointer_y)
    }
}

/// Transient controller state.
#[derive(Debug, Clone, Default, PartialEq)]
enum State {
    #[default]
    Idle,
    PendingDrag(Gesture),
    Dragging(Gesture),
    Resizing(Gesture, ResizeHandle),
}

/// What an event did to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Interaction {
    /// Nothing changed.
    None,
    /// An element became the selection.
    Selected(ElementId),
    /// The selection was cleared.
    SelectionCleared,
    /// An element moved.
    Moved(ElementId),
    /// An element was resized.
    Resized(ElementId),
    /// The selected element was deleted.
    Removed(ElementId),
    /// The selected element was duplicated; carries the copy's id.
    Duplicated(ElementId),
}

/// Pointer and keyboard state machine over an [`ElementStore`].
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: State,
    read_only: bool,
}

impl InteractionController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller that ignores all input.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            state: State::Idle,
            read_only: true,
        }
    }

    /// Whether input is ignored.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether a drag or resize gesture is in progress (pending drags excluded).
    #[must_use]
    pub fn is_manipulating(&self) -> bool {
        matches!(self.state, State::Dragging(_) | State::Resizing(..))
    }

    /// Drop any in-flight gesture.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Feed one event. Malformed sequences reset the gesture and report
    /// [`Interaction::None`]; nothing here fails.
    pub fn handle(&mut self, store: &mut ElementStore, event: &InputEvent) -> Interaction {
        if self.read_only {
            return Interaction::None;
        }
        match event {
            InputEvent::Pointer {
                phase,
                x,
                y,
                target,
            } => match phase {
                PointerPhase::Down => self.pointer_down(store, *x, *y, target),
                PointerPhase::Move => self.pointer_move(store, *x, *y),
                PointerPhase::Up | PointerPhase::Cancel => {
                    self.reset();
                    Interaction::None
                }
            },
            InputEvent::Key {
                key,
                pressed,
                modifiers,
            } => {
                if *pressed {
                    Self::key_down(store, key, *modifiers)
                } else {
                    Interaction::None
                }
            }
        }
    }

    fn pointer_down(
        &mut self,
        store: &mut ElementStore,
        x: f32,
        y: f32,
        target: &PointerTarget,
    ) -> Interaction {
        if self.state != State::Idle {
            tracing::debug!("Pointer down during a gesture, resetting");
            self.reset();
        }

        let Some(id) = target.element() else {
            store.clear_selection();
            return Interaction::SelectionCleared;
        };
        let Some(element) = store.get(id) else {
            tracing::debug!("Pointer down on unknown element {id}");
            return Interaction::None;
        };

        let gesture = Gesture {
            element: id.clone(),
            pointer_x: x,
            pointer_y: y,
            start: StartGeometry {
                x: element.transform.x,
                y: element.transform.y,
                width: element.transform.width,
                height: element.transform.height,
            },
        };
        let locked = element.locked;
        let was_selected = store.selected() == Some(id);

        match target {
            PointerTarget::Resize(_, handle) if was_selected && !locked => {
                self.state = State::Resizing(gesture, *handle);
                Interaction::None
            }
            PointerTarget::MoveHandle(_) if !locked => {
                store.select(id);
                self.state = State::Dragging(gesture);
                Interaction::Selected(id.clone())
            }
            _ => {
                store.select(id);
                if !locked {
                    self.state = State::PendingDrag(gesture);
                }
                Interaction::Selected(id.clone())
            }
        }
    }

    fn pointer_move(&mut self, store: &mut ElementStore, x: f32, y: f32) -> Interaction {
        let state = std::mem::take(&mut self.state);
        let gesture = match &state {
            State::Idle => return Interaction::None,
            State::PendingDrag(g) | State::Dragging(g) | State::Resizing(g, _) => g,
        };

        // The element may have vanished or been locked since the press.
        match store.get(&gesture.element) {
            Some(element) if !element.locked => {}
            _ => {
                tracing::debug!("Gesture target {} unavailable, resetting", gesture.element);
                return Interaction::None;
            }
        }

        let (dx, dy) = gesture.delta(x, y);
        let (next, outcome) = match state {
            State::PendingDrag(g) => {
                if dx.hypot(dy) > DRAG_THRESHOLD {
                    let outcome = Self::drag_to(store, &g, dx, dy);
                    (State::Dragging(g), outcome)
                } else {
                    (State::PendingDrag(g), Interaction::None)
                }
            }
            State::Dragging(g) => {
                let outcome = Self::drag_to(store, &g, dx, dy);
                (State::Dragging(g), outcome)
            }
            State::Resizing(g, handle) => {
                let outcome = Self::resize_to(store, &g, handle, dx, dy);
                (State::Resizing(g, handle), outcome)
            }
            State::Idle => (State::Idle, Interaction::None),
        };
        self.state = next;
        outcome
    }

    fn drag_to(store: &mut ElementStore, gesture: &Gesture, dx: f32, dy: f32) -> Interaction {
        let patch = ElementPatch::position(gesture.start.x + dx, gesture.start.y + dy);
        store.update(&gesture.element, &patch);
        Interaction::Moved(gesture.element.clone())
    }

    fn resize_to(
        store: &mut ElementStore,
        gesture: &Gesture,
        handle: ResizeHandle,
        dx: f32,
        dy: f32,
    ) -> Interaction {
        let start = gesture.start;
        let mut x = start.x;
        let mut y = start.y;
        let mut width = start.width;
        let mut height = start.height;

        if handle.east() {
            width = (start.width + dx).max(MIN_WIDTH);
        }
        if handle.west() {
            width = (start.width - dx).max(MIN_WIDTH);
            x = start.x + start.width - width;
        }
        if handle.south() {
            height = (start.height + dy).max(MIN_HEIGHT);
        }
        if handle.north() {
            height = (start.height - dy).max(MIN_HEIGHT);
            y = start.y + start.height - height;
        }

        store.update(&gesture.element, &ElementPatch::bounds(x, y, width, height));
        Interaction::Resized(gesture.element.clone())
    }

    fn key_down(store: &mut ElementStore, key: &str, modifiers: KeyModifiers) -> Interaction {
        let Some(selected) = store.selected().cloned() else {
            return Interaction::None;
        };
        if key == "Delete" {
            return store
                .remove(&selected)
                .map_or(Interaction::None, |_| Interaction::Removed(selected));
        }
        if modifiers.command() && key.eq_ignore_ascii_case("c") {
            return store
                .duplicate(&selected)
                .map_or(Interaction::None, Interaction::Duplicated);
        }
        Interaction::None
    }
}
