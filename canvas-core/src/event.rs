//! Input events for canvas interaction.
//!
//! Hosts translate their native pointer/keyboard events into [`InputEvent`]s.
//! Hit testing is the host's job: every pointer event carries the
//! [`PointerTarget`] under the pointer (use
//! [`ElementStore::element_at`](crate::ElementStore::element_at) when the host
//! has no scene graph of its own).

use serde::{Deserialize, Serialize};

use crate::ElementId;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
    /// Gesture aborted by the host (focus loss, pointer capture lost).
    Cancel,
}

/// Resize handle on the selection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    /// Whether the handle drags the east (right) edge.
    #[must_use]
    pub fn east(self) -> bool {
        matches!(self, Self::E | Self::Ne | Self::Se)
    }

    /// Whether the handle drags the west (left) edge.
    #[must_use]
    pub fn west(self) -> bool {
        matches!(self, Self::W | Self::Nw | Self::Sw)
    }

    /// Whether the handle drags the south (bottom) edge.
    #[must_use]
    pub fn south(self) -> bool {
        matches!(self, Self::S | Self::Se | Self::Sw)
    }

    /// Whether the handle drags the north (top) edge.
    #[must_use]
    pub fn north(self) -> bool {
        matches!(self, Self::N | Self::Ne | Self::Nw)
    }
}

/// What the pointer is over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PointerTarget {
    /// Empty page area.
    Canvas,
    /// The body of an element.
    Element(ElementId),
    /// The explicit move grip of an element.
    MoveHandle(ElementId),
    /// A resize handle of an element.
    Resize(ElementId, ResizeHandle),
}

impl PointerTarget {
    /// The element the pointer is over, if any.
    #[must_use]
    pub fn element(&self) -> Option<&ElementId> {
        match self {
            Self::Canvas => None,
            Self::Element(id) | Self::MoveHandle(id) | Self::Resize(id, _) => Some(id),
        }
    }
}

/// All input events the canvas can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Pointer (mouse, pen or primary touch) event.
    Pointer {
        /// Phase of the gesture.
        phase: PointerPhase,
        /// X coordinate in page pixels.
        x: f32,
        /// Y coordinate in page pixels.
        y: f32,
        /// What the pointer is over.
        target: PointerTarget,
    },

    /// Keyboard event.
    Key {
        /// Key name (`"Delete"`, `"c"`, ...).
        key: String,
        /// Whether the key is pressed.
        pressed: bool,
        /// Active modifier keys.
        modifiers: KeyModifiers,
    },
}

impl InputEvent {
    /// Pointer-down at (`x`, `y`) over `target`.
    #[must_use]
    pub fn pointer_down(x: f32, y: f32, target: PointerTarget) -> Self {
        Self::Pointer {
            phase: PointerPhase::Down,
            x,
            y,
            target,
        }
    }

    /// Pointer move to (`x`, `y`); the target is irrelevant mid-gesture.
    #[must_use]
    pub fn pointer_move(x: f32, y: f32) -> Self {
        Self::Pointer {
            phase: PointerPhase::Move,
            x,
            y,
            target: PointerTarget::Canvas,
        }
    }

    /// Pointer-up at (`x`, `y`).
    #[must_use]
    pub fn pointer_up(x: f32, y: f32) -> Self {
        Self::Pointer {
            phase: PointerPhase::Up,
            x,
            y,
            target: PointerTarget::Canvas,
        }
    }

    /// Key press of `key` with `modifiers`.
    #[must_use]
    pub fn key_down(key: impl Into<String>, modifiers: KeyModifiers) -> Self {
        Self::Key {
            key: key.into(),
            pressed: true,
            modifiers,
        }
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

impl KeyModifiers {
    /// Only Control held.
    #[must_use]
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    /// Only Meta/Command held.
    #[must_use]
    pub fn meta() -> Self {
        Self {
            meta: true,
            ..Self::default()
        }
    }

    /// Control or Command, the platform shortcut modifier.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_edges() {
        assert!(ResizeHandle::Nw.north() && ResizeHandle::Nw.west());
        assert!(!ResizeHandle::Nw.east() && !ResizeHandle::Nw.south());
        assert!(ResizeHandle::E.east());
        assert!(!ResizeHandle::E.north() && !ResizeHandle::E.south());
        assert!(ResizeHandle::Se.south() && ResizeHandle::Se.east());
    }

    #[test]
    fn test_event_serialization() {
        let event = InputEvent::pointer_down(
            10.0,
            20.0,
            PointerTarget::Resize(ElementId::from("abc"), ResizeHandle::Se),
        );
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "Pointer");
        assert_eq!(json["data"]["phase"], "down");
        assert_eq!(json["data"]["target"]["kind"], "resize");

        let back: InputEvent = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, event);
    }

    #[test]
    fn test_command_modifier() {
        assert!(KeyModifiers::ctrl().command());
        assert!(KeyModifiers::meta().command());
        assert!(!KeyModifiers::default().command());
    }
}
