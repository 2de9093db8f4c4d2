//! Ordered element storage with single selection.
//!
//! [`ElementStore`] keeps elements in paint order (back to front) and
//! renumbers `zIndex` densely after every structural change, so the stored
//! order and the `zIndex` field never disagree. Mutations are copy-on-write:
//! a [`ElementStore::snapshot`] taken before a mutation is never altered by it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, Element, ElementId, ElementKind, ElementPatch, ListStyle};

/// Offset applied to a duplicated element, in pixels.
pub const DUPLICATE_OFFSET: f32 = 20.0;

/// Direction for [`ElementStore::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// One step towards the front (higher `zIndex`).
    Up,
    /// One step towards the back (lower `zIndex`).
    Down,
}

/// The editor's element collection plus the current selection.
///
/// # Example
///
/// ```
/// use canvas_core::{ElementKind, ElementStore};
///
/// let mut store = ElementStore::new();
/// let id = store.add(ElementKind::Rectangle);
///
/// assert_eq!(store.selected(), Some(&id));
/// assert_eq!(store.get(&id).map(|e| e.transform.z_index), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    /// Elements in paint order.
    elements: Arc<Vec<Element>>,
    /// Currently selected element, if any.
    selected: Option<ElementId>,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load persisted elements.
    ///
    /// Elements are ordered by their stored `zIndex`; a missing (zero) value
    /// falls back to the element's list position + 1 and ties keep list
    /// order. The result is renumbered densely. Nothing is selected.
    #[must_use]
    pub fn from_elements(elements: Vec<Element>) -> Self {
        let mut keyed: Vec<(i64, Element)> = elements
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                let key = if element.transform.z_index == 0 {
                    i64::try_from(index).unwrap_or(i64::MAX).saturating_add(1)
                } else {
                    i64::from(element.transform.z_index)
                };
                (key, element)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| *key);

        let mut store = Self {
            elements: Arc::new(keyed.into_iter().map(|(_, element)| element).collect()),
            selected: None,
        };
        store.renumber();
        store
    }

    /// Add a new element of `kind` with its type defaults on top of the stack
    /// and select it.
    pub fn add(&mut self, kind: ElementKind) -> ElementId {
        self.add_element(Element::new(kind))
    }

    /// Add an image element showing `src` on top of the stack and select it.
    pub fn add_image(&mut self, src: impl Into<String>) -> ElementId {
        self.add_element(Element::image(src))
    }

    /// Add a prepared element on top of the stack and select it.
    ///
    /// The element's `zIndex` is overwritten with the new top position.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let id = element.id.clone();
        let elements = Arc::make_mut(&mut self.elements);
        elements.push(element);
        self.renumber();
        self.selected = Some(id.clone());
        tracing::debug!("Added element {id} ({} total)", self.elements.len());
        id
    }

    /// Merge `patch` into the element `id`.
    ///
    /// Locked elements are still updated; the lock only guards direct
    /// manipulation. Returns `false` if the id is unknown.
    pub fn update(&mut self, id: &ElementId, patch: &ElementPatch) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let elements = Arc::make_mut(&mut self.elements);
        patch.apply_to(&mut elements[index]);
        true
    }

    /// Run `f` against the element `id`. Returns `false` if the id is unknown.
    pub(crate) fn modify(&mut self, id: &ElementId, f: impl FnOnce(&mut Element)) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let elements = Arc::make_mut(&mut self.elements);
        f(&mut elements[index]);
        true
    }

    /// Remove the element `id`, clearing the selection if it was selected.
    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let index = self.index_of(id)?;
        let elements = Arc::make_mut(&mut self.elements);
        let removed = elements.remove(index);
        self.renumber();
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        tracing::debug!("Removed element {id}");
        Some(removed)
    }

    /// Clone element `id` with a fresh id, offset by [`DUPLICATE_OFFSET`], on
    /// top of the stack. The copy becomes the selection.
    pub fn duplicate(&mut self, id: &ElementId) -> Option<ElementId> {
        let mut copy = self.get(id)?.clone();
        copy.id = ElementId::new();
        copy.transform.x += DUPLICATE_OFFSET;
        copy.transform.y += DUPLICATE_OFFSET;
        Some(self.add_element(copy))
    }

    /// Swap element `id` with its immediate neighbour in paint order.
    ///
    /// Returns `false` when the id is unknown or the element is already at
    /// the boundary in `direction`.
    pub fn reorder(&mut self, id: &ElementId, direction: Direction) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Up if index + 1 < self.elements.len() => index + 1,
            Direction::Down if index > 0 => index - 1,
            _ => return false,
        };
        let elements = Arc::make_mut(&mut self.elements);
        elements.swap(index, neighbour);
        self.renumber();
        tracing::debug!("Moved element {id} {direction:?}");
        true
    }

    /// Flip the lock flag of element `id`. Returns the new state.
    pub fn toggle_locked(&mut self, id: &ElementId) -> Option<bool> {
        let mut state = None;
        self.modify(id, |element| {
            element.locked = !element.locked;
            state = Some(element.locked);
        });
        state
    }

    /// Flip the visibility of element `id`. Returns the new state.
    pub fn toggle_visible(&mut self, id: &ElementId) -> Option<bool> {
        let mut state = None;
        self.modify(id, |element| {
            element.visible = !element.visible;
            state = Some(element.visible);
        });
        state
    }

    /// Toggle the list marker of text element `id`: applying the active
    /// style turns lists off, any other style replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ElementNotFound`] for an unknown id and
    /// [`CanvasError::InvalidOperation`] for non-text elements.
    pub fn toggle_list_style(&mut self, id: &ElementId, style: ListStyle) -> CanvasResult<ListStyle> {
        let element = self
            .get(id)
            .ok_or_else(|| CanvasError::ElementNotFound(id.to_string()))?;
        if element.kind != ElementKind::Text {
            return Err(CanvasError::InvalidOperation(format!(
                "list style on {:?} element {id}",
                element.kind
            )));
        }
        let next = if element.style.list_style == style {
            ListStyle::None
        } else {
            style
        };
        self.modify(id, |element| element.style.list_style = next);
        Ok(next)
    }

    /// Select element `id`. Returns `false` (and keeps the old selection) if
    /// the id is unknown.
    pub fn select(&mut self, id: &ElementId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.selected = Some(id.clone());
        true
    }

    /// Clear the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected element id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&ElementId> {
        self.selected.as_ref()
    }

    /// The selected element, if any.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Look up an element by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|element| &element.id == id)
    }

    /// All elements in paint order (back to front).
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Immutable snapshot of the elements in paint order.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Vec<Element>> {
        Arc::clone(&self.elements)
    }

    /// Topmost visible element containing the page point (`x`, `y`).
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<&ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|element| element.visible && element.contains_point(x, y))
            .map(|element| &element.id)
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the store holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn index_of(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|element| &element.id == id)
    }

    fn renumber(&mut self) {
        let in_order = self
            .elements
            .iter()
            .zip(1..)
            .all(|(element, z)| element.transform.z_index == z);
        if in_order {
            return;
        }
        let elements = Arc::make_mut(&mut self.elements);
        for (element, z) in elements.iter_mut().zip(1..) {
            element.transform.z_index = z;
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn z_indices(store: &ElementStore) -> Vec<i32> {
        store.elements().iter().map(|e| e.transform.z_index).collect()
    }

    #[test]
    fn test_add_assigns_top_z_and_selects() {
        let mut store = ElementStore::new();
        let first = store.add(ElementKind::Text);
        let second = store.add(ElementKind::Circle);

        assert_eq!(z_indices(&store), vec![1, 2]);
        assert_eq!(store.selected(), Some(&second));
        assert_eq!(store.get(&first).map(|e| e.kind), Some(ElementKind::Text));
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut store = ElementStore::new();
        let keep = store.add(ElementKind::Rectangle);
        let gone = store.add(ElementKind::Star);

        assert!(store.remove(&gone).is_some());
        assert!(store.selected().is_none());
        assert_eq!(z_indices(&store), vec![1]);
        assert!(store.get(&keep).is_some());
        assert!(store.remove(&gone).is_none());
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut store = ElementStore::new();
        let other = store.add(ElementKind::Rectangle);
        let selected = store.add(ElementKind::Star);

        store.remove(&other);
        assert_eq!(store.selected(), Some(&selected));
    }

    #[test]
    fn test_duplicate_offsets_and_selects_copy() {
        let mut store = ElementStore::new();
        let original = store.add(ElementKind::Hexagon);
        store.update(&original, &ElementPatch::position(100.0, 40.0));

        let copy = store.duplicate(&original).expect("duplicate");
        assert_ne!(copy, original);
        assert_eq!(store.selected(), Some(&copy));

        let copied = store.get(&copy).expect("copy exists");
        assert_eq!(copied.transform.x, 120.0);
        assert_eq!(copied.transform.y, 60.0);
        assert_eq!(copied.transform.z_index, 2);
        assert_eq!(copied.kind, ElementKind::Hexagon);
    }

    #[test]
    fn test_reorder_swaps_with_neighbour() {
        let mut store = ElementStore::new();
        let a = store.add(ElementKind::Rectangle);
        let b = store.add(ElementKind::Circle);
        let c = store.add(ElementKind::Triangle);

        assert!(store.reorder(&b, Direction::Up));
        assert_eq!(store.get(&b).map(|e| e.transform.z_index), Some(3));
        assert_eq!(store.get(&c).map(|e| e.transform.z_index), Some(2));
        assert_eq!(store.get(&a).map(|e| e.transform.z_index), Some(1));

        // b is now on top
        assert!(!store.reorder(&b, Direction::Up));
        assert!(!store.reorder(&a, Direction::Down));
        assert_eq!(z_indices(&store), vec![1, 2, 3]);
    }

    #[test]
    fn test_update_ignores_lock_and_unknown_ids() {
        let mut store = ElementStore::new();
        let id = store.add(ElementKind::Rectangle);
        store.toggle_locked(&id);

        let patch = ElementPatch {
            background_color: Some("#ff0000".to_string()),
            ..ElementPatch::default()
        };
        assert!(store.update(&id, &patch));
        assert_eq!(
            store.get(&id).map(|e| e.style.background_color.as_str()),
            Some("#ff0000")
        );
        assert!(!store.update(&ElementId::new(), &patch));
    }

    #[test]
    fn test_toggle_list_style() {
        let mut store = ElementStore::new();
        let text = store.add(ElementKind::Text);
        let shape = store.add(ElementKind::Circle);

        assert_eq!(
            store.toggle_list_style(&text, ListStyle::Disc).expect("text"),
            ListStyle::Disc
        );
        assert_eq!(
            store.toggle_list_style(&text, ListStyle::Decimal).expect("text"),
            ListStyle::Decimal
        );
        assert_eq!(
            store.toggle_list_style(&text, ListStyle::Decimal).expect("text"),
            ListStyle::None
        );
        assert!(matches!(
            store.toggle_list_style(&shape, ListStyle::Disc),
            Err(CanvasError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_snapshot_is_isolated_from_mutation() {
        let mut store = ElementStore::new();
        let id = store.add(ElementKind::Rectangle);
        let before = store.snapshot();

        store.update(&id, &ElementPatch::position(300.0, 300.0));
        store.add(ElementKind::Circle);

        assert_eq!(before.len(), 1);
        assert_eq!(before[0].transform.x, 50.0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_from_elements_orders_by_z_with_fallback() {
        let mut back = Element::new(ElementKind::Rectangle);
        back.transform.z_index = 1;
        let mut front = Element::new(ElementKind::Circle);
        front.transform.z_index = 9;
        let unnumbered = Element::new(ElementKind::Star);

        let store = ElementStore::from_elements(vec![front.clone(), unnumbered.clone(), back.clone()]);
        let order: Vec<_> = store.elements().iter().map(|e| e.id.clone()).collect();

        assert_eq!(order, vec![back.id, unnumbered.id, front.id]);
        assert_eq!(z_indices(&store), vec![1, 2, 3]);
        assert!(store.selected().is_none());
    }

    #[test]
    fn test_element_at_prefers_topmost_visible() {
        let mut store = ElementStore::new();
        let below = store.add(ElementKind::Rectangle);
        let above = store.add(ElementKind::Rectangle);

        assert_eq!(store.element_at(60.0, 60.0), Some(&above));
        store.toggle_visible(&above);
        assert_eq!(store.element_at(60.0, 60.0), Some(&below));
        assert_eq!(store.element_at(5.0, 5.0), None);
    }

    // -----------------------------------------------------------------------
    // Ordering properties
    // -----------------------------------------------------------------------

    fn kind_strategy() -> impl Strategy<Value = ElementKind> {
        prop_oneof![
            Just(ElementKind::Text),
            Just(ElementKind::Rectangle),
            Just(ElementKind::Circle),
            Just(ElementKind::Triangle),
            Just(ElementKind::Hexagon),
            Just(ElementKind::Star),
            Just(ElementKind::Image),
        ]
    }

    proptest! {
        #[test]
        fn prop_add_sequence_is_strictly_increasing(kinds in prop::collection::vec(kind_strategy(), 1..40)) {
            let mut store = ElementStore::new();
            let mut last = None;
            for kind in kinds {
                last = Some(store.add(kind));
            }
            let z = z_indices(&store);
            prop_assert!(z.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(store.selected(), last.as_ref());
        }

        #[test]
        fn prop_operations_keep_dense_order(
            ops in prop::collection::vec((0u8..4, 0usize..16), 1..60)
        ) {
            let mut store = ElementStore::new();
            for (op, pick) in ops {
                let target = store
                    .elements()
                    .get(pick % store.len().max(1))
                    .map(|e| e.id.clone());
                match (op, target) {
                    (0, _) | (_, None) => {
                        store.add(ElementKind::Rectangle);
                    }
                    (1, Some(id)) => {
                        store.remove(&id);
                    }
                    (2, Some(id)) => {
                        store.duplicate(&id);
                    }
                    (_, Some(id)) => {
                        store.reorder(&id, if pick % 2 == 0 { Direction::Up } else { Direction::Down });
                    }
                }
                let expected: Vec<i32> = (1..).take(store.len()).collect();
                prop_assert_eq!(z_indices(&store), expected);
                if let Some(selected) = store.selected() {
                    prop_assert!(store.get(selected).is_some());
                }
            }
        }
    }
}
