//! Paired emphasis across the tree view and the flat-array view.
//!
//! Marks are keyed by flat heap index. The rendering surface hands over an
//! explicit index → handle map for each view when it realizes a frame, so a
//! marked index always resolves to its node in *both* views.

use std::collections::{BTreeSet, HashMap};

use heap_replay_protocol::ThemeToken;
use serde::{Deserialize, Serialize};

use crate::model::HighlightKind;

/// Which of the two synchronized views a handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum View {
    Tree,
    Array,
}

/// Why an index is emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emphasis {
    /// Driven by the current frame's highlight.
    Step(HighlightKind),
    /// Pointer is over the node; cleared on pointer-leave.
    Hover,
    /// Node was clicked; persists until superseded.
    Click,
}

impl Emphasis {
    pub fn theme_token(self) -> ThemeToken {
        match self {
            Self::Step(HighlightKind::Compare) => ThemeToken::CompareHighlight,
            Self::Step(HighlightKind::Swap) => ThemeToken::SwapHighlight,
            Self::Step(HighlightKind::Focus) => ThemeToken::FocusHighlight,
            Self::Step(HighlightKind::Insert) => ThemeToken::InsertHighlight,
            Self::Step(HighlightKind::Remove) => ThemeToken::RemoveHighlight,
            Self::Hover => ThemeToken::HoverHighlight,
            Self::Click => ThemeToken::SelectionHighlight,
        }
    }
}

/// Index → handle, one map per view. Maintained by the rendering surface.
#[derive(Debug, Clone)]
pub struct HandleMap<H> {
    tree: HashMap<usize, H>,
    array: HashMap<usize, H>,
}

impl<H> Default for HandleMap<H> {
    fn default() -> Self {
        Self {
            tree: HashMap::new(),
            array: HashMap::new(),
        }
    }
}

impl<H> HandleMap<H> {
    pub fn insert(&mut self, view: View, index: usize, handle: H) {
        self.view_mut(view).insert(index, handle);
    }

    pub fn get(&self, view: View, index: usize) -> Option<&H> {
        match view {
            View::Tree => self.tree.get(&index),
            View::Array => self.array.get(&index),
        }
    }

    /// Iterate one view's handles.
    pub fn iter(&self, view: View) -> impl Iterator<Item = (usize, &H)> {
        let map = match view {
            View::Tree => &self.tree,
            View::Array => &self.array,
        };
        map.iter().map(|(&i, h)| (i, h))
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.array.is_empty()
    }

    fn view_mut(&mut self, view: View) -> &mut HashMap<usize, H> {
        match view {
            View::Tree => &mut self.tree,
            View::Array => &mut self.array,
        }
    }
}

/// A marked index resolved against both views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mark<'a, H> {
    pub index: usize,
    pub emphasis: Emphasis,
    pub tree: Option<&'a H>,
    pub array: Option<&'a H>,
}

#[derive(Debug, Clone)]
pub struct HighlightSync<H> {
    handles: HandleMap<H>,
    marked: BTreeSet<usize>,
    emphasis: Option<Emphasis>,
}

impl<H> Default for HighlightSync<H> {
    fn default() -> Self {
        Self {
            handles: HandleMap::default(),
            marked: BTreeSet::new(),
            emphasis: None,
        }
    }
}

impl<H> HighlightSync<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the handle map after the surface re-rendered. Marks survive;
    /// they are resolved against the new handles.
    pub fn bind(&mut self, handles: HandleMap<H>) {
        self.handles = handles;
    }

    pub fn handles(&self) -> &HandleMap<H> {
        &self.handles
    }

    /// Mark `indices` in both views. Always clears first: highlights never
    /// stack across calls.
    pub fn apply(&mut self, indices: impl IntoIterator<Item = usize>, emphasis: Emphasis) {
        self.clear();
        self.marked.extend(indices);
        if !self.marked.is_empty() {
            self.emphasis = Some(emphasis);
        }
    }

    pub fn clear(&mut self) {
        self.marked.clear();
        self.emphasis = None;
    }

    pub fn hover(&mut self, index: usize) {
        self.apply([index], Emphasis::Hover);
    }

    pub fn click(&mut self, index: usize) {
        self.apply([index], Emphasis::Click);
    }

    /// Drop a hover mark. Any other emphasis is left alone.
    pub fn pointer_leave(&mut self) {
        if self.emphasis == Some(Emphasis::Hover) {
            self.clear();
        }
    }

    pub fn emphasis(&self) -> Option<Emphasis> {
        self.emphasis
    }

    /// Emphasis of `index`, identical for both views by construction.
    pub fn emphasis_of(&self, index: usize) -> Option<Emphasis> {
        if self.marked.contains(&index) {
            self.emphasis
        } else {
            None
        }
    }

    pub fn marked(&self) -> impl Iterator<Item = usize> + '_ {
        self.marked.iter().copied()
    }

    /// Every marked index with its handle in each view.
    pub fn marks(&self) -> impl Iterator<Item = Mark<'_, H>> {
        let emphasis = self.emphasis;
        self.marked.iter().filter_map(move |&index| {
            Some(Mark {
                index,
                emphasis: emphasis?,
                tree: self.handles.get(View::Tree, index),
                array: self.handles.get(View::Array, index),
            })
        })
    }

    /// Flat index whose handle in `view` satisfies `hit`, for pointer
    /// hit-testing on the surface.
    pub fn index_at(&self, view: View, mut hit: impl FnMut(&H) -> bool) -> Option<usize> {
        self.handles
            .iter(view)
            .find_map(|(i, h)| hit(h).then_some(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synced(n: usize) -> HighlightSync<String> {
        let mut handles = HandleMap::default();
        for i in 0..n {
            handles.insert(View::Tree, i, format!("tree-{i}"));
            handles.insert(View::Array, i, format!("chip-{i}"));
        }
        let mut sync = HighlightSync::new();
        sync.bind(handles);
        sync
    }

    #[test]
    fn second_apply_replaces_first() {
        let mut sync = synced(8);
        sync.apply([1, 2], Emphasis::Step(HighlightKind::Compare));
        sync.apply([5], Emphasis::Step(HighlightKind::Compare));
        assert_eq!(sync.marked().collect::<Vec<_>>(), vec![5]);
        assert_eq!(sync.emphasis_of(1), None);
        assert_eq!(sync.emphasis_of(2), None);
    }

    #[test]
    fn marks_resolve_in_both_views() {
        let mut sync = synced(4);
        sync.apply([0, 3], Emphasis::Step(HighlightKind::Swap));
        let marks: Vec<_> = sync.marks().collect();
        assert_eq!(marks.len(), 2);
        for mark in marks {
            assert_eq!(mark.tree, Some(&format!("tree-{}", mark.index)));
            assert_eq!(mark.array, Some(&format!("chip-{}", mark.index)));
            assert_eq!(mark.emphasis, Emphasis::Step(HighlightKind::Swap));
        }
    }

    #[test]
    fn marks_survive_rebinding() {
        let mut sync = synced(2);
        sync.apply([1], Emphasis::Click);
        sync.bind(HandleMap::default());
        let mark = sync.marks().next().expect("still marked");
        assert_eq!(mark.tree, None);
        assert_eq!(sync.emphasis_of(1), Some(Emphasis::Click));
    }

    #[test]
    fn pointer_leave_only_clears_hover() {
        let mut sync = synced(3);
        sync.click(2);
        sync.pointer_leave();
        assert_eq!(sync.emphasis_of(2), Some(Emphasis::Click));

        sync.hover(1);
        assert_eq!(sync.emphasis_of(2), None);
        sync.pointer_leave();
        assert_eq!(sync.emphasis(), None);
    }

    #[test]
    fn empty_apply_leaves_nothing() {
        let mut sync = synced(3);
        sync.apply([0], Emphasis::Hover);
        sync.apply(std::iter::empty(), Emphasis::Click);
        assert_eq!(sync.emphasis(), None);
        assert_eq!(sync.marks().count(), 0);
    }

    #[test]
    fn hit_testing_by_view() {
        let sync = synced(3);
        assert_eq!(sync.index_at(View::Array, |h| h == "chip-2"), Some(2));
        assert_eq!(sync.index_at(View::Tree, |h| h == "chip-2"), None);
    }
}
