use crate::models::document::ContentChange;
use crate::models::range::{transform_offset, transform_range, CharRange};
use slotmap::SlotMap;

slotmap::new_key_type! {
    pub struct DecorationId;
}

/// Live match decorations plus the navigation anchor.
///
/// Ranges are rebased across every content change, no matter who edited;
/// recomputing the set is research's job, keeping it anchored is ours.
#[derive(Debug, Default)]
pub struct FindDecorations {
    decorations: SlotMap<DecorationId, CharRange>,
    order: Vec<DecorationId>,
    current: Option<DecorationId>,
    scope: Option<CharRange>,
    start_position: usize,
}

impl FindDecorations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked set; `matches` must be in document order.
    pub fn set(&mut self, matches: &[CharRange], scope: Option<CharRange>) {
        self.decorations.clear();
        self.order.clear();
        self.current = None;
        self.order.reserve(matches.len());
        for range in matches {
            self.order.push(self.decorations.insert(*range));
        }
        self.scope = scope;
    }

    /// Drop all match decorations; scope and anchor survive a reset.
    pub fn reset(&mut self) {
        self.decorations.clear();
        self.order.clear();
        self.current = None;
    }

    pub fn count(&self) -> usize {
        self.order.len()
    }

    pub fn matches(&self) -> Vec<CharRange> {
        self.order
            .iter()
            .filter_map(|id| self.decorations.get(*id).copied())
            .collect()
    }

    /// 1-based index of the decoration equal to `selection`, 0 when the
    /// selection does not sit exactly on a tracked match.
    pub fn current_position(&self, selection: CharRange) -> usize {
        self.order
            .iter()
            .position(|id| self.decorations.get(*id) == Some(&selection))
            .map(|index| index + 1)
            .unwrap_or(0)
    }

    /// Highlight `range` as the current match and return its 1-based index
    /// (0 when the range is not tracked, e.g. past the display cap).
    pub fn set_current_find_match(&mut self, range: CharRange) -> usize {
        match self
            .order
            .iter()
            .position(|id| self.decorations.get(*id) == Some(&range))
        {
            Some(index) => {
                self.current = Some(self.order[index]);
                index + 1
            }
            None => {
                self.current = None;
                0
            }
        }
    }

    pub fn current_find_match(&self) -> Option<CharRange> {
        self.current
            .and_then(|id| self.decorations.get(id))
            .copied()
    }

    pub fn set_start_position(&mut self, offset: usize) {
        self.start_position = offset;
    }

    pub fn start_position(&self) -> usize {
        self.start_position
    }

    pub fn set_find_scope(&mut self, scope: Option<CharRange>) {
        self.scope = scope;
    }

    pub fn find_scope(&self) -> Option<CharRange> {
        self.scope
    }

    /// Rebase every tracked range, the scope and the anchor across a batch
    /// of edits.
    pub fn apply_content_change(&mut self, change: &ContentChange) {
        if change.deltas.is_empty() {
            return;
        }
        for range in self.decorations.values_mut() {
            *range = transform_range(*range, &change.deltas);
        }
        if let Some(scope) = self.scope.as_mut() {
            *scope = transform_range(*scope, &change.deltas);
        }
        self.start_position = transform_offset(self.start_position, &change.deltas, true);
    }
}
