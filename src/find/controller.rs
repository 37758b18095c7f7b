use std::time::Instant;

use super::config::FindConfig;
use super::decorations::FindDecorations;
use super::state::{FindReplaceState, FindStateUpdate};
use crate::models::document::{ContentChange, ContentChangeKind, CursorChangeReason, Document};
use crate::models::edit_history::EditSource;
use crate::models::range::CharRange;
use crate::models::selection::Selection;
use crate::search::query::SearchQuery;
use crate::search::replace_pattern::ReplacePattern;
use crate::search::searcher::SearchMatch;

pub type Result<T> = crate::models::document::Result<T>;

enum ScopeUpdate {
    Keep,
    Set(Option<CharRange>),
}

/// Binds find/replace state to one live document.
///
/// The host owns the `Document` and forwards its events here; the controller
/// owns the state, the match decorations and the research schedule. Created
/// when a document becomes the find target, disposed when the binding ends.
pub struct FindController {
    state: FindReplaceState,
    decorations: FindDecorations,
    config: FindConfig,
    ignore_content_changes: bool,
    research_deadline: Option<Instant>,
    disposed: bool,
}

impl FindController {
    pub fn new(config: FindConfig) -> Self {
        Self {
            state: FindReplaceState::new(),
            decorations: FindDecorations::new(),
            config,
            ignore_content_changes: false,
            research_deadline: None,
            disposed: false,
        }
    }

    pub fn state(&self) -> &FindReplaceState {
        &self.state
    }

    pub fn decorations(&self) -> &FindDecorations {
        &self.decorations
    }

    pub fn has_pending_research(&self) -> bool {
        self.research_deadline.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Cancels any pending research and drops the decorations. Every call
    /// after this is a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.research_deadline = None;
        self.decorations.reset();
    }

    // ==================== event sources ====================

    /// Apply a state transition. Search-affecting fields trigger an
    /// immediate research, superseding any pending debounced one.
    pub fn change_state(&mut self, doc: &mut Document, update: FindStateUpdate, move_cursor: bool) {
        if self.disposed {
            return;
        }
        let changed = self.state.change(update, move_cursor);
        if !changed.triggers_research() {
            return;
        }
        let scope_update = if changed.search_scope {
            ScopeUpdate::Set(self.state.search_scope())
        } else {
            ScopeUpdate::Keep
        };
        self.research(doc, changed.move_cursor, scope_update);
    }

    /// Only user- or history-driven moves update the navigation anchor;
    /// selection changes from our own replace must not, or navigation would
    /// keep resuming from the replaced spot.
    pub fn on_cursor_moved(&mut self, doc: &Document, reason: CursorChangeReason) {
        if self.disposed {
            return;
        }
        if matches!(
            reason,
            CursorChangeReason::Explicit | CursorChangeReason::Undo | CursorChangeReason::Redo
        ) {
            self.decorations.set_start_position(doc.cursor_offset());
        }
    }

    pub fn on_content_changed(&mut self, doc: &Document, change: &ContentChange, now: Instant) {
        if self.disposed {
            return;
        }
        // marker rebasing happens for every edit, including our own
        self.decorations.apply_content_change(change);
        if self.ignore_content_changes {
            return;
        }
        if change.kind == ContentChangeKind::Flush {
            self.decorations.reset();
        }
        self.decorations.set_start_position(doc.cursor_offset());
        self.research_deadline = Some(now + self.config.research_delay());
    }

    /// Fires the debounced research once the quiet period has passed.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> bool {
        if self.disposed {
            return false;
        }
        let Some(deadline) = self.research_deadline else {
            return false;
        };
        if now < deadline {
            return false;
        }
        let overshoot = now.duration_since(deadline);
        if overshoot.as_millis() > 5 {
            tracing::debug!(
                overshoot_ms = overshoot.as_millis() as u64,
                "research debounce overshoot"
            );
        }
        self.research_deadline = None;
        self.research(doc, false, ScopeUpdate::Keep);
        true
    }

    // ==================== research ====================

    fn build_query(&mut self) -> Option<SearchQuery> {
        if self.state.search_string().is_empty() {
            return None;
        }
        match SearchQuery::new(self.state.search_string(), &self.state.search_options()) {
            Ok(query) => {
                self.state.set_last_error(None);
                Some(query)
            }
            Err(e) => {
                tracing::debug!(error = %e, "search pattern rejected");
                self.state.set_last_error(Some(e.to_string()));
                None
            }
        }
    }

    fn effective_range(&self, doc: &Document, scope: Option<CharRange>) -> CharRange {
        let base = if self.state.is_replace_revealed() {
            doc.editable_range()
        } else {
            doc.full_range()
        };
        match scope {
            Some(scope) => base
                .intersect(scope)
                .unwrap_or_else(|| CharRange::collapsed(base.start)),
            None => base,
        }
    }

    fn research(&mut self, doc: &mut Document, move_cursor: bool, scope_update: ScopeUpdate) {
        self.research_deadline = None;
        let scope = match scope_update {
            ScopeUpdate::Keep => self.decorations.find_scope(),
            ScopeUpdate::Set(scope) => scope,
        };
        let range = self.effective_range(doc, scope);
        let matches: Vec<CharRange> = match self.build_query() {
            Some(query) => doc
                .find_matches(&query, range, false, self.config.max_highlight_matches)
                .into_iter()
                .map(|m| m.range)
                .collect(),
            None => Vec::new(),
        };
        tracing::debug!(count = matches.len(), "research");
        self.decorations.set(&matches, scope);

        let selection = doc.primary_selection().range();
        let position = self.decorations.current_position(selection);
        let current = (position > 0).then_some(selection);
        self.state
            .change_match_info(position, self.decorations.count(), current);

        if move_cursor {
            self.next_match_from(doc, self.decorations.start_position(), false);
        }
    }

    // ==================== navigation ====================

    pub fn move_to_next_match(&mut self, doc: &mut Document) {
        if self.disposed {
            return;
        }
        self.next_match_from(doc, doc.primary_selection().max(), false);
    }

    pub fn move_to_prev_match(&mut self, doc: &mut Document) {
        if self.disposed {
            return;
        }
        self.prev_match_from(doc, doc.primary_selection().min(), false);
    }

    /// Zero matches is a result, not an error; with a scope active we still
    /// bring its boundary into view so scoped search is visible.
    fn reveal_scope_if_empty(&self, doc: &mut Document) -> bool {
        if self.decorations.count() > 0 {
            return false;
        }
        if let Some(scope) = self.decorations.find_scope() {
            doc.reveal_range_in_center_if_outside_viewport(scope);
        }
        true
    }

    fn next_match_from(&mut self, doc: &mut Document, after: usize, is_recursed: bool) {
        if self.reveal_scope_if_empty(doc) {
            return;
        }
        let range = self.effective_range(doc, self.decorations.find_scope());
        let mut after = after;
        if after > range.end || after < range.start {
            after = range.start;
        }
        let Some(query) = self.build_query() else {
            return;
        };
        let Some(mut found) = doc.find_next_match(&query, after) else {
            return;
        };

        if found.is_empty() && found.start == after {
            // the primitive would hand back this zero-width match forever
            let escaped = if query.is_line_anchored() {
                doc.next_line_start(after)
            } else {
                doc.next_char(after)
            }
            .unwrap_or(range.start);
            match doc.find_next_match(&query, escaped) {
                Some(retry) => found = retry,
                None => return,
            }
        }

        if !range.contains_range(found) {
            // wraparound crossed the scope boundary; retry once from there
            if !is_recursed {
                self.next_match_from(doc, found.end, true);
            }
            return;
        }

        self.commit_match(doc, found);
    }

    fn prev_match_from(&mut self, doc: &mut Document, before: usize, is_recursed: bool) {
        if self.reveal_scope_if_empty(doc) {
            return;
        }
        let range = self.effective_range(doc, self.decorations.find_scope());
        let mut before = before;
        if before < range.start || before > range.end {
            before = range.end;
        }
        let Some(query) = self.build_query() else {
            return;
        };
        let Some(mut found) = doc.find_prev_match(&query, before) else {
            return;
        };

        if found.is_empty() && found.start == before {
            let escaped = if query.is_line_anchored() {
                doc.prev_line_end(before)
            } else {
                doc.prev_char(before)
            }
            .unwrap_or(range.end);
            match doc.find_prev_match(&query, escaped) {
                Some(retry) => found = retry,
                None => return,
            }
        }

        if !range.contains_range(found) {
            if !is_recursed {
                self.prev_match_from(doc, found.start, true);
            }
            return;
        }

        self.commit_match(doc, found);
    }

    fn commit_match(&mut self, doc: &mut Document, found: CharRange) {
        let position = self.decorations.set_current_find_match(found);
        self.state
            .change_match_info(position, self.decorations.count(), Some(found));
        doc.set_selection(Selection::from_range(found));
        doc.reveal_range_in_center_if_outside_viewport(found);
    }

    // ==================== replace ====================

    fn build_replacement(&self, doc: &Document, m: &SearchMatch) -> String {
        if self.state.is_regex() {
            let matched = doc.value_in_range(m.range);
            ReplacePattern::parse(self.state.replace_string()).expand(&matched, m.captures.as_deref())
        } else {
            self.state.replace_string().to_string()
        }
    }

    /// Guard window around our own edit so its change notification cannot
    /// re-enter research; released on success and error alike, the error
    /// propagates untouched.
    fn execute_guarded(
        &mut self,
        doc: &mut Document,
        edits: &[(CharRange, String)],
    ) -> Result<ContentChange> {
        self.ignore_content_changes = true;
        let result = doc.execute_edits(EditSource::FindReplace, edits);
        if let Ok(change) = &result {
            self.on_content_changed(doc, change, Instant::now());
        }
        self.ignore_content_changes = false;
        result
    }

    /// Replace the selected match. A selection that is not exactly a match
    /// (re-checked against the primitive, not decoration identity) only
    /// navigates, so repeated invocations alternate find and replace.
    pub fn replace(&mut self, doc: &mut Document) -> Result<()> {
        if self.disposed || self.decorations.count() == 0 {
            return Ok(());
        }
        let Some(query) = self.build_query() else {
            return Ok(());
        };
        let range = self.effective_range(doc, self.decorations.find_scope());
        let selection = doc.primary_selection().range();
        let Some(next) = doc.find_next_match_captures(&query, selection.start) else {
            return Ok(());
        };
        if next.range != selection || !range.contains_range(next.range) {
            self.next_match_from(doc, selection.start, false);
            return Ok(());
        }

        let replacement = self.build_replacement(doc, &next);
        let start = next.range.start;
        self.execute_guarded(doc, &[(next.range, replacement.clone())])?;

        let caret = start + replacement.chars().count();
        doc.set_selection(Selection::collapsed(caret));
        self.decorations.set_start_position(caret);
        self.research(doc, false, ScopeUpdate::Keep);
        Ok(())
    }

    /// Replace every match in the effective range as ONE atomic multi-edit:
    /// one undo step, one content change. Uses the uncapped match set, not
    /// the display-capped decorations.
    pub fn replace_all(&mut self, doc: &mut Document) -> Result<()> {
        if self.disposed || self.state.search_string().is_empty() {
            return Ok(());
        }
        let Some(query) = self.build_query() else {
            return Ok(());
        };
        let range = self.effective_range(doc, self.decorations.find_scope());
        let matches = doc.find_matches(
            &query,
            range,
            self.state.is_regex(),
            self.config.max_operation_matches,
        );
        if matches.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = matches.len(), "replace all");

        let pattern = self
            .state
            .is_regex()
            .then(|| ReplacePattern::parse(self.state.replace_string()));
        let edits: Vec<(CharRange, String)> = matches
            .iter()
            .map(|m| {
                let replacement = match &pattern {
                    Some(pattern) => {
                        pattern.expand(&doc.value_in_range(m.range), m.captures.as_deref())
                    }
                    None => self.state.replace_string().to_string(),
                };
                (m.range, replacement)
            })
            .collect();

        self.execute_guarded(doc, &edits)?;
        self.research(doc, false, ScopeUpdate::Keep);
        Ok(())
    }

    /// Turn every match into a cursor. No text mutation.
    pub fn select_all_matches(&mut self, doc: &mut Document) {
        if self.disposed || self.state.search_string().is_empty() {
            return;
        }
        let Some(query) = self.build_query() else {
            return;
        };
        let range = self.effective_range(doc, self.decorations.find_scope());
        let matches = doc.find_matches(&query, range, false, self.config.max_operation_matches);
        if matches.is_empty() {
            return;
        }
        let selections = matches
            .iter()
            .map(|m| Selection::from_range(m.range))
            .collect();
        doc.set_selections(selections);
    }

    // ==================== seeding ====================

    /// A non-empty single-line selection seeds the search string; an empty
    /// one seeds from the word under the cursor. Multi-line selections never
    /// seed.
    pub fn seed_search_string_from_selection(&mut self, doc: &mut Document) {
        if self.disposed {
            return;
        }
        let selection = doc.primary_selection();
        let range = selection.range();
        let seed = if range.is_empty() {
            match doc.word_range_at(selection.head()) {
                Some(word) => doc.value_in_range(word),
                None => return,
            }
        } else if doc.char_to_line(range.start) == doc.char_to_line(range.end) {
            doc.value_in_range(range)
        } else {
            return;
        };
        if seed.is_empty() {
            return;
        }
        self.change_state(
            doc,
            FindStateUpdate {
                search_string: Some(seed),
                ..Default::default()
            },
            false,
        );
    }
}

impl Default for FindController {
    fn default() -> Self {
        Self::new(FindConfig::default())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/find/controller.rs"]
mod tests;
