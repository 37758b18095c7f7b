use crate::models::range::CharRange;
use crate::search::query::SearchOptions;

/// Fields to apply in one state transition. `None` leaves a field untouched;
/// `search_scope` carries its own `Option` so a transition can also clear it.
#[derive(Debug, Clone, Default)]
pub struct FindStateUpdate {
    pub search_string: Option<String>,
    pub replace_string: Option<String>,
    pub is_regex: Option<bool>,
    pub match_case: Option<bool>,
    pub whole_word: Option<bool>,
    pub is_replace_revealed: Option<bool>,
    pub search_scope: Option<Option<CharRange>>,
}

/// Which fields a transition actually changed, plus the cursor request.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindStateChange {
    pub search_string: bool,
    pub replace_string: bool,
    pub is_regex: bool,
    pub match_case: bool,
    pub whole_word: bool,
    pub is_replace_revealed: bool,
    pub search_scope: bool,
    pub move_cursor: bool,
}

impl FindStateChange {
    pub fn triggers_research(&self) -> bool {
        self.search_string
            || self.is_replace_revealed
            || self.is_regex
            || self.whole_word
            || self.match_case
            || self.search_scope
    }
}

#[derive(Debug, Default)]
pub struct FindReplaceState {
    search_string: String,
    replace_string: String,
    is_regex: bool,
    match_case: bool,
    whole_word: bool,
    is_replace_revealed: bool,
    search_scope: Option<CharRange>,
    matches_count: usize,
    matches_position: usize,
    current_match: Option<CharRange>,
    last_error: Option<String>,
}

impl FindReplaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_string(&self) -> &str {
        &self.search_string
    }

    pub fn replace_string(&self) -> &str {
        &self.replace_string
    }

    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    pub fn match_case(&self) -> bool {
        self.match_case
    }

    pub fn whole_word(&self) -> bool {
        self.whole_word
    }

    pub fn is_replace_revealed(&self) -> bool {
        self.is_replace_revealed
    }

    pub fn search_scope(&self) -> Option<CharRange> {
        self.search_scope
    }

    pub fn matches_count(&self) -> usize {
        self.matches_count
    }

    /// 1-based; 0 means no determinable current match.
    pub fn matches_position(&self) -> usize {
        self.matches_position
    }

    pub fn current_match(&self) -> Option<CharRange> {
        self.current_match
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            is_regex: self.is_regex,
            match_case: self.match_case,
            whole_word: self.whole_word,
        }
    }

    /// Apply a transition and report exactly which fields changed.
    pub fn change(&mut self, update: FindStateUpdate, move_cursor: bool) -> FindStateChange {
        let mut changed = FindStateChange {
            move_cursor,
            ..FindStateChange::default()
        };

        if let Some(search_string) = update.search_string {
            if self.search_string != search_string {
                self.search_string = search_string;
                self.last_error = None;
                changed.search_string = true;
            }
        }
        if let Some(replace_string) = update.replace_string {
            if self.replace_string != replace_string {
                self.replace_string = replace_string;
                changed.replace_string = true;
            }
        }
        if let Some(is_regex) = update.is_regex {
            if self.is_regex != is_regex {
                self.is_regex = is_regex;
                self.last_error = None;
                changed.is_regex = true;
            }
        }
        if let Some(match_case) = update.match_case {
            if self.match_case != match_case {
                self.match_case = match_case;
                changed.match_case = true;
            }
        }
        if let Some(whole_word) = update.whole_word {
            if self.whole_word != whole_word {
                self.whole_word = whole_word;
                changed.whole_word = true;
            }
        }
        if let Some(is_replace_revealed) = update.is_replace_revealed {
            if self.is_replace_revealed != is_replace_revealed {
                self.is_replace_revealed = is_replace_revealed;
                changed.is_replace_revealed = true;
            }
        }
        if let Some(search_scope) = update.search_scope {
            if self.search_scope != search_scope {
                self.search_scope = search_scope;
                changed.search_scope = true;
            }
        }
        changed
    }

    /// Publish path for the controller. Deliberately does NOT produce a
    /// `FindStateChange`: counter updates must never feed back into research.
    pub fn change_match_info(
        &mut self,
        position: usize,
        count: usize,
        current_match: Option<CharRange>,
    ) {
        self.matches_count = count;
        self.matches_position = if position <= count { position } else { 0 };
        self.current_match = current_match;
    }

    pub fn set_last_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }
}
