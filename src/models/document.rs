//! 文本缓冲区模型
//!
//! 职责：
//! - 文本存储（Rope）与选区集合（主选区在前）
//! - 原子批量编辑（一批 = 一个撤销组 = 一次变更通知）
//! - 行列 ↔ 字符偏移映射、视口跟随
//! - 搜索原语入口（find_next / find_prev / find_matches）

use super::edit_history::{EditGroup, EditHistory, EditSource};
use super::edit_op::EditOp;
use super::range::{transform_offset, CharRange, EditDelta};
use super::selection::Selection;
use crate::search::query::SearchQuery;
use crate::search::searcher::{self, SearchMatch};
use ropey::{Rope, RopeSlice};
use std::borrow::Cow;
use std::path::PathBuf;
use unicode_xid::UnicodeXID;

/// 从 RopeSlice 获取字符串，优先零拷贝
pub fn slice_to_cow(slice: RopeSlice<'_>) -> Cow<'_, str> {
    match slice.as_str() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(slice.to_string()),
    }
}

pub fn is_word_char(c: char) -> bool {
    c == '_' || UnicodeXID::is_xid_continue(c)
}

pub type Result<T> = std::result::Result<T, CommandError>;

#[derive(Debug)]
pub enum CommandError {
    ReadOnly,
    OutOfBounds { end: usize, len: usize },
    OverlappingEdits,
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::ReadOnly => write!(f, "document is read-only"),
            CommandError::OutOfBounds { end, len } => {
                write!(f, "edit range ends at {} but document length is {}", end, len)
            }
            CommandError::OverlappingEdits => write!(f, "edit ranges overlap"),
        }
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentChangeKind {
    Edit,
    Undo,
    Redo,
    Flush,
}

/// 一次文档变更通知；`deltas` 以变更前坐标升序描述整批编辑
#[derive(Debug, Clone)]
pub struct ContentChange {
    pub kind: ContentChangeKind,
    pub version: u64,
    pub deltas: Vec<EditDelta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorChangeReason {
    NotSet,
    ContentFlush,
    Explicit,
    Paste,
    Undo,
    Redo,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewportState {
    pub line_offset: usize,
    pub height: usize,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            line_offset: 0,
            height: 20,
        }
    }
}

pub struct Document {
    rope: Rope,
    selections: Vec<Selection>,
    history: EditHistory,
    viewport: ViewportState,
    version: u64,
    read_only: bool,
    editable_range: Option<CharRange>,
}

impl Document {
    pub fn new() -> Self {
        Self::from_text("")
    }

    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            selections: vec![Selection::collapsed(0)],
            history: EditHistory::new(),
            viewport: ViewportState::default(),
            version: 0,
            read_only: false,
            editable_range: None,
        }
    }

    /// 创建带编辑日志的文档
    pub fn with_journal(text: &str, journal_path: PathBuf) -> std::io::Result<Self> {
        let mut doc = Self::from_text(text);
        doc.history = EditHistory::with_journal(journal_path)?;
        Ok(doc)
    }

    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn full_range(&self) -> CharRange {
        CharRange::new(0, self.rope.len_chars())
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// 只读区域之外的可编辑子区间；未设置时为整个文档
    pub fn editable_range(&self) -> CharRange {
        match self.editable_range {
            Some(range) => range
                .intersect(self.full_range())
                .unwrap_or_else(|| self.full_range()),
            None => self.full_range(),
        }
    }

    pub fn set_editable_range(&mut self, range: Option<CharRange>) {
        self.editable_range = range;
    }

    pub fn value_in_range(&self, range: CharRange) -> String {
        let len = self.rope.len_chars();
        let start = range.start.min(len);
        let end = range.end.min(len);
        self.rope.slice(start..end).to_string()
    }

    // ==================== 行列映射 ====================

    pub fn char_to_line(&self, offset: usize) -> usize {
        self.rope.char_to_line(offset.min(self.rope.len_chars()))
    }

    pub fn line_to_char(&self, line: usize) -> usize {
        self.rope.line_to_char(line.min(self.rope.len_lines()))
    }

    /// 下一行行首的偏移；已在末行时返回 None
    pub fn next_line_start(&self, offset: usize) -> Option<usize> {
        let line = self.char_to_line(offset);
        if line + 1 < self.rope.len_lines() {
            Some(self.rope.line_to_char(line + 1))
        } else {
            None
        }
    }

    /// 上一行行尾（换行符所在偏移）；已在首行时返回 None
    pub fn prev_line_end(&self, offset: usize) -> Option<usize> {
        let line = self.char_to_line(offset);
        if line == 0 {
            None
        } else {
            Some(self.rope.line_to_char(line).saturating_sub(1))
        }
    }

    pub fn next_char(&self, offset: usize) -> Option<usize> {
        if offset < self.rope.len_chars() {
            Some(offset + 1)
        } else {
            None
        }
    }

    pub fn prev_char(&self, offset: usize) -> Option<usize> {
        offset.checked_sub(1)
    }

    // ==================== 选区 ====================

    pub fn primary_selection(&self) -> Selection {
        self.selections[0]
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn cursor_offset(&self) -> usize {
        self.selections[0].head()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selections = vec![self.clamp_selection(selection)];
    }

    /// 多光标选区集合，主选区在前；空集合被忽略
    pub fn set_selections(&mut self, selections: Vec<Selection>) -> bool {
        if selections.is_empty() {
            return false;
        }
        let clamped: Vec<Selection> = selections
            .into_iter()
            .map(|s| self.clamp_selection(s))
            .collect();
        self.selections = clamped;
        true
    }

    fn clamp_selection(&self, selection: Selection) -> Selection {
        let len = self.rope.len_chars();
        selection.map(|offset| offset.min(len))
    }

    /// 光标处的单词区间，用于搜索串种子
    pub fn word_range_at(&self, offset: usize) -> Option<CharRange> {
        let len = self.rope.len_chars();
        let probe = if offset < len && is_word_char(self.rope.char(offset)) {
            offset
        } else if offset > 0 && is_word_char(self.rope.char(offset - 1)) {
            offset - 1
        } else {
            return None;
        };

        let mut start = probe;
        while start > 0 && is_word_char(self.rope.char(start - 1)) {
            start -= 1;
        }
        let mut end = probe + 1;
        while end < len && is_word_char(self.rope.char(end)) {
            end += 1;
        }
        Some(CharRange::new(start, end))
    }

    // ==================== 视口 ====================

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn set_viewport(&mut self, line_offset: usize, height: usize) {
        self.viewport.line_offset = line_offset;
        self.viewport.height = height.max(1);
    }

    /// 区间所在行不可见时，滚动视口使其居中
    pub fn reveal_range_in_center_if_outside_viewport(&mut self, range: CharRange) {
        let line = self.char_to_line(range.start);
        let top = self.viewport.line_offset;
        let bottom = top + self.viewport.height;
        if line < top || line >= bottom {
            self.viewport.line_offset = line.saturating_sub(self.viewport.height / 2);
        }
    }

    // ==================== 搜索原语 ====================

    /// 从 `from` 向后查找下一个匹配，到文档尾后回绕到文档头
    pub fn find_next_match(&self, query: &SearchQuery, from: usize) -> Option<CharRange> {
        searcher::next_match(&self.rope, query, from, false).map(|m| m.range)
    }

    /// 同 `find_next_match`，同时带回捕获组
    pub fn find_next_match_captures(&self, query: &SearchQuery, from: usize) -> Option<SearchMatch> {
        searcher::next_match(&self.rope, query, from, true)
    }

    /// 查找起点严格小于 `before` 的最后一个匹配，无则回绕到最后一个
    pub fn find_prev_match(&self, query: &SearchQuery, before: usize) -> Option<CharRange> {
        searcher::prev_match(&self.rope, query, before)
    }

    pub fn find_matches(
        &self,
        query: &SearchQuery,
        within: CharRange,
        captures: bool,
        limit: usize,
    ) -> Vec<SearchMatch> {
        searcher::find_matches(&self.rope, query, within, captures, limit)
    }

    // ==================== 原子批量编辑 ====================

    /// 应用一批编辑：整批一个撤销组、一次变更通知。
    ///
    /// 区间按编辑前坐标给出，互不重叠；内部自底向上应用，使先记录的
    /// 偏移始终有效。
    pub fn execute_edits(
        &mut self,
        source: EditSource,
        edits: &[(CharRange, String)],
    ) -> Result<ContentChange> {
        if self.read_only {
            return Err(CommandError::ReadOnly);
        }
        if edits.is_empty() {
            return Ok(ContentChange {
                kind: ContentChangeKind::Edit,
                version: self.version,
                deltas: Vec::new(),
            });
        }

        let len = self.rope.len_chars();
        let mut ordered: Vec<&(CharRange, String)> = edits.iter().collect();
        ordered.sort_by_key(|(range, _)| (range.start, range.end));

        for pair in ordered.windows(2) {
            if pair[0].0.end > pair[1].0.start {
                return Err(CommandError::OverlappingEdits);
            }
        }
        if let Some((range, _)) = ordered.last() {
            if range.end > len {
                return Err(CommandError::OutOfBounds {
                    end: range.end,
                    len,
                });
            }
        }

        let mut ops = Vec::with_capacity(ordered.len());
        for (range, text) in &ordered {
            let deleted = self.rope.slice(range.start..range.end).to_string();
            ops.push(EditOp::new(*range, deleted, text.clone()));
        }

        // 自底向上应用，高偏移先编辑
        for op in ops.iter().rev() {
            op.apply(&mut self.rope);
        }

        let deltas: Vec<EditDelta> = ops
            .iter()
            .map(|op| {
                let (range, new_len) = op.effect();
                EditDelta { range, new_len }
            })
            .collect();

        let selections_before = self.selections.clone();
        let moved: Vec<Selection> = selections_before
            .iter()
            .map(|s| self.clamp_selection(s.map(|offset| transform_offset(offset, &deltas, true))))
            .collect();
        self.selections = moved;

        self.version = self.version.saturating_add(1);
        self.history.push(EditGroup {
            source,
            ops,
            selections_before,
            selections_after: Vec::new(),
        });

        Ok(ContentChange {
            kind: ContentChangeKind::Edit,
            version: self.version,
            deltas,
        })
    }

    // ==================== Undo / Redo ====================

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> Option<ContentChange> {
        let mut group = self.history.pop_undo()?;
        group.selections_after = self.selections.clone();

        // 自顶向下求逆：低偏移的组先还原，后续操作的原始偏移随之重新生效
        let mut deltas = Vec::with_capacity(group.ops.len());
        let mut shift = 0isize;
        for op in &group.ops {
            let (old, new_len) = op.effect();
            let start = if shift >= 0 {
                old.start + shift as usize
            } else {
                old.start - shift.unsigned_abs()
            };
            deltas.push(EditDelta {
                range: CharRange::new(start, start + new_len),
                new_len: old.len(),
            });
            shift += new_len as isize - old.len() as isize;
            op.inverse().apply(&mut self.rope);
        }

        self.selections = group.selections_before.clone();
        if self.selections.is_empty() {
            self.selections = vec![Selection::collapsed(0)];
        }
        self.version = self.version.saturating_add(1);
        let change = ContentChange {
            kind: ContentChangeKind::Undo,
            version: self.version,
            deltas,
        };
        self.history.push_redo(group);
        Some(change)
    }

    pub fn redo(&mut self) -> Option<ContentChange> {
        let group = self.history.pop_redo()?;

        for op in group.ops.iter().rev() {
            op.apply(&mut self.rope);
        }
        let deltas: Vec<EditDelta> = group
            .ops
            .iter()
            .map(|op| {
                let (range, new_len) = op.effect();
                EditDelta { range, new_len }
            })
            .collect();

        self.selections = group.selections_after.clone();
        if self.selections.is_empty() {
            self.selections = vec![Selection::collapsed(0)];
        }
        self.version = self.version.saturating_add(1);
        let change = ContentChange {
            kind: ContentChangeKind::Redo,
            version: self.version,
            deltas,
        };
        self.history.restore_undo(group);
        Some(change)
    }

    /// 整篇重载：清空历史，选区收起到文档头
    pub fn set_text(&mut self, text: &str) -> ContentChange {
        let old_len = self.rope.len_chars();
        self.rope = Rope::from_str(text);
        self.selections = vec![Selection::collapsed(0)];
        self.history.clear();
        self.version = self.version.saturating_add(1);
        ContentChange {
            kind: ContentChangeKind::Flush,
            version: self.version,
            deltas: vec![EditDelta {
                range: CharRange::new(0, old_len),
                new_len: self.rope.len_chars(),
            }],
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
