//! 原子编辑操作
//!
//! 每个操作记录编辑前坐标与被替换文本，可求逆、可序列化为 JSON 行
//! （用于崩溃恢复日志）。

use super::range::CharRange;
use ropey::Rope;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditOp {
    Insert {
        at: usize,
        text: String,
    },
    Delete {
        start: usize,
        end: usize,
        deleted: String,
    },
    Replace {
        start: usize,
        end: usize,
        deleted: String,
        inserted: String,
    },
}

impl EditOp {
    /// 按删除/插入文本的形态选择变体
    pub fn new(range: CharRange, deleted: String, inserted: String) -> Self {
        if deleted.is_empty() {
            EditOp::Insert {
                at: range.start,
                text: inserted,
            }
        } else if inserted.is_empty() {
            EditOp::Delete {
                start: range.start,
                end: range.end,
                deleted,
            }
        } else {
            EditOp::Replace {
                start: range.start,
                end: range.end,
                deleted,
                inserted,
            }
        }
    }

    /// 编辑前被替换的区间与替换文本的 char 数
    pub fn effect(&self) -> (CharRange, usize) {
        match self {
            EditOp::Insert { at, text } => (CharRange::collapsed(*at), text.chars().count()),
            EditOp::Delete { start, end, .. } => (CharRange::new(*start, *end), 0),
            EditOp::Replace {
                start,
                end,
                inserted,
                ..
            } => (CharRange::new(*start, *end), inserted.chars().count()),
        }
    }

    pub fn apply(&self, rope: &mut Rope) {
        match self {
            EditOp::Insert { at, text } => {
                rope.insert(*at, text);
            }
            EditOp::Delete { start, end, .. } => {
                rope.remove(*start..*end);
            }
            EditOp::Replace {
                start,
                end,
                inserted,
                ..
            } => {
                rope.remove(*start..*end);
                rope.insert(*start, inserted);
            }
        }
    }

    pub fn inverse(&self) -> EditOp {
        match self {
            EditOp::Insert { at, text } => EditOp::Delete {
                start: *at,
                end: at + text.chars().count(),
                deleted: text.clone(),
            },
            EditOp::Delete { start, deleted, .. } => EditOp::Insert {
                at: *start,
                text: deleted.clone(),
            },
            EditOp::Replace {
                start,
                deleted,
                inserted,
                ..
            } => EditOp::Replace {
                start: *start,
                end: start + inserted.chars().count(),
                deleted: inserted.clone(),
                inserted: deleted.clone(),
            },
        }
    }

    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json_line(line: &str) -> Option<Self> {
        serde_json::from_str(line).ok()
    }
}
