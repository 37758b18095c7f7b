//! 编辑历史管理
//!
//! 线性分组模型：
//! - 一次 `execute_edits` 批量 = 一个撤销组，整组一步撤销/重做
//! - 新编辑清空重做栈
//! - 可选 append-only 日志文件（JSON 行），崩溃恢复简单

use super::edit_op::EditOp;
use super::selection::Selection;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// 编辑来源标记，仅用于日志与分组归因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    User,
    FindReplace,
}

/// 一个撤销组：按编辑前坐标升序排列的操作，加上编辑前后的选区
#[derive(Debug, Clone)]
pub struct EditGroup {
    pub source: EditSource,
    pub ops: Vec<EditOp>,
    pub selections_before: Vec<Selection>,
    pub selections_after: Vec<Selection>,
}

pub struct EditHistory {
    undo_stack: Vec<EditGroup>,
    redo_stack: Vec<EditGroup>,
    journal: Option<Journal>,
}

struct Journal {
    path: PathBuf,
    file: File,
}

impl EditHistory {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            journal: None,
        }
    }

    /// 创建带日志文件的编辑历史
    pub fn with_journal(path: PathBuf) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            journal: Some(Journal { path, file }),
        })
    }

    pub fn journal_path(&self) -> Option<&std::path::Path> {
        self.journal.as_ref().map(|j| j.path.as_path())
    }

    /// 记录新编辑组，清空重做栈
    pub fn push(&mut self, group: EditGroup) {
        if let Some(journal) = self.journal.as_mut() {
            for op in &group.ops {
                if let Err(e) = writeln!(journal.file, "{}", op.to_json_line()) {
                    tracing::warn!(error = %e, "edit journal write failed");
                    break;
                }
            }
        }
        self.redo_stack.clear();
        self.undo_stack.push(group);
    }

    pub fn pop_undo(&mut self) -> Option<EditGroup> {
        self.undo_stack.pop()
    }

    pub fn push_redo(&mut self, group: EditGroup) {
        self.redo_stack.push(group);
    }

    pub fn pop_redo(&mut self) -> Option<EditGroup> {
        self.redo_stack.pop()
    }

    /// 重做完成后放回撤销栈，不再写日志
    pub fn restore_undo(&mut self, group: EditGroup) {
        self.undo_stack.push(group);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}
