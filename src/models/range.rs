//! 字符区间模型
//!
//! 职责：
//! - 半开字符区间 `[start, end)`
//! - 编辑增量（EditDelta）
//! - 编辑后区间/偏移的重定位

use serde::{Deserialize, Serialize};

/// 半开字符区间，offset 单位为 char
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CharRange {
    pub start: usize,
    pub end: usize,
}

impl CharRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn contains_range(&self, other: CharRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersect(&self, other: CharRange) -> Option<CharRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(CharRange::new(start, end))
        } else {
            None
        }
    }

    pub fn collapse_to_end(&self) -> CharRange {
        CharRange::collapsed(self.end)
    }
}

/// 单次已应用编辑：`range` 为编辑前坐标，`new_len` 为替换文本的 char 数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDelta {
    pub range: CharRange,
    pub new_len: usize,
}

impl EditDelta {
    pub fn shift(&self) -> isize {
        self.new_len as isize - self.range.len() as isize
    }
}

fn apply_shift(offset: usize, shift: isize) -> usize {
    if shift >= 0 {
        offset.saturating_add(shift as usize)
    } else {
        offset.saturating_sub(shift.unsigned_abs())
    }
}

/// 将编辑前的偏移重定位到编辑后坐标
///
/// `deltas` 必须按编辑前坐标升序且互不重叠。`insert_pushes` 决定恰好落在
/// 插入点上的偏移是否被推向右侧（区间起点推、终点不推，装饰区间不会因为
/// 在边缘输入而增长）。
pub fn transform_offset(offset: usize, deltas: &[EditDelta], insert_pushes: bool) -> usize {
    let mut shift = 0isize;
    for delta in deltas {
        let old = delta.range;
        if old.end < offset || (old.end == offset && (!old.is_empty() || insert_pushes)) {
            shift += delta.shift();
            continue;
        }
        if old.start < offset {
            // 偏移落在被替换区域内部：夹到编辑起点
            return apply_shift(old.start, shift);
        }
        break;
    }
    apply_shift(offset, shift)
}

/// 重定位一个区间，保证结果不反转
pub fn transform_range(range: CharRange, deltas: &[EditDelta]) -> CharRange {
    let start = transform_offset(range.start, deltas, true);
    let end = transform_offset(range.end, deltas, false);
    CharRange::new(start, end.max(start))
}
