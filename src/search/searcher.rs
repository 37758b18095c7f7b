//! 区间搜索器
//!
//! 在 Rope 的指定区间内枚举匹配；字节偏移经 Rope 映射回字符偏移。
//! 零宽匹配（裸锚点）是合法结果，由上层的导航逻辑负责不在原地打转。

use crate::models::document::{is_word_char, slice_to_cow};
use crate::models::range::CharRange;
use crate::search::query::{QueryPlan, SearchQuery};
use memchr::memmem;
use ropey::Rope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub range: CharRange,
    /// 正则路径下的捕获组（含第 0 组整体匹配），按组号索引
    pub captures: Option<Vec<Option<String>>>,
}

impl SearchMatch {
    fn plain(range: CharRange) -> Self {
        Self {
            range,
            captures: None,
        }
    }
}

/// 词边界判定：匹配的首/尾字符是单词字符时，紧邻的外侧字符不能也是
fn is_whole_word_match(rope: &Rope, start: usize, end: usize) -> bool {
    let len = rope.len_chars();
    if start < end {
        if is_word_char(rope.char(start)) && start > 0 && is_word_char(rope.char(start - 1)) {
            return false;
        }
        if is_word_char(rope.char(end - 1)) && end < len && is_word_char(rope.char(end)) {
            return false;
        }
    } else if start > 0
        && start < len
        && is_word_char(rope.char(start - 1))
        && is_word_char(rope.char(start))
    {
        return false;
    }
    true
}

fn word_ok(rope: &Rope, query: &SearchQuery, start: usize, end: usize) -> bool {
    !query.whole_word() || is_whole_word_match(rope, start, end)
}

fn advance_char(hay: &str, byte: usize) -> Option<usize> {
    hay[byte..].chars().next().map(|c| byte + c.len_utf8())
}

fn capture_strings(caps: &regex::Captures<'_>) -> Vec<Option<String>> {
    caps.iter()
        .map(|group| group.map(|m| m.as_str().to_string()))
        .collect()
}

/// 枚举 `within` 内的全部匹配（文档序、互不重叠），最多 `limit` 个
pub fn find_matches(
    rope: &Rope,
    query: &SearchQuery,
    within: CharRange,
    captures: bool,
    limit: usize,
) -> Vec<SearchMatch> {
    let len = rope.len_chars();
    let start = within.start.min(len);
    let end = within.end.min(len).max(start);
    let slice = rope.slice(start..end);
    let hay = slice_to_cow(slice);
    let base_byte = rope.char_to_byte(start);

    let mut out = Vec::new();
    match &query.plan {
        QueryPlan::Literal { pattern } => {
            if pattern.is_empty() {
                return out;
            }
            for found in memmem::find_iter(hay.as_bytes(), pattern.as_bytes()) {
                let match_start = rope.byte_to_char(base_byte + found);
                let match_end = rope.byte_to_char(base_byte + found + pattern.len());
                if !word_ok(rope, query, match_start, match_end) {
                    continue;
                }
                out.push(SearchMatch::plain(CharRange::new(match_start, match_end)));
                if out.len() >= limit {
                    break;
                }
            }
        }
        QueryPlan::Pattern { regex } => {
            if captures {
                for caps in regex.captures_iter(&hay) {
                    let m = match caps.get(0) {
                        Some(m) => m,
                        None => continue,
                    };
                    let match_start = rope.byte_to_char(base_byte + m.start());
                    let match_end = rope.byte_to_char(base_byte + m.end());
                    if !word_ok(rope, query, match_start, match_end) {
                        continue;
                    }
                    out.push(SearchMatch {
                        range: CharRange::new(match_start, match_end),
                        captures: Some(capture_strings(&caps)),
                    });
                    if out.len() >= limit {
                        break;
                    }
                }
            } else {
                for m in regex.find_iter(&hay) {
                    let match_start = rope.byte_to_char(base_byte + m.start());
                    let match_end = rope.byte_to_char(base_byte + m.end());
                    if !word_ok(rope, query, match_start, match_end) {
                        continue;
                    }
                    out.push(SearchMatch::plain(CharRange::new(match_start, match_end)));
                    if out.len() >= limit {
                        break;
                    }
                }
            }
        }
    }
    out
}

/// 从 `from` 向后查找第一个匹配；扫到文档尾后回绕到文档头
pub fn next_match(
    rope: &Rope,
    query: &SearchQuery,
    from: usize,
    captures: bool,
) -> Option<SearchMatch> {
    let len = rope.len_chars();
    let from = from.min(len);
    let hay = slice_to_cow(rope.slice(..));
    let from_byte = rope.char_to_byte(from);

    if let Some(m) = scan_forward(rope, query, &hay, from_byte, captures) {
        return Some(m);
    }
    if from_byte > 0 {
        return scan_forward(rope, query, &hay, 0, captures);
    }
    None
}

fn scan_forward(
    rope: &Rope,
    query: &SearchQuery,
    hay: &str,
    mut pos: usize,
    captures: bool,
) -> Option<SearchMatch> {
    match &query.plan {
        QueryPlan::Literal { pattern } => {
            if pattern.is_empty() {
                return None;
            }
            let finder = memmem::Finder::new(pattern.as_bytes());
            loop {
                let found = finder.find(hay[pos..].as_bytes())? + pos;
                let start = rope.byte_to_char(found);
                let end = rope.byte_to_char(found + pattern.len());
                if word_ok(rope, query, start, end) {
                    return Some(SearchMatch::plain(CharRange::new(start, end)));
                }
                pos = advance_char(hay, found)?;
            }
        }
        QueryPlan::Pattern { regex } => loop {
            if captures {
                let caps = regex.captures_at(hay, pos)?;
                let m = caps.get(0)?;
                let start = rope.byte_to_char(m.start());
                let end = rope.byte_to_char(m.end());
                if word_ok(rope, query, start, end) {
                    return Some(SearchMatch {
                        range: CharRange::new(start, end),
                        captures: Some(capture_strings(&caps)),
                    });
                }
                pos = advance_char(hay, m.start())?;
            } else {
                let m = regex.find_at(hay, pos)?;
                let start = rope.byte_to_char(m.start());
                let end = rope.byte_to_char(m.end());
                if word_ok(rope, query, start, end) {
                    return Some(SearchMatch::plain(CharRange::new(start, end)));
                }
                pos = advance_char(hay, m.start())?;
            }
        },
    }
}

/// 查找起点严格小于 `before` 的最后一个匹配；无则回绕到最后一个
pub fn prev_match(rope: &Rope, query: &SearchQuery, before: usize) -> Option<CharRange> {
    let all = find_matches(
        rope,
        query,
        CharRange::new(0, rope.len_chars()),
        false,
        usize::MAX,
    );
    if all.is_empty() {
        return None;
    }
    let before = before.min(rope.len_chars());
    all.iter()
        .rev()
        .find(|m| m.range.start < before)
        .or_else(|| all.last())
        .map(|m| m.range)
}
