//! 搜索模式编译
//!
//! 区分大小写的字面量走 memchr 快速路径，其余（正则、忽略大小写、
//! 整词）统一编译为 regex。

use regex::{Regex, RegexBuilder};

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug)]
pub enum QueryError {
    InvalidRegex(regex::Error),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidRegex(e) => write!(f, "Invalid regex: {}", e),
        }
    }
}

impl std::error::Error for QueryError {}

impl From<regex::Error> for QueryError {
    fn from(e: regex::Error) -> Self {
        QueryError::InvalidRegex(e)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub is_regex: bool,
    pub match_case: bool,
    pub whole_word: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum QueryPlan {
    Literal { pattern: String },
    Pattern { regex: Regex },
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    source: String,
    is_regex: bool,
    whole_word: bool,
    pub(crate) plan: QueryPlan,
}

impl SearchQuery {
    pub fn new(pattern: &str, options: &SearchOptions) -> Result<Self> {
        let plan = if !options.is_regex && options.match_case {
            QueryPlan::Literal {
                pattern: pattern.to_string(),
            }
        } else {
            let source = if options.is_regex {
                pattern.to_string()
            } else {
                regex::escape(pattern)
            };
            let regex = RegexBuilder::new(&source)
                .multi_line(true)
                .case_insensitive(!options.match_case)
                .build()?;
            QueryPlan::Pattern { regex }
        };

        Ok(Self {
            source: pattern.to_string(),
            is_regex: options.is_regex,
            whole_word: options.whole_word,
            plan,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_regex(&self) -> bool {
        self.is_regex
    }

    pub fn whole_word(&self) -> bool {
        self.whole_word
    }

    /// 模式串是否含行锚点。对原始模式做文本判断，不询问正则引擎，
    /// 与原系统的可观察行为保持一致。
    pub fn is_line_anchored(&self) -> bool {
        self.is_regex && (self.source.contains('^') || self.source.contains('$'))
    }
}
