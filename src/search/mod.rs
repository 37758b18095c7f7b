//! 搜索原语层

pub mod query;
pub mod replace_pattern;
pub mod searcher;

pub use query::{QueryError, SearchOptions, SearchQuery};
pub use replace_pattern::ReplacePattern;
pub use searcher::SearchMatch;
