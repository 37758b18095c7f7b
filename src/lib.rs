//! zfind - 增量查找/替换引擎
//!
//! 模块结构：
//! - models: 数据模型（Document, Selection, EditHistory, CharRange）
//! - search: 搜索原语（SearchQuery, Searcher, ReplacePattern）
//! - find: 控制层（FindController, FindReplaceState, FindDecorations）

pub mod find;
pub mod models;
pub mod search;
