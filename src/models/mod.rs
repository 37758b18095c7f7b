//! 数据模型层

pub mod document;
pub mod edit_history;
pub mod edit_op;
pub mod range;
pub mod selection;

pub use document::{
    is_word_char, slice_to_cow, CommandError, ContentChange, ContentChangeKind, CursorChangeReason,
    Document, ViewportState,
};
pub use edit_history::{EditGroup, EditHistory, EditSource};
pub use edit_op::EditOp;
pub use range::{transform_offset, transform_range, CharRange, EditDelta};
pub use selection::Selection;
