//! Content, mark, and text-range mutation algorithms (C5-C7).
//!
//! Every operation here is written against [`docstore_store::MutableStore`]
//! so it behaves identically whether it runs directly against a
//! [`docstore_store::NodeStore`] or inside a transaction's overlay view.

mod content_ops;
mod error;
mod mark_ops;
mod range_ops;

pub use content_ops::{materialize_template, ContentOps};
pub use error::OpsError;
pub use mark_ops::{mark_statistics, normalize, MarkOps, MarkStatistics};
pub use range_ops::{
    apply_mark, constrain_marks_to_range, copy_text, delete_text, duplicate_text, expand_to_word, extract_text,
    find_all, find_text, get_text_length, indent, insert_text, merge_block_nodes, move_text, normalize_range,
    normalize_whitespace, outdent, remove_mark, replace, replace_text, split_block_node, toggle_mark, trim_text,
    unwrap, wrap, ModelSelection,
};
