//! Core data types for the DataStore document model.
//!
//! This crate is pure data: [`INode`], [`Mark`], [`NodeId`] and their
//! supporting types carry no store/schema/transaction logic. Everything else
//! in the workspace is built on top of these.

mod ids;
mod mark;
mod node;
mod operation;
mod template;

pub use ids::{IdAllocator, NodeId};
pub use mark::{Attrs, Mark, Range};
pub use node::{INode, NodePatch, ALIAS_ATTR};
pub use operation::Operation;
pub use template::{NodeTemplate, TemplateChild};
