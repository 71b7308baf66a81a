//! The storage layer: a flat node map (C2), a copy-on-write transaction
//! overlay (C3), and the atomic operation log (C4) they both write through.

mod error;
mod mutable_store;
mod node_store;
mod op_buffer;
mod overlay;

pub use error::StoreError;
pub use mutable_store::MutableStore;
pub use node_store::NodeStore;
pub use op_buffer::OpBuffer;
pub use overlay::{Overlay, OverlayEntry, OverlayView};
