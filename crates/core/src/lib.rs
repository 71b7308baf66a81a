//! `docstore-core`: the `DataStore` facade composing C1–C9 behind one public
//! entry point, plus the `CollaborationAdapter` contract from §6.

mod adapter;
mod datastore;
mod error;
mod template_builder;

pub use adapter::{AdapterConfig, AdapterHooks, CollaborationAdapter, DetachGuard, OperationHandler, SubscriptionId, UserInfo};
pub use datastore::DataStore;
pub use error::{DataStoreError, TemplateError};
pub use template_builder::create_node_with_children;

pub use docstore_ops::ModelSelection;
pub use docstore_traversal::TraversalOptions;
pub use docstore_types::Operation;
