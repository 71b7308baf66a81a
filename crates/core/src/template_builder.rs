//! C9: recursively materialize a [`NodeTemplate`] into the store. The
//! alias-uniqueness check, schema validation, id allocation, and single-root
//! enforcement all live in [`docstore_ops::materialize_template`]; this module
//! only narrows that function's error type to the one C9 exposes.

use crate::error::TemplateError;
use docstore_ops::OpsError;
use docstore_schema::Schema;
use docstore_store::MutableStore;
use docstore_types::{NodeId, NodeTemplate};

/// Materialize `template` under the schema's top node, returning the new
/// subtree's root id.
pub fn create_node_with_children<S: MutableStore + ?Sized>(
    store: &mut S,
    schema: &Schema,
    template: &NodeTemplate,
) -> Result<NodeId, TemplateError> {
    docstore_ops::materialize_template(store, schema, template, None).map_err(narrow)
}

fn narrow(err: OpsError) -> TemplateError {
    match err {
        OpsError::Store(e) => TemplateError::Store(e),
        OpsError::Schema(e) => TemplateError::Schema(e),
        OpsError::DuplicateAlias(name) => TemplateError::DuplicateAlias(name),
        other => unreachable!("materialize_template never produces {other:?}"),
    }
}
