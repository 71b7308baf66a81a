//! C6/§6: the `CollaborationAdapter` contract — subscriber management plus
//! the detach/reattach guard collaboration adapters use to apply a remote op
//! without echoing it back to themselves.

use docstore_types::Operation;
use serde::{Deserialize, Serialize};

pub type SubscriptionId = u64;

/// A callback invoked synchronously, once per emitted [`Operation`], after a
/// mutation or transaction commit.
pub type OperationHandler = Box<dyn FnMut(&Operation)>;

/// Identifying information about the local collaborator, carried in [`AdapterConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: Option<String>,
}

/// Serializable half of an integrator's adapter configuration (§6). The
/// `transform_operation` hook cannot round-trip through `serde` — it lives in
/// the companion [`AdapterHooks`] struct instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub client_id: Option<String>,
    pub user: Option<UserInfo>,
    pub debug: bool,
}

/// Non-serializable adapter hooks, paired one-to-one with an [`AdapterConfig`].
#[derive(Default)]
pub struct AdapterHooks {
    pub transform_operation: Option<Box<dyn Fn(Operation) -> Operation>>,
}

/// The surface a collaboration backend (CRDT/OT) implements to wrap a [`crate::DataStore`].
pub trait CollaborationAdapter {
    /// Subscribe to the store's op stream. Implementors should record the
    /// returned [`SubscriptionId`] so [`CollaborationAdapter::receive_operation`]
    /// can detach it for the duration of applying a remote op.
    fn connect(&mut self, store: &mut crate::DataStore);

    /// Push a locally-produced op to the backend.
    fn send_operation(&mut self, op: &Operation);

    /// Apply a remote op to `store`. Implementors detach their own
    /// subscription first (via [`crate::DataStore::detach`]) so the echo of
    /// their own write doesn't round-trip back through [`CollaborationAdapter::send_operation`].
    fn receive_operation(&mut self, store: &mut crate::DataStore, op: Operation);
}

/// RAII guard returned by [`crate::DataStore::detach`]: the subscription is
/// removed from the store's subscriber list for the guard's lifetime and
/// reinserted when it drops, even if the guarded code panics.
pub struct DetachGuard<'a> {
    pub(crate) store: &'a mut crate::DataStore,
    pub(crate) id: SubscriptionId,
    pub(crate) handler: Option<OperationHandler>,
}

impl<'a> Drop for DetachGuard<'a> {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            self.store.reattach(self.id, handler);
        }
    }
}

impl<'a> std::ops::Deref for DetachGuard<'a> {
    type Target = crate::DataStore;
    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl<'a> std::ops::DerefMut for DetachGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.store
    }
}
