//! Change notification.
//!
//! Every model owns one [`EventBus`]; nodes never hold listener lists of
//! their own. The bus is a cheap, cloneable handle, so collaborators can keep
//! a copy and subscribe more listeners at any time, including from inside a
//! notification. Fan-out iterates over a snapshot taken before the first
//! call, so a listener added mid-notification starts receiving events from
//! the next one.

use crate::field::NodeId;
use crate::model::CostModel;
use std::sync::{Arc, PoisonError, RwLock};

/// Receives structural and value changes from a [`CostModel`].
///
/// Every method has an empty default so listeners implement only what they
/// care about. The model is passed in read-only so listeners can look up
/// the field that changed.
///
/// # Examples
///
/// ```rust
/// use sfxcost::{CostModel, FieldListener, NodeId};
/// use std::sync::{Arc, Mutex};
///
/// #[derive(Default)]
/// struct Costs(Mutex<Vec<i64>>);
///
/// impl FieldListener for Costs {
///     fn changed(&self, model: &CostModel, field: NodeId) {
///         self.0.lock().unwrap().push(model.cost(field));
///     }
/// }
///
/// let mut model = CostModel::standard();
/// let costs = Arc::new(Costs::default());
/// model.events().subscribe(costs.clone());
///
/// let effect = model.field("Effect");
/// model.apply_delta(effect, 2);
/// assert!(costs.0.lock().unwrap().contains(&2));
/// ```
pub trait FieldListener: Send + Sync {
    /// A child was added to a composite.
    fn added(&self, _model: &CostModel, _field: NodeId) {}

    /// A field's value or cost may have changed.
    fn changed(&self, _model: &CostModel, _field: NodeId) {}

    /// A field was replaced by a bulk reload. `old` belongs to the previous
    /// generation and is only good for identity comparisons.
    fn replaced(&self, _model: &CostModel, _old: NodeId, _new: NodeId) {}

    /// A child was removed from a composite.
    fn removed(&self, _model: &CostModel, _field: NodeId) {}
}

/// Shared list of listeners for one model.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<Vec<Arc<dyn FieldListener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The same listener may be registered twice and
    /// is then called twice.
    pub fn subscribe(&self, listener: Arc<dyn FieldListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
        tracing::trace!("listener subscribed");
    }

    /// Remove every registration of `listener`. Returns whether any was found.
    pub fn unsubscribe(&self, listener: &Arc<dyn FieldListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        before != listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current listeners; the lock is released on return.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn FieldListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Quiet;
    impl FieldListener for Quiet {}

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus = EventBus::new();
        let listener: Arc<dyn FieldListener> = Arc::new(Quiet);
        bus.subscribe(listener.clone());
        bus.subscribe(Arc::new(Quiet));
        assert_eq!(bus.len(), 2);

        assert!(bus.unsubscribe(&listener));
        assert_eq!(bus.len(), 1);
        assert!(!bus.unsubscribe(&listener));
    }

    #[test]
    fn test_clones_share_listeners() {
        let bus = EventBus::new();
        let handle = bus.clone();
        handle.subscribe(Arc::new(Quiet));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let bus = EventBus::new();
        bus.subscribe(Arc::new(Quiet));
        let snapshot = bus.snapshot();
        bus.subscribe(Arc::new(Quiet));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(bus.len(), 2);
    }
}
