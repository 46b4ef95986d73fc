//! Field registry.
//!
//! Fields are registered by name against a constructor. Nothing is built
//! at registration time; the first lookup of a name runs its constructor,
//! which may look up (and so build) other names before it returns. The slot
//! then holds the built node and later lookups return it directly.
//!
//! A name looked up while its own constructor is still running is a wiring
//! bug and reported with the chain of names that led back to it.

use crate::field::NodeId;
use crate::field_id::FieldId;
use crate::model::CostModel;
use std::collections::HashMap;

/// Builds one named field inside a model, wiring its dependencies.
pub type Factory = Box<dyn FnOnce(&mut CostModel) -> NodeId + Send>;

enum Slot {
    Pending(Factory),
    Building,
    Built(NodeId),
}

/// What a lookup found.
pub(crate) enum Lookup {
    Built(NodeId),
    Construct(Factory),
    Cycle(Vec<FieldId>),
    Missing,
}

/// Name-keyed constructors and the nodes they produced.
#[derive(Default)]
pub struct Registry {
    slots: HashMap<FieldId, Slot>,
    order: Vec<FieldId>,
    building: Vec<FieldId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for `name`, replacing any earlier
    /// registration. The name keeps its original position in
    /// [`names`](Self::names).
    pub fn register(&mut self, name: FieldId, factory: Factory) {
        if !self.slots.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.slots.insert(name, Slot::Pending(factory));
    }

    pub fn contains(&self, name: &FieldId) -> bool {
        self.slots.contains_key(name)
    }

    /// The node built for `name`, if it has been built.
    pub fn built(&self, name: &FieldId) -> Option<NodeId> {
        match self.slots.get(name) {
            Some(Slot::Built(id)) => Some(*id),
            _ => None,
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> &[FieldId] {
        &self.order
    }

    /// Number of names whose constructor has not run yet.
    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look `name` up, taking its constructor out of the slot when it has
    /// not been built yet. Callers must hand the result back through
    /// [`finish`](Self::finish).
    pub(crate) fn begin(&mut self, name: &FieldId) -> Lookup {
        let Some(slot) = self.slots.get_mut(name) else {
            return Lookup::Missing;
        };
        match slot {
            Slot::Built(id) => Lookup::Built(*id),
            Slot::Building => {
                let start = self
                    .building
                    .iter()
                    .position(|n| n == name)
                    .unwrap_or(0);
                let mut path = self.building[start..].to_vec();
                path.push(name.clone());
                Lookup::Cycle(path)
            }
            Slot::Pending(_) => {
                let Slot::Pending(factory) = std::mem::replace(slot, Slot::Building) else {
                    unreachable!("slot was pending");
                };
                self.building.push(name.clone());
                Lookup::Construct(factory)
            }
        }
    }

    /// Store the node a constructor produced.
    pub(crate) fn finish(&mut self, name: &FieldId, id: NodeId) {
        self.building.retain(|n| n != name);
        self.slots.insert(name.clone(), Slot::Built(id));
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("names", &self.order)
            .field("pending", &self.pending())
            .finish()
    }
}
