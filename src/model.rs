//! Cost model.
//!
//! Provides the `CostModel` type, the main entry point. A model owns every
//! field node in an arena, the name registry that builds them lazily, and
//! the event bus that reports their changes.
//!
//! Edges between nodes are plain [`NodeId`] lists:
//!
//! - `dependents`: nodes to push a recompute to when this node changes
//! - `sources`: nodes this node pulls from when it recomputes
//!
//! [`CostModel::add_depends`] maintains both in one step. Composites also
//! own an ordered child list; each child pushes to its composite.
//!
//! Reads live in [`evaluate`](crate::evaluate), writes in
//! [`mutation`](crate::mutation).

use crate::catalog;
use crate::config::ModelConfig;
use crate::error::FieldError;
use crate::events::EventBus;
use crate::field::{FieldKind, Node, NodeId, Variant};
use crate::field_id::FieldId;
use crate::graph::FieldGraph;
use crate::registry::{Factory, Lookup, Registry};
use crate::table::LookupTable;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

static NEXT_GENERATION: AtomicU32 = AtomicU32::new(1);

/// Registers every named field a model starts with.
pub type Catalog = fn(&mut CostModel);

/// Lookup tables shared by the fields of one model.
#[derive(Debug, Clone)]
pub struct Tables {
    /// General value table.
    pub values: Arc<LookupTable>,
    /// Table behind community entries.
    pub community: Arc<LookupTable>,
    /// Table behind component and gesture entries.
    pub bonus: Arc<LookupTable>,
}

impl Tables {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            values: Arc::new(LookupTable::values(config.value_rows)),
            community: Arc::new(LookupTable::community(config.community_rows)),
            bonus: Arc::new(LookupTable::bonus(config.bonus_rows)),
        }
    }
}

/// The cost graph: field nodes, their registry, and their listeners.
///
/// The model is driven from one thread at a time; every mutation takes
/// `&mut self` and runs to completion, including the recomputation of
/// everything downstream.
///
/// # Examples
///
/// ```rust
/// use sfxcost::CostModel;
///
/// let mut model = CostModel::standard();
///
/// let effect = model.field("Effect");
/// model.apply_delta(effect, 3);
///
/// let duration = model.field("Duration");
/// model.apply_delta(duration, 5);
///
/// let mandatory = model.field("Mandatory");
/// assert_eq!(model.cost(mandatory), 8);
/// ```
pub struct CostModel {
    pub(crate) nodes: Vec<Node>,
    pub(crate) registry: Registry,
    pub(crate) events: EventBus,
    pub(crate) tables: Tables,
    pub(crate) config: ModelConfig,
    pub(crate) catalog: Option<Catalog>,
    pub(crate) generation: u32,
}

impl CostModel {
    /// Create an empty model with default tables and nothing registered.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::CostModel;
    ///
    /// let mut model = CostModel::new();
    /// assert!(model.try_field("Effect").is_none());
    /// ```
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Create an empty model whose tables follow `config`.
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            nodes: Vec::new(),
            registry: Registry::new(),
            events: EventBus::new(),
            tables: Tables::from_config(&config),
            config,
            catalog: None,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a model with the standard SFX fields registered.
    pub fn standard() -> Self {
        Self::from_catalog(ModelConfig::default(), catalog::standard)
    }

    /// Create a model with the standard SFX fields, sized by `config`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::{CostModel, ModelConfig};
    ///
    /// let config = ModelConfig::from_json(r#"{ "fraction_default": 0.25 }"#).unwrap();
    /// let mut model = CostModel::configured(config).unwrap();
    /// let fraction = model.field("Fraction");
    /// assert_eq!(model.split(fraction, 100), (25, 75));
    /// ```
    pub fn configured(config: ModelConfig) -> Result<Self, FieldError> {
        config.validate()?;
        Ok(Self::from_catalog(config, catalog::standard))
    }

    /// Create a model with `catalog` registered against `config` tables.
    ///
    /// [`reset`](Self::reset) rebuilds from the same catalog.
    pub fn from_catalog(config: ModelConfig, catalog: Catalog) -> Self {
        let mut model = Self::with_config(config);
        catalog(&mut model);
        model.catalog = Some(catalog);
        model
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// The listener bus. Clone it to subscribe from elsewhere.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Generation stamped on every handle this model issues.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of nodes ever created, including composite entries that have
    /// since been removed.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Register a constructor for `name`. Nothing is built until the name
    /// is first looked up.
    pub fn register<F>(&mut self, name: impl Into<FieldId>, factory: F)
    where
        F: FnOnce(&mut CostModel) -> NodeId + Send + 'static,
    {
        let factory: Factory = Box::new(factory);
        self.registry.register(name.into(), factory);
    }

    /// Resolve a registered field, building it (and whatever it needs) on
    /// first use.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not registered, or if building it requires
    /// building itself.
    pub fn field(&mut self, name: &str) -> NodeId {
        match self.try_field(name) {
            Some(id) => id,
            None => panic!("no field registered as {name:?}"),
        }
    }

    /// Resolve a registered field, or `None` if the name is unknown.
    ///
    /// # Panics
    ///
    /// Panics if building the field requires building itself.
    pub fn try_field(&mut self, name: &str) -> Option<NodeId> {
        let name = FieldId::from_str(name);
        match self.registry.begin(&name) {
            Lookup::Built(id) => Some(id),
            Lookup::Missing => None,
            Lookup::Cycle(path) => panic!(
                "construction cycle: {}",
                crate::error::format_cycle_path(&path)
            ),
            Lookup::Construct(factory) => {
                tracing::debug!(field = %name, "constructing field");
                let id = factory(self);
                self.registry.finish(&name, id);
                // Sources may have changed before this field existed.
                self.recompute(id);
                Some(id)
            }
        }
    }

    /// Build every registered field that has not been built yet.
    pub fn build_all(&mut self) -> Vec<NodeId> {
        let names = self.registry.names().to_vec();
        names
            .iter()
            .filter_map(|name| self.try_field(name.as_str()))
            .collect()
    }

    /// Add a node to the arena. The node is not registered under its name;
    /// registry constructors return the id this gives them.
    pub fn add_node(&mut self, name: impl Into<FieldId>, kind: FieldKind) -> NodeId {
        let id = NodeId {
            index: self.nodes.len() as u32,
            generation: self.generation,
        };
        self.nodes.push(Node::new(name.into(), kind));
        id
    }

    /// Change the label a field presents; the registry name is unaffected.
    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        self.node_mut(id).label = label.into();
    }

    /// Make `node` depend on `source`: `node` is pushed a recompute when
    /// `source` changes, and lists `source` among its inputs.
    pub fn add_depends(&mut self, node: NodeId, source: NodeId) {
        self.node_mut(source).dependents.push(node);
        self.node_mut(node).sources.push(source);
    }

    /// Undo one [`add_depends`](Self::add_depends), then recompute `node`.
    pub fn remove_depends(&mut self, node: NodeId, source: NodeId) {
        let dependents = &mut self.node_mut(source).dependents;
        if let Some(pos) = dependents.iter().position(|d| *d == node) {
            dependents.remove(pos);
        }
        let sources = &mut self.node_mut(node).sources;
        if let Some(pos) = sources.iter().position(|s| *s == source) {
            sources.remove(pos);
        }
        self.recompute(node);
    }

    pub fn name(&self, id: NodeId) -> &FieldId {
        &self.node(id).name
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.node(id).label
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn dependents(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).dependents
    }

    pub fn sources(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).sources
    }

    pub fn variant(&self, id: NodeId) -> Variant {
        self.node(id).kind.variant()
    }

    /// Raw state of a field.
    pub fn kind(&self, id: NodeId) -> &FieldKind {
        &self.node(id).kind
    }

    /// Push a recompute to every dependent, then notify listeners.
    ///
    /// Dependents are visited in registration order. A node reachable
    /// along several paths is recomputed once per path.
    pub fn propagate(&mut self, id: NodeId) {
        let dependents = self.node(id).dependents.clone();
        tracing::trace!(
            field = %self.node(id).name,
            dependents = dependents.len(),
            "propagating change"
        );
        for dependent in dependents {
            self.recompute(dependent);
        }
        self.notify(id);
    }

    /// Tell listeners that `id` changed.
    pub fn notify(&mut self, id: NodeId) {
        for listener in self.events.snapshot() {
            listener.changed(self, id);
        }
    }

    pub(crate) fn emit_added(&self, id: NodeId) {
        for listener in self.events.snapshot() {
            listener.added(self, id);
        }
    }

    pub(crate) fn emit_removed(&self, id: NodeId) {
        for listener in self.events.snapshot() {
            listener.removed(self, id);
        }
    }

    /// Replace every field with the corresponding field of `loaded`.
    ///
    /// Listeners see, for each name: the old composite's children removed
    /// (while the old nodes are still in place), then the swap reported as
    /// `replaced(old, new)`, then the new composite's children added. A
    /// name `loaded` lacks is reported removed along with its children. The
    /// listeners of this model are kept; those of `loaded` are dropped.
    pub fn replace_content(&mut self, mut loaded: CostModel) {
        self.build_all();
        loaded.build_all();
        tracing::debug!(
            from = self.generation,
            to = loaded.generation,
            fields = loaded.registry.len(),
            "replacing model content"
        );

        let names = loaded.registry.names().to_vec();
        let pairs: Vec<(Option<NodeId>, NodeId)> = names
            .iter()
            .filter_map(|name| {
                loaded
                    .registry
                    .built(name)
                    .map(|new| (self.registry.built(name), new))
            })
            .collect();

        let outgoing: Vec<NodeId> = self
            .registry
            .names()
            .iter()
            .filter(|name| !loaded.registry.contains(name))
            .filter_map(|name| self.registry.built(name))
            .collect();

        let dropped = pairs.iter().filter_map(|(old, _)| *old);
        for old in dropped.chain(outgoing.iter().copied()).collect::<Vec<_>>() {
            for child in self.children_of(old) {
                self.emit_removed(child);
            }
        }
        // Children were reported with their composite.
        for old in outgoing {
            if self.node(old).parent.is_none() {
                self.emit_removed(old);
            }
        }

        self.nodes = std::mem::take(&mut loaded.nodes);
        self.registry = std::mem::take(&mut loaded.registry);
        self.tables = loaded.tables.clone();
        self.config = loaded.config.clone();
        self.catalog = loaded.catalog;
        self.generation = loaded.generation;

        for (old, new) in pairs {
            let snapshot = self.events.snapshot();
            match old {
                Some(old) => {
                    for listener in &snapshot {
                        listener.replaced(self, old, new);
                    }
                }
                None => {
                    for listener in &snapshot {
                        listener.added(self, new);
                    }
                }
            }
            for child in self.children_of(new) {
                self.emit_added(child);
            }
        }
    }

    /// Replace every field with a freshly built one from this model's
    /// catalog, keeping the listeners.
    pub fn reset(&mut self) {
        let fresh = match self.catalog {
            Some(catalog) => CostModel::from_catalog(self.config.clone(), catalog),
            None => CostModel::with_config(self.config.clone()),
        };
        self.replace_content(fresh);
    }

    /// Dependency view of every node built so far.
    pub fn dependency_graph(&self) -> FieldGraph {
        let mut graph = FieldGraph::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId {
                index: index as u32,
                generation: self.generation,
            };
            graph.add_node(id, node.name.clone());
            for dependent in &node.dependents {
                graph.add_edge(*dependent, id);
            }
        }
        graph
    }

    /// Check that the wiring has no cycles.
    pub fn validate(&self) -> Result<(), FieldError> {
        self.dependency_graph().detect_cycles()
    }

    fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            FieldKind::Composite(composite) => composite.children.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.check(id);
        &self.nodes[id.index as usize]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.check(id);
        &mut self.nodes[id.index as usize]
    }

    fn check(&self, id: NodeId) {
        if id.generation != self.generation || id.index as usize >= self.nodes.len() {
            panic!(
                "stale or foreign field handle {id} (model generation {})",
                self.generation
            );
        }
    }
}

impl Default for CostModel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CostModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostModel")
            .field("generation", &self.generation)
            .field("nodes", &self.nodes.len())
            .field("registry", &self.registry)
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Scalar, ScalarRule};

    #[test]
    fn test_new_model_is_empty() {
        let mut model = CostModel::new();
        assert_eq!(model.node_count(), 0);
        assert!(model.try_field("Effect").is_none());
    }

    #[test]
    #[should_panic(expected = "no field registered")]
    fn test_unknown_name_panics() {
        let mut model = CostModel::new();
        model.field("Missing");
    }

    #[test]
    fn test_add_depends_keeps_both_lists() {
        let mut model = CostModel::new();
        let a = model.add_node("A", FieldKind::Scalar(Scalar::new(ScalarRule::Plain)));
        let b = model.add_node("B", FieldKind::Scalar(Scalar::new(ScalarRule::Plain)));
        model.add_depends(b, a);
        assert_eq!(model.dependents(a), &[b]);
        assert_eq!(model.sources(b), &[a]);

        model.remove_depends(b, a);
        assert!(model.dependents(a).is_empty());
        assert!(model.sources(b).is_empty());
    }

    #[test]
    fn test_lazy_construction_is_memoized() {
        let mut model = CostModel::new();
        model.register("Effect", |model: &mut CostModel| {
            model.add_node("Effect", FieldKind::Scalar(Scalar::new(ScalarRule::Plain)))
        });
        assert_eq!(model.node_count(), 0);
        let first = model.field("Effect");
        let second = model.field("Effect");
        assert_eq!(first, second);
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    #[should_panic(expected = "construction cycle")]
    fn test_construction_cycle_panics() {
        let mut model = CostModel::new();
        model.register("A", |model: &mut CostModel| model.field("B"));
        model.register("B", |model: &mut CostModel| model.field("A"));
        model.field("A");
    }

    #[test]
    #[should_panic(expected = "stale or foreign")]
    fn test_foreign_handle_panics() {
        let mut first = CostModel::standard();
        let mut second = CostModel::standard();
        let effect = first.field("Effect");
        second.field("Effect");
        second.cost(effect);
    }

    #[test]
    fn test_dependency_graph_of_standard_model_is_acyclic() {
        let mut model = CostModel::standard();
        model.build_all();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_cycles() {
        let mut model = CostModel::new();
        let a = model.add_node("A", FieldKind::Scalar(Scalar::new(ScalarRule::Plain)));
        let b = model.add_node("B", FieldKind::Scalar(Scalar::new(ScalarRule::Plain)));
        model.node_mut(a).dependents.push(b);
        model.node_mut(b).dependents.push(a);
        assert!(matches!(model.validate(), Err(FieldError::Cycle { .. })));
    }
}
