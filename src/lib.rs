//! # sfxcost - Incremental Point-Cost Engine for SFX Spells
//!
//! A cost engine for SFX spell sheets that provides:
//! - **Incremental** recomputation (a change pushes only to what depends on it)
//! - **Lazy** construction (fields are built the first time they are named)
//! - **Typed** mutation (legacy text is parsed once, into a [`Command`])
//! - **Observable** state (listeners hear about every change and reload)
//!
//! ## Core Concepts
//!
//! ### Fields
//!
//! Every entry on the sheet is a field node in a [`CostModel`]. A field has
//! a value, a cost, and possibly a secondary bonus. Derived fields pull
//! their cost from their sources:
//!
//! ```text
//! [Effect, Range, Speed, Duration] → [SubMandatory, HalfMandatory] → [Mandatory]
//! [Mandatory, Optional, Fraction, Modifiers] → [Total]
//! ```
//!
//! 1. **Inputs** hold a number, a table row, or a proportion
//! 2. **Derived fields** recompute when an input pushes a change to them
//! 3. **Totals** split the spell budget between the DN and FV ledgers
//!
//! ### Key Features
//!
//! - **Lookup tables**: Rows grow exponentially in value but linearly in cost
//! - **Multipliers**: Each table field selects a unit that shifts its cost
//! - **Cycle Detection**: Wiring is checked with a petgraph dependency view
//! - **Bulk reload**: Swap every field at once, with ordered events
//!
//! ## Example
//!
//! ```rust
//! use sfxcost::*;
//!
//! let mut model = CostModel::standard();
//!
//! let effect = model.field("Effect");
//! model.apply_delta(effect, 3);
//! assert_eq!(model.value(effect), "3");
//!
//! let duration = model.field("Duration");
//! model.apply_delta(duration, 5);
//!
//! let mandatory = model.field("Mandatory");
//! assert_eq!(model.cost(mandatory), 8);
//!
//! // Route the focus ledger by hand
//! let other = model.field("Other");
//! model.apply_text(other, "FV 2").unwrap();
//! assert_eq!(model.ledgers(other), (0, 2));
//! ```
//!
//! ## Modules
//!
//! - [`model`] - The cost model and its arena
//! - [`field`] - Field state per variant
//! - [`evaluate`] - Cost reads and recomputation
//! - [`mutation`] - Deltas, commands and composite edits
//! - [`command`] - Typed commands and the text grammars
//! - [`registry`] - Lazy name-to-field construction
//! - [`catalog`] - The standard SFX fields
//! - [`table`] - Lookup tables
//! - [`multiplier`] - Unit multipliers
//! - [`formula`] - Derived-cost arithmetic
//! - [`events`] - Listener bus
//! - [`graph`] - Dependency graph validation
//! - [`report`] - Serializable field snapshots
//! - [`config`] - Model configuration
//! - [`error`] - Error types

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod events;
pub mod field;
pub mod field_id;
pub mod formula;
pub mod graph;
pub mod model;
pub mod multiplier;
pub mod mutation;
pub mod registry;
pub mod report;
pub mod table;

// Re-export main types for convenience
pub use command::{Command, Grammar, IncantationFlag, Ledger, Outcome};
pub use config::ModelConfig;
pub use error::FieldError;
pub use events::{EventBus, FieldListener};
pub use field::{FieldKind, NodeId, Variant};
pub use field_id::FieldId;
pub use formula::MoveSpeed;
pub use graph::FieldGraph;
pub use model::{Catalog, CostModel, Tables};
pub use multiplier::{Multiplier, MultiplierKind};
pub use registry::{Factory, Registry};
pub use report::FieldReport;
pub use table::{LookupTable, TableStyle};
