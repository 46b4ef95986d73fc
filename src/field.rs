//! Field nodes.
//!
//! A field is a node in the cost graph: some local state plus a rule for
//! turning that state (and, for derived fields, the state of its sources)
//! into a cost. Nodes live in the model's arena and refer to each other by
//! [`NodeId`]; nothing here owns another node.
//!
//! This module holds the state of each variant and the rules that need no
//! access to other nodes. Rules that pull from sources live in
//! [`evaluate`](crate::evaluate).

use crate::command::{Grammar, Ledger};
use crate::field_id::FieldId;
use crate::formula;
use crate::multiplier::Multiplier;
use crate::table::{format_value, LookupTable};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Handle to a node in a [`CostModel`](crate::CostModel).
///
/// Handles carry the generation of the model that issued them, so a handle
/// kept across a bulk reload is detected as stale instead of silently
/// addressing a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Arena slot of this node.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Model generation this handle belongs to.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

/// Discriminant of a field's state, for callers that branch on shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Text,
    Scalar,
    Calculated,
    Composite,
    Value,
    ValueModifier,
    ValueFollows,
    Fraction,
    Double,
}

/// Cost and delta rules for integer fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarRule {
    /// Cost equals the value.
    Plain,
    /// Cost is the value times a fixed factor.
    Scaled(i64),
    /// Target count: never rests on 1; costs double when an area is set.
    MultiTarget { area: NodeId },
    /// Limited by the target count; surcharged by area and attributes.
    ChangeTarget {
        targets: NodeId,
        area: NodeId,
        attributes: NodeId,
    },
    /// Multiples of five, optionally warded.
    Charges { ward: bool },
}

/// Non-negative integer field.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub(crate) value: i64,
    pub(crate) rule: ScalarRule,
}

impl Scalar {
    pub fn new(rule: ScalarRule) -> Self {
        Self { value: 0, rule }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Add `delta`, then apply the rule's rounding and clamp into
    /// `0..=POINT_CEILING`.
    pub(crate) fn shift(&mut self, delta: i64) {
        let mut value = self.value.saturating_add(delta);
        if let ScalarRule::MultiTarget { .. } = self.rule {
            if value == 1 {
                value = value.saturating_add(delta);
            }
        }
        self.value = self.normalize(value);
    }

    /// Replace the value, then apply the rule's rounding and clamp into
    /// `0..=POINT_CEILING`.
    pub(crate) fn assign(&mut self, value: i64) {
        let value = match self.rule {
            ScalarRule::MultiTarget { .. } if value == 1 => {
                if self.value > 1 {
                    0
                } else {
                    2
                }
            }
            _ => value,
        };
        self.value = self.normalize(value);
    }

    fn normalize(&self, value: i64) -> i64 {
        let value = match self.rule {
            ScalarRule::Charges { .. } => value - value % 5,
            _ => value,
        };
        value.clamp(0, formula::POINT_CEILING)
    }
}

/// Formulas for calculated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formula {
    /// The stored value, set directly.
    Stored,
    /// Sum of source costs.
    Sum,
    /// Sum of source costs, halved.
    HalfSum,
    /// The larger of `sub - casting` and `half`.
    Mandatory {
        sub: NodeId,
        casting: NodeId,
        half: NodeId,
    },
    /// When switched on, a tenth of the source costs.
    Maintenance,
    /// When switched on, a fifth of the source costs, rounded up.
    Focus,
    /// When switched on, two points if the concentration costs anything.
    ConcentrationAdd { concentration: NodeId },
}

/// Integer field set directly or derived from its sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculated {
    pub(crate) value: i64,
    pub(crate) formula: Formula,
}

impl Calculated {
    pub fn new(formula: Formula) -> Self {
        Self { value: 0, formula }
    }

    pub fn value(&self) -> i64 {
        self.value
    }
}

/// Kinds of repeatable composite entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Community,
    Component,
    Gesture,
}

/// How a composite relates its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeRule {
    /// Children are independent.
    Plain,
    /// At most one child may carry a nonzero value.
    Exclusive,
    /// Child reductions are checked against a ceiling derived from the
    /// mandatory and optional totals.
    Budget {
        mandatory: NodeId,
        optional: NodeId,
        fraction: NodeId,
    },
}

/// Ordered group of child fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub(crate) children: Vec<NodeId>,
    pub(crate) rule: CompositeRule,
    pub(crate) entries: Option<EntryKind>,
    pub(crate) limited: bool,
}

impl Composite {
    pub fn new(rule: CompositeRule) -> Self {
        Self {
            children: Vec::new(),
            rule,
            entries: None,
            limited: false,
        }
    }

    /// A composite whose children are repeatable entries of `kind`.
    pub fn with_entries(rule: CompositeRule, kind: EntryKind) -> Self {
        Self {
            entries: Some(kind),
            ..Self::new(rule)
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Extra behaviour layered on a plain table value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRule {
    Plain,
    /// Cost shaved by one point for shamans.
    Reception { skill: NodeId },
    /// Forced to a minimum duration for necroscopes, who get five points back.
    Trance { skill: NodeId },
}

/// Index into a lookup table combined with a unit multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueField {
    pub(crate) index: usize,
    pub(crate) table: Arc<LookupTable>,
    pub(crate) multiplier: Multiplier,
    pub(crate) rule: ValueRule,
}

impl ValueField {
    pub fn new(table: Arc<LookupTable>, multiplier: Multiplier) -> Self {
        Self {
            index: 0,
            table,
            multiplier,
            rule: ValueRule::Plain,
        }
    }

    pub fn with_rule(mut self, rule: ValueRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn multiplier(&self) -> &Multiplier {
        &self.multiplier
    }

    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    /// `offset + table.cost(index)`.
    pub fn base_cost(&self) -> i64 {
        self.multiplier.offset() + self.table.cost(self.index)
    }

    pub fn table_value(&self) -> f64 {
        self.table.value(self.index)
    }

    /// Move the index, unless the result falls outside the table.
    pub(crate) fn try_index(&mut self, index: i64) -> bool {
        if self.table.out_of_range(index) {
            return false;
        }
        self.index = index as usize;
        true
    }

    /// Move to the closest row for a presented value.
    pub(crate) fn try_closest(&mut self, value: f64) -> bool {
        match self.table.closest_value(value) {
            Some(index) => {
                self.index = index;
                true
            }
            None => false,
        }
    }
}

/// Per-kind behaviour of a value whose cost can count as a reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierRule {
    RelatedSkill,
    /// A third of the value cost.
    Concentration,
    /// One extra point per quality once anything is spoken.
    Incantation {
        foreign: bool,
        loud: bool,
        profane: bool,
    },
    /// Community entry: row cost scaled by the difficulty offset.
    Community,
    /// Component entry: doubled when destroyed by casting.
    Component { destroyed: bool },
    /// Gesture entry.
    Gesture,
}

impl ModifierRule {
    /// Whether deltas set the index absolutely.
    pub(crate) fn indexes_absolutely(&self) -> bool {
        matches!(
            self,
            ModifierRule::Community | ModifierRule::Component { .. } | ModifierRule::Gesture
        )
    }

    pub(crate) fn entry_kind(&self) -> Option<EntryKind> {
        match self {
            ModifierRule::Community => Some(EntryKind::Community),
            ModifierRule::Component { .. } => Some(EntryKind::Component),
            ModifierRule::Gesture => Some(EntryKind::Gesture),
            _ => None,
        }
    }
}

/// A value whose cost goes either to the active ledger or to the
/// reduction, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierField {
    pub(crate) value: ValueField,
    pub(crate) primary: bool,
    pub(crate) initial: bool,
    pub(crate) rule: ModifierRule,
}

impl ModifierField {
    pub fn new(value: ValueField, rule: ModifierRule) -> Self {
        Self {
            value,
            primary: true,
            initial: false,
            rule,
        }
    }

    pub fn value(&self) -> &ValueField {
        &self.value
    }

    /// The cost before it is routed to a ledger.
    pub fn combined(&self) -> i64 {
        let value = &self.value;
        match self.rule {
            ModifierRule::RelatedSkill => value.base_cost(),
            ModifierRule::Concentration => value.base_cost() / 3,
            ModifierRule::Incantation {
                foreign,
                loud,
                profane,
            } => {
                let base = value.base_cost();
                if base == 0 {
                    0
                } else {
                    base + i64::from(foreign) + i64::from(loud) + i64::from(profane)
                }
            }
            ModifierRule::Community => {
                value.table.cost(value.index) * value.multiplier.offset() / 2
            }
            ModifierRule::Component { destroyed } => {
                let combined = (value.index + value.multiplier.index()) as i64;
                if destroyed {
                    combined * 2
                } else {
                    combined
                }
            }
            ModifierRule::Gesture => (value.index + value.multiplier.index()) as i64,
        }
    }

    pub fn cost(&self) -> i64 {
        if self.primary {
            self.combined()
        } else {
            0
        }
    }

    pub fn reduction(&self) -> i64 {
        if self.primary {
            0
        } else {
            self.combined()
        }
    }

    pub fn ledger(&self) -> Ledger {
        if self.primary {
            Ledger::Dn
        } else {
            Ledger::Fv
        }
    }

    pub fn bonus(&self) -> i64 {
        match self.rule {
            ModifierRule::Incantation {
                foreign,
                loud,
                profane,
            } => i64::from(foreign) + 2 * i64::from(loud) + 4 * i64::from(profane),
            ModifierRule::Component { destroyed } => i64::from(destroyed),
            _ => 0,
        }
    }

    /// Roll the modifier asks for, as shown next to the field.
    pub fn comment(&self) -> String {
        let unit = self.value.multiplier.index();
        match self.rule {
            ModifierRule::Concentration => {
                if self.value.index == 0 {
                    "None".to_string()
                } else {
                    format!("Will @ DN {}", self.value.base_cost() / 3 + 6)
                }
            }
            ModifierRule::Gesture => {
                if unit < 2 {
                    "None".to_string()
                } else {
                    format!("Dex @ DN {}", (unit - 2) * 4 + 8)
                }
            }
            ModifierRule::Incantation { .. } => {
                if unit < 3 {
                    "None".to_string()
                } else {
                    format!("Mind @ DN {}", (unit - 3) * 4 + 8)
                }
            }
            ModifierRule::RelatedSkill => {
                if unit < 1 {
                    "None".to_string()
                } else {
                    format!("Skill @ DN {}", unit + 5)
                }
            }
            ModifierRule::Community | ModifierRule::Component { .. } => "<None>".to_string(),
        }
    }
}

/// What a following value does with the field it follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowRule {
    /// Mirror the followed index and cost only the difference.
    Mirror,
    /// Apportation movement: priced from its sources once switched on.
    Move,
}

/// A value that can track another field.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowsField {
    pub(crate) value: ValueField,
    pub(crate) tracked: NodeId,
    pub(crate) tracking: bool,
    pub(crate) rule: FollowRule,
}

impl FollowsField {
    pub fn new(value: ValueField, tracked: NodeId, rule: FollowRule) -> Self {
        Self {
            value,
            tracked,
            tracking: true,
            rule,
        }
    }

    pub fn detached(mut self) -> Self {
        self.tracking = false;
        self
    }

    pub fn value(&self) -> &ValueField {
        &self.value
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }
}

/// Disbelief applied to an unreal effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unreal {
    pub(crate) level: i64,
    pub(crate) effect: NodeId,
}

/// A proportion in `[0, 1]` used to split totals between the ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct Fraction {
    pub(crate) value: f64,
    pub(crate) default: f64,
    pub(crate) pinned: bool,
    pub(crate) unreal: Option<Unreal>,
}

impl Fraction {
    pub fn new(default: f64) -> Self {
        Self {
            value: default,
            default,
            pinned: false,
            unreal: None,
        }
    }

    /// A fraction that also prices disbelief in an unreal `effect`.
    pub fn unreal(default: f64, effect: NodeId) -> Self {
        Self {
            unreal: Some(Unreal { level: 0, effect }),
            ..Self::new(default)
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Split `total` into `(a, b)` with `a + b == total`.
    ///
    /// Only the first part is rounded; the second is the remainder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::field::Fraction;
    ///
    /// let half = Fraction::new(0.5);
    /// assert_eq!(half.split(7), (4, 3));
    /// assert_eq!(half.split(8), (4, 4));
    /// ```
    pub fn split(&self, total: i64) -> (i64, i64) {
        let a = (self.value * total as f64 + 0.5) as i64;
        (a, total - a)
    }
}

/// How a dual-ledger field fills its ledgers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerFormula {
    /// Set by hand.
    Manual,
    /// Sum of every contributor's reductions.
    Modifiers {
        mandatory: NodeId,
        optional: NodeId,
        fraction: NodeId,
        contributors: Vec<NodeId>,
    },
    /// The split budget less the modifiers.
    Totals {
        mandatory: NodeId,
        optional: NodeId,
        fraction: NodeId,
        modifiers: NodeId,
    },
    /// As totals, after the specific add-ons are taken out.
    Specific {
        mandatory: NodeId,
        optional: NodeId,
        fraction: NodeId,
        modifiers: NodeId,
        lock: NodeId,
        extras: Vec<NodeId>,
    },
}

/// Two independent ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleLedger {
    pub(crate) dn: i64,
    pub(crate) fv: i64,
    pub(crate) value: i64,
    pub(crate) limited: bool,
    pub(crate) formula: LedgerFormula,
}

impl DoubleLedger {
    pub fn new(formula: LedgerFormula) -> Self {
        Self {
            dn: 0,
            fv: 0,
            value: 0,
            limited: false,
            formula,
        }
    }

    pub fn ledgers(&self) -> (i64, i64) {
        (self.dn, self.fv)
    }

    pub(crate) fn set(&mut self, ledger: Ledger, amount: i64) {
        let amount = formula::clamp_points(amount);
        match ledger {
            Ledger::Dn => self.dn = amount,
            Ledger::Fv => self.fv = amount,
        }
    }
}

/// State of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(String),
    Scalar(Scalar),
    Calculated(Calculated),
    Composite(Composite),
    Value(ValueField),
    Modifier(ModifierField),
    Follows(FollowsField),
    Fraction(Fraction),
    Double(DoubleLedger),
}

impl FieldKind {
    pub fn variant(&self) -> Variant {
        match self {
            FieldKind::Text(_) => Variant::Text,
            FieldKind::Scalar(_) => Variant::Scalar,
            FieldKind::Calculated(_) => Variant::Calculated,
            FieldKind::Composite(_) => Variant::Composite,
            FieldKind::Value(_) => Variant::Value,
            FieldKind::Modifier(_) => Variant::ValueModifier,
            FieldKind::Follows(_) => Variant::ValueFollows,
            FieldKind::Fraction(_) => Variant::Fraction,
            FieldKind::Double(_) => Variant::Double,
        }
    }

    /// Text syntax accepted by `apply_text`.
    pub fn grammar(&self) -> Grammar {
        match self {
            FieldKind::Text(_) => Grammar::Text,
            FieldKind::Scalar(scalar) => match scalar.rule {
                ScalarRule::Charges { .. } => Grammar::Charges,
                _ => Grammar::Integer,
            },
            FieldKind::Calculated(_) => Grammar::Integer,
            FieldKind::Composite(_) => Grammar::Fixed,
            FieldKind::Value(_) => Grammar::Number,
            FieldKind::Modifier(modifier) => match modifier.rule {
                ModifierRule::Incantation { .. } => Grammar::Incantation,
                ModifierRule::Component { .. } => Grammar::Component,
                _ => Grammar::Modifier,
            },
            FieldKind::Follows(_) => Grammar::Follow,
            FieldKind::Fraction(fraction) => {
                if fraction.unreal.is_some() {
                    Grammar::Unreal
                } else {
                    Grammar::Fraction
                }
            }
            FieldKind::Double(_) => Grammar::Ledger,
        }
    }

    /// The underlying table value, for the variants that have one.
    pub fn value_field(&self) -> Option<&ValueField> {
        match self {
            FieldKind::Value(value) => Some(value),
            FieldKind::Modifier(modifier) => Some(&modifier.value),
            FieldKind::Follows(follows) => Some(&follows.value),
            _ => None,
        }
    }

    pub(crate) fn value_field_mut(&mut self) -> Option<&mut ValueField> {
        match self {
            FieldKind::Value(value) => Some(value),
            FieldKind::Modifier(modifier) => Some(&mut modifier.value),
            FieldKind::Follows(follows) => Some(&mut follows.value),
            _ => None,
        }
    }

    /// Text form of the local state; composites report their label instead.
    pub(crate) fn local_value(&self) -> Option<String> {
        match self {
            FieldKind::Text(text) => Some(text.clone()),
            FieldKind::Scalar(scalar) => Some(scalar.value.to_string()),
            FieldKind::Calculated(calculated) => Some(calculated.value.to_string()),
            FieldKind::Composite(_) => None,
            FieldKind::Value(value) => Some(format_value(value.table_value())),
            FieldKind::Modifier(modifier) => {
                if modifier.rule.indexes_absolutely() {
                    Some(modifier.value.index.to_string())
                } else {
                    Some(format_value(modifier.value.table_value()))
                }
            }
            FieldKind::Follows(follows) => Some(format_value(follows.value.table_value())),
            FieldKind::Fraction(fraction) => Some(format_value(fraction.value)),
            FieldKind::Double(double) => Some(double.value.to_string()),
        }
    }
}

/// A node in the model arena.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) name: FieldId,
    pub(crate) label: String,
    pub(crate) parent: Option<NodeId>,
    /// Nodes to push a recompute to when this one changes.
    pub(crate) dependents: Vec<NodeId>,
    /// Nodes this one pulls from.
    pub(crate) sources: Vec<NodeId>,
    pub(crate) kind: FieldKind,
}

impl Node {
    pub(crate) fn new(name: FieldId, kind: FieldKind) -> Self {
        Self {
            label: name.as_str().to_string(),
            name,
            parent: None,
            dependents: Vec::new(),
            sources: Vec::new(),
            kind,
        }
    }
}
