//! Reading and recomputing fields.
//!
//! Costs are never cached: every [`CostModel::cost`] call pulls from the
//! field's sources or children. [`CostModel::recompute`] is what a source
//! pushes when it changes; stored derived values are refreshed there and the
//! change is passed on.

use crate::field::{
    CompositeRule, EntryKind, FieldKind, FollowRule, Formula, Fraction, LedgerFormula, NodeId, ScalarRule,
    ValueField, ValueRule,
};
use crate::formula::{self, MoveSpeed};
use crate::model::CostModel;
use crate::multiplier::{Multiplier, MultiplierKind, NECROSCOPE, SHAMAN};

/// Trance unit forced on necroscopes.
const NECROSCOPE_TRANCE: usize = 5;

/// What a recompute does after refreshing state.
enum Settle {
    Propagate,
    NotifyOnly,
    Nothing,
}

/// State written back by a recompute.
enum Refresh {
    Keep(Settle),
    Scalar(i64),
    Calculated(i64),
    Index(usize),
    Multiplier(usize),
    Budget(bool),
    Ledgers {
        dn: i64,
        fv: i64,
        limited: bool,
        value: Option<i64>,
    },
}

impl CostModel {
    /// Text form of a field's value. Composites report their label.
    pub fn value(&self, id: NodeId) -> String {
        let node = self.node(id);
        node.kind
            .local_value()
            .unwrap_or_else(|| node.label.clone())
    }

    /// Current cost of a field, pulled from its inputs.
    pub fn cost(&self, id: NodeId) -> i64 {
        match &self.node(id).kind {
            FieldKind::Text(_) => 0,
            FieldKind::Scalar(scalar) => match scalar.rule {
                ScalarRule::Plain => scalar.value,
                ScalarRule::Scaled(factor) => scalar.value.saturating_mul(factor),
                ScalarRule::MultiTarget { area } => {
                    formula::multi_target_cost(scalar.value, self.cost(area))
                }
                ScalarRule::ChangeTarget {
                    area, attributes, ..
                } => formula::change_target_cost(
                    scalar.value,
                    self.cost(area),
                    self.cost(attributes),
                ),
                ScalarRule::Charges { ward } => formula::charges_cost(scalar.value, ward),
            },
            FieldKind::Calculated(calculated) => match &calculated.formula {
                Formula::Stored | Formula::Sum | Formula::HalfSum | Formula::Mandatory { .. } => {
                    calculated.value
                }
                Formula::Maintenance => {
                    formula::maintenance_cost(calculated.value, self.source_sum(id))
                }
                Formula::Focus => formula::focus_cost(calculated.value, self.source_sum(id)),
                Formula::ConcentrationAdd { concentration } => {
                    let concentrating =
                        self.cost(*concentration) + self.reduction(*concentration) > 0;
                    if calculated.value != 0 && concentrating {
                        2
                    } else {
                        0
                    }
                }
            },
            FieldKind::Composite(composite) => {
                composite.children.iter().map(|child| self.cost(*child)).sum()
            }
            FieldKind::Value(value) => match value.rule {
                ValueRule::Plain => value.base_cost(),
                ValueRule::Reception { skill } => {
                    let offset = value.multiplier.offset();
                    if offset == 0 {
                        0
                    } else {
                        offset - i64::from(self.cost(skill) == SHAMAN)
                    }
                }
                ValueRule::Trance { skill } => {
                    let refund = if self.cost(skill) == NECROSCOPE {
                        NECROSCOPE_TRANCE as i64
                    } else {
                        0
                    };
                    value.multiplier.offset() - refund
                }
            },
            FieldKind::Modifier(modifier) => modifier.cost(),
            FieldKind::Follows(follows) => match follows.rule {
                FollowRule::Mirror => {
                    if follows.tracking {
                        follows.value.base_cost() - self.cost(follows.tracked)
                    } else {
                        follows.value.base_cost()
                    }
                }
                FollowRule::Move => formula::move_cost(follows.tracking, self.source_sum(id)),
            },
            FieldKind::Fraction(fraction) => match fraction.unreal {
                Some(unreal) => formula::unreal_cost(self.cost(unreal.effect), unreal.level),
                None => 0,
            },
            FieldKind::Double(double) => double.dn + double.fv,
        }
    }

    /// Secondary indicator shown next to the cost; 0 for most fields.
    pub fn bonus(&self, id: NodeId) -> i64 {
        match &self.node(id).kind {
            FieldKind::Scalar(scalar) => match scalar.rule {
                ScalarRule::Charges { ward } => i64::from(ward),
                _ => 0,
            },
            FieldKind::Modifier(modifier) => modifier.bonus(),
            _ => 0,
        }
    }

    /// Cost routed to the reduction ledger.
    ///
    /// For a composite, the sum of its children's reductions.
    ///
    /// # Panics
    ///
    /// Panics for fields that are neither modifiers nor composites.
    pub fn reduction(&self, id: NodeId) -> i64 {
        match &self.node(id).kind {
            FieldKind::Modifier(modifier) => modifier.reduction(),
            FieldKind::Composite(_) => {
                let mut total = 0;
                self.for_each_child(id, |model, child| {
                    if let FieldKind::Modifier(modifier) = &model.node(child).kind {
                        total += modifier.reduction();
                    }
                });
                total
            }
            _ => self.wrong_variant(id, "reduction"),
        }
    }

    /// `(DN, FV)` ledgers of a double field.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not doubles.
    pub fn ledgers(&self, id: NodeId) -> (i64, i64) {
        match &self.node(id).kind {
            FieldKind::Double(double) => double.ledgers(),
            _ => self.wrong_variant(id, "ledgers"),
        }
    }

    /// Whether a budgeted composite or the modifiers ledger is over its
    /// limit.
    ///
    /// # Panics
    ///
    /// Panics for fields that are neither composites nor doubles.
    pub fn is_limited(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            FieldKind::Composite(composite) => composite.limited,
            FieldKind::Double(double) => double.limited,
            _ => self.wrong_variant(id, "is_limited"),
        }
    }

    /// Roll a modifier asks for.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not modifiers.
    pub fn comment(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            FieldKind::Modifier(modifier) => modifier.comment(),
            _ => self.wrong_variant(id, "comment"),
        }
    }

    /// Whether a modifier's cost goes to the DN ledger.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not modifiers.
    pub fn is_primary(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            FieldKind::Modifier(modifier) => modifier.primary,
            _ => self.wrong_variant(id, "is_primary"),
        }
    }

    /// Whether a composite entry is the one its composite started with.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not modifiers.
    pub fn is_initial(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            FieldKind::Modifier(modifier) => modifier.initial,
            _ => self.wrong_variant(id, "is_initial"),
        }
    }

    /// Index of an integer or table field: the value of scalars and
    /// calculated fields, the row of table fields.
    ///
    /// # Panics
    ///
    /// Panics for other variants.
    pub fn raw_index(&self, id: NodeId) -> i64 {
        match &self.node(id).kind {
            FieldKind::Scalar(scalar) => scalar.value,
            FieldKind::Calculated(calculated) => calculated.value,
            kind => match kind.value_field() {
                Some(value) => value.index as i64,
                None => self.wrong_variant(id, "raw_index"),
            },
        }
    }

    /// Name of the selected unit.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn unit(&self, id: NodeId) -> &'static str {
        self.value_field(id, "unit").multiplier.name()
    }

    /// Selected unit row.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn multiplier_index(&self, id: NodeId) -> usize {
        self.value_field(id, "multiplier_index").multiplier.index()
    }

    /// Unit names a field can select from.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn multiplier_content(&self, id: NodeId) -> Vec<String> {
        self.value_field(id, "multiplier_content").multiplier.content()
    }

    /// Row labels of a field's lookup table.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn table_content(&self, id: NodeId) -> Vec<String> {
        self.value_field(id, "table_content").table.content()
    }

    /// Attribute, roll kind and resistance of the selected skill.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn skill_basis(&self, id: NodeId) -> Option<(&'static str, &'static str, &'static str)> {
        self.value_field(id, "skill_basis").multiplier.skill_basis()
    }

    /// Whether a following field is tracking (or, for movement, enabled).
    ///
    /// # Panics
    ///
    /// Panics for fields that do not follow another.
    pub fn is_tracking(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            FieldKind::Follows(follows) => follows.tracking,
            _ => self.wrong_variant(id, "is_tracking"),
        }
    }

    /// Split `total` between the ledgers with a fraction field.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not fractions.
    pub fn split(&self, id: NodeId, total: i64) -> (i64, i64) {
        self.fraction(id).split(total)
    }

    /// Disbelief level of an unreal fraction, if it has one.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not fractions.
    pub fn disbelief(&self, id: NodeId) -> Option<i64> {
        self.fraction(id).unreal.map(|unreal| unreal.level)
    }

    /// Mass a movement field moves.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn mass(&self, id: NodeId) -> f64 {
        self.value_field(id, "mass").table_value()
    }

    /// Effect points left after paying for moving `mass` in the weight
    /// unit at `unit`. `None` when the mass is beyond the table or the unit
    /// does not exist.
    ///
    /// # Panics
    ///
    /// Panics for fields that do not follow another.
    pub fn delta_effect_mass_cost(&self, id: NodeId, mass: f64, unit: usize) -> Option<i64> {
        let FieldKind::Follows(follows) = &self.node(id).kind else {
            self.wrong_variant(id, "delta_effect_mass_cost")
        };
        let row = follows.value.table.closest_value(mass)? as i64;
        let offset = Multiplier::new(MultiplierKind::Weight).offset_at(unit)?;
        Some(self.cost(follows.tracked) - (row + offset))
    }

    /// Speed a movement budget buys in the speed unit at `unit`.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn move_speed(&self, id: NodeId, budget: i64, unit: usize) -> MoveSpeed {
        formula::move_speed(budget, unit, &self.value_field(id, "move_speed").table)
    }

    /// The FV ledger of a double field expressed as a duration.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not doubles.
    pub fn time_display(&self, id: NodeId) -> Option<(f64, &'static str)> {
        let (_, fv) = self.ledgers(id);
        formula::time_display(fv, &self.tables.values)
    }

    /// Children of a composite, in order.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not composites.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            FieldKind::Composite(composite) => &composite.children,
            _ => self.wrong_variant(id, "children"),
        }
    }

    /// Kind of repeatable entry a composite holds, or that a field is.
    pub fn entry_kind(&self, id: NodeId) -> Option<EntryKind> {
        match &self.node(id).kind {
            FieldKind::Composite(composite) => composite.entries,
            FieldKind::Modifier(modifier) => modifier.rule.entry_kind(),
            _ => None,
        }
    }

    /// Visit every child of a composite in order.
    ///
    /// # Panics
    ///
    /// Panics for fields that are not composites.
    pub fn for_each_child<F>(&self, id: NodeId, mut visit: F)
    where
        F: FnMut(&CostModel, NodeId),
    {
        for child in self.children(id) {
            visit(self, *child);
        }
    }

    /// Refresh a field after one of its sources changed, then pass the
    /// change on.
    pub fn recompute(&mut self, id: NodeId) {
        let refresh = self.refresh(id);
        let settle = match refresh {
            Refresh::Keep(settle) => settle,
            Refresh::Scalar(value) => {
                if let FieldKind::Scalar(scalar) = &mut self.node_mut(id).kind {
                    scalar.value = value;
                }
                Settle::Propagate
            }
            Refresh::Calculated(value) => {
                if let FieldKind::Calculated(calculated) = &mut self.node_mut(id).kind {
                    calculated.value = value;
                }
                Settle::Propagate
            }
            Refresh::Index(index) => {
                if let Some(value) = self.node_mut(id).kind.value_field_mut() {
                    value.index = index;
                }
                Settle::Propagate
            }
            Refresh::Multiplier(index) => {
                if let Some(value) = self.node_mut(id).kind.value_field_mut() {
                    value.multiplier.set_index(index);
                }
                Settle::Propagate
            }
            Refresh::Budget(limited) => {
                let children = match &mut self.node_mut(id).kind {
                    FieldKind::Composite(composite) => {
                        composite.limited = limited;
                        composite.children.clone()
                    }
                    _ => Vec::new(),
                };
                for child in children {
                    self.notify(child);
                }
                Settle::Propagate
            }
            Refresh::Ledgers {
                dn,
                fv,
                limited,
                value,
            } => {
                if let FieldKind::Double(double) = &mut self.node_mut(id).kind {
                    double.dn = dn;
                    double.fv = fv;
                    double.limited = limited;
                    if let Some(value) = value {
                        double.value = value;
                    }
                }
                Settle::Propagate
            }
        };

        match settle {
            Settle::Propagate => self.propagate(id),
            Settle::NotifyOnly => self.notify(id),
            Settle::Nothing => {}
        }
    }

    fn refresh(&self, id: NodeId) -> Refresh {
        match &self.node(id).kind {
            FieldKind::Scalar(scalar) => match scalar.rule {
                ScalarRule::ChangeTarget { targets, .. } => {
                    let limit = formula::change_target_limit(self.raw_index(targets));
                    Refresh::Scalar(scalar.value.clamp(0, limit))
                }
                _ => Refresh::Keep(Settle::Propagate),
            },
            FieldKind::Calculated(calculated) => match &calculated.formula {
                Formula::Sum => Refresh::Calculated(self.source_sum(id)),
                Formula::HalfSum => Refresh::Calculated(formula::halve(self.source_sum(id))),
                Formula::Mandatory { sub, casting, half } => Refresh::Calculated(
                    formula::mandatory(self.cost(*sub), self.cost(*casting), self.cost(*half)),
                ),
                _ => Refresh::Keep(Settle::Propagate),
            },
            FieldKind::Composite(composite) => match &composite.rule {
                CompositeRule::Budget {
                    mandatory,
                    optional,
                    fraction,
                } => {
                    let check = formula::budget(
                        self.cost(*mandatory),
                        self.cost(*optional),
                        self.fraction(*fraction),
                        self.cost(id),
                        self.reduction(id),
                    );
                    Refresh::Budget(check.limited)
                }
                _ => Refresh::Keep(Settle::Propagate),
            },
            FieldKind::Value(value) => match value.rule {
                ValueRule::Trance { skill } => {
                    if self.cost(skill) != NECROSCOPE {
                        Refresh::Keep(Settle::NotifyOnly)
                    } else if value.multiplier.offset() == 0 {
                        Refresh::Multiplier(NECROSCOPE_TRANCE)
                    } else {
                        Refresh::Keep(Settle::Propagate)
                    }
                }
                _ => Refresh::Keep(Settle::Propagate),
            },
            FieldKind::Follows(follows) => match follows.rule {
                FollowRule::Mirror if follows.tracking => {
                    let index = self.raw_index(follows.tracked);
                    if follows.value.table.out_of_range(index) {
                        Refresh::Keep(Settle::Nothing)
                    } else {
                        Refresh::Index(index as usize)
                    }
                }
                FollowRule::Mirror => Refresh::Keep(Settle::Nothing),
                FollowRule::Move => Refresh::Keep(Settle::Propagate),
            },
            FieldKind::Double(double) => match &double.formula {
                LedgerFormula::Manual => Refresh::Keep(Settle::Propagate),
                LedgerFormula::Modifiers {
                    mandatory,
                    optional,
                    fraction,
                    contributors,
                } => {
                    let contributions: Vec<(i64, i64)> = contributors
                        .iter()
                        .map(|contributor| self.contribution(*contributor))
                        .collect();
                    let ledgers = formula::modifier_ledgers(
                        self.cost(*mandatory),
                        self.cost(*optional),
                        self.fraction(*fraction),
                        &contributions,
                    );
                    Refresh::Ledgers {
                        dn: ledgers.dn,
                        fv: ledgers.fv,
                        limited: ledgers.limited,
                        value: None,
                    }
                }
                LedgerFormula::Totals {
                    mandatory,
                    optional,
                    fraction,
                    modifiers,
                } => {
                    let budget = self.cost(*mandatory) + self.cost(*optional);
                    let (dn, fv) =
                        formula::totals(budget, self.fraction(*fraction), self.ledgers(*modifiers));
                    Refresh::Ledgers {
                        dn,
                        fv,
                        limited: false,
                        value: None,
                    }
                }
                LedgerFormula::Specific {
                    mandatory,
                    optional,
                    fraction,
                    modifiers,
                    lock,
                    extras,
                } => {
                    let specific = -self.cost(*lock)
                        + extras.iter().map(|extra| self.cost(*extra)).sum::<i64>();
                    let budget = self.cost(*mandatory) + self.cost(*optional) - specific;
                    let (dn, fv) =
                        formula::totals(budget, self.fraction(*fraction), self.ledgers(*modifiers));
                    Refresh::Ledgers {
                        dn,
                        fv,
                        limited: false,
                        value: Some(specific),
                    }
                }
            },
            FieldKind::Text(_)
            | FieldKind::Modifier(_)
            | FieldKind::Fraction(_) => Refresh::Keep(Settle::Propagate),
        }
    }

    /// What a field adds to the `(DN, FV)` modifier ledgers.
    fn contribution(&self, id: NodeId) -> (i64, i64) {
        match &self.node(id).kind {
            FieldKind::Composite(_) | FieldKind::Modifier(_) => {
                (self.cost(id), self.reduction(id))
            }
            FieldKind::Double(double) => double.ledgers(),
            FieldKind::Fraction(fraction) if fraction.unreal.is_some() => {
                fraction.split(self.cost(id))
            }
            _ => (self.cost(id), 0),
        }
    }

    pub(crate) fn source_sum(&self, id: NodeId) -> i64 {
        self.node(id)
            .sources
            .iter()
            .map(|source| self.cost(*source))
            .sum()
    }

    pub(crate) fn fraction(&self, id: NodeId) -> &Fraction {
        match &self.node(id).kind {
            FieldKind::Fraction(fraction) => fraction,
            _ => self.wrong_variant(id, "fraction"),
        }
    }

    pub(crate) fn value_field(&self, id: NodeId, accessor: &str) -> &ValueField {
        match self.node(id).kind.value_field() {
            Some(value) => value,
            None => self.wrong_variant(id, accessor),
        }
    }

    pub(crate) fn wrong_variant(&self, id: NodeId, accessor: &str) -> ! {
        let node = self.node(id);
        panic!(
            "{accessor} called on field {} which is a {:?}",
            node.name,
            node.kind.variant()
        )
    }
}
