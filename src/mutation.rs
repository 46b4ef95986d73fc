//! Changing fields.
//!
//! Every mutation either applies and propagates, or is rejected and leaves
//! the model untouched. Text input is parsed with the grammar the field
//! advertises before anything changes, so a parse error never leaves a
//! partial update behind.

use crate::command::{Command, IncantationFlag, Ledger, Outcome};
use crate::error::FieldError;
use crate::field::{
    CompositeRule, EntryKind, FieldKind, FollowRule, ModifierField, ModifierRule, NodeId,
    ScalarRule, ValueField,
};
use crate::formula;
use crate::model::CostModel;
use crate::multiplier::{Multiplier, MultiplierKind};
use std::fmt;

impl CostModel {
    /// Adjust a field by `delta`.
    ///
    /// What a delta means depends on the field: integer fields add it,
    /// table fields move their row by it (composite entries jump to row
    /// `delta`), calculated and double fields store it as their value, and
    /// the rest just propagate.
    ///
    /// # Returns
    ///
    /// [`Outcome::Rejected`] when the resulting row falls outside the
    /// field's table. Nothing changes and nothing is propagated then.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::{CostModel, Outcome};
    ///
    /// let mut model = CostModel::standard();
    /// let duration = model.field("Duration");
    ///
    /// assert_eq!(model.apply_delta(duration, 5), Outcome::Applied);
    /// assert_eq!(model.cost(duration), 5);
    ///
    /// assert_eq!(model.apply_delta(duration, 500), Outcome::Rejected);
    /// assert_eq!(model.cost(duration), 5);
    /// ```
    pub fn apply_delta(&mut self, id: NodeId, delta: i64) -> Outcome {
        let limit = self.change_limit(id);
        let tracked = self.tracked_index(id);

        let applied = match &mut self.node_mut(id).kind {
            FieldKind::Text(_) | FieldKind::Composite(_) | FieldKind::Fraction(_) => true,
            FieldKind::Scalar(scalar) => {
                scalar.shift(delta);
                if let Some(limit) = limit {
                    scalar.value = scalar.value.min(limit);
                }
                true
            }
            FieldKind::Calculated(calculated) => {
                calculated.value = formula::clamp_points(delta);
                true
            }
            FieldKind::Value(value) => (value.index as i64)
                .checked_add(delta)
                .is_some_and(|index| value.try_index(index)),
            FieldKind::Modifier(modifier) => {
                let index = if modifier.rule.indexes_absolutely() {
                    Some(delta)
                } else {
                    (modifier.value.index as i64).checked_add(delta)
                };
                index.is_some_and(|index| modifier.value.try_index(index))
            }
            FieldKind::Follows(follows) => {
                let index = match (follows.rule, tracked) {
                    (FollowRule::Mirror, Some(tracked)) if follows.tracking => Some(tracked),
                    _ => (follows.value.index as i64).checked_add(delta),
                };
                index.is_some_and(|index| follows.value.try_index(index))
            }
            FieldKind::Double(double) => {
                double.value = formula::clamp_points(delta);
                true
            }
        };

        self.conclude(id, applied, format_args!("delta {delta}"))
    }

    /// Parse `text` with the field's grammar and apply it.
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome)` - the command was understood; see
    ///   [`apply_command`](Self::apply_command)
    /// * `Err(FieldError::Parse)` - the text does not match the grammar;
    ///   the model is unchanged
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::{CostModel, FieldError};
    ///
    /// let mut model = CostModel::standard();
    /// let other = model.field("Other");
    ///
    /// model.apply_text(other, "DN 3").unwrap();
    /// assert_eq!(model.ledgers(other), (3, 0));
    ///
    /// let err = model.apply_text(other, "DN three").unwrap_err();
    /// assert!(matches!(err, FieldError::Parse { .. }));
    /// assert_eq!(model.ledgers(other), (3, 0));
    /// ```
    pub fn apply_text(&mut self, id: NodeId, text: &str) -> Result<Outcome, FieldError> {
        let node = self.node(id);
        let command = node.kind.grammar().parse(&node.name, text)?;
        self.apply_command(id, command)
    }

    /// Apply a typed command.
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome::Applied)` - the state changed and was propagated
    /// * `Ok(Outcome::Rejected)` - the value is outside the field's range
    /// * `Err(FieldError::UnsupportedCommand)` - the field has no such
    ///   operation; the model is unchanged
    pub fn apply_command(&mut self, id: NodeId, command: Command) -> Result<Outcome, FieldError> {
        let limit = self.change_limit(id);
        let tracked = self.tracked_index(id);

        let applied = match (&mut self.node_mut(id).kind, &command) {
            (FieldKind::Text(text), Command::Text(new)) => {
                *text = new.clone();
                Some(true)
            }
            (FieldKind::Scalar(scalar), Command::Integer(n)) => {
                scalar.assign(*n);
                if let Some(limit) = limit {
                    scalar.value = scalar.value.min(limit);
                }
                Some(true)
            }
            (FieldKind::Scalar(scalar), Command::Charges { count, ward }) => {
                if let ScalarRule::Charges { ward: warded } = &mut scalar.rule {
                    *warded = *ward;
                    scalar.assign(*count as i64);
                    Some(true)
                } else {
                    None
                }
            }
            (FieldKind::Calculated(calculated), Command::Integer(n)) => {
                calculated.value = formula::clamp_points(*n).max(0);
                Some(true)
            }
            (FieldKind::Value(value), Command::Integer(n)) => Some(value.try_closest(*n as f64)),
            (FieldKind::Value(value), Command::Number(n)) => Some(value.try_closest(*n)),
            (FieldKind::Modifier(modifier), Command::Ledger(ledger)) => {
                modifier.primary = *ledger == Ledger::Dn;
                Some(true)
            }
            (FieldKind::Modifier(modifier), Command::Integer(n)) => {
                Some(modifier.value.try_closest(*n as f64))
            }
            (FieldKind::Modifier(modifier), Command::Number(n)) => {
                Some(modifier.value.try_closest(*n))
            }
            (FieldKind::Modifier(modifier), Command::Incantation(flag, on)) => {
                match &mut modifier.rule {
                    ModifierRule::Incantation {
                        foreign,
                        loud,
                        profane,
                    } => {
                        match flag {
                            IncantationFlag::Foreign => *foreign = *on,
                            IncantationFlag::Loud => *loud = *on,
                            IncantationFlag::Profane => *profane = *on,
                        }
                        Some(true)
                    }
                    _ => None,
                }
            }
            (FieldKind::Modifier(modifier), Command::Destroyed(on)) => match &mut modifier.rule {
                ModifierRule::Component { destroyed } => {
                    *destroyed = *on;
                    Some(true)
                }
                _ => None,
            },
            (FieldKind::Follows(follows), Command::Track(on)) => {
                follows.tracking = *on;
                if let (true, FollowRule::Mirror, Some(tracked)) = (*on, follows.rule, tracked) {
                    follows.value.try_index(tracked);
                }
                Some(true)
            }
            (FieldKind::Follows(follows), Command::Integer(n)) => {
                Some(follows.value.try_closest(*n as f64))
            }
            (FieldKind::Follows(follows), Command::Number(n)) => {
                Some(follows.value.try_closest(*n))
            }
            (FieldKind::Fraction(fraction), Command::PinDefault(pin)) => {
                fraction.pinned = *pin;
                if *pin {
                    fraction.value = fraction.default;
                }
                Some(true)
            }
            (FieldKind::Fraction(fraction), Command::Integer(n)) => {
                Some(set_proportion(fraction, *n as f64))
            }
            (FieldKind::Fraction(fraction), Command::Number(n)) => {
                Some(set_proportion(fraction, *n))
            }
            (FieldKind::Fraction(fraction), Command::Level(level)) => match &mut fraction.unreal {
                Some(unreal) => {
                    let in_range = (0..=100).contains(level);
                    if in_range {
                        unreal.level = *level;
                    }
                    Some(in_range)
                }
                None => None,
            },
            (FieldKind::Double(double), Command::Integer(n)) => {
                double.value = formula::clamp_points(*n);
                Some(true)
            }
            (FieldKind::Double(double), Command::LedgerValue(ledger, amount)) => {
                double.set(*ledger, *amount);
                Some(true)
            }
            _ => None,
        };

        match applied {
            Some(applied) => Ok(self.conclude(id, applied, &command)),
            None => Err(FieldError::UnsupportedCommand {
                field: self.node(id).name.clone(),
                command: command.to_string(),
            }),
        }
    }

    /// Select a unit for a table field.
    ///
    /// # Returns
    ///
    /// [`Outcome::Rejected`] when `index` is past the last unit.
    ///
    /// # Panics
    ///
    /// Panics for fields without a table value.
    pub fn set_multiplier_index(&mut self, id: NodeId, index: usize) -> Outcome {
        let applied = match self.node_mut(id).kind.value_field_mut() {
            Some(value) => value.multiplier.set_index(index),
            None => self.wrong_variant(id, "set_multiplier_index"),
        };
        self.conclude(id, applied, format_args!("unit {index}"))
    }

    /// Attach `child` to `composite`: the child pushes its changes to the
    /// composite, and listeners are told it was added.
    ///
    /// # Panics
    ///
    /// Panics if `composite` is not a composite.
    pub fn add_child(&mut self, composite: NodeId, child: NodeId) {
        match &mut self.node_mut(composite).kind {
            FieldKind::Composite(group) => group.children.push(child),
            _ => self.wrong_variant(composite, "add_child"),
        }
        let node = self.node_mut(child);
        node.parent = Some(composite);
        node.dependents.push(composite);
        tracing::debug!(
            composite = %self.node(composite).name,
            child = %child,
            "child added"
        );
        self.emit_added(child);
        self.recompute(composite);
    }

    /// Detach `child` from `composite`, telling listeners first, then
    /// recompute the composite.
    ///
    /// # Panics
    ///
    /// Panics if `composite` is not a composite or `child` is not one of its
    /// children.
    pub fn remove_child(&mut self, composite: NodeId, child: NodeId) {
        if !self.children(composite).contains(&child) {
            panic!(
                "{child} is not a child of {}",
                self.node(composite).name
            );
        }
        self.emit_removed(child);

        if let FieldKind::Composite(group) = &mut self.node_mut(composite).kind {
            group.children.retain(|c| *c != child);
        }
        let node = self.node_mut(child);
        node.parent = None;
        if let Some(pos) = node.dependents.iter().position(|d| *d == composite) {
            node.dependents.remove(pos);
        }
        tracing::debug!(
            composite = %self.node(composite).name,
            child = %child,
            "child removed"
        );
        self.recompute(composite);
    }

    /// Create a new entry in a composite of repeatable entries and attach
    /// it. The first entry a composite gets is marked initial.
    ///
    /// # Panics
    ///
    /// Panics if `composite` does not hold repeatable entries.
    pub fn add_entry(&mut self, composite: NodeId) -> NodeId {
        let (kind, first) = match &self.node(composite).kind {
            FieldKind::Composite(group) => match group.entries {
                Some(kind) => (kind, group.children.is_empty()),
                None => self.wrong_variant(composite, "add_entry"),
            },
            _ => self.wrong_variant(composite, "add_entry"),
        };

        let (table, multiplier, rule) = match kind {
            EntryKind::Community => (
                self.tables.community.clone(),
                MultiplierKind::Community,
                ModifierRule::Community,
            ),
            EntryKind::Component => (
                self.tables.bonus.clone(),
                MultiplierKind::Component,
                ModifierRule::Component { destroyed: false },
            ),
            EntryKind::Gesture => (
                self.tables.bonus.clone(),
                MultiplierKind::Gesture,
                ModifierRule::Gesture,
            ),
        };
        let mut entry = ModifierField::new(ValueField::new(table, Multiplier::new(multiplier)), rule);
        entry.initial = first;

        let name = self.node(composite).name.clone();
        let label = self.node(composite).label.clone();
        let id = self.add_node(name, FieldKind::Modifier(entry));
        self.set_label(id, label);
        self.add_child(composite, id);
        id
    }

    /// Add a sibling entry next to `entry`.
    ///
    /// # Panics
    ///
    /// Panics if `entry` is not an attached composite entry.
    pub fn duplicate(&mut self, entry: NodeId) -> NodeId {
        match (self.entry_kind(entry), self.node(entry).parent) {
            (Some(_), Some(parent)) => self.add_entry(parent),
            _ => panic!("{} is not a composite entry", self.node(entry).name),
        }
    }

    fn conclude(&mut self, id: NodeId, applied: bool, request: impl fmt::Display) -> Outcome {
        if applied {
            self.clear_exclusive_siblings(id);
            self.propagate(id);
            Outcome::Applied
        } else {
            tracing::trace!(
                field = %self.node(id).name,
                request = %request,
                "request out of range"
            );
            Outcome::Rejected
        }
    }

    /// When `id` sits in an exclusive composite and now costs something,
    /// zero its siblings. Siblings are only notified; the composite is
    /// recomputed when `id` propagates.
    fn clear_exclusive_siblings(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let siblings = match &self.node(parent).kind {
            FieldKind::Composite(group) if group.rule == CompositeRule::Exclusive => {
                group.children.clone()
            }
            _ => return,
        };
        if self.cost(id) <= 0 {
            return;
        }

        for sibling in siblings.into_iter().filter(|s| *s != id) {
            let cleared = match &mut self.node_mut(sibling).kind {
                FieldKind::Scalar(scalar) => {
                    let changed = scalar.value != 0;
                    scalar.value = 0;
                    changed
                }
                // The unit stays selected.
                kind => match kind.value_field_mut() {
                    Some(value) => {
                        let changed = value.index != 0;
                        value.index = 0;
                        changed
                    }
                    None => false,
                },
            };
            if cleared {
                self.notify(sibling);
            }
        }
    }

    fn change_limit(&self, id: NodeId) -> Option<i64> {
        match &self.node(id).kind {
            FieldKind::Scalar(scalar) => match scalar.rule {
                ScalarRule::ChangeTarget { targets, .. } => {
                    Some(formula::change_target_limit(self.raw_index(targets)))
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn tracked_index(&self, id: NodeId) -> Option<i64> {
        match &self.node(id).kind {
            FieldKind::Follows(follows) if follows.rule == FollowRule::Mirror => {
                Some(self.raw_index(follows.tracked))
            }
            _ => None,
        }
    }
}

fn set_proportion(fraction: &mut crate::field::Fraction, value: f64) -> bool {
    if !(0.0..=1.0).contains(&value) {
        return false;
    }
    fraction.value = if fraction.pinned {
        fraction.default
    } else {
        value
    };
    true
}
