//! Field reports.
//!
//! Contains the `FieldReport` type, a serializable snapshot of one field as
//! a spell sheet would show it.

use crate::field::{FieldKind, NodeId};
use crate::field_id::FieldId;
use crate::model::CostModel;
use serde::{Deserialize, Serialize};

/// A snapshot of a field's presented state.
///
/// Reports are detached from the model: they hold no handles and stay
/// valid after the model changes or is reloaded.
///
/// # Examples
///
/// ```rust
/// use sfxcost::CostModel;
///
/// let mut model = CostModel::standard();
/// let effect = model.field("Effect");
/// model.apply_delta(effect, 3);
///
/// let report = model.report(effect);
/// assert_eq!(report.value, "3");
/// assert_eq!(report.cost, 3);
/// assert!(report.ledgers.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldReport {
    /// Registry name.
    pub name: FieldId,

    /// Presented label.
    pub label: String,

    /// Text form of the value.
    pub value: String,

    pub cost: i64,

    pub bonus: i64,

    /// Cost routed to reduction, for modifiers and composites.
    pub reduction: Option<i64>,

    /// `(DN, FV)`, for double fields.
    pub ledgers: Option<(i64, i64)>,

    /// Over-limit flag, for composites and doubles.
    pub limited: Option<bool>,

    /// Roll the field asks for, for modifiers.
    pub comment: Option<String>,
}

impl FieldReport {
    /// A report with only the fields every variant has.
    pub fn new(name: FieldId, label: impl Into<String>, value: impl Into<String>, cost: i64) -> Self {
        Self {
            name,
            label: label.into(),
            value: value.into(),
            cost,
            bonus: 0,
            reduction: None,
            ledgers: None,
            limited: None,
            comment: None,
        }
    }
}

impl CostModel {
    /// Snapshot one field.
    pub fn report(&self, id: NodeId) -> FieldReport {
        let mut report = FieldReport::new(
            self.name(id).clone(),
            self.label(id),
            self.value(id),
            self.cost(id),
        );
        report.bonus = self.bonus(id);

        match self.kind(id) {
            FieldKind::Modifier(_) => {
                report.reduction = Some(self.reduction(id));
                report.comment = Some(self.comment(id));
            }
            FieldKind::Composite(_) => {
                report.reduction = Some(self.reduction(id));
                report.limited = Some(self.is_limited(id));
            }
            FieldKind::Double(_) => {
                report.ledgers = Some(self.ledgers(id));
                report.limited = Some(self.is_limited(id));
            }
            _ => {}
        }
        report
    }

    /// Snapshot every built field, in registration order.
    pub fn reports(&self) -> Vec<FieldReport> {
        self.registry
            .names()
            .iter()
            .filter_map(|name| self.registry.built(name))
            .map(|id| self.report(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_report() {
        let mut model = CostModel::standard();
        let other = model.field("Other");
        model.apply_text(other, "FV 2").unwrap();

        let report = model.report(other);
        assert_eq!(report.label, "Others");
        assert_eq!(report.ledgers, Some((0, 2)));
        assert_eq!(report.cost, 2);
        assert_eq!(report.limited, Some(false));
    }

    #[test]
    fn test_modifier_report_has_comment() {
        let mut model = CostModel::standard();
        let skill = model.field("RelatedSkill");
        let report = model.report(skill);
        assert_eq!(report.comment.as_deref(), Some("None"));
        assert_eq!(report.reduction, Some(0));
    }

    #[test]
    fn test_reports_cover_built_fields() {
        let mut model = CostModel::standard();
        model.field("Effect");
        assert_eq!(model.reports().len(), 1);

        model.build_all();
        let reports = model.reports();
        assert_eq!(reports.len(), 38);
        assert_eq!(reports[0].name, FieldId::from_str("Name"));
    }

    #[test]
    fn test_report_serializes() {
        let mut model = CostModel::standard();
        let total = model.field("Total");
        let json = serde_json::to_value(model.report(total)).unwrap();
        assert_eq!(json["name"], "Total");
        assert_eq!(json["ledgers"][0], 0);
    }
}
