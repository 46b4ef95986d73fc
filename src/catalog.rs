//! The standard SFX catalog.
//!
//! Registers every field of an SFX spell sheet, in sheet order, together
//! with the constructor that wires it to the fields it reads. Constructors
//! look their sources up by name, so registration order does not have to
//! follow dependency order.

use crate::field::{
    Calculated, Composite, CompositeRule, DoubleLedger, EntryKind, FieldKind, FollowRule,
    FollowsField, Formula, Fraction, LedgerFormula, ModifierField, ModifierRule, NodeId, Scalar,
    ScalarRule, ValueField, ValueRule,
};
use crate::model::CostModel;
use crate::multiplier::{Multiplier, MultiplierKind};

/// Everything that feeds movement and maintenance.
const SUSTAINED: &[&str] = &[
    "Mandatory",
    "AreaEffect",
    "MultiTarget",
    "MultiAttribute",
    "ChangeTarget",
    "VariableEffect",
    "VariableDuration",
];

const MANDATORY_PARTS: &[&str] = &["Effect", "Range", "Speed", "Duration"];

/// Register the standard fields into `model`.
///
/// # Examples
///
/// ```rust
/// use sfxcost::{catalog, CostModel, ModelConfig};
///
/// let mut model = CostModel::from_catalog(ModelConfig::default(), catalog::standard);
/// assert_eq!(model.registry().len(), 38);
/// let area = model.field("AreaEffect");
/// assert_eq!(model.value(area), "AreaEffect");
/// ```
pub fn standard(model: &mut CostModel) {
    model.register("Name", |model| {
        model.add_node("Name", FieldKind::Text(String::new()))
    });
    model.register("Effect", |model| scalar(model, "Effect", ScalarRule::Plain));
    model.register("Range", |model| value(model, "Range", MultiplierKind::Distance));
    model.register("Speed", |model| {
        let range = model.field("Range");
        let table = model.tables().values.clone();
        let follows = FollowsField::new(
            ValueField::new(table, Multiplier::new(MultiplierKind::Speed)),
            range,
            FollowRule::Mirror,
        );
        let id = model.add_node("Speed", FieldKind::Follows(follows));
        model.add_depends(id, range);
        id
    });
    model.register("Duration", |model| value(model, "Duration", MultiplierKind::Time));
    model.register("SubMandatory", |model| {
        calculated(model, "SubMandatory", Formula::Sum, MANDATORY_PARTS)
    });
    model.register("HalfMandatory", |model| {
        calculated(model, "HalfMandatory", Formula::HalfSum, MANDATORY_PARTS)
    });
    model.register("Casting", |model| value(model, "Casting", MultiplierKind::Time));
    model.register("Mandatory", |model| {
        let sub = model.field("SubMandatory");
        let casting = model.field("Casting");
        let half = model.field("HalfMandatory");
        let formula = Formula::Mandatory { sub, casting, half };
        calculated(
            model,
            "Mandatory",
            formula,
            &["SubMandatory", "Casting", "HalfMandatory"],
        )
    });

    model.register("AreaEffect", |model| {
        let id = model.add_node(
            "AreaEffect",
            FieldKind::Composite(Composite::new(CompositeRule::Exclusive)),
        );
        let area = scalar(model, "Area", ScalarRule::Scaled(2));
        let volume = scalar(model, "Volume", ScalarRule::Scaled(5));
        let shape = value(model, "Shape", MultiplierKind::Shape);
        for child in [area, volume, shape] {
            model.add_child(id, child);
        }
        id
    });
    model.register("MultiTarget", |model| {
        let area = model.field("AreaEffect");
        let id = scalar(model, "MultiTarget", ScalarRule::MultiTarget { area });
        model.add_depends(id, area);
        id
    });
    model.register("MultiAttribute", |model| {
        value(model, "MultiAttribute", MultiplierKind::MultiAttribute)
    });
    model.register("ChangeTarget", |model| {
        let area = model.field("AreaEffect");
        let targets = model.field("MultiTarget");
        let attributes = model.field("MultiAttribute");
        let rule = ScalarRule::ChangeTarget {
            targets,
            area,
            attributes,
        };
        let id = scalar(model, "ChangeTarget", rule);
        model.set_label(id, "Change target");
        for source in [area, targets, attributes] {
            model.add_depends(id, source);
        }
        id
    });
    model.register("VariableEffect", |model| {
        scalar(model, "VariableEffect", ScalarRule::Scaled(2))
    });
    model.register("VariableDuration", |model| {
        let id = model.add_node(
            "VariableDuration",
            FieldKind::Composite(Composite::new(CompositeRule::Plain)),
        );
        let switch = value(model, "Switch", MultiplierKind::Switch);
        let extend = value(model, "Extend", MultiplierKind::Time);
        model.add_child(id, switch);
        model.add_child(id, extend);
        id
    });
    model.register("Apportation", |model| {
        let id = model.add_node(
            "Apportation",
            FieldKind::Composite(Composite::new(CompositeRule::Plain)),
        );
        let to_hit = scalar(model, "ToHit", ScalarRule::Scaled(2));

        let effect = model.field("Effect");
        let table = model.tables().values.clone();
        let movement = FollowsField::new(
            ValueField::new(table, Multiplier::new(MultiplierKind::Weight)),
            effect,
            FollowRule::Move,
        )
        .detached();
        let moved = model.add_node("Move", FieldKind::Follows(movement));
        depend(model, moved, SUSTAINED);

        model.add_child(id, to_hit);
        model.add_child(id, moved);
        id
    });
    model.register("Maintenance", |model| {
        let id = calculated(model, "Maintenance", Formula::Maintenance, SUSTAINED);
        depend(model, id, &["Apportation"]);
        id
    });
    model.register("Focus", |model| {
        calculated(model, "Focus", Formula::Focus, &["Effect", "Duration"])
    });
    model.register("Charges", |model| {
        scalar(model, "Charges", ScalarRule::Charges { ward: false })
    });
    model.register("Optional", |model| {
        calculated(
            model,
            "Optional",
            Formula::Sum,
            &[
                "AreaEffect",
                "MultiTarget",
                "MultiAttribute",
                "ChangeTarget",
                "VariableEffect",
                "VariableDuration",
                "Apportation",
                "Maintenance",
                "Focus",
                "Charges",
            ],
        )
    });

    model.register("Community", |model| {
        entries(model, "Community", CompositeRule::Plain, EntryKind::Community)
    });
    model.register("Components", |model| {
        let mandatory = model.field("Mandatory");
        let optional = model.field("Optional");
        let fraction = model.field("Fraction");
        let rule = CompositeRule::Budget {
            mandatory,
            optional,
            fraction,
        };
        let id = model.add_node(
            "Components",
            FieldKind::Composite(Composite::with_entries(rule, EntryKind::Component)),
        );
        for source in [mandatory, optional, fraction] {
            model.add_depends(id, source);
        }
        model.add_entry(id);
        id
    });
    model.register("Concentration", |model| {
        modifier(
            model,
            "Concentration",
            MultiplierKind::Time,
            ModifierRule::Concentration,
        )
    });
    model.register("Gestures", |model| {
        entries(model, "Gestures", CompositeRule::Plain, EntryKind::Gesture)
    });
    model.register("Incantation", |model| {
        let rule = ModifierRule::Incantation {
            foreign: false,
            loud: false,
            profane: false,
        };
        modifier(model, "Incantation", MultiplierKind::Incantation, rule)
    });
    model.register("RelatedSkill", |model| {
        modifier(
            model,
            "RelatedSkill",
            MultiplierKind::RelatedSkill,
            ModifierRule::RelatedSkill,
        )
    });
    model.register("Other", |model| {
        let id = model.add_node(
            "Other",
            FieldKind::Double(DoubleLedger::new(LedgerFormula::Manual)),
        );
        model.set_label(id, "Others");
        id
    });
    model.register("Unreal", |model| {
        let effect = model.field("Effect");
        let fraction = Fraction::unreal(model.config().fraction_default, effect);
        let id = model.add_node("Unreal", FieldKind::Fraction(fraction));
        model.add_depends(id, effect);
        id
    });
    model.register("Modifiers", |model| {
        let mandatory = model.field("Mandatory");
        let optional = model.field("Optional");
        let fraction = model.field("Fraction");
        let contributors: Vec<NodeId> = [
            "Community",
            "Components",
            "Concentration",
            "Gestures",
            "Incantation",
            "RelatedSkill",
            "Other",
            "Unreal",
        ]
        .iter()
        .map(|name| model.field(name))
        .collect();

        let formula = LedgerFormula::Modifiers {
            mandatory,
            optional,
            fraction,
            contributors: contributors.clone(),
        };
        let id = model.add_node("Modifiers", FieldKind::Double(DoubleLedger::new(formula)));
        for source in [mandatory, optional, fraction].into_iter().chain(contributors) {
            model.add_depends(id, source);
        }
        id
    });
    model.register("Fraction", |model| {
        let fraction = Fraction::new(model.config().fraction_default);
        model.add_node("Fraction", FieldKind::Fraction(fraction))
    });
    model.register("Total", |model| {
        let mandatory = model.field("Mandatory");
        let optional = model.field("Optional");
        let fraction = model.field("Fraction");
        let modifiers = model.field("Modifiers");
        let formula = LedgerFormula::Totals {
            mandatory,
            optional,
            fraction,
            modifiers,
        };
        let id = model.add_node("Total", FieldKind::Double(DoubleLedger::new(formula)));
        model.set_label(id, "Totals");
        for source in [mandatory, optional, fraction, modifiers] {
            model.add_depends(id, source);
        }
        id
    });

    model.register("Skill", |model| value(model, "Skill", MultiplierKind::Skill));
    model.register("ConcentrationAdd", |model| {
        let concentration = model.field("Concentration");
        calculated(
            model,
            "ConcentrationAdd",
            Formula::ConcentrationAdd { concentration },
            &["Concentration"],
        )
    });
    model.register("Reception", |model| {
        let skill = model.field("Skill");
        skill_value(
            model,
            "Reception",
            MultiplierKind::Reception,
            ValueRule::Reception { skill },
        )
    });
    model.register("Trance", |model| {
        let skill = model.field("Skill");
        skill_value(
            model,
            "Trance",
            MultiplierKind::Trance,
            ValueRule::Trance { skill },
        )
    });
    model.register("Lock", |model| value(model, "Lock", MultiplierKind::Lock));
    model.register("Countenance", |model| {
        value(model, "Countenance", MultiplierKind::Countenance)
    });
    model.register("Specific", |model| {
        let mandatory = model.field("Mandatory");
        let optional = model.field("Optional");
        let fraction = model.field("Fraction");
        let modifiers = model.field("Modifiers");
        let lock = model.field("Lock");
        let extras: Vec<NodeId> = ["ConcentrationAdd", "Reception", "Trance", "Countenance"]
            .iter()
            .map(|name| model.field(name))
            .collect();

        let formula = LedgerFormula::Specific {
            mandatory,
            optional,
            fraction,
            modifiers,
            lock,
            extras: extras.clone(),
        };
        let id = model.add_node("Specific", FieldKind::Double(DoubleLedger::new(formula)));
        model.set_label(id, "Totals");
        for source in [mandatory, optional, fraction, modifiers, lock]
            .into_iter()
            .chain(extras)
        {
            model.add_depends(id, source);
        }
        id
    });
}

fn scalar(model: &mut CostModel, name: &str, rule: ScalarRule) -> NodeId {
    model.add_node(name, FieldKind::Scalar(Scalar::new(rule)))
}

fn value(model: &mut CostModel, name: &str, kind: MultiplierKind) -> NodeId {
    let table = model.tables().values.clone();
    model.add_node(
        name,
        FieldKind::Value(ValueField::new(table, Multiplier::new(kind))),
    )
}

fn skill_value(model: &mut CostModel, name: &str, kind: MultiplierKind, rule: ValueRule) -> NodeId {
    let table = model.tables().values.clone();
    let field = ValueField::new(table, Multiplier::new(kind)).with_rule(rule);
    let id = model.add_node(name, FieldKind::Value(field));
    depend(model, id, &["Skill"]);
    id
}

fn modifier(model: &mut CostModel, name: &str, kind: MultiplierKind, rule: ModifierRule) -> NodeId {
    let table = model.tables().values.clone();
    let field = ModifierField::new(ValueField::new(table, Multiplier::new(kind)), rule);
    model.add_node(name, FieldKind::Modifier(field))
}

fn calculated(model: &mut CostModel, name: &str, formula: Formula, sources: &[&str]) -> NodeId {
    let id = model.add_node(name, FieldKind::Calculated(Calculated::new(formula)));
    depend(model, id, sources);
    id
}

fn entries(model: &mut CostModel, name: &str, rule: CompositeRule, kind: EntryKind) -> NodeId {
    let id = model.add_node(
        name,
        FieldKind::Composite(Composite::with_entries(rule, kind)),
    );
    model.add_entry(id);
    id
}

fn depend(model: &mut CostModel, id: NodeId, sources: &[&str]) {
    for name in sources {
        let source = model.field(name);
        model.add_depends(id, source);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Variant;

    #[test]
    fn test_registers_in_sheet_order() {
        let model = CostModel::standard();
        let names: Vec<&str> = model.registry().names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names.len(), 38);
        assert_eq!(names[0], "Name");
        assert_eq!(names[8], "Mandatory");
        assert_eq!(names[37], "Specific");
        assert_eq!(model.registry().pending(), 38);
    }

    #[test]
    fn test_forward_references_resolve() {
        let mut model = CostModel::standard();
        // Modifiers reads Fraction, which is registered after it.
        let modifiers = model.field("Modifiers");
        let fraction = model.field("Fraction");
        assert!(model.sources(modifiers).contains(&fraction));

        model.build_all();
        assert_eq!(model.registry().pending(), 0);
    }

    #[test]
    fn test_labels() {
        let mut model = CostModel::standard();
        for (name, label) in [
            ("ChangeTarget", "Change target"),
            ("Other", "Others"),
            ("Total", "Totals"),
            ("Specific", "Totals"),
            ("Effect", "Effect"),
        ] {
            let id = model.field(name);
            assert_eq!(model.label(id), label);
        }
    }

    #[test]
    fn test_entry_composites_start_with_one_entry() {
        let mut model = CostModel::standard();
        for name in ["Community", "Components", "Gestures"] {
            let id = model.field(name);
            let children = model.children(id);
            assert_eq!(children.len(), 1, "{name}");
            assert_eq!(model.variant(children[0]), Variant::ValueModifier);
        }
    }

    #[test]
    fn test_mandatory_reads_real_half() {
        let mut model = CostModel::standard();
        let effect = model.field("Effect");
        let casting = model.field("Casting");
        let mandatory = model.field("Mandatory");

        model.apply_delta(effect, 10);
        model.apply_delta(casting, 8);
        // sub 10 - casting 8 = 2, half 5
        assert_eq!(model.cost(mandatory), 5);
    }
}
