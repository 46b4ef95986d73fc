use proptest::prelude::*;
use sfxcost::field::Fraction;
use sfxcost::*;

proptest! {
    /// Integer fields never go negative, whatever the deltas.
    #[test]
    fn test_scalar_never_negative(deltas in prop::collection::vec(-20i64..20, 1..30)) {
        let mut model = CostModel::standard();
        let effect = model.field("Effect");
        for delta in deltas {
            model.apply_delta(effect, delta);
            prop_assert!(model.raw_index(effect) >= 0);
            prop_assert_eq!(model.cost(effect), model.raw_index(effect));
        }
    }

    /// Charges stay on multiples of five.
    #[test]
    fn test_charges_multiple_of_five(deltas in prop::collection::vec(-12i64..12, 1..30)) {
        let mut model = CostModel::standard();
        let charges = model.field("Charges");
        for delta in deltas {
            model.apply_delta(charges, delta);
            let value = model.raw_index(charges);
            prop_assert!(value >= 0);
            prop_assert_eq!(value % 5, 0);
        }
    }

    /// The two parts of a split always add back up.
    #[test]
    fn test_split_sums_to_total(value in 0.0f64..=1.0, total in 0i64..100_000) {
        let mut model = CostModel::standard();
        let id = model.field("Fraction");
        prop_assert_eq!(model.apply_command(id, Command::Number(value)).unwrap(), Outcome::Applied);

        let (a, b) = model.split(id, total);
        prop_assert_eq!(a + b, total);
        prop_assert!((0..=total).contains(&a));
        prop_assert_eq!(Fraction::new(value).split(total), (a, b));
    }

    /// A modifier's cost lands in exactly one of cost and reduction.
    #[test]
    fn test_modifier_exclusive(index in 0i64..8, unit in 0usize..8, primary in any::<bool>()) {
        let mut model = CostModel::standard();
        let skill = model.field("RelatedSkill");
        model.apply_delta(skill, index);
        model.set_multiplier_index(skill, unit);
        let ledger = if primary { Ledger::Dn } else { Ledger::Fv };
        model.apply_command(skill, Command::Ledger(ledger)).unwrap();

        let combined = match model.kind(skill) {
            FieldKind::Modifier(modifier) => modifier.combined(),
            _ => unreachable!(),
        };
        let (cost, reduction) = (model.cost(skill), model.reduction(skill));
        prop_assert_eq!(cost + reduction, combined);
        if combined != 0 {
            prop_assert!((cost == 0) != (reduction == 0));
        }
        prop_assert_eq!(cost != 0, primary && combined != 0);
    }

    /// Looking up a row's own value finds that row.
    #[test]
    fn test_closest_value_finds_row(row in 0usize..100) {
        let table = LookupTable::values(100);
        prop_assert_eq!(table.closest_value(table.value(row)), Some(row));
    }
}
