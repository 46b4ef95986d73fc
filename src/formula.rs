//! Derived-cost formulas.
//!
//! The arithmetic behind calculated fields, kept free of graph access so
//! each rule can be checked on its own. [`evaluate`](crate::evaluate) pulls
//! the inputs out of the model and calls into here.
//!
//! All divisions truncate toward zero.

use crate::field::Fraction;
use crate::multiplier::{Multiplier, MultiplierKind};
use crate::table::LookupTable;

/// Largest amount a single entered field may hold.
pub const POINT_CEILING: i64 = 1_000_000_000;

/// Clamp an entered amount to `-POINT_CEILING..=POINT_CEILING`.
pub fn clamp_points(amount: i64) -> i64 {
    amount.clamp(-POINT_CEILING, POINT_CEILING)
}

/// `max(sub - casting, half)`.
///
/// # Examples
///
/// ```rust
/// use sfxcost::formula::mandatory;
///
/// assert_eq!(mandatory(8, 0, 4), 8);
/// assert_eq!(mandatory(8, 6, 4), 4);
/// ```
pub fn mandatory(sub: i64, casting: i64, half: i64) -> i64 {
    (sub - casting).max(half)
}

/// Half of a sum.
pub fn halve(sum: i64) -> i64 {
    sum / 2
}

/// Target count cost: triple, or six times when an area is set.
pub fn multi_target_cost(targets: i64, area_cost: i64) -> i64 {
    if area_cost > 0 {
        targets.saturating_mul(6)
    } else {
        targets.saturating_mul(3)
    }
}

/// Change-target cost: five per target, plus half again for an area and
/// half again for multiple attributes, rounded up.
pub fn change_target_cost(value: i64, area_cost: i64, attribute_cost: i64) -> i64 {
    let halves = 2 + i64::from(area_cost > 0) + i64::from(attribute_cost > 0);
    value
        .saturating_mul(5 * halves)
        .saturating_add(1)
        / 2
}

/// Largest number of targets a change can apply to.
pub fn change_target_limit(targets: i64) -> i64 {
    if targets == 0 {
        1
    } else {
        targets
    }
}

/// Charges cost two points each, plus ten percent when warded.
pub fn charges_cost(charges: i64, ward: bool) -> i64 {
    if ward {
        charges.saturating_mul(2 * 110) / 100
    } else {
        charges.saturating_mul(2)
    }
}

/// Maintenance costs a tenth of what it sustains when switched on.
pub fn maintenance_cost(switch: i64, sustained: i64) -> i64 {
    if switch == 0 {
        0
    } else {
        10 * sustained / 100
    }
}

/// Focus costs a fifth of the effect and duration, rounded up, when
/// switched on.
pub fn focus_cost(switch: i64, focused: i64) -> i64 {
    if switch == 0 {
        0
    } else {
        (focused + 4) / 5
    }
}

/// Movement costs a tenth of everything it moves, rounded up.
pub fn move_cost(enabled: bool, moved: i64) -> i64 {
    if enabled {
        (moved + 9) / 10
    } else {
        0
    }
}

/// Disbelief cost: `level` percent of the effect, rounded up.
pub fn unreal_cost(effect_cost: i64, level: i64) -> i64 {
    effect_cost.saturating_mul(level).saturating_add(99) / 100
}

/// Outcome of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetCheck {
    /// The ceiling neither sum may exceed.
    pub limit: i64,
    /// Whether either sum exceeds it.
    pub limited: bool,
}

/// Component budget.
///
/// The mandatory and optional totals are split by the fraction, each half
/// is halved again rounding up, and the smaller of the two is the ceiling
/// for both the active cost and the reductions.
///
/// # Examples
///
/// ```rust
/// use sfxcost::field::Fraction;
/// use sfxcost::formula::budget;
///
/// let half = Fraction::new(0.5);
/// let check = budget(8, 2, &half, 3, 0);
/// assert_eq!(check.limit, 3);
/// assert!(!check.limited);
///
/// assert!(budget(8, 2, &half, 0, 4).limited);
/// ```
pub fn budget(
    mandatory: i64,
    optional: i64,
    fraction: &Fraction,
    cost: i64,
    reductions: i64,
) -> BudgetCheck {
    let total = mandatory + optional;
    let (first, _) = fraction.split(total);
    let fv = total - first;
    let dn = total - fv;
    let limit = ((dn + 1) / 2).min((fv + 1) / 2);
    BudgetCheck {
        limit,
        limited: cost > limit || reductions > limit,
    }
}

/// Filled ledgers of the modifiers field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierLedgers {
    pub dn: i64,
    pub fv: i64,
    pub limited: bool,
}

/// Modifier ledgers from per-contributor `(dn, fv)` reductions.
///
/// Either ledger may use at most half of its share of the split budget,
/// and together they may not exceed the mandatory total.
pub fn modifier_ledgers(
    mandatory: i64,
    optional: i64,
    fraction: &Fraction,
    contributions: &[(i64, i64)],
) -> ModifierLedgers {
    let total = mandatory + optional;
    let (limit_dn, limit_fv) = fraction.split(total);
    let (dn, fv) = contributions
        .iter()
        .fold((0, 0), |(dn, fv), (a, b)| (dn + a, fv + b));
    let limited = dn > limit_dn / 2 || fv > limit_fv / 2 || dn + fv > mandatory;
    ModifierLedgers { dn, fv, limited }
}

/// Final ledgers: the split of `budget` less the modifier ledgers, floored
/// at zero.
pub fn totals(budget: i64, fraction: &Fraction, modifiers: (i64, i64)) -> (i64, i64) {
    let (dn, fv) = fraction.split(budget);
    ((dn - modifiers.0).max(0), (fv - modifiers.1).max(0))
}

/// What a movement budget buys at a given speed unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveSpeed {
    /// Distance per round in the chosen unit.
    Speed(f64),
    /// The unit alone costs more than the budget.
    BelowBase,
    /// The remaining budget is beyond the table.
    OutOfRange,
}

/// Speed a cost budget buys in the speed unit at `unit`.
pub fn move_speed(budget: i64, unit: usize, table: &LookupTable) -> MoveSpeed {
    let base = Multiplier::new(MultiplierKind::Speed)
        .offset_at(unit)
        .unwrap_or(0);
    if base > budget {
        return MoveSpeed::BelowBase;
    }
    let remaining = budget - base;
    if table.out_of_range(remaining) {
        return MoveSpeed::OutOfRange;
    }
    MoveSpeed::Speed(table.value(remaining as usize))
}

/// Express a focus-ledger cost as a duration: the largest time unit whose
/// offset fits, and the table value of what is left.
///
/// # Examples
///
/// ```rust
/// use sfxcost::formula::time_display;
/// use sfxcost::LookupTable;
///
/// let table = LookupTable::values(100);
/// assert_eq!(time_display(11, &table), Some((2.5, "minutes")));
/// assert_eq!(time_display(3, &table), Some((4.0, "seconds")));
/// ```
pub fn time_display(fv: i64, table: &LookupTable) -> Option<(f64, &'static str)> {
    let mut time = Multiplier::new(MultiplierKind::Time);
    for index in 1..time.len() {
        match time.offset_at(index) {
            Some(offset) if offset <= fv => {
                time.set_index(index);
            }
            _ => break,
        }
    }
    let remaining = fv - time.offset();
    if table.out_of_range(remaining) {
        return None;
    }
    Some((table.value(remaining as usize), time.name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandatory_takes_larger() {
        assert_eq!(mandatory(3 + 5, 0, 0), 8);
        assert_eq!(mandatory(10, 9, 5), 5);
    }

    #[test]
    fn test_change_target_cost_rounds_up() {
        assert_eq!(change_target_cost(1, 0, 0), 5);
        assert_eq!(change_target_cost(1, 2, 0), 8);
        assert_eq!(change_target_cost(1, 2, 3), 10);
        assert_eq!(change_target_cost(3, 1, 0), 23);
    }

    #[test]
    fn test_switch_costs() {
        assert_eq!(maintenance_cost(0, 50), 0);
        assert_eq!(maintenance_cost(1, 57), 5);
        assert_eq!(focus_cost(1, 6), 2);
        assert_eq!(focus_cost(0, 6), 0);
        assert_eq!(move_cost(false, 40), 0);
        assert_eq!(move_cost(true, 41), 5);
    }

    #[test]
    fn test_charges_and_unreal() {
        assert_eq!(charges_cost(10, false), 20);
        assert_eq!(charges_cost(10, true), 22);
        assert_eq!(unreal_cost(10, 25), 3);
        assert_eq!(unreal_cost(0, 75), 0);
    }

    #[test]
    fn test_costs_saturate() {
        assert_eq!(charges_cost(i64::MAX, false), i64::MAX);
        assert_eq!(charges_cost(i64::MAX, true), i64::MAX / 100);
        assert_eq!(multi_target_cost(i64::MAX, 1), i64::MAX);
        assert_eq!(change_target_cost(i64::MAX, 1, 1), i64::MAX / 2);
        assert_eq!(unreal_cost(i64::MAX, 100), i64::MAX / 100);
        assert_eq!(clamp_points(i64::MIN), -POINT_CEILING);
    }

    #[test]
    fn test_budget_limit_set_and_cleared() {
        let half = Fraction::new(0.5);
        // total 10 splits 5/5, ceiling 3
        let over = budget(6, 4, &half, 0, 4);
        assert_eq!(over.limit, 3);
        assert!(over.limited);

        let under = budget(6, 4, &half, 0, 3);
        assert!(!under.limited);
    }

    #[test]
    fn test_modifier_ledgers() {
        let half = Fraction::new(0.5);
        let ledgers = modifier_ledgers(10, 0, &half, &[(1, 0), (0, 1), (1, 1)]);
        assert_eq!((ledgers.dn, ledgers.fv), (2, 2));
        assert!(!ledgers.limited);

        let ledgers = modifier_ledgers(10, 0, &half, &[(3, 0)]);
        assert!(ledgers.limited);
    }

    #[test]
    fn test_totals_floor_at_zero() {
        let half = Fraction::new(0.5);
        assert_eq!(totals(10, &half, (2, 1)), (3, 4));
        assert_eq!(totals(2, &half, (5, 5)), (0, 0));
    }

    #[test]
    fn test_move_speed() {
        let table = LookupTable::values(10);
        assert_eq!(move_speed(5, 0, &table), MoveSpeed::Speed(10.0));
        assert_eq!(move_speed(5, 2, &table), MoveSpeed::Speed(2.5));
        assert_eq!(move_speed(1, 2, &table), MoveSpeed::BelowBase);
        assert_eq!(move_speed(20, 0, &table), MoveSpeed::OutOfRange);
    }

    #[test]
    fn test_time_display_out_of_table() {
        let table = LookupTable::values(5);
        assert_eq!(time_display(-1, &table), None);
        assert_eq!(time_display(40, &table), None);
    }
}
