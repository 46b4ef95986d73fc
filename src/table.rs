//! Lookup tables.
//!
//! A lookup table cross-references a linear cost (the row index) with an
//! exponentially growing value. Rows cycle through the base sequence
//! `[1, 1.5, 2.5, 4, 6]`, scaled by a further power of ten every five rows,
//! so row 0 is `1`, row 5 is `10` and row 10 is `100`.
//!
//! Tables are immutable once generated and shared between fields through
//! `Arc`; each field keeps its own index into the shared rows.

use serde::{Deserialize, Serialize};

const BASE_VALUES: [f64; 5] = [1.0, 1.5, 2.5, 4.0, 6.0];

const BONUS_LABELS: [&str; 4] = ["no bonus", "linked (+1)", "appropriate (+2)", "inventive (+3)"];

/// How a table labels its rows for presentation.
///
/// The numbers are identical for every style; only `content()` differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableStyle {
    /// Rows are labelled with their value, e.g. `"2.5"`.
    Values,
    /// Rows are labelled with the integer span they cover, e.g. `"5-6"`.
    Community,
    /// Rows are labelled with the fixed component bonus names.
    Bonus,
}

/// A single (cost, value) row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Linear cost; equal to the row index.
    pub cost: i64,
    /// Exponential value.
    pub value: f64,
}

/// An ordered cost/value cross-reference table.
///
/// # Examples
///
/// ```rust
/// use sfxcost::LookupTable;
///
/// let table = LookupTable::values(100);
/// assert_eq!(table.value(2), 2.5);
/// assert_eq!(table.value(7), 25.0);
/// assert_eq!(table.cost(7), 7);
/// assert_eq!(table.closest_value(2.5), Some(2));
/// assert_eq!(table.closest_value(3.0), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    entries: Vec<TableEntry>,
    style: TableStyle,
}

impl LookupTable {
    /// Generate a table with `rows` entries labelled in the given style.
    pub fn generate(rows: usize, style: TableStyle) -> Self {
        let mut entries = Vec::with_capacity(rows);
        let mut scale = 1.0_f64;
        for cost in 0..rows {
            entries.push(TableEntry {
                cost: cost as i64,
                value: BASE_VALUES[cost % BASE_VALUES.len()] * scale,
            });
            if (cost + 1) % BASE_VALUES.len() == 0 {
                scale *= 10.0;
            }
        }
        Self { entries, style }
    }

    /// The general value table used by most fields.
    pub fn values(rows: usize) -> Self {
        Self::generate(rows, TableStyle::Values)
    }

    /// The table behind community entries, labelled with integer spans.
    pub fn community(rows: usize) -> Self {
        Self::generate(rows, TableStyle::Community)
    }

    /// The small table behind component and gesture entries.
    pub fn bonus(rows: usize) -> Self {
        Self::generate(rows, TableStyle::Bonus)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Presentation style of this table.
    pub fn style(&self) -> TableStyle {
        self.style
    }

    /// The value of a row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; callers check with
    /// [`out_of_range`](Self::out_of_range) first.
    pub fn value(&self, index: usize) -> f64 {
        self.entries[index].value
    }

    /// The cost of a row.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn cost(&self, index: usize) -> i64 {
        self.entries[index].cost
    }

    /// Whether `index` falls outside the table.
    ///
    /// Takes a signed index so tentative `current + delta` results can be
    /// checked before they are stored.
    pub fn out_of_range(&self, index: i64) -> bool {
        index < 0 || index >= self.entries.len() as i64
    }

    /// Cost of the first row whose value is at least `value`.
    ///
    /// Returns `None` when `value` is beyond the last row.
    pub fn closest_value(&self, value: f64) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| value <= entry.value)
            .map(|entry| entry.cost as usize)
    }

    /// Row labels for presentation.
    pub fn content(&self) -> Vec<String> {
        match self.style {
            TableStyle::Values => self.entries.iter().map(|e| format_value(e.value)).collect(),
            TableStyle::Community => self.community_labels(),
            TableStyle::Bonus => self
                .entries
                .iter()
                .enumerate()
                .map(|(i, e)| match BONUS_LABELS.get(i) {
                    Some(label) => (*label).to_string(),
                    None => format_value(e.value),
                })
                .collect(),
        }
    }

    /// Span labels: 0, 1, 2, 3-4, 5-6, 7-10, 11-15, ...
    fn community_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::with_capacity(self.entries.len());
        let mut last = 0_i64;
        let mut opening = true;

        for entry in &self.entries {
            let next = entry.value.ceil() as i64;
            if next - last == 1 {
                labels.push(last.to_string());
                last = next;
                continue;
            }
            if opening {
                opening = false;
                if let Some(previous) = labels.last_mut() {
                    *previous = format!("{}-{}", last - 1, last);
                }
            }
            labels.push(format!("{}-{}", last + 1, next));
            last = next;
        }

        labels
    }
}

/// Format a table value the way fields report it, always with a fractional
/// digit for whole numbers (`10.0`, `2.5`).
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_rows() {
        let table = LookupTable::values(100);
        assert_eq!(table.len(), 100);
        let first: Vec<f64> = (0..5).map(|i| table.value(i)).collect();
        assert_eq!(first, vec![1.0, 1.5, 2.5, 4.0, 6.0]);
        let second: Vec<f64> = (5..10).map(|i| table.value(i)).collect();
        assert_eq!(second, vec![10.0, 15.0, 25.0, 40.0, 60.0]);
        assert_eq!(table.value(10), 100.0);
    }

    #[test]
    fn test_cost_equals_index() {
        let table = LookupTable::values(20);
        for i in 0..20 {
            assert_eq!(table.cost(i), i as i64);
        }
    }

    #[test]
    fn test_closest_value() {
        let table = LookupTable::values(100);
        assert_eq!(table.closest_value(2.5), Some(2));
        assert_eq!(table.closest_value(0.9), Some(0));
        assert_eq!(table.closest_value(11.0), Some(6));
        assert_eq!(table.closest_value(f64::MAX), None);
    }

    #[test]
    fn test_out_of_range() {
        let table = LookupTable::values(4);
        assert!(table.out_of_range(-1));
        assert!(!table.out_of_range(0));
        assert!(!table.out_of_range(3));
        assert!(table.out_of_range(4));
    }

    #[test]
    fn test_value_labels() {
        let table = LookupTable::values(6);
        assert_eq!(table.content(), vec!["1.0", "1.5", "2.5", "4.0", "6.0", "10.0"]);
    }

    #[test]
    fn test_community_labels() {
        let table = LookupTable::community(9);
        assert_eq!(
            table.content(),
            vec!["0", "1", "2", "3-4", "5-6", "7-10", "11-15", "16-25", "26-40"]
        );
    }

    #[test]
    fn test_bonus_labels() {
        let table = LookupTable::bonus(4);
        assert_eq!(table.content()[0], "no bonus");
        assert_eq!(table.content()[3], "inventive (+3)");
        assert_eq!(table.len(), 4);
    }
}
