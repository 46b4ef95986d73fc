//! Multiplier tables.
//!
//! A multiplier selects a named unit (seconds, kilometers, "DN 10", ...)
//! and contributes that unit's fixed offset to a field's cost. Each field
//! that uses one owns its own `Multiplier`, so the selected index is
//! per-field while the offset/name rows are static.

use serde::{Deserialize, Serialize};

const TIME: &[(i64, &str)] = &[
    (0, "seconds"),
    (9, "minutes"),
    (18, "hours"),
    (25, "days"),
    (29, "months"),
    (32, "years"),
];

const DISTANCE: &[(i64, &str)] = &[
    (0, "meters"),
    (15, "kilometers"),
    (-3, "feet"),
    (16, "miles"),
    (10, "football field"),
    (11, "city block"),
    (23, "marathon race"),
    (30, "length of state"),
    (32, "Paris to Moscow"),
    (33, "NY to LA"),
    (34, "NY to London"),
    (35, "London to Tokyo"),
    (38, "Round the World"),
];

const SPEED: &[(i64, &str)] = &[(0, "meters per round"), (2, "kph"), (3, "mph")];

const WEIGHT: &[(i64, &str)] = &[(0, "kg"), (-2, "pounds"), (15, "tons")];

const SHAPE: &[(i64, &str)] = &[(0, "none"), (1, "single"), (3, "any"), (6, "fluid")];

const SWITCH: &[(i64, &str)] = &[(0, "none"), (4, "off"), (8, "off/on")];

const COMMUNITY: &[(i64, &str)] = &[
    (1, "Simple"),
    (2, "DN 8"),
    (3, "DN 10"),
    (4, "DN 12"),
    (5, "DN 14"),
    (6, "DN 16"),
    (7, "DN 18"),
];

const COMPONENT: &[(i64, &str)] = &[
    (0, "unset"),
    (1, "common"),
    (2, "free / common"),
    (3, "cheap / common"),
    (4, "affordable / uncommon"),
    (5, "affordable / rare"),
    (6, "expensive / very rare"),
    (7, "expensive / unique"),
    (8, "fabulously expensive"),
];

const GESTURE: &[(i64, &str)] = &[
    (0, "simple"),
    (1, "average"),
    (2, "complex"),
    (3, "very complex"),
    (4, "extremely complex"),
    (5, "downright hard"),
];

const INCANTATION: &[(i64, &str)] = &[
    (0, "none"),
    (1, "few words"),
    (2, "sentence"),
    (3, "incantation"),
    (4, "litany"),
    (5, "complex formula"),
    (6, "extensive complex elements"),
];

const RELATED_SKILL: &[(i64, &str)] = &[
    (0, "none"),
    (1, "DN 6"),
    (2, "DN 7"),
    (3, "DN 8"),
    (4, "DN 9"),
    (5, "DN 10"),
    (6, "DN 11"),
    (7, "DN 12"),
];

const MULTI_ATTRIBUTE: &[(i64, &str)] = &[
    (0, "unset"),
    (3, "TWO attributes"),
    (6, "THREE attributes"),
    (9, "FOUR attributes"),
    (12, "FIVE attributes"),
    (15, "SIX attributes"),
    (18, "SEVEN attributes"),
    (21, "ALL attributes"),
];

const SKILL: &[(i64, &str)] = &[
    (0, "Unset"),
    (1, "Necroscope"),
    (2, "Necromancer"),
    (3, "Prescient"),
    (4, "Seer"),
    (5, "Sensitive"),
    (6, "Shaman"),
    (7, "Spotter"),
    (8, "Telepath"),
    (9, "Numerancer"),
    (10, "Witch - self"),
];

/// Attribute, roll kind and resistance per skill row.
const SKILL_BASIS: &[(&str, &str, &str)] = &[
    ("", "", ""),
    ("Charisma", "Interactive", "Confidence"),
    ("Strength", "Interactive", "Willpower"),
    ("Intellect", "Time", ""),
    ("Mind", "Time", ""),
    ("Intellect", "Special", ""),
    ("Confidence", "Damage", "Toughness (ignores armour)"),
    ("Mind", "Special", ""),
    ("Intellect", "Interactive", "Intellect"),
    ("", "", ""),
    ("Confidence", "Push", "Varies"),
];

const RECEPTION: &[(i64, &str)] = &[
    (0, "Unset"),
    (1, "Feeling"),
    (2, "INT roll"),
    (3, "Perception roll"),
    (4, "Automatically knows the effect"),
];

const TRANCE: &[(i64, &str)] = &[
    (0, "None"),
    (1, "Will DN 7 to break trance"),
    (2, "Will DN 8 to break trance"),
    (3, "Will DN 10 to break trance"),
    (4, "Will DN 12 to break trance"),
    (5, "Will DN 15 to break trance"),
    (6, "Will DN 19 to break trance"),
];

const LOCK: &[(i64, &str)] = &[
    (0, "Unset"),
    (1, "Target makes Will DN 7 or +2 modifier"),
    (2, "Target makes Will DN 8 or +2 modifier"),
    (3, "Target makes Will DN 10 or +2 modifier"),
    (4, "Target makes Will DN 12 or +2 modifier"),
];

const COUNTENANCE: &[(i64, &str)] = &[
    (0, "Unset"),
    (1, "Noticable - grey pallor, foaming mouth"),
    (2, "Extreme - convulsions, psychic image"),
];

/// Skill cost that marks a Necroscope.
pub const NECROSCOPE: i64 = 1;

/// Skill cost that marks a Shaman.
pub const SHAMAN: i64 = 6;

/// The unit family a multiplier selects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MultiplierKind {
    Time,
    Distance,
    Speed,
    Weight,
    Shape,
    Switch,
    Community,
    Component,
    Gesture,
    Incantation,
    RelatedSkill,
    MultiAttribute,
    Skill,
    Reception,
    Trance,
    Lock,
    Countenance,
}

impl MultiplierKind {
    fn rows(self) -> &'static [(i64, &'static str)] {
        match self {
            MultiplierKind::Time => TIME,
            MultiplierKind::Distance => DISTANCE,
            MultiplierKind::Speed => SPEED,
            MultiplierKind::Weight => WEIGHT,
            MultiplierKind::Shape => SHAPE,
            MultiplierKind::Switch => SWITCH,
            MultiplierKind::Community => COMMUNITY,
            MultiplierKind::Component => COMPONENT,
            MultiplierKind::Gesture => GESTURE,
            MultiplierKind::Incantation => INCANTATION,
            MultiplierKind::RelatedSkill => RELATED_SKILL,
            MultiplierKind::MultiAttribute => MULTI_ATTRIBUTE,
            MultiplierKind::Skill => SKILL,
            MultiplierKind::Reception => RECEPTION,
            MultiplierKind::Trance => TRANCE,
            MultiplierKind::Lock => LOCK,
            MultiplierKind::Countenance => COUNTENANCE,
        }
    }
}

/// A unit selection: a fixed list of (offset, name) rows plus the index
/// currently in use.
///
/// # Examples
///
/// ```rust
/// use sfxcost::{Multiplier, MultiplierKind};
///
/// let mut time = Multiplier::new(MultiplierKind::Time);
/// assert_eq!(time.offset(), 0);
///
/// assert!(time.set_index(2));
/// assert_eq!(time.offset(), 18);
/// assert_eq!(time.name(), "hours");
///
/// // Out of range: ignored, previous index kept
/// assert!(!time.set_index(40));
/// assert_eq!(time.index(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Multiplier {
    kind: MultiplierKind,
    index: usize,
}

impl Multiplier {
    /// A multiplier of the given kind at index 0.
    pub fn new(kind: MultiplierKind) -> Self {
        Self { kind, index: 0 }
    }

    pub fn kind(&self) -> MultiplierKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of selectable rows.
    pub fn len(&self) -> usize {
        self.kind.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind.rows().is_empty()
    }

    /// Select a row. Returns `false` and keeps the previous index when
    /// `index` is out of range.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.index = index;
        true
    }

    /// Offset of the selected row.
    pub fn offset(&self) -> i64 {
        self.kind.rows()[self.index].0
    }

    /// Offset of an arbitrary row, or `None` when out of range.
    pub fn offset_at(&self, index: usize) -> Option<i64> {
        self.kind.rows().get(index).map(|row| row.0)
    }

    /// Name of the selected row.
    pub fn name(&self) -> &'static str {
        self.kind.rows()[self.index].1
    }

    /// Row names for presentation.
    pub fn content(&self) -> Vec<String> {
        self.kind.rows().iter().map(|row| row.1.to_string()).collect()
    }

    /// Attribute, roll kind and resistance for the selected skill.
    ///
    /// Returns `None` for multipliers that are not skills.
    pub fn skill_basis(&self) -> Option<(&'static str, &'static str, &'static str)> {
        match self.kind {
            MultiplierKind::Skill => SKILL_BASIS.get(self.index).copied(),
            _ => None,
        }
    }
}
