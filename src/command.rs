//! Field commands.
//!
//! Mutations other than plain deltas are expressed as a [`Command`]. The
//! legacy text protocol (`"DN 3"`, `"ENABLE"`, `"12 true"`, ...) is parsed
//! in exactly one place, [`Grammar::parse`], using the grammar the target
//! field advertises.

use crate::error::FieldError;
use crate::field_id::FieldId;
use crate::formula::POINT_CEILING;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two cost ledgers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ledger {
    /// The difficulty (`DN`) ledger.
    Dn,
    /// The focus (`FV`) ledger.
    Fv,
}

/// Incantation qualities that each add a point when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncantationFlag {
    Foreign,
    Loud,
    Profane,
}

/// A typed mutation for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Replace free text.
    Text(String),
    /// Set an integer value.
    Integer(i64),
    /// Set a value by number; table fields map it to the closest row.
    Number(f64),
    /// Set a charge count and the ward flag together.
    Charges { count: f64, ward: bool },
    /// Route a modifier's cost to a ledger.
    Ledger(Ledger),
    /// Set one ledger of a double field.
    LedgerValue(Ledger, i64),
    /// Start or stop tracking another field.
    Track(bool),
    /// Pin a fraction to its default, or release it.
    PinDefault(bool),
    /// Set a disbelief percentage.
    Level(i64),
    /// Mark a component as destroyed by casting, or preserved.
    Destroyed(bool),
    /// Toggle an incantation quality.
    Incantation(IncantationFlag, bool),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Text(text) => write!(f, "text {text:?}"),
            Command::Integer(n) => write!(f, "integer {n}"),
            Command::Number(n) => write!(f, "number {n}"),
            Command::Charges { count, ward } => write!(f, "charges {count} ward={ward}"),
            Command::Ledger(ledger) => write!(f, "ledger {ledger:?}"),
            Command::LedgerValue(ledger, n) => write!(f, "ledger {ledger:?} = {n}"),
            Command::Track(on) => write!(f, "track {on}"),
            Command::PinDefault(on) => write!(f, "pin default {on}"),
            Command::Level(n) => write!(f, "level {n}"),
            Command::Destroyed(on) => write!(f, "destroyed {on}"),
            Command::Incantation(flag, on) => write!(f, "incantation {flag:?} {on}"),
        }
    }
}

/// Result of a mutation that parsed and applied cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// State changed (or was re-asserted) and the change was propagated.
    Applied,
    /// The request fell outside the field's range; nothing changed and
    /// nothing was propagated.
    Rejected,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Outcome::Applied)
    }
}

/// The text syntax a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grammar {
    /// Any text.
    Text,
    /// A signed integer.
    Integer,
    /// An integer or a float.
    Number,
    /// `"<number> <true|false>"`.
    Charges,
    /// `"DN <n>"` or `"FV <n>"`.
    Ledger,
    /// `"DN"`, `"FV"`, or a number.
    Modifier,
    /// Modifier keywords plus `FOREIGN`/`NATIVE`, `LOUD`/`SOFT`,
    /// `PROFANE`/`POLITE`.
    Incantation,
    /// Modifier keywords plus `DESTROY`/`PRESERVE`.
    Component,
    /// `ENABLE`, `DISABLE`, or a number.
    Follow,
    /// `DEFAULT`, `FRACTION`, or a number.
    Fraction,
    /// Fraction keywords plus `LEVEL <n>`.
    Unreal,
    /// Accepts nothing.
    Fixed,
}

impl Grammar {
    /// Parse legacy text into a command for the field named `field`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sfxcost::{Command, FieldId, Grammar, Ledger};
    ///
    /// let field = FieldId::from_str("Other");
    /// let cmd = Grammar::Ledger.parse(&field, "DN 3").unwrap();
    /// assert_eq!(cmd, Command::LedgerValue(Ledger::Dn, 3));
    ///
    /// assert!(Grammar::Ledger.parse(&field, "XX 3").is_err());
    /// ```
    pub fn parse(self, field: &FieldId, text: &str) -> Result<Command, FieldError> {
        let trimmed = text.trim();
        let fail = |reason: &str| FieldError::Parse {
            field: field.clone(),
            input: text.to_string(),
            reason: reason.to_string(),
        };

        match self {
            Grammar::Text => Ok(Command::Text(text.to_string())),
            Grammar::Integer => trimmed
                .parse::<i64>()
                .map(Command::Integer)
                .map_err(|_| fail("expected an integer")),
            Grammar::Number => parse_number(trimmed).ok_or_else(|| fail("expected a number")),
            Grammar::Charges => {
                let mut parts = trimmed.split_whitespace();
                let (Some(count), Some(ward), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(fail("expected \"<number> <true|false>\""));
                };
                let count = count
                    .parse::<f64>()
                    .map_err(|_| fail("expected a charge count"))?;
                if !count.is_finite() || count.abs() > POINT_CEILING as f64 {
                    return Err(fail("charge count out of range"));
                }
                let ward = parse_bool(ward).ok_or_else(|| fail("expected true or false"))?;
                Ok(Command::Charges { count, ward })
            }
            Grammar::Ledger => {
                let mut parts = trimmed.split_whitespace();
                let (Some(keyword), Some(amount), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err(fail("expected \"DN <n>\" or \"FV <n>\""));
                };
                let ledger = parse_ledger(keyword).ok_or_else(|| fail("expected DN or FV"))?;
                let amount = amount
                    .parse::<i64>()
                    .map_err(|_| fail("expected an integer amount"))?;
                Ok(Command::LedgerValue(ledger, amount))
            }
            Grammar::Modifier => parse_ledger(trimmed)
                .map(Command::Ledger)
                .or_else(|| parse_number(trimmed))
                .ok_or_else(|| fail("expected DN, FV or a number")),
            Grammar::Incantation => {
                let keyword = match trimmed {
                    "FOREIGN" => Some((IncantationFlag::Foreign, true)),
                    "NATIVE" => Some((IncantationFlag::Foreign, false)),
                    "LOUD" => Some((IncantationFlag::Loud, true)),
                    "SOFT" => Some((IncantationFlag::Loud, false)),
                    "PROFANE" => Some((IncantationFlag::Profane, true)),
                    "POLITE" => Some((IncantationFlag::Profane, false)),
                    _ => None,
                };
                match keyword {
                    Some((flag, on)) => Ok(Command::Incantation(flag, on)),
                    None => Grammar::Modifier.parse(field, text),
                }
            }
            Grammar::Component => match trimmed {
                "DESTROY" => Ok(Command::Destroyed(true)),
                "PRESERVE" => Ok(Command::Destroyed(false)),
                _ => Grammar::Modifier.parse(field, text),
            },
            Grammar::Follow => match trimmed {
                "ENABLE" => Ok(Command::Track(true)),
                "DISABLE" => Ok(Command::Track(false)),
                _ => parse_number(trimmed)
                    .ok_or_else(|| fail("expected ENABLE, DISABLE or a number")),
            },
            Grammar::Fraction => match trimmed {
                "DEFAULT" => Ok(Command::PinDefault(true)),
                "FRACTION" => Ok(Command::PinDefault(false)),
                _ => parse_number(trimmed)
                    .ok_or_else(|| fail("expected DEFAULT, FRACTION or a number")),
            },
            Grammar::Unreal => match trimmed.strip_prefix("LEVEL") {
                Some(rest) => rest
                    .trim()
                    .parse::<i64>()
                    .map(Command::Level)
                    .map_err(|_| fail("expected LEVEL <n>")),
                None => Grammar::Fraction.parse(field, text),
            },
            Grammar::Fixed => Err(fail("field does not accept text")),
        }
    }
}

fn parse_number(text: &str) -> Option<Command> {
    if let Ok(n) = text.parse::<i64>() {
        return Some(Command::Integer(n));
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Command::Number)
}

fn parse_ledger(text: &str) -> Option<Ledger> {
    match text {
        "DN" => Some(Ledger::Dn),
        "FV" => Some(Ledger::Fv),
        _ => None,
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
