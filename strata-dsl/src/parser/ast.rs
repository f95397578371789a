//! Abstract Syntax Tree for the geology DSL
//!
//! A [`Document`] keeps its statements in declaration order. Spans are carried
//! in [`Spanned`] wrappers, which compare by value only, so document equality
//! is structural.

use crate::parser::grammar::StatementKind;
use crate::parser::lexer::{Location, Spanned};
use serde::Serialize;
use std::fmt;

/// Statement identifiers
pub type Ident = String;

/// Root AST node - represents an entire DSL document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub statements: Vec<Spanned<Statement>>,
}

impl Document {
    pub fn rocks(&self) -> impl Iterator<Item = &RockDefinition> {
        self.statements.iter().filter_map(|s| match &s.value {
            Statement::Rock(rock) => Some(rock),
            Statement::Event(_) => None,
        })
    }

    /// All events in declaration order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.statements.iter().filter_map(|s| match &s.value {
            Statement::Event(event) => Some(event),
            Statement::Rock(_) => None,
        })
    }

    pub fn count(&self, kind: StatementKind) -> usize {
        self.statements.iter().filter(|s| s.value.kind() == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "statement", rename_all = "lowercase")]
pub enum Statement {
    Rock(RockDefinition),
    Event(Event),
}

impl Statement {
    pub fn id(&self) -> &Spanned<Ident> {
        match self {
            Statement::Rock(rock) => &rock.id,
            Statement::Event(event) => &event.id,
        }
    }

    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Rock(_) => StatementKind::Rock,
            Statement::Event(event) => event.kind.statement_kind(),
        }
    }
}

// ============================================================
// Rocks
// ============================================================

/// `ROCK id [ name: "..."; type: ...; age: ... ]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RockDefinition {
    pub id: Spanned<Ident>,
    pub name: Spanned<String>,
    pub rock_type: Spanned<RockType>,
    pub age: Option<Spanned<TimeValue>>,
}

/// Rock classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RockType {
    Sedimentary,
    Volcanic,
    Intrusive,
    Metamorphic,
}

impl RockType {
    pub const ALL: [RockType; 4] = [
        RockType::Sedimentary,
        RockType::Volcanic,
        RockType::Intrusive,
        RockType::Metamorphic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RockType::Sedimentary => "sedimentary",
            RockType::Volcanic => "volcanic",
            RockType::Intrusive => "intrusive",
            RockType::Metamorphic => "metamorphic",
        }
    }

    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

// ============================================================
// Events
// ============================================================

/// A deposition, erosion, or intrusion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: Spanned<Ident>,
    pub kind: EventKind,
    pub time: Option<Spanned<TimeValue>>,
    /// Events this one occurs after; no duplicates
    pub after: Vec<Spanned<Ident>>,
}

impl Event {
    /// The rock this event deposits or intrudes
    pub fn rock(&self) -> Option<&Spanned<Ident>> {
        match &self.kind {
            EventKind::Deposition { rock } | EventKind::Intrusion { rock, .. } => Some(rock),
            EventKind::Erosion => None,
        }
    }

    /// Span of the event's id
    pub fn location(&self) -> Location {
        self.id.span
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Deposition {
        rock: Spanned<Ident>,
    },
    Erosion,
    Intrusion {
        rock: Spanned<Ident>,
        style: Option<Spanned<IntrusionStyle>>,
    },
}

impl EventKind {
    pub fn statement_kind(&self) -> StatementKind {
        match self {
            EventKind::Deposition { .. } => StatementKind::Deposition,
            EventKind::Erosion => StatementKind::Erosion,
            EventKind::Intrusion { .. } => StatementKind::Intrusion,
        }
    }
}

/// Geometry of an igneous intrusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntrusionStyle {
    Dike,
    Sill,
    Stock,
    Batholith,
}

impl IntrusionStyle {
    pub const ALL: [IntrusionStyle; 4] = [
        IntrusionStyle::Dike,
        IntrusionStyle::Sill,
        IntrusionStyle::Stock,
        IntrusionStyle::Batholith,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IntrusionStyle::Dike => "dike",
            IntrusionStyle::Sill => "sill",
            IntrusionStyle::Stock => "stock",
            IntrusionStyle::Batholith => "batholith",
        }
    }

    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

// ============================================================
// Time
// ============================================================

/// Geological time unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimeUnit {
    /// Thousand years
    #[serde(rename = "ka")]
    Ka,
    /// Million years
    #[serde(rename = "Ma")]
    Ma,
    /// Billion years
    #[serde(rename = "Ga")]
    Ga,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 3] = [TimeUnit::Ka, TimeUnit::Ma, TimeUnit::Ga];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Ka => "ka",
            TimeUnit::Ma => "Ma",
            TimeUnit::Ga => "Ga",
        }
    }

    /// Power of ten converting this unit to years
    pub fn exponent(self) -> i32 {
        match self {
            TimeUnit::Ka => 3,
            TimeUnit::Ma => 6,
            TimeUnit::Ga => 9,
        }
    }

    /// Case-insensitive unit lookup
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|u| u.as_str().eq_ignore_ascii_case(suffix))
    }
}

/// A stated age or event time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimeValue {
    /// `35Ma`: a magnitude "ago" in the given unit
    Absolute { magnitude: f64, unit: TimeUnit },
    /// A quoted epoch name such as `"late Eocene"`
    Epoch { name: String },
    /// `"?"`
    Unknown,
}

impl TimeValue {
    /// Years before present, or `None` for epochs and unknowns.
    ///
    /// Scaling goes through decimal text so that the same quantity written in
    /// different units (`1ka`, `0.001Ma`) lands on the same value.
    pub fn years_before_present(&self) -> Option<f64> {
        match self {
            TimeValue::Absolute { magnitude, unit } => {
                let scaled = format!("{}e{}", magnitude, unit.exponent());
                Some(
                    scaled
                        .parse::<f64>()
                        .unwrap_or_else(|_| magnitude * 10f64.powi(unit.exponent())),
                )
            }
            TimeValue::Epoch { .. } | TimeValue::Unknown => None,
        }
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self, TimeValue::Absolute { .. })
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Absolute { magnitude, unit } => write!(f, "{}{}", magnitude, unit.as_str()),
            TimeValue::Epoch { name } => f.write_str(name),
            TimeValue::Unknown => f.write_str("?"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absolute(magnitude: f64, unit: TimeUnit) -> TimeValue {
        TimeValue::Absolute { magnitude, unit }
    }

    #[test]
    fn test_years_before_present() {
        assert_eq!(absolute(100.0, TimeUnit::Ma).years_before_present(), Some(100_000_000.0));
        assert_eq!(absolute(2.5, TimeUnit::Ga).years_before_present(), Some(2_500_000_000.0));
        assert_eq!(TimeValue::Unknown.years_before_present(), None);
        assert_eq!(
            TimeValue::Epoch { name: "late Eocene".to_string() }.years_before_present(),
            None
        );
    }

    #[test]
    fn test_units_compare_on_one_scale() {
        assert_eq!(
            absolute(1.0, TimeUnit::Ka).years_before_present(),
            absolute(0.001, TimeUnit::Ma).years_before_present()
        );
        assert!(
            absolute(900.0, TimeUnit::Ma).years_before_present()
                < absolute(1.0, TimeUnit::Ga).years_before_present()
        );
    }

    #[test]
    fn test_time_display() {
        assert_eq!(absolute(100.0, TimeUnit::Ma).to_string(), "100Ma");
        assert_eq!(absolute(2.5, TimeUnit::Ga).to_string(), "2.5Ga");
        assert_eq!(absolute(500.0, TimeUnit::Ka).to_string(), "500ka");
        assert_eq!(TimeValue::Unknown.to_string(), "?");
    }

    #[test]
    fn test_unit_lookup_ignores_case() {
        assert_eq!(TimeUnit::from_suffix("MA"), Some(TimeUnit::Ma));
        assert_eq!(TimeUnit::from_suffix("ka"), Some(TimeUnit::Ka));
        assert_eq!(TimeUnit::from_suffix("yr"), None);
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(RockType::from_name("volcanic"), Some(RockType::Volcanic));
        assert_eq!(RockType::from_name("granite"), None);
        assert_eq!(IntrusionStyle::from_name("batholith"), Some(IntrusionStyle::Batholith));
    }

    #[test]
    fn test_enum_names_ignore_case() {
        assert_eq!(RockType::from_name("Sedimentary"), Some(RockType::Sedimentary));
        assert_eq!(RockType::from_name("METAMORPHIC"), Some(RockType::Metamorphic));
        assert_eq!(IntrusionStyle::from_name("Dike"), Some(IntrusionStyle::Dike));
        assert_eq!(IntrusionStyle::from_name("dyke"), None);
    }

    #[test]
    fn test_spanned_equality_ignores_location() {
        let a = Spanned::new("R1".to_string(), Location::new(0, 2));
        let b = Spanned::new("R1".to_string(), Location::new(10, 12));
        assert_eq!(a, b);
    }
}
