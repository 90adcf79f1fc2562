//! Typed representation of a scenario and its events.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;

/// Identifies one domain event type as a `(kind, variant)` pair,
/// e.g. (`CreditFacilityEvent`, `Initialized`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    /// Event enum name in the host, e.g. `CustomerEvent`.
    pub kind: String,
    /// Variant name, e.g. `Initialized`.
    pub variant: String,
}

impl EventKey {
    pub fn new(kind: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            variant: variant.into(),
        }
    }

    /// Parse a `Kind::Variant` string. Returns `None` when either side is
    /// empty or the separator is missing.
    pub fn parse(s: &str) -> Option<Self> {
        let (kind, variant) = s.split_once("::")?;
        if kind.is_empty() || variant.is_empty() || variant.contains("::") {
            return None;
        }
        Some(Self::new(kind, variant))
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.kind, self.variant)
    }
}

/// A literal value attached to an event.
///
/// Values come straight from the scenario YAML; the mapping layer decides
/// what shape each one must have. Nested maps carry structured values such
/// as credit facility terms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Map(IndexMap<String, FieldValue>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            FieldValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Walk a dotted path (`terms.duration.Months`) through nested maps.
    pub fn lookup_path<'a>(
        fields: &'a IndexMap<String, FieldValue>,
        path: &str,
    ) -> Option<&'a FieldValue> {
        let mut segments = path.split('.');
        let mut current = fields.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }
}

/// One domain event in a scenario timeline. Immutable after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// The `(kind, variant)` pair used for mapping lookup.
    pub key: EventKey,
    /// Scenario-local entity label this event concerns, e.g. `customer_1`.
    pub entity: String,
    /// Literal values attached to the event, in document order.
    pub fields: IndexMap<String, FieldValue>,
    /// Position in the scenario. Strictly increasing; authoritative order.
    pub sequence_index: usize,
    /// Absolute offset from the scenario start time. Events sharing an
    /// offset keep their `sequence_index` order.
    pub offset: Duration,
}

impl Event {
    pub fn field(&self, path: &str) -> Option<&FieldValue> {
        FieldValue::lookup_path(&self.fields, path)
    }
}

/// A parsed scenario: metadata plus the ordered event timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Human-readable scenario name. Module and function names derive
    /// from it via [`sanitize_identifier`].
    pub name: String,
    pub description: String,
    /// Seed forwarded to the host's simulation harness.
    pub seed: u64,
    /// Simulated wall-clock instant at which the timeline begins.
    pub start_time: DateTime<Utc>,
    pub events: Vec<Event>,
}

impl Scenario {
    /// Function name for the generated scenario runner.
    pub fn fn_name(&self) -> String {
        sanitize_identifier(&self.name)
    }

    /// Module name of the generated file (identical to [`Self::fn_name`]).
    pub fn module_name(&self) -> String {
        self.fn_name()
    }
}

/// Reduce an arbitrary scenario name to a valid snake_case Rust identifier.
///
/// Lowercases, collapses every non-alphanumeric run into a single `_`, and
/// trims leading/trailing underscores. A leading digit gets an `s_` prefix
/// so the result is usable as a module name. Returns an empty string when
/// nothing survives; callers treat that as a parse failure.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    let trimmed = out.trim_matches('_');
    match trimmed.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("s_{trimmed}"),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_key_parses_kind_and_variant() {
        let key = EventKey::parse("CustomerEvent::Initialized").unwrap();
        assert_eq!(key.kind, "CustomerEvent");
        assert_eq!(key.variant, "Initialized");
        assert_eq!(key.to_string(), "CustomerEvent::Initialized");
    }

    #[test]
    fn event_key_rejects_malformed_strings() {
        assert!(EventKey::parse("CustomerEvent").is_none());
        assert!(EventKey::parse("::Initialized").is_none());
        assert!(EventKey::parse("CustomerEvent::").is_none());
        assert!(EventKey::parse("A::B::C").is_none());
    }

    #[test]
    fn field_lookup_walks_nested_maps() {
        let mut terms = IndexMap::new();
        terms.insert("annual_rate".to_string(), FieldValue::Str("0.10".into()));
        let mut duration = IndexMap::new();
        duration.insert("Months".to_string(), FieldValue::Int(6));
        terms.insert("duration".to_string(), FieldValue::Map(duration));
        let mut fields = IndexMap::new();
        fields.insert("terms".to_string(), FieldValue::Map(terms));

        let rate = FieldValue::lookup_path(&fields, "terms.annual_rate").unwrap();
        assert_eq!(rate.as_str(), Some("0.10"));
        let months = FieldValue::lookup_path(&fields, "terms.duration.Months").unwrap();
        assert_eq!(months.as_i64(), Some(6));
        assert!(FieldValue::lookup_path(&fields, "terms.duration.Days").is_none());
    }

    #[test]
    fn sanitize_produces_module_names() {
        assert_eq!(sanitize_identifier("Basic Loan"), "basic_loan");
        assert_eq!(sanitize_identifier("  multi--facility! "), "multi_facility");
        assert_eq!(sanitize_identifier("3 customers"), "s_3_customers");
        assert_eq!(sanitize_identifier("!!!"), "");
    }
}
