//! Scenario document parsing and validation.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::duration::parse_compact;
use crate::event::{sanitize_identifier, Event, EventKey, FieldValue, Scenario};

/// Errors that can occur when loading or validating a scenario document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the scenario file.
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the scenario YAML.
    #[error("failed to parse scenario YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Missing or empty scenario name.
    #[error("scenario name is missing or empty")]
    MissingName,

    /// Name contains nothing usable as a module identifier.
    #[error("scenario name '{0}' does not reduce to a usable module name")]
    UnusableName(String),

    /// Event type string is not `Kind::Variant`.
    #[error("event {index}: '{event}' is not of the form Kind::Variant")]
    MalformedEventType { index: usize, event: String },

    /// Event entity label is empty.
    #[error("event {index}: entity label is empty")]
    MissingEntity { index: usize },

    /// Offset string fails the compact duration grammar.
    #[error("event {index}: invalid offset '{value}' (expected digits plus s/m/h/d, e.g. 30d)")]
    InvalidOffset { index: usize, value: String },

    /// Offsets must be non-decreasing in file order; the parser never
    /// reorders a timeline.
    #[error("event {index}: offset {offset_secs}s is earlier than the previous event at {previous_secs}s")]
    OffsetRegression {
        index: usize,
        offset_secs: u64,
        previous_secs: u64,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    seed: u64,
    #[serde(default)]
    start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEvent {
    event: String,
    entity: String,
    /// Absolute offset from `start_time`. Absent means "same instant as
    /// the previous event".
    #[serde(default)]
    at: Option<String>,
    #[serde(default)]
    values: IndexMap<String, FieldValue>,
}

fn default_start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ParseResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scenario from a YAML string.
    pub fn from_yaml(yaml: &str) -> ParseResult<Self> {
        let raw: RawScenario = serde_yaml::from_str(yaml)?;
        raw.validate()
    }
}

impl RawScenario {
    fn validate(self) -> ParseResult<Scenario> {
        let name = match self.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(ParseError::MissingName),
        };
        if sanitize_identifier(&name).is_empty() {
            return Err(ParseError::UnusableName(name));
        }

        let mut events = Vec::with_capacity(self.events.len());
        let mut previous_offset = Duration::ZERO;
        for (index, raw) in self.events.into_iter().enumerate() {
            let key = EventKey::parse(&raw.event).ok_or_else(|| {
                ParseError::MalformedEventType {
                    index,
                    event: raw.event.clone(),
                }
            })?;
            if raw.entity.trim().is_empty() {
                return Err(ParseError::MissingEntity { index });
            }
            let offset = match raw.at {
                Some(value) => {
                    parse_compact(&value).ok_or(ParseError::InvalidOffset { index, value })?
                }
                None => previous_offset,
            };
            if offset < previous_offset {
                return Err(ParseError::OffsetRegression {
                    index,
                    offset_secs: offset.as_secs(),
                    previous_secs: previous_offset.as_secs(),
                });
            }
            previous_offset = offset;
            events.push(Event {
                key,
                entity: raw.entity,
                fields: raw.values,
                sequence_index: index,
                offset,
            });
        }

        Ok(Scenario {
            name,
            description: self.description,
            seed: self.seed,
            start_time: self.start_time.unwrap_or_else(default_start_time),
            events,
        })
    }
}
