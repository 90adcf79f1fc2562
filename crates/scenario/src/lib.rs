//! Scenario Event Model
//!
//! A scenario is an ordered timeline of domain events describing one
//! simulated banking workflow (customer creation, deposits, credit
//! facility lifecycle, payments). This crate owns the event model and
//! the YAML parser that turns a scenario document into a typed,
//! ordered event sequence.
//!
//! # Design
//!
//! A scenario may:
//! - Name entities with scenario-local labels (`customer_1`, `facility_1`)
//! - Place events on a simulated clock via absolute offsets from `start_time`
//! - Attach literal values to events for the action mapping layer
//!
//! A scenario must NOT:
//! - Reorder events by time (list order is authoritative execution order)
//! - Move backwards in simulated time
//!
//! # File Format
//!
//! ```yaml
//! name: basic loan
//! description: one customer takes one facility
//! seed: 42
//! start_time: 2024-01-01T09:00:00Z
//!
//! events:
//!   - event: CustomerEvent::Initialized
//!     entity: customer_1
//!     at: 0m
//!     values:
//!       email: alice@example.com
//!
//!   - event: DepositEvent::Initialized
//!     entity: deposit_1
//!     at: 1d
//!     values:
//!       customer_ref: customer_1
//!       amount: 10000000
//! ```
//!
//! Parsing never reorders: an `at` offset lower than its predecessor is a
//! [`ParseError`], not a sort.

mod duration;
mod event;
mod parse;

pub use duration::parse_compact;
pub use event::{sanitize_identifier, Event, EventKey, FieldValue, Scenario};
pub use parse::{ParseError, ParseResult};
