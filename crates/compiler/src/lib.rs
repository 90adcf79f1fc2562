//! Scenario Compiler
//!
//! Unified entry point for the scenario compilation pipeline. Turns a
//! declarative event timeline into a generated Rust module that replays
//! the timeline through the host's sim-bootstrap operations.
//!
//! # Pipeline
//!
//! 1. **Parse**: the YAML document becomes an ordered, typed event
//!    sequence (`banksim-scenario`).
//! 2. **Classify**: each event's `(kind, variant)` is looked up in the
//!    mapping registry (`banksim-registry`). Unmapped events are hard
//!    errors, never silently skipped.
//! 3. **Bind**: the [`bind`] module threads a per-scenario
//!    [`SimulationContext`] through the sequence, resolving template
//!    parameters against earlier-bound entity handles and interleaving
//!    clock advances where offsets increase.
//! 4. **Synthesize**: the [`codegen`] module renders the bound step
//!    sequence into stable, diffable Rust source.
//!
//! Every stage is deterministic: the same scenario and registry always
//! produce byte-identical output. Any failure is fatal to that one
//! scenario's pipeline; batch conversion collects per-scenario outcomes
//! instead of aborting.

pub mod analyze;
pub mod batch;
pub mod bind;
pub mod codegen;

use std::path::Path;

use thiserror::Error;

use banksim_scenario::{ParseError, Scenario};

pub use analyze::{analyze, CoverageReport};
pub use batch::{convert_all, BatchReport, ScenarioFailure};
pub use bind::{
    bind, ActionInvocation, ArgValue, BoundArg, BoundScenario, ClockAdvance, SimulationContext,
    Step,
};
pub use codegen::GeneratedModule;

/// Errors from any stage of a single scenario's pipeline.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The scenario document failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Registry gap: the event has no classification. Actionable by
    /// adding a mapping entry, never by skipping the event.
    #[error("event {sequence_index} ({kind}::{variant}) has no registered mapping")]
    UnmappedEvent {
        kind: String,
        variant: String,
        sequence_index: usize,
    },

    /// The scenario references an entity label before any event creates it.
    #[error("event {sequence_index}: entity '{role}' referenced before it is created")]
    UnresolvedReference { role: String, sequence_index: usize },

    /// An invocation's offset is behind the simulated clock.
    #[error(
        "event {sequence_index}: simulated time moves backwards \
         (offset {offset_secs}s, clock already at {clock_secs}s)"
    )]
    TemporalOrder {
        sequence_index: usize,
        offset_secs: u64,
        clock_secs: u64,
    },

    /// A bound value does not fit the template parameter's declared shape.
    #[error("event {sequence_index}: template '{template}' parameter '{param}': {reason}")]
    TemplateRender {
        template: &'static str,
        param: &'static str,
        reason: String,
        sequence_index: usize,
    },

    /// Two distinct entity labels reduce to the same generated handle
    /// identifier; the later binding would shadow the earlier one and
    /// reroute every later reference to the wrong entity.
    #[error(
        "event {sequence_index}: entity '{label}' produces handle '{ident}', \
         already bound by a different entity"
    )]
    HandleCollision {
        label: String,
        ident: String,
        sequence_index: usize,
    },

    /// Two scenario files reduce to the same module name; generated file
    /// paths must stay disjoint.
    #[error("duplicate generated module name '{module}'")]
    DuplicateModule { module: String },

    /// Failed to write a generated artifact.
    #[error("failed to write generated output: {0}")]
    Io(#[from] std::io::Error),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Compile one scenario into its generated module.
pub fn convert(scenario: &Scenario) -> CompileResult<GeneratedModule> {
    let bound = bind::bind(scenario)?;
    codegen::synthesize(scenario, &bound)
}

/// Load a scenario file and compile it.
pub fn convert_path(path: impl AsRef<Path>) -> CompileResult<GeneratedModule> {
    let scenario = Scenario::load(path)?;
    convert(&scenario)
}

/// All registered event-to-action mappings, for the operator CLI.
pub fn list_mappings() -> &'static [banksim_registry::MappingEntry] {
    banksim_registry::entries()
}
