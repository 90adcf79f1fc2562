//! Context binding.
//!
//! Walks the event sequence in order, threading one mutable
//! [`SimulationContext`] through the pass. Each explicit event's template
//! parameters are resolved here, against either literal event fields or
//! entity handles bound by earlier events, and the simulated clock is
//! advanced whenever an invocation's offset exceeds it.
//!
//! Shape validation also happens here: every resolved value is checked
//! against the template parameter's declared [`ArgShape`], so the
//! synthesizer downstream only ever splices checked values into generated
//! source. Raw scenario text never reaches a structural code position.

use std::time::Duration;

use indexmap::IndexMap;

use banksim_registry::{
    lookup, ActionTemplate, ArgShape, Classification, DefaultValue, ParamSource, ParamSpec,
};
use banksim_scenario::{sanitize_identifier, Event, FieldValue, Scenario};

use crate::{CompileError, CompileResult};

/// Customer types the host accepts; anything else is a render error.
const CUSTOMER_TYPES: &[&str] = &["Individual", "Company"];

/// A resolved call to one host operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInvocation {
    /// Host operation name, from the template.
    pub template_id: &'static str,
    /// Local variable the call's result is bound to, when the template
    /// produces a new entity handle.
    pub binds: Option<String>,
    /// Arguments in positional call order.
    pub args: Vec<BoundArg>,
    /// Source event position, for diagnostics.
    pub sequence_index: usize,
}

/// One resolved argument.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg {
    pub name: &'static str,
    pub value: ArgValue,
}

/// A value already validated against its template shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Str(String),
    Cents(u64),
    Sats(u64),
    /// Decimal literal, validated digits-dot-digits.
    Rate(String),
    Months(u32),
    CustomerType(&'static str),
    /// Identifier of a previously bound entity handle.
    Handle(String),
}

/// Simulated clock movement between invocations. Always forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockAdvance {
    pub delta: Duration,
}

/// One element of the bound output sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Invoke(ActionInvocation),
    Advance(ClockAdvance),
}

/// Entity handles bound so far plus the simulated clock. Owned by one
/// scenario's binding pass and discarded after synthesis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationContext {
    /// Entity label -> generated local identifier.
    pub entities: IndexMap<String, String>,
    /// Current simulated offset from the scenario start.
    pub clock: Duration,
}

/// Binder output: the ordered step sequence plus the final context
/// snapshot for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundScenario {
    pub steps: Vec<Step>,
    pub context: SimulationContext,
}

impl BoundScenario {
    pub fn invocations(&self) -> impl Iterator<Item = &ActionInvocation> {
        self.steps.iter().filter_map(|s| match s {
            Step::Invoke(inv) => Some(inv),
            Step::Advance(_) => None,
        })
    }
}

/// Bind a parsed scenario against the mapping registry.
pub fn bind(scenario: &Scenario) -> CompileResult<BoundScenario> {
    let mut context = SimulationContext::default();
    let mut steps = Vec::new();

    for event in &scenario.events {
        match lookup(&event.key.kind, &event.key.variant) {
            Classification::Unmapped => {
                return Err(CompileError::UnmappedEvent {
                    kind: event.key.kind.clone(),
                    variant: event.key.variant.clone(),
                    sequence_index: event.sequence_index,
                });
            }
            Classification::Implicit => {
                tracing::debug!(event = %event.key, entity = %event.entity, "implicit, skipped");
            }
            Classification::Explicit(template) => {
                // Clock only moves when an invocation is appended; implicit
                // events never advance it.
                if event.offset > context.clock {
                    steps.push(Step::Advance(ClockAdvance {
                        delta: event.offset - context.clock,
                    }));
                    context.clock = event.offset;
                } else if event.offset < context.clock {
                    return Err(CompileError::TemporalOrder {
                        sequence_index: event.sequence_index,
                        offset_secs: event.offset.as_secs(),
                        clock_secs: context.clock.as_secs(),
                    });
                }

                let invocation = resolve_invocation(event, template, &context)?;
                if let Some(var) = &invocation.binds {
                    // Distinct labels must not share a handle identifier:
                    // the later `let` would shadow the earlier one and
                    // every later reference would splice the wrong entity.
                    let collision = context
                        .entities
                        .iter()
                        .any(|(label, v)| v == var && label != &event.entity);
                    if collision {
                        return Err(CompileError::HandleCollision {
                            label: event.entity.clone(),
                            ident: var.clone(),
                            sequence_index: event.sequence_index,
                        });
                    }
                    context.entities.insert(event.entity.clone(), var.clone());
                }
                steps.push(Step::Invoke(invocation));
            }
        }
    }

    Ok(BoundScenario { steps, context })
}

fn resolve_invocation(
    event: &Event,
    template: &'static ActionTemplate,
    context: &SimulationContext,
) -> CompileResult<ActionInvocation> {
    let mut args = Vec::with_capacity(template.params.len());
    for param in template.params {
        args.push(BoundArg {
            name: param.name,
            value: resolve_param(event, template, param, context)?,
        });
    }

    let binds = if template.produces {
        Some(handle_ident(event, template)?)
    } else {
        None
    };

    Ok(ActionInvocation {
        template_id: template.id,
        binds,
        args,
        sequence_index: event.sequence_index,
    })
}

fn resolve_param(
    event: &Event,
    template: &'static ActionTemplate,
    param: &ParamSpec,
    context: &SimulationContext,
) -> CompileResult<ArgValue> {
    match param.source {
        ParamSource::OwnEntity => Ok(ArgValue::Str(event.entity.clone())),
        ParamSource::OwnEntityRef => resolve_handle(event, &event.entity, context),
        ParamSource::EntityRef(field) => {
            let value = event.field(field).ok_or_else(|| render_error(
                event,
                template,
                param,
                format!("missing required reference field '{field}'"),
            ))?;
            let label = value.as_str().ok_or_else(|| render_error(
                event,
                template,
                param,
                format!("reference field '{field}' must be a string entity label"),
            ))?;
            // Scenario authors may write `customer_1` or `customer_1_ref`.
            let label = label.strip_suffix("_ref").unwrap_or(label);
            resolve_handle(event, label, context)
        }
        ParamSource::Field(field) => {
            let value = event.field(field).ok_or_else(|| render_error(
                event,
                template,
                param,
                format!("missing required field '{field}'"),
            ))?;
            coerce(event, template, param, value)
        }
        ParamSource::FieldOr(field, default) => match event.field(field) {
            Some(value) => coerce(event, template, param, value),
            None => default_value(event, template, param, default),
        },
    }
}

fn resolve_handle(
    event: &Event,
    label: &str,
    context: &SimulationContext,
) -> CompileResult<ArgValue> {
    match context.entities.get(label) {
        Some(var) => Ok(ArgValue::Handle(var.clone())),
        None => Err(CompileError::UnresolvedReference {
            role: label.to_string(),
            sequence_index: event.sequence_index,
        }),
    }
}

fn handle_ident(event: &Event, template: &'static ActionTemplate) -> CompileResult<String> {
    let ident = sanitize_identifier(&event.entity);
    if ident.is_empty() {
        return Err(CompileError::TemplateRender {
            template: template.id,
            param: "entity",
            reason: format!("entity label '{}' is not usable as an identifier", event.entity),
            sequence_index: event.sequence_index,
        });
    }
    Ok(ident)
}

/// Validate a literal field value against the parameter's declared shape.
fn coerce(
    event: &Event,
    template: &'static ActionTemplate,
    param: &ParamSpec,
    value: &FieldValue,
) -> CompileResult<ArgValue> {
    match (param.shape, value) {
        (ArgShape::Str, FieldValue::Str(s)) => Ok(ArgValue::Str(s.clone())),
        (ArgShape::Cents, FieldValue::Int(v)) if *v >= 0 => Ok(ArgValue::Cents(*v as u64)),
        (ArgShape::Sats, FieldValue::Int(v)) if *v >= 0 => Ok(ArgValue::Sats(*v as u64)),
        (ArgShape::Months, FieldValue::Int(v)) if (1..=600).contains(v) => {
            Ok(ArgValue::Months(*v as u32))
        }
        (ArgShape::Rate, FieldValue::Str(s)) if is_decimal_literal(s) => {
            Ok(ArgValue::Rate(s.clone()))
        }
        // Unquoted YAML rates arrive as floats; Display for f64 never
        // emits an exponent, but re-check the literal before accepting.
        (ArgShape::Rate, FieldValue::Float(v)) if *v >= 0.0 => {
            let rendered = format!("{v}");
            if is_decimal_literal(&rendered) {
                Ok(ArgValue::Rate(rendered))
            } else {
                Err(render_error(
                    event,
                    template,
                    param,
                    format!("rate {v} does not render as a decimal literal"),
                ))
            }
        }
        (ArgShape::CustomerType, FieldValue::Str(s)) => CUSTOMER_TYPES
            .iter()
            .find(|t| **t == s.as_str())
            .map(|t| ArgValue::CustomerType(*t))
            .ok_or_else(|| {
                render_error(
                    event,
                    template,
                    param,
                    format!("unknown customer type '{s}' (expected one of {CUSTOMER_TYPES:?})"),
                )
            }),
        (shape, value) => Err(render_error(
            event,
            template,
            param,
            format!("value {value:?} does not fit shape {shape:?}"),
        )),
    }
}

fn default_value(
    event: &Event,
    template: &'static ActionTemplate,
    param: &ParamSpec,
    default: DefaultValue,
) -> CompileResult<ArgValue> {
    match (param.shape, default) {
        (ArgShape::Cents, DefaultValue::Int(v)) => Ok(ArgValue::Cents(v)),
        (ArgShape::Sats, DefaultValue::Int(v)) => Ok(ArgValue::Sats(v)),
        (ArgShape::Months, DefaultValue::Int(v)) => Ok(ArgValue::Months(v as u32)),
        (ArgShape::Rate, DefaultValue::Str(s)) => Ok(ArgValue::Rate(s.to_string())),
        (ArgShape::Str, DefaultValue::Str(s)) => Ok(ArgValue::Str(s.to_string())),
        (ArgShape::CustomerType, DefaultValue::Str(s)) => Ok(ArgValue::CustomerType(
            CUSTOMER_TYPES.iter().find(|t| **t == s).copied().unwrap_or("Individual"),
        )),
        (ArgShape::Str, DefaultValue::EntityEmail) => {
            Ok(ArgValue::Str(format!("{}@example.com", event.entity)))
        }
        (shape, default) => Err(render_error(
            event,
            template,
            param,
            format!("default {default:?} does not fit shape {shape:?}"),
        )),
    }
}

/// Digits with at most one interior dot: `10`, `0.10`, `12.5`.
fn is_decimal_literal(s: &str) -> bool {
    let mut dots = 0;
    if s.is_empty() || s.starts_with('.') || s.ends_with('.') {
        return false;
    }
    for b in s.bytes() {
        match b {
            b'0'..=b'9' => {}
            b'.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1
}

fn render_error(
    event: &Event,
    template: &'static ActionTemplate,
    param: &ParamSpec,
    reason: String,
) -> CompileError {
    CompileError::TemplateRender {
        template: template.id,
        param: param.name,
        reason,
        sequence_index: event.sequence_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    fn event(
        key: &str,
        entity: &str,
        offset: Duration,
        sequence_index: usize,
        fields: &[(&str, FieldValue)],
    ) -> Event {
        let (kind, variant) = key.split_once("::").unwrap();
        Event {
            key: banksim_scenario::EventKey::new(kind, variant),
            entity: entity.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            sequence_index,
            offset,
        }
    }

    // The parser rejects offset regressions before binding, so the
    // binder's own check is only reachable with a hand-built sequence.
    #[test]
    fn decreasing_offsets_are_a_temporal_order_error() {
        let scenario = Scenario {
            name: "backwards clock".to_string(),
            description: String::new(),
            seed: 0,
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            events: vec![
                event(
                    "CustomerEvent::Initialized",
                    "customer_1",
                    Duration::from_secs(5 * 86_400),
                    0,
                    &[],
                ),
                event(
                    "DepositEvent::Initialized",
                    "deposit_1",
                    Duration::from_secs(2 * 86_400),
                    1,
                    &[("customer_ref", FieldValue::Str("customer_1".to_string()))],
                ),
            ],
        };

        match bind(&scenario).unwrap_err() {
            CompileError::TemporalOrder {
                sequence_index,
                offset_secs,
                clock_secs,
            } => {
                assert_eq!(sequence_index, 1);
                assert_eq!(offset_secs, 2 * 86_400);
                assert_eq!(clock_secs, 5 * 86_400);
            }
            other => panic!("expected TemporalOrder, got {other:?}"),
        }
    }

    #[test]
    fn decimal_literal_grammar() {
        assert!(is_decimal_literal("0.10"));
        assert!(is_decimal_literal("12"));
        assert!(is_decimal_literal("12.5"));
        assert!(!is_decimal_literal(""));
        assert!(!is_decimal_literal(".5"));
        assert!(!is_decimal_literal("5."));
        assert!(!is_decimal_literal("1.2.3"));
        assert!(!is_decimal_literal("0.1e3"));
        assert!(!is_decimal_literal("-0.1"));
    }
}
