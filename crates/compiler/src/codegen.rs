//! Code synthesis.
//!
//! Renders a bound step sequence into Rust source for the host's
//! sim-bootstrap harness. The structure is fixed: module header,
//! a single `pub async fn run(sim: &mut SimDriver)` whose body holds one
//! statement per step, and a sorted index module for batch runs.
//!
//! Only already-validated [`ArgValue`]s are spliced into the output.
//! String values are escaped, identifiers have been sanitized during
//! binding, and numeric shapes render through typed constructors, so no
//! scenario-authored text can alter the structure of the emitted code.
//! Re-synthesizing the same step sequence yields byte-identical text.

use banksim_scenario::Scenario;

use crate::bind::{ActionInvocation, ArgValue, BoundScenario, Step};
use crate::{CompileError, CompileResult};

/// One generated artifact: target file name plus full source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// Module identifier, e.g. `basic_loan`.
    pub module_name: String,
    /// Target file name, e.g. `basic_loan.rs`.
    pub file_name: String,
    pub source: String,
}

/// Render one scenario's generated module.
pub fn synthesize(scenario: &Scenario, bound: &BoundScenario) -> CompileResult<GeneratedModule> {
    let module_name = scenario.module_name();

    let mut src = String::new();
    src.push_str(&format!(
        "//! Generated scenario module `{module_name}`.\n//!\n"
    ));
    src.push_str(&format!(
        "//! Source scenario: \"{}\".\n",
        comment_safe(&scenario.name)
    ));
    if !scenario.description.is_empty() {
        src.push_str(&format!("//! {}\n", comment_safe(&scenario.description)));
    }
    src.push_str("//!\n//! Regenerated by the scenario compiler; do not edit by hand.\n\n");
    src.push_str("use std::time::Duration;\n\nuse crate::scenarios::prelude::*;\n\n");
    src.push_str("pub async fn run(sim: &mut SimDriver) -> Result<()> {\n");
    src.push_str(&format!(
        "    sim.set_start_time(\"{}\").await?;\n",
        scenario.start_time.to_rfc3339()
    ));
    src.push_str(&format!("    sim.set_seed({}).await?;\n", scenario.seed));

    for step in &bound.steps {
        match step {
            Step::Advance(advance) => {
                src.push_str(&format!(
                    "    sim.advance(Duration::from_secs({})).await?;\n",
                    advance.delta.as_secs()
                ));
            }
            Step::Invoke(invocation) => {
                src.push_str("    ");
                src.push_str(&render_invocation(invocation)?);
                src.push('\n');
            }
        }
    }

    src.push_str("    Ok(())\n}\n");

    Ok(GeneratedModule {
        file_name: format!("{module_name}.rs"),
        module_name,
        source: src,
    })
}

/// Render the aggregate index module over a set of generated scenario
/// modules. Output order is sorted by module name, independent of the
/// caller's ordering, so regeneration is stable.
pub fn synthesize_index(modules: &[GeneratedModule]) -> GeneratedModule {
    let mut names: Vec<&str> = modules.iter().map(|m| m.module_name.as_str()).collect();
    names.sort_unstable();

    let mut src = String::new();
    src.push_str("//! Generated scenario index.\n//!\n");
    src.push_str("//! Regenerated by the scenario compiler; do not edit by hand.\n\n");
    for name in &names {
        src.push_str(&format!("pub mod {name};\n"));
    }
    src.push_str("\n/// Every generated scenario module, sorted by name.\n");
    src.push_str("pub const SCENARIO_MODULES: &[&str] = &[\n");
    for name in &names {
        src.push_str(&format!("    \"{name}\",\n"));
    }
    src.push_str("];\n");

    GeneratedModule {
        module_name: "mod".to_string(),
        file_name: "mod.rs".to_string(),
        source: src,
    }
}

fn render_invocation(invocation: &ActionInvocation) -> CompileResult<String> {
    let mut args = Vec::with_capacity(invocation.args.len());
    for arg in &invocation.args {
        args.push(render_arg(invocation, arg.name, &arg.value)?);
    }
    let call = format!(
        "sim.{}({}).await?;",
        invocation.template_id,
        args.join(", ")
    );
    Ok(match &invocation.binds {
        Some(var) => format!("let {var} = {call}"),
        None => call,
    })
}

fn render_arg(
    invocation: &ActionInvocation,
    param: &'static str,
    value: &ArgValue,
) -> CompileResult<String> {
    match value {
        ArgValue::Str(s) => Ok(format!("\"{}\"", escape_str(s))),
        ArgValue::Cents(n) => Ok(format!("UsdCents::from({n})")),
        ArgValue::Sats(n) => Ok(format!("Satoshis::from({n})")),
        ArgValue::Months(m) => Ok(m.to_string()),
        ArgValue::CustomerType(t) => Ok(format!("CustomerType::{t}")),
        // Rate and Handle were validated during binding; re-check before
        // splicing so a future template cannot smuggle unchecked text.
        ArgValue::Rate(r) => {
            if r.bytes().all(|b| b.is_ascii_digit() || b == b'.') && !r.is_empty() {
                Ok(format!("dec!({r})"))
            } else {
                Err(unrenderable(invocation, param, "rate is not a decimal literal"))
            }
        }
        ArgValue::Handle(var) => {
            if is_ident(var) {
                Ok(format!("&{var}"))
            } else {
                Err(unrenderable(invocation, param, "handle is not a valid identifier"))
            }
        }
    }
}

fn unrenderable(
    invocation: &ActionInvocation,
    param: &'static str,
    reason: &str,
) -> CompileError {
    CompileError::TemplateRender {
        template: invocation.template_id,
        param,
        reason: reason.to_string(),
        sequence_index: invocation.sequence_index,
    }
}

fn escape_str(s: &str) -> String {
    s.chars().flat_map(char::escape_default).collect()
}

/// Comment-position text: strip line breaks and other control characters
/// so scenario metadata cannot terminate the doc comment.
fn comment_safe(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
