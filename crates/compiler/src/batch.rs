//! Batch conversion over a directory of scenario files.
//!
//! Each scenario's pipeline is independent: one failure is recorded and
//! the batch continues. Discovery is recursive over `*.yml` / `*.yaml`
//! and sorted, and the generated index is ordered by module name, so the
//! batch output does not depend on filesystem enumeration order.

use std::path::{Path, PathBuf};

use banksim_scenario::Scenario;

use crate::codegen::{synthesize_index, GeneratedModule};
use crate::{convert, CompileError, CompileResult};

/// One scenario that failed to convert.
#[derive(Debug)]
pub struct ScenarioFailure {
    pub path: PathBuf,
    pub error: CompileError,
}

/// Outcome of a batch conversion: generated modules (sorted by module
/// name), the aggregate index over them, and per-scenario failures.
#[derive(Debug)]
pub struct BatchReport {
    pub modules: Vec<GeneratedModule>,
    pub index: GeneratedModule,
    pub failures: Vec<ScenarioFailure>,
}

impl BatchReport {
    /// Write every generated module plus the index into `out_dir`, one
    /// file per scenario. With `clean`, previously generated `.rs` files
    /// in the directory are removed first. Failed scenarios write
    /// nothing.
    pub fn write_to(&self, out_dir: &Path, clean: bool) -> CompileResult<()> {
        if clean && out_dir.exists() {
            remove_generated_files(out_dir)?;
        }
        std::fs::create_dir_all(out_dir)?;

        for module in &self.modules {
            std::fs::write(out_dir.join(&module.file_name), &module.source)?;
        }
        std::fs::write(out_dir.join(&self.index.file_name), &self.index.source)?;

        tracing::info!(
            modules = self.modules.len(),
            out_dir = %out_dir.display(),
            "wrote generated scenario modules"
        );
        Ok(())
    }
}

/// Convert every scenario file found under `scenarios_dir`.
pub fn convert_all(scenarios_dir: &Path) -> CompileResult<BatchReport> {
    let mut modules: Vec<GeneratedModule> = Vec::new();
    let mut failures = Vec::new();

    for path in collect_scenario_files(scenarios_dir)? {
        let result = Scenario::load(&path).map_err(CompileError::from).and_then(|s| {
            let module = convert(&s)?;
            if modules.iter().any(|m| m.module_name == module.module_name) {
                return Err(CompileError::DuplicateModule {
                    module: module.module_name,
                });
            }
            Ok(module)
        });
        match result {
            Ok(module) => modules.push(module),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "scenario failed to convert");
                failures.push(ScenarioFailure { path, error });
            }
        }
    }

    modules.sort_by(|a, b| a.module_name.cmp(&b.module_name));
    let index = synthesize_index(&modules);

    tracing::info!(
        converted = modules.len(),
        failed = failures.len(),
        "batch conversion finished"
    );

    Ok(BatchReport {
        modules,
        index,
        failures,
    })
}

/// Recursively collect scenario files, sorted by path.
fn collect_scenario_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect_recursive(dir, &mut files)?;
    files.sort();
    Ok(files)
}

fn collect_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
            files.push(path);
        }
    }
    Ok(())
}

fn remove_generated_files(dir: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "rs") {
            std::fs::remove_file(&path)?;
        }
    }
    Ok(())
}
