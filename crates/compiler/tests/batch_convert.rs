// Batch conversion tests over real (temporary) directories.

use std::fs;
use std::path::Path;

use banksim_compiler::{convert_all, CompileError};

fn write_scenario(dir: &Path, file: &str, name: &str) {
    let yaml = format!(
        r#"
name: {name}
events:
  - event: CustomerEvent::Initialized
    entity: customer_1
    values:
      email: {name}@example.com
"#
    );
    fs::write(dir.join(file), yaml).unwrap();
}

#[test]
fn converts_every_scenario_and_sorts_the_index() {
    let dir = tempfile::tempdir().unwrap();
    // Deliberately unsorted file names vs scenario names.
    write_scenario(dir.path(), "01.yml", "zeta run");
    write_scenario(dir.path(), "02.yml", "alpha run");
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_scenario(&nested, "03.yaml", "mid run");

    let report = convert_all(dir.path()).unwrap();

    assert!(report.failures.is_empty());
    let names: Vec<&str> = report.modules.iter().map(|m| m.module_name.as_str()).collect();
    assert_eq!(names, ["alpha_run", "mid_run", "zeta_run"]);

    let index = &report.index.source;
    let alpha = index.find("pub mod alpha_run;").unwrap();
    let mid = index.find("pub mod mid_run;").unwrap();
    let zeta = index.find("pub mod zeta_run;").unwrap();
    assert!(alpha < mid && mid < zeta);
}

#[test]
fn one_failure_does_not_abort_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario(dir.path(), "good.yml", "good run");
    fs::write(
        dir.path().join("bad.yml"),
        r#"
name: bad run
events:
  - event: WithdrawalEvent::Initialized
    entity: withdrawal_1
"#,
    )
    .unwrap();

    let report = convert_all(dir.path()).unwrap();

    assert_eq!(report.modules.len(), 1);
    assert_eq!(report.modules[0].module_name, "good_run");
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("bad.yml"));
    assert!(matches!(
        report.failures[0].error,
        CompileError::UnmappedEvent { .. }
    ));
    // The index only references successes.
    assert!(!report.index.source.contains("bad_run"));
}

#[test]
fn duplicate_module_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario(dir.path(), "a.yml", "same name");
    write_scenario(dir.path(), "b.yml", "Same Name");

    let report = convert_all(dir.path()).unwrap();

    assert_eq!(report.modules.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        CompileError::DuplicateModule { .. }
    ));
}

#[test]
fn write_with_clean_removes_stale_modules() {
    let scenarios = tempfile::tempdir().unwrap();
    write_scenario(scenarios.path(), "a.yml", "alpha run");
    write_scenario(scenarios.path(), "b.yml", "beta run");

    let out = tempfile::tempdir().unwrap();
    fs::write(out.path().join("stale_scenario.rs"), "// stale\n").unwrap();
    fs::write(out.path().join("notes.txt"), "keep me\n").unwrap();

    let report = convert_all(scenarios.path()).unwrap();
    report.write_to(out.path(), true).unwrap();

    assert!(!out.path().join("stale_scenario.rs").exists());
    assert!(out.path().join("notes.txt").exists());
    assert!(out.path().join("alpha_run.rs").exists());
    assert!(out.path().join("beta_run.rs").exists());

    let index = fs::read_to_string(out.path().join("mod.rs")).unwrap();
    assert!(index.contains("pub mod alpha_run;"));
    assert!(index.contains("pub mod beta_run;"));

    let rs_files = fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "rs"))
        .count();
    // Two scenario modules plus the index.
    assert_eq!(rs_files, 3);
}

#[test]
fn regeneration_is_byte_stable() {
    let dir = tempfile::tempdir().unwrap();
    write_scenario(dir.path(), "a.yml", "alpha run");

    let first = convert_all(dir.path()).unwrap();
    let second = convert_all(dir.path()).unwrap();

    assert_eq!(first.modules[0].source, second.modules[0].source);
    assert_eq!(first.index.source, second.index.source);
}
