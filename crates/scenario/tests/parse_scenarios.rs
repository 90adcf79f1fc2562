// Integration tests that parse realistic multi-event scenario documents,
// catching issues that small inline-string unit tests might miss.

use std::time::Duration;

use banksim_scenario::{FieldValue, Scenario};

const BASIC_LOAN: &str = r#"
name: basic loan
description: one customer takes one credit facility and repays it
seed: 42
start_time: 2024-01-01T09:00:00Z

events:
  - event: CustomerEvent::Initialized
    entity: customer_1
    at: 0m
    values:
      email: alice@example.com
      customer_type: Individual

  - event: DepositEvent::Initialized
    entity: deposit_1
    at: 1d
    values:
      customer_ref: customer_1
      amount: 10000000

  - event: CreditFacilityEvent::Initialized
    entity: facility_1
    at: 2d
    values:
      customer_ref: customer_1
      amount: 50000000
      collateral: 25000000
      terms:
        annual_rate: "0.12"
        duration:
          Months: 6

  - event: DisbursalEvent::Initialized
    entity: disbursal_1
    at: 2d
    values:
      facility_ref: facility_1
      amount: 50000000

  - event: PaymentEvent::Initialized
    entity: payment_1
    at: 32d
    values:
      facility_ref: facility_1
      amount: 5000000
"#;

#[test]
fn parses_full_timeline() {
    let scenario = Scenario::from_yaml(BASIC_LOAN).unwrap();

    assert_eq!(scenario.name, "basic loan");
    assert_eq!(scenario.module_name(), "basic_loan");
    assert_eq!(scenario.seed, 42);
    assert_eq!(scenario.start_time.to_rfc3339(), "2024-01-01T09:00:00+00:00");
    assert_eq!(scenario.events.len(), 5);

    let facility = &scenario.events[2];
    assert_eq!(facility.key.to_string(), "CreditFacilityEvent::Initialized");
    assert_eq!(facility.entity, "facility_1");
    assert_eq!(facility.offset, Duration::from_secs(2 * 86_400));
    assert_eq!(
        facility.field("terms.annual_rate").and_then(FieldValue::as_str),
        Some("0.12")
    );
    assert_eq!(
        facility
            .field("terms.duration.Months")
            .and_then(FieldValue::as_i64),
        Some(6)
    );
}

#[test]
fn sequence_indices_are_strictly_increasing() {
    let scenario = Scenario::from_yaml(BASIC_LOAN).unwrap();
    for (i, event) in scenario.events.iter().enumerate() {
        assert_eq!(event.sequence_index, i);
    }
}

#[test]
fn events_at_equal_offsets_keep_file_order() {
    let scenario = Scenario::from_yaml(BASIC_LOAN).unwrap();
    let facility = &scenario.events[2];
    let disbursal = &scenario.events[3];
    assert_eq!(facility.offset, disbursal.offset);
    assert!(facility.sequence_index < disbursal.sequence_index);
}
