//! Mapping coverage analysis.
//!
//! Non-mutating inspection of a parsed scenario: which distinct event
//! types will compile, which are host side effects, and which will block
//! compilation with an unmapped error. Consumed by the operator CLI
//! before attempting conversion; never proceeds to binding or synthesis.

use std::collections::BTreeSet;

use banksim_registry::{lookup, Classification};
use banksim_scenario::{EventKey, Scenario};

/// Partition of a scenario's distinct `(kind, variant)` pairs.
///
/// The three sets never overlap: each distinct pair lands in exactly one,
/// according to the registry's classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    /// Event types that compile to host operation calls.
    pub explicit: BTreeSet<EventKey>,
    /// Event types the host produces automatically; skipped.
    pub implicit: BTreeSet<EventKey>,
    /// Event types with no registered mapping; these fail conversion.
    pub unmapped: BTreeSet<EventKey>,
    /// Total number of events in the scenario (occurrences, not types).
    pub event_count: usize,
}

impl CoverageReport {
    /// True when conversion can succeed: no unmapped event types.
    pub fn is_fully_mapped(&self) -> bool {
        self.unmapped.is_empty()
    }
}

/// Classify every distinct event type appearing in the scenario.
pub fn analyze(scenario: &Scenario) -> CoverageReport {
    let mut report = CoverageReport {
        event_count: scenario.events.len(),
        ..CoverageReport::default()
    };
    for event in &scenario.events {
        let set = match lookup(&event.key.kind, &event.key.variant) {
            Classification::Explicit(_) => &mut report.explicit,
            Classification::Implicit => &mut report.implicit,
            Classification::Unmapped => &mut report.unmapped,
        };
        set.insert(event.key.clone());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario(yaml: &str) -> Scenario {
        Scenario::from_yaml(yaml).unwrap()
    }

    #[test]
    fn partitions_without_overlap() {
        let s = scenario(
            r#"
name: coverage
events:
  - event: CustomerEvent::Initialized
    entity: customer_1
  - event: ApprovalProcessEvent::Approved
    entity: approval_1
  - event: WithdrawalEvent::Initialized
    entity: withdrawal_1
  - event: CustomerEvent::Initialized
    entity: customer_2
"#,
        );
        let report = analyze(&s);
        assert_eq!(report.event_count, 4);
        assert_eq!(report.explicit.len(), 1);
        assert_eq!(report.implicit.len(), 1);
        assert_eq!(report.unmapped.len(), 1);
        assert!(!report.is_fully_mapped());

        for key in &report.explicit {
            assert!(!report.implicit.contains(key));
            assert!(!report.unmapped.contains(key));
        }
    }

    #[test]
    fn empty_scenario_is_fully_mapped() {
        let report = analyze(&scenario("name: empty\n"));
        assert_eq!(report.event_count, 0);
        assert!(report.is_fully_mapped());
    }
}
