//! Event-to-Action Mapping Registry.
//!
//! Maps each domain event `(kind, variant)` pair to one of three
//! classifications:
//!
//! - **Explicit** - the event must be replayed by calling one host
//!   operation; the attached [`ActionTemplate`] names that operation and
//!   the arguments it needs.
//! - **Implicit** - the host produces this event on its own as a side
//!   effect of an earlier action; the compiler skips it.
//! - **Unmapped** - nothing is registered. Lookup is fail-closed: an
//!   absent key is `Unmapped`, and the binder turns that into a hard
//!   error rather than silently dropping the event.
//!
//! The table is policy, not computation. Adding support for a new host
//! operation means adding one [`MappingEntry`] (and, for explicit events,
//! one template); the binder and synthesizer never change.
//!
//! Withdrawals, prospects and reports are deliberately absent: their
//! replay semantics are unsettled, and an unmapped error at compile time
//! beats a generated scenario that silently diverges from its source.

/// How one event `(kind, variant)` is handled by the compiler.
#[derive(Debug, Clone, Copy)]
pub enum Classification {
    /// Replay by invoking the templated host operation.
    Explicit(&'static ActionTemplate),
    /// Host-produced side effect; skipped.
    Implicit,
    /// No registered mapping; compiling this event is an error.
    Unmapped,
}

impl Classification {
    pub fn is_explicit(&self) -> bool {
        matches!(self, Classification::Explicit(_))
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, Classification::Implicit)
    }

    pub fn is_unmapped(&self) -> bool {
        matches!(self, Classification::Unmapped)
    }
}

/// One row of the mapping table.
#[derive(Debug, Clone, Copy)]
pub struct MappingEntry {
    pub kind: &'static str,
    pub variant: &'static str,
    pub classification: Classification,
}

/// Describes one host operation invocation: the method to call on the
/// simulation driver and the arguments it takes, in call order.
#[derive(Debug)]
pub struct ActionTemplate {
    /// Host operation name; also the method emitted in generated code.
    pub id: &'static str,
    /// Parameters in positional call order.
    pub params: &'static [ParamSpec],
    /// Whether invoking this template binds the event's entity label as a
    /// new handle in the simulation context, visible to later events.
    pub produces: bool,
}

/// One template parameter: where its value comes from and what shape the
/// synthesizer may render it as.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub source: ParamSource,
    pub shape: ArgShape,
}

/// Where a parameter's value is resolved from during binding.
#[derive(Debug, Clone, Copy)]
pub enum ParamSource {
    /// The event's own entity label, as a literal string.
    OwnEntity,
    /// The handle previously bound for the event's own entity label.
    OwnEntityRef,
    /// A handle previously bound for another entity, named by the given
    /// event field (a trailing `_ref` on the field's value is stripped).
    EntityRef(&'static str),
    /// A literal event field, addressed by dotted path. Missing field is
    /// a render error.
    Field(&'static str),
    /// A literal event field with a fallback when absent.
    FieldOr(&'static str, DefaultValue),
}

/// Fallback value for an absent literal field.
#[derive(Debug, Clone, Copy)]
pub enum DefaultValue {
    Int(u64),
    Str(&'static str),
    /// `<entity>@example.com`, derived from the event's entity label.
    EntityEmail,
}

/// The renderable argument shapes. The binder validates every resolved
/// value against its declared shape, so the synthesizer only ever splices
/// checked values into generated source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    /// Escaped string literal.
    Str,
    /// `UsdCents::from(n)` - non-negative integer amount in cents.
    Cents,
    /// `Satoshis::from(n)` - non-negative integer collateral amount.
    Sats,
    /// `dec!(r)` - decimal annual rate, validated digits-dot-digits.
    Rate,
    /// Plain integer month count.
    Months,
    /// `CustomerType::<Variant>` from a closed set.
    CustomerType,
    /// Reference to a previously bound entity handle.
    Handle,
}

use ArgShape as S;
use DefaultValue as D;
use ParamSource as P;

const CREATE_CUSTOMER: ActionTemplate = ActionTemplate {
    id: "create_customer",
    params: &[
        ParamSpec { name: "label", source: P::OwnEntity, shape: S::Str },
        ParamSpec { name: "email", source: P::FieldOr("email", D::EntityEmail), shape: S::Str },
        ParamSpec {
            name: "customer_type",
            source: P::FieldOr("customer_type", D::Str("Individual")),
            shape: S::CustomerType,
        },
    ],
    produces: true,
};

const MAKE_DEPOSIT: ActionTemplate = ActionTemplate {
    id: "make_deposit",
    params: &[
        ParamSpec { name: "customer", source: P::EntityRef("customer_ref"), shape: S::Handle },
        ParamSpec { name: "amount", source: P::FieldOr("amount", D::Int(10_000_000)), shape: S::Cents },
    ],
    produces: false,
};

const CREATE_PROPOSAL: ActionTemplate = ActionTemplate {
    id: "create_proposal",
    params: &[
        ParamSpec { name: "customer", source: P::EntityRef("customer_ref"), shape: S::Handle },
        ParamSpec { name: "amount", source: P::FieldOr("amount", D::Int(50_000_000)), shape: S::Cents },
        ParamSpec {
            name: "annual_rate",
            source: P::FieldOr("terms.annual_rate", D::Str("0.10")),
            shape: S::Rate,
        },
        ParamSpec {
            name: "duration_months",
            source: P::FieldOr("terms.duration.Months", D::Int(6)),
            shape: S::Months,
        },
    ],
    produces: true,
};

const CONCLUDE_CUSTOMER_APPROVAL: ActionTemplate = ActionTemplate {
    id: "conclude_customer_approval",
    params: &[ParamSpec { name: "proposal", source: P::OwnEntityRef, shape: S::Handle }],
    produces: false,
};

const WAIT_FOR_APPROVAL: ActionTemplate = ActionTemplate {
    id: "wait_for_approval",
    params: &[ParamSpec { name: "proposal", source: P::OwnEntityRef, shape: S::Handle }],
    produces: false,
};

const UPDATE_COLLATERAL: ActionTemplate = ActionTemplate {
    id: "update_collateral",
    params: &[
        ParamSpec { name: "facility", source: P::EntityRef("facility_ref"), shape: S::Handle },
        ParamSpec { name: "collateral", source: P::FieldOr("collateral", D::Int(25_000_000)), shape: S::Sats },
    ],
    produces: false,
};

/// The host's `create_facility` wraps the full proposal flow (proposal,
/// customer approval, collateral, activation) behind one operation, so a
/// `CreditFacilityEvent::Initialized` maps to a single invocation.
const CREATE_FACILITY: ActionTemplate = ActionTemplate {
    id: "create_facility",
    params: &[
        ParamSpec { name: "customer", source: P::EntityRef("customer_ref"), shape: S::Handle },
        ParamSpec { name: "amount", source: P::FieldOr("amount", D::Int(50_000_000)), shape: S::Cents },
        ParamSpec { name: "collateral", source: P::FieldOr("collateral", D::Int(25_000_000)), shape: S::Sats },
        ParamSpec {
            name: "annual_rate",
            source: P::FieldOr("terms.annual_rate", D::Str("0.10")),
            shape: S::Rate,
        },
        ParamSpec {
            name: "duration_months",
            source: P::FieldOr("terms.duration.Months", D::Int(6)),
            shape: S::Months,
        },
    ],
    produces: true,
};

const COMPLETE_FACILITY: ActionTemplate = ActionTemplate {
    id: "complete_facility",
    params: &[ParamSpec { name: "facility", source: P::OwnEntityRef, shape: S::Handle }],
    produces: false,
};

const INITIATE_DISBURSAL: ActionTemplate = ActionTemplate {
    id: "initiate_disbursal",
    params: &[
        ParamSpec { name: "facility", source: P::EntityRef("facility_ref"), shape: S::Handle },
        ParamSpec { name: "amount", source: P::FieldOr("amount", D::Int(50_000_000)), shape: S::Cents },
    ],
    produces: true,
};

const WAIT_FOR_DISBURSAL: ActionTemplate = ActionTemplate {
    id: "wait_for_disbursal",
    params: &[ParamSpec { name: "disbursal", source: P::OwnEntityRef, shape: S::Handle }],
    produces: false,
};

const RECORD_PAYMENT: ActionTemplate = ActionTemplate {
    id: "record_payment",
    params: &[
        ParamSpec { name: "facility", source: P::EntityRef("facility_ref"), shape: S::Handle },
        ParamSpec { name: "amount", source: P::FieldOr("amount", D::Int(0)), shape: S::Cents },
    ],
    produces: false,
};

const CREATE_TERMS_TEMPLATE: ActionTemplate = ActionTemplate {
    id: "create_terms_template",
    params: &[
        ParamSpec { name: "name", source: P::OwnEntity, shape: S::Str },
        ParamSpec { name: "annual_rate", source: P::FieldOr("annual_rate", D::Str("0.10")), shape: S::Rate },
        ParamSpec { name: "duration_months", source: P::FieldOr("duration_months", D::Int(6)), shape: S::Months },
    ],
    produces: true,
};

macro_rules! explicit {
    ($kind:literal, $variant:literal, $template:expr) => {
        MappingEntry {
            kind: $kind,
            variant: $variant,
            classification: Classification::Explicit(&$template),
        }
    };
}

macro_rules! implicit {
    ($kind:literal, $variant:literal) => {
        MappingEntry {
            kind: $kind,
            variant: $variant,
            classification: Classification::Implicit,
        }
    };
}

/// The full mapping table. One entry per `(kind, variant)`; uniqueness is
/// enforced by test. Time-only events (accrual cycles, maturity, obligation
/// due dates) are implicit because clock movement is derived from event
/// offsets, not from mapped actions.
static MAPPINGS: &[MappingEntry] = &[
    // Customer lifecycle
    explicit!("CustomerEvent", "Initialized", CREATE_CUSTOMER),
    implicit!("CustomerEvent", "EmailUpdated"),
    // Deposits
    implicit!("DepositAccountEvent", "Initialized"),
    explicit!("DepositEvent", "Initialized", MAKE_DEPOSIT),
    // Credit facility proposal
    explicit!("CreditFacilityProposalEvent", "Initialized", CREATE_PROPOSAL),
    explicit!(
        "CreditFacilityProposalEvent",
        "CustomerApprovalConcluded",
        CONCLUDE_CUSTOMER_APPROVAL
    ),
    explicit!(
        "CreditFacilityProposalEvent",
        "ApprovalProcessConcluded",
        WAIT_FOR_APPROVAL
    ),
    // Approval process
    implicit!("ApprovalProcessEvent", "Initialized"),
    implicit!("ApprovalProcessEvent", "Approved"),
    implicit!("ApprovalProcessEvent", "Denied"),
    implicit!("ApprovalProcessEvent", "Concluded"),
    // Collateral
    implicit!("CollateralEvent", "Initialized"),
    explicit!("CollateralEvent", "UpdatedViaManualInput", UPDATE_COLLATERAL),
    explicit!("CollateralEvent", "UpdatedViaCustodianSync", UPDATE_COLLATERAL),
    // Pending credit facility
    implicit!("PendingCreditFacilityEvent", "Initialized"),
    implicit!("PendingCreditFacilityEvent", "CollateralizationStateChanged"),
    implicit!("PendingCreditFacilityEvent", "Completed"),
    // Credit facility
    explicit!("CreditFacilityEvent", "Initialized", CREATE_FACILITY),
    implicit!("CreditFacilityEvent", "InterestAccrualCycleStarted"),
    implicit!("CreditFacilityEvent", "InterestAccrualCycleConcluded"),
    implicit!("CreditFacilityEvent", "CollateralizationStateChanged"),
    implicit!("CreditFacilityEvent", "CollateralizationRatioChanged"),
    implicit!("CreditFacilityEvent", "PartialLiquidationInitiated"),
    implicit!("CreditFacilityEvent", "ProceedsFromPartialLiquidationApplied"),
    implicit!("CreditFacilityEvent", "Matured"),
    explicit!("CreditFacilityEvent", "Completed", COMPLETE_FACILITY),
    // Disbursal
    explicit!("DisbursalEvent", "Initialized", INITIATE_DISBURSAL),
    implicit!("DisbursalEvent", "ApprovalProcessConcluded"),
    explicit!("DisbursalEvent", "Settled", WAIT_FOR_DISBURSAL),
    // Obligations
    implicit!("ObligationEvent", "Initialized"),
    implicit!("ObligationEvent", "DueRecorded"),
    implicit!("ObligationEvent", "OverdueRecorded"),
    implicit!("ObligationEvent", "DefaultedRecorded"),
    implicit!("ObligationEvent", "PaymentAllocated"),
    implicit!("ObligationEvent", "Completed"),
    // Payments
    explicit!("PaymentEvent", "Initialized", RECORD_PAYMENT),
    implicit!("PaymentAllocationEvent", "Initialized"),
    // Liquidation
    implicit!("LiquidationEvent", "Initialized"),
    implicit!("LiquidationEvent", "CollateralSentOut"),
    implicit!("LiquidationEvent", "ProceedsReceivedAndLiquidationCompleted"),
    // Terms templates and back-office setup
    explicit!("TermsTemplateEvent", "Initialized", CREATE_TERMS_TEMPLATE),
    implicit!("CustodianEvent", "Initialized"),
    implicit!("CustodianEvent", "ConfigUpdated"),
    implicit!("CommitteeEvent", "Initialized"),
    implicit!("CommitteeEvent", "MemberAdded"),
    implicit!("ChartEvent", "Initialized"),
    implicit!("ChartEvent", "BaseConfigSet"),
    implicit!("ChartNodeEvent", "Initialized"),
    implicit!("ChartNodeEvent", "ChildNodeAdded"),
    implicit!("RoleEvent", "Initialized"),
    implicit!("UserEvent", "Initialized"),
];

/// Look up the classification for an event. Absent keys are `Unmapped`.
pub fn lookup(kind: &str, variant: &str) -> Classification {
    MAPPINGS
        .iter()
        .find(|e| e.kind == kind && e.variant == variant)
        .map(|e| e.classification)
        .unwrap_or(Classification::Unmapped)
}

/// All registered mapping entries, for coverage analysis and listing.
pub fn entries() -> &'static [MappingEntry] {
    MAPPINGS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lookup_finds_explicit_entries() {
        let classification = lookup("CustomerEvent", "Initialized");
        match classification {
            Classification::Explicit(template) => {
                assert_eq!(template.id, "create_customer");
                assert!(template.produces);
            }
            _ => panic!("expected explicit mapping"),
        }
    }

    #[test]
    fn lookup_is_fail_closed() {
        assert!(lookup("WithdrawalEvent", "Initialized").is_unmapped());
        assert!(lookup("ReportEvent", "Initialized").is_unmapped());
        assert!(lookup("ProspectEvent", "KycStarted").is_unmapped());
        assert!(lookup("CustomerEvent", "NoSuchVariant").is_unmapped());
    }

    #[test]
    fn table_has_no_duplicate_keys() {
        let mut seen = HashSet::new();
        for entry in entries() {
            assert!(
                seen.insert((entry.kind, entry.variant)),
                "duplicate mapping for {}::{}",
                entry.kind,
                entry.variant
            );
        }
    }

    #[test]
    fn no_entry_is_registered_as_unmapped() {
        // Unmapped is what lookup returns for absent keys; registering it
        // would be a contradiction.
        for entry in entries() {
            assert!(
                !entry.classification.is_unmapped(),
                "{}::{} registered as Unmapped",
                entry.kind,
                entry.variant
            );
        }
    }

    #[test]
    fn explicit_templates_declare_usable_params() {
        for entry in entries() {
            if let Classification::Explicit(template) = entry.classification {
                assert!(
                    !template.params.is_empty(),
                    "template {} has no parameters",
                    template.id
                );
                for param in template.params {
                    if matches!(param.shape, ArgShape::Handle) {
                        assert!(
                            matches!(
                                param.source,
                                ParamSource::OwnEntityRef | ParamSource::EntityRef(_)
                            ),
                            "handle param {} of {} must resolve from the context",
                            param.name,
                            template.id
                        );
                    }
                }
            }
        }
    }
}
