//! Approval state machine
//!
//! A request moves through three approval stages, each owned by one role:
//!
//! ```text
//! PENDIENTE_DIRECTOR --director--> PENDIENTE_PEDIDOS --pedidos--> PENDIENTE_ADMIN --admin--> COMPLETADO
//!         \                               \                              \
//!          +-------------------------------+------------------------------+--> RECHAZADO
//! ```
//!
//! Nothing here touches storage. [`decide`] checks every precondition before
//! it mutates the in-memory record, so a failed call leaves it untouched.

use std::{fmt, str::FromStr};

use auth::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::request::{ApprovalFlags, DecisionPayload, RequestRecord};

/// Position of a request in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    #[serde(rename = "PENDIENTE_DIRECTOR")]
    PendingDirector,
    #[serde(rename = "PENDIENTE_PEDIDOS")]
    PendingOrders,
    #[serde(rename = "PENDIENTE_ADMIN")]
    PendingAdmin,
    #[serde(rename = "COMPLETADO")]
    Completed,
    #[serde(rename = "RECHAZADO")]
    Rejected,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 5] = [
        WorkflowState::PendingDirector,
        WorkflowState::PendingOrders,
        WorkflowState::PendingAdmin,
        WorkflowState::Completed,
        WorkflowState::Rejected,
    ];

    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::PendingDirector => "PENDIENTE_DIRECTOR",
            WorkflowState::PendingOrders => "PENDIENTE_PEDIDOS",
            WorkflowState::PendingAdmin => "PENDIENTE_ADMIN",
            WorkflowState::Completed => "COMPLETADO",
            WorkflowState::Rejected => "RECHAZADO",
        }
    }

    /// The state implied by the approval flags and the rejection marker
    ///
    /// Flags are only ever set in stage order, so the first unset flag names
    /// the pending stage.
    pub fn derive(flags: ApprovalFlags, rejected: bool) -> Self {
        if rejected {
            return WorkflowState::Rejected;
        }

        Stage::ALL
            .into_iter()
            .find(|stage| !flags.is_approved(*stage))
            .map(|stage| stage.pending_state())
            .unwrap_or(WorkflowState::Completed)
    }

    /// Stage waiting on this state, `None` for terminal states
    pub fn stage(&self) -> Option<Stage> {
        match self {
            WorkflowState::PendingDirector => Some(Stage::Director),
            WorkflowState::PendingOrders => Some(Stage::Orders),
            WorkflowState::PendingAdmin => Some(Stage::Admin),
            WorkflowState::Completed | WorkflowState::Rejected => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage().is_none()
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown workflow state: {}", s))
    }
}

/// One of the three approval gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Sales director
    Director,
    /// Order management
    Orders,
    /// Administration
    Admin,
}

impl Stage {
    /// Stages in approval order
    pub const ALL: [Stage; 3] = [Stage::Director, Stage::Orders, Stage::Admin];

    /// Stage owned by `role`; the commercial agent owns none
    pub fn for_role(role: Role) -> Option<Self> {
        match role {
            Role::Director => Some(Stage::Director),
            Role::Pedidos => Some(Stage::Orders),
            Role::Admin => Some(Stage::Admin),
            Role::Comercial => None,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Stage::Director => Role::Director,
            Stage::Orders => Role::Pedidos,
            Stage::Admin => Role::Admin,
        }
    }

    /// State in which the request waits on this stage
    pub fn pending_state(&self) -> WorkflowState {
        match self {
            Stage::Director => WorkflowState::PendingDirector,
            Stage::Orders => WorkflowState::PendingOrders,
            Stage::Admin => WorkflowState::PendingAdmin,
        }
    }

    /// State reached when this stage approves
    pub fn next_state(&self) -> WorkflowState {
        match self {
            Stage::Director => WorkflowState::PendingOrders,
            Stage::Orders => WorkflowState::PendingAdmin,
            Stage::Admin => WorkflowState::Completed,
        }
    }

    /// Key of this stage's entry in the notes mapping
    pub fn note_key(&self) -> &'static str {
        self.role().as_str()
    }
}

/// Validated stage-specific approval data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageApproval {
    Director { brands: Vec<String>, tariff: String },
    Orders,
    Admin { payment_term: String },
}

/// Workflow rule violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("This request is not pending for role {role} (current state: {state})")]
    NotPendingForRole { state: WorkflowState, role: Role },

    #[error("Brands and tariff are required to approve the request")]
    MissingBrandsOrTariff,

    #[error("A payment term is required to approve the request")]
    MissingPaymentTerm,

    #[error("The request is not ready to be archived")]
    NotFullyApproved,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Check the fields `stage` needs to approve
pub fn validate(stage: Stage, input: &DecisionPayload) -> Result<StageApproval, WorkflowError> {
    match stage {
        Stage::Director => {
            let brands: Vec<String> = input
                .brands
                .iter()
                .map(|b| b.trim())
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .collect();
            let tariff = non_blank(input.tariff.as_deref());

            match tariff {
                Some(tariff) if !brands.is_empty() => Ok(StageApproval::Director { brands, tariff }),
                _ => Err(WorkflowError::MissingBrandsOrTariff),
            }
        }
        Stage::Orders => Ok(StageApproval::Orders),
        Stage::Admin => non_blank(input.payment_term.as_deref())
            .map(|payment_term| StageApproval::Admin { payment_term })
            .ok_or(WorkflowError::MissingPaymentTerm),
    }
}

/// Apply `actor`'s decision to `record`
///
/// Fails without touching the record when the request is not pending for
/// the actor's role or when an approval lacks its stage fields.
pub fn decide(
    record: &mut RequestRecord,
    actor: Role,
    input: &DecisionPayload,
    now: DateTime<Utc>,
) -> Result<WorkflowState, WorkflowError> {
    let stage = record
        .state
        .stage()
        .filter(|stage| stage.role() == actor)
        .ok_or(WorkflowError::NotPendingForRole {
            state: record.state,
            role: actor,
        })?;

    if input.approve {
        let approval = validate(stage, input)?;

        match approval {
            StageApproval::Director { brands, tariff } => {
                record.client.approved_brands = Some(brands);
                record.client.approved_tariff = Some(tariff);
            }
            StageApproval::Orders => {}
            StageApproval::Admin { payment_term } => {
                record.client.payment_term = Some(payment_term);
            }
        }

        record.approvals.approve(stage);
        record.approved_at.stamp(stage, now);
        record.state = stage.next_state();
    } else {
        record.state = WorkflowState::Rejected;
    }

    record
        .notes
        .insert(stage.note_key().to_string(), input.note.clone());
    record.updated_at = now;

    Ok(record.state)
}

/// Fail unless every stage has approved `record`
pub fn ensure_archivable(record: &RequestRecord) -> Result<(), WorkflowError> {
    if record.approvals.all() {
        Ok(())
    } else {
        Err(WorkflowError::NotFullyApproved)
    }
}
