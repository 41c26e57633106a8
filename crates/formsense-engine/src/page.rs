//! Typed round trips to the page runtime: one snapshot, one plan application.

use crate::backend::{BackendError, ScriptBridge};
use crate::dom::Dom;
use formsense_common::error::map_page_error;
use formsense_common::protocol::{
    ApplyOutcome, ApplyRequest, NodeQuery, PageAction, PageData, PageResponse, PlannedStep,
    SnapshotRequest,
};
use formsense_common::result::FailureKind;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Unexpected page response: expected {expected}")]
    UnexpectedResponse { expected: &'static str },
}

impl EngineError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            EngineError::Backend(err) => err.failure_kind(),
            EngineError::UnexpectedResponse { .. } => FailureKind::Bridge,
        }
    }
}

fn into_data(resp: PageResponse) -> Result<PageData, EngineError> {
    match resp {
        PageResponse::Ok { data, warnings } => {
            for warning in warnings {
                warn!("page runtime: {}", warning);
            }
            Ok(data)
        }
        PageResponse::Error {
            code,
            message,
            details,
        } => Err(map_page_error(&code, &message, details.as_ref()).into()),
    }
}

/// Serialize the live DOM, answering `queries` against the same node registry.
pub async fn snapshot<B: ScriptBridge + ?Sized>(
    bridge: &mut B,
    queries: Vec<NodeQuery>,
) -> Result<Dom, EngineError> {
    let action = PageAction::Snapshot(SnapshotRequest { queries });
    match into_data(bridge.dispatch(&action).await?)? {
        PageData::Snapshot(snapshot) => {
            debug!(
                epoch = snapshot.epoch,
                nodes = snapshot.nodes.len(),
                "snapshot received"
            );
            Ok(Dom::new(*snapshot))
        }
        PageData::Applied(_) => Err(EngineError::UnexpectedResponse {
            expected: "snapshot",
        }),
    }
}

/// Apply a plan computed against snapshot `epoch`.
pub async fn apply<B: ScriptBridge + ?Sized>(
    bridge: &mut B,
    epoch: u64,
    steps: Vec<PlannedStep>,
) -> Result<ApplyOutcome, EngineError> {
    let count = steps.len();
    let action = PageAction::Apply(ApplyRequest { epoch, steps });
    match into_data(bridge.dispatch(&action).await?)? {
        PageData::Applied(outcome) => {
            debug!(epoch, steps = count, applied = outcome.applied, "plan applied");
            Ok(outcome)
        }
        PageData::Snapshot(_) => Err(EngineError::UnexpectedResponse { expected: "applied" }),
    }
}
