//! The transaction-execution state machine shared by every mutating dialog.
//!
//! A dialog moves through `Form → Pending → (Confirming) → Success | Failed |
//! Cancelled`. User rejection is routed to its own terminal state: declining
//! a wallet prompt is an expected choice, not a failure. Post-success hook
//! failures are swallowed — once the transaction succeeded on-chain, a broken
//! UI refresh must not present it as failed.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::{
    classify::ErrorClassification,
    errors::{MutationError, ValidationError},
    service::OperationResult,
    types::{AccessControlOp, TxStatus},
};

const FLOW_TARGET: &str = "access_console::flow";

/// How long the success state stays visible before the close hook fires.
/// A design constant, deliberately not configurable per call site.
pub const CLOSE_DELAY: Duration = Duration::from_millis(1_500);

/// Dialog step the UI renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Form,
    Pending,
    Confirming,
    Success,
    Failed,
    Cancelled,
}

/// The contract the state machine drives: anything that can execute an
/// operation and clear its own state.
#[async_trait]
pub trait DialogMutation: Send + Sync {
    async fn mutate(&self, op: AccessControlOp) -> Result<OperationResult, MutationError>;

    fn reset(&self);
}

type SuccessHook =
    Box<dyn Fn() -> Result<(), Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;
type CloseHook = Arc<dyn Fn() + Send + Sync>;

struct FlowState {
    step: Step,
    error_message: Option<String>,
    classification: ErrorClassification,
    last_op: Option<AccessControlOp>,
}

/// Drives one dialog instance through the execution state machine.
///
/// Owned by the dialog controller and dropped with it. The flow stores the
/// last submitted operation so [`retry`] can re-run it unchanged.
///
/// [`retry`]: TransactionFlow::retry
pub struct TransactionFlow<M: DialogMutation> {
    mutation: Arc<M>,
    state: Mutex<FlowState>,
    on_success: Option<SuccessHook>,
    on_close: Option<CloseHook>,
}

impl<M: DialogMutation> TransactionFlow<M> {
    pub fn new(mutation: Arc<M>) -> Self {
        Self {
            mutation,
            state: Mutex::new(FlowState {
                step: Step::Form,
                error_message: None,
                classification: ErrorClassification::default(),
                last_op: None,
            }),
            on_success: None,
            on_close: None,
        }
    }

    /// Hook invoked after the mutation resolves, before the step flips to
    /// [`Step::Success`]. Failures here are logged and swallowed.
    pub fn on_success(
        mut self,
        hook: impl Fn() -> Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Hook invoked [`CLOSE_DELAY`] after a successful execution, giving the
    /// success UI time to be seen.
    pub fn on_close(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(hook));
        self
    }

    pub fn mutation(&self) -> &Arc<M> {
        &self.mutation
    }

    pub fn step(&self) -> Step {
        self.state.lock().expect("flow state poisoned").step
    }

    pub fn error_message(&self) -> Option<String> {
        self.state
            .lock()
            .expect("flow state poisoned")
            .error_message
            .clone()
    }

    pub fn is_network_error(&self) -> bool {
        self.state
            .lock()
            .expect("flow state poisoned")
            .classification
            .is_network_error
    }

    pub fn is_user_rejection(&self) -> bool {
        self.state
            .lock()
            .expect("flow state poisoned")
            .classification
            .is_user_rejection
    }

    /// Submits one operation: stores it for retry, enters [`Step::Pending`],
    /// and routes the outcome to a terminal step.
    pub async fn execute(&self, op: AccessControlOp) {
        {
            let mut state = self.state.lock().expect("flow state poisoned");
            state.last_op = Some(op.clone());
            state.step = Step::Pending;
            state.error_message = None;
            state.classification = ErrorClassification::default();
        }
        debug!(target: FLOW_TARGET, operation = op.name(), "submitted");

        match self.mutation.mutate(op).await {
            Ok(result) => self.finish_success(&result),
            Err(err) => self.finish_failure(&err),
        }
    }

    /// Re-runs the last submitted operation; a no-op if nothing was
    /// submitted yet.
    pub async fn retry(&self) {
        let op = self
            .state
            .lock()
            .expect("flow state poisoned")
            .last_op
            .clone();
        if let Some(op) = op {
            self.execute(op).await;
        }
    }

    /// Returns to the form, clearing the error and the mutation's own state.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock().expect("flow state poisoned");
            state.step = Step::Form;
            state.error_message = None;
            state.classification = ErrorClassification::default();
        }
        self.mutation.reset();
    }

    /// Marks a validation failure without invoking the mutation. No network
    /// call is made for client-detectable input errors.
    pub fn fail_validation(&self, error: &ValidationError) {
        let mut state = self.state.lock().expect("flow state poisoned");
        state.step = Step::Failed;
        state.error_message = Some(error.to_string());
        state.classification = ErrorClassification::default();
    }

    /// Feeds an adapter status change into the flow. A pending-confirmation
    /// status moves `Pending` to `Confirming`; everything else is ignored.
    pub fn note_status(&self, status: &TxStatus) {
        let mut state = self.state.lock().expect("flow state poisoned");
        if state.step == Step::Pending && status.is_pending_confirmation() {
            state.step = Step::Confirming;
        }
    }

    fn finish_success(&self, result: &OperationResult) {
        if let Some(hook) = &self.on_success {
            if let Err(err) = hook() {
                // The transaction already succeeded on-chain; a failed UI
                // refresh must not downgrade the outcome.
                warn!(
                    target: FLOW_TARGET,
                    "post-success hook failed, keeping success state: {err}"
                );
            }
        }
        self.state.lock().expect("flow state poisoned").step = Step::Success;
        info!(target: FLOW_TARGET, id = %result.id, "transaction succeeded");

        if let Some(close) = &self.on_close {
            let close = Arc::clone(close);
            tokio::spawn(async move {
                tokio::time::sleep(CLOSE_DELAY).await;
                close();
            });
        }
    }

    fn finish_failure(&self, err: &MutationError) {
        let classification = err.classification();
        let mut state = self.state.lock().expect("flow state poisoned");
        state.classification = classification;
        if classification.is_user_rejection {
            info!(target: FLOW_TARGET, "user rejected the transaction");
            state.step = Step::Cancelled;
        } else {
            state.step = Step::Failed;
            state.error_message = Some(err.to_string());
        }
    }
}
