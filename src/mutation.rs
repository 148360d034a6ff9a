//! Execution of access-control operations against the chain adapter.
//!
//! One logical mutation per operation, all sharing the same pipeline:
//! check the adapter is available, invoke the capability method while
//! mirroring its status callbacks, and on success invalidate the affected
//! cached views and open a post-mutation poll window.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::{
    classify::ErrorClassification,
    errors::MutationError,
    invalidation::{QueryCache, invalidate_after},
    poll::MutationPollTracker,
    service::{AccessControlService, ExecutionConfig, OperationResult, RuntimeCredential},
    types::{AccessControlOp, Address, StatusDetails, TxStatus},
};

const MUTATION_EXECUTOR_TARGET: &str = "access_console::mutation::executor";

type StatusListener = Arc<dyn Fn(TxStatus, StatusDetails) + Send + Sync>;

struct MutationState {
    status: TxStatus,
    details: Option<StatusDetails>,
    last_error: Option<MutationError>,
}

impl MutationState {
    fn idle() -> Self {
        Self {
            status: TxStatus::idle(),
            details: None,
            last_error: None,
        }
    }
}

/// The handler for executing one contract's access-control mutations.
///
/// This is the entry point all dialogs share. The adapter handle is optional:
/// a console can render before a wallet is connected, and any execution
/// attempt in that state fails fast with a distinctly worded
/// [`MutationError::ServiceNotAvailable`] instead of a network error.
pub struct AccessControlMutation {
    service: Option<Arc<dyn AccessControlService>>,
    contract: Address,
    config: ExecutionConfig,
    credential: Option<RuntimeCredential>,
    tracker: Arc<MutationPollTracker>,
    cache: Arc<dyn QueryCache>,
    state: Mutex<MutationState>,
    status_listener: Mutex<Option<StatusListener>>,
}

impl AccessControlMutation {
    pub fn new(
        service: Option<Arc<dyn AccessControlService>>,
        contract: Address,
        config: ExecutionConfig,
        tracker: Arc<MutationPollTracker>,
        cache: Arc<dyn QueryCache>,
    ) -> Self {
        Self {
            service,
            contract,
            config,
            credential: None,
            tracker,
            cache,
            state: Mutex::new(MutationState::idle()),
            status_listener: Mutex::new(None),
        }
    }

    /// Supplies a call-time credential for [`SigningMethod::LocalKey`] flows.
    ///
    /// [`SigningMethod::LocalKey`]: crate::service::SigningMethod::LocalKey
    pub fn with_credential(mut self, credential: RuntimeCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Registers a listener that receives every adapter status change
    /// verbatim, after the mutation has mirrored it into its own state.
    pub fn set_status_listener(
        &self,
        listener: impl Fn(TxStatus, StatusDetails) + Send + Sync + 'static,
    ) {
        *self
            .status_listener
            .lock()
            .expect("status listener poisoned") = Some(Arc::new(listener));
    }

    pub fn contract(&self) -> &Address {
        &self.contract
    }

    /// Adapter-reported status of the current or last call.
    pub fn status(&self) -> TxStatus {
        self.state.lock().expect("mutation state poisoned").status.clone()
    }

    pub fn status_details(&self) -> Option<StatusDetails> {
        self.state
            .lock()
            .expect("mutation state poisoned")
            .details
            .clone()
    }

    pub fn error_message(&self) -> Option<String> {
        self.state
            .lock()
            .expect("mutation state poisoned")
            .last_error
            .as_ref()
            .map(|err| err.to_string())
    }

    /// The retained classification of the last failure, if any.
    pub fn classification(&self) -> Option<ErrorClassification> {
        self.state
            .lock()
            .expect("mutation state poisoned")
            .last_error
            .as_ref()
            .map(MutationError::classification)
    }

    pub fn is_network_error(&self) -> bool {
        self.classification()
            .map(|c| c.is_network_error)
            .unwrap_or(false)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.classification()
            .map(|c| c.is_user_rejection)
            .unwrap_or(false)
    }

    /// Clears status, details and error back to idle.
    pub fn reset(&self) {
        *self.state.lock().expect("mutation state poisoned") = MutationState::idle();
    }

    /// Executes one operation against the adapter.
    ///
    /// On success the affected cached views are invalidated and a
    /// post-mutation poll window opens with this operation as its preview.
    /// On failure the error is surfaced with its classification retained;
    /// nothing is swallowed here.
    pub async fn execute(&self, op: AccessControlOp) -> Result<OperationResult, MutationError> {
        let Some(service) = self.service.clone() else {
            warn!(
                target: MUTATION_EXECUTOR_TARGET,
                contract = %self.contract,
                operation = op.name(),
                "mutation attempted without an adapter"
            );
            let err = MutationError::ServiceNotAvailable;
            let mut state = self.state.lock().expect("mutation state poisoned");
            state.status = TxStatus::error();
            state.last_error = Some(err.clone());
            return Err(err);
        };

        {
            let mut state = self.state.lock().expect("mutation state poisoned");
            state.status = TxStatus::idle();
            state.details = None;
            state.last_error = None;
        }

        info!(
            target: MUTATION_EXECUTOR_TARGET,
            contract = %self.contract,
            operation = op.name(),
            "executing access-control operation"
        );

        let on_status = |status: TxStatus, details: StatusDetails| {
            debug!(
                target: MUTATION_EXECUTOR_TARGET,
                contract = %self.contract,
                status = %status,
                "adapter status change"
            );
            {
                let mut state = self.state.lock().expect("mutation state poisoned");
                state.status = status.clone();
                state.details = Some(details.clone());
            }
            let listener = self
                .status_listener
                .lock()
                .expect("status listener poisoned")
                .clone();
            if let Some(listener) = listener {
                listener(status, details);
            }
        };

        match self.dispatch(service.as_ref(), &op, &on_status).await {
            Ok(result) => {
                invalidate_after(self.cache.as_ref(), &self.contract, &op);
                self.tracker
                    .record_mutation(&self.contract, Some(op.clone()));
                self.state.lock().expect("mutation state poisoned").status = TxStatus::success();
                info!(
                    target: MUTATION_EXECUTOR_TARGET,
                    contract = %self.contract,
                    operation = op.name(),
                    id = %result.id,
                    "operation succeeded"
                );
                Ok(result)
            }
            Err(service_err) => {
                let err = MutationError::execution(service_err.to_string());
                let mut state = self.state.lock().expect("mutation state poisoned");
                state.status = TxStatus::error();
                state.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn dispatch(
        &self,
        service: &dyn AccessControlService,
        op: &AccessControlOp,
        on_status: &(dyn Fn(TxStatus, StatusDetails) + Send + Sync),
    ) -> Result<OperationResult, crate::errors::ServiceError> {
        let contract = &self.contract;
        let config = &self.config;
        let credential = self.credential.as_ref();
        match op {
            AccessControlOp::GrantRole { role_id, account } => {
                service
                    .grant_role(contract, role_id, account, config, on_status, credential)
                    .await
            }
            AccessControlOp::RevokeRole { role_id, account } => {
                service
                    .revoke_role(contract, role_id, account, config, on_status, credential)
                    .await
            }
            AccessControlOp::TransferOwnership {
                new_owner,
                expiration_block,
            } => {
                service
                    .transfer_ownership(
                        contract,
                        new_owner,
                        *expiration_block,
                        config,
                        on_status,
                        credential,
                    )
                    .await
            }
            AccessControlOp::AcceptOwnership => {
                service
                    .accept_ownership(contract, config, on_status, credential)
                    .await
            }
            AccessControlOp::TransferAdmin { new_admin } => {
                service
                    .transfer_admin_role(contract, new_admin, config, on_status, credential)
                    .await
            }
            AccessControlOp::AcceptAdminTransfer => {
                service
                    .accept_admin_transfer(contract, config, on_status, credential)
                    .await
            }
            AccessControlOp::CancelAdminTransfer => {
                service
                    .cancel_admin_transfer(contract, config, on_status, credential)
                    .await
            }
            AccessControlOp::ChangeAdminDelay { new_delay_secs } => {
                service
                    .change_admin_delay(contract, *new_delay_secs, config, on_status, credential)
                    .await
            }
            AccessControlOp::RollbackAdminDelay => {
                service
                    .rollback_admin_delay(contract, config, on_status, credential)
                    .await
            }
        }
    }
}

#[async_trait::async_trait]
impl crate::flow::DialogMutation for AccessControlMutation {
    async fn mutate(&self, op: AccessControlOp) -> Result<OperationResult, MutationError> {
        self.execute(op).await
    }

    fn reset(&self) {
        AccessControlMutation::reset(self);
    }
}
