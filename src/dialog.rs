//! Dialog controllers: one thin orchestrator per user-facing operation.
//!
//! Each controller collects form input, runs synchronous validation, and
//! hands a fully built [`AccessControlOp`] to its [`TransactionFlow`].
//! Validation failures set the failed step directly — no network call is
//! made for input errors the client can detect itself.

use std::sync::Mutex;

use crate::{
    errors::ValidationError,
    flow::{DialogMutation, TransactionFlow},
    types::{AccessControlOp, Address, RoleId},
};

/// Fails when the new party is the current party (case-insensitive).
pub fn validate_not_self(
    current: Option<&Address>,
    target: &Address,
    subject: &'static str,
) -> Result<(), ValidationError> {
    match current {
        Some(current) if current.matches(target) => Err(ValidationError::SelfTransfer {
            subject,
            target: target.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Parses an expiration block and checks it lies strictly beyond the polled
/// current block. The current block being unavailable is its own error, so
/// dialogs can tell "wait for chain data" apart from "bad input".
pub fn validate_expiration(
    raw: &str,
    current_block: Option<u64>,
) -> Result<u64, ValidationError> {
    let expiration: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidExpiration(raw.trim().to_string()))?;
    let current = current_block.ok_or(ValidationError::CurrentBlockUnavailable)?;
    if expiration <= current {
        return Err(ValidationError::ExpirationNotInFuture {
            expiration,
            current,
        });
    }
    Ok(expiration)
}

/// Assigns a role to an account.
pub struct AssignRoleDialog<M: DialogMutation> {
    flow: TransactionFlow<M>,
}

impl<M: DialogMutation> AssignRoleDialog<M> {
    pub fn new(flow: TransactionFlow<M>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &TransactionFlow<M> {
        &self.flow
    }

    pub async fn submit(&self, role_id: impl Into<RoleId>, account: impl Into<Address>) {
        self.flow
            .execute(AccessControlOp::GrantRole {
                role_id: role_id.into(),
                account: account.into(),
            })
            .await;
    }
}

/// Revokes a role from an account.
pub struct RevokeRoleDialog<M: DialogMutation> {
    flow: TransactionFlow<M>,
}

impl<M: DialogMutation> RevokeRoleDialog<M> {
    pub fn new(flow: TransactionFlow<M>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &TransactionFlow<M> {
        &self.flow
    }

    pub async fn submit(&self, role_id: impl Into<RoleId>, account: impl Into<Address>) {
        self.flow
            .execute(AccessControlOp::RevokeRole {
                role_id: role_id.into(),
                account: account.into(),
            })
            .await;
    }
}

/// Form input for an ownership transfer, as typed by the user.
#[derive(Clone, Debug)]
pub struct TransferOwnershipForm {
    pub new_owner: String,
    pub expiration_block: String,
}

/// Transfers ownership to a new owner with an expiration block.
///
/// The form is kept after submission so a retry can re-validate the
/// expiration against the latest polled block — the chain may have advanced
/// past the typed value while the first attempt was failing.
pub struct TransferOwnershipDialog<M: DialogMutation> {
    flow: TransactionFlow<M>,
    last_form: Mutex<Option<TransferOwnershipForm>>,
}

impl<M: DialogMutation> TransferOwnershipDialog<M> {
    pub fn new(flow: TransactionFlow<M>) -> Self {
        Self {
            flow,
            last_form: Mutex::new(None),
        }
    }

    pub fn flow(&self) -> &TransactionFlow<M> {
        &self.flow
    }

    pub async fn submit(
        &self,
        form: TransferOwnershipForm,
        current_owner: Option<&Address>,
        current_block: Option<u64>,
    ) {
        *self.last_form.lock().expect("dialog form poisoned") = Some(form.clone());
        self.run(&form, current_owner, current_block).await;
    }

    /// Re-submits the stored form, re-validating against the latest block.
    pub async fn retry(&self, current_owner: Option<&Address>, current_block: Option<u64>) {
        let form = self
            .last_form
            .lock()
            .expect("dialog form poisoned")
            .clone();
        if let Some(form) = form {
            self.run(&form, current_owner, current_block).await;
        }
    }

    async fn run(
        &self,
        form: &TransferOwnershipForm,
        current_owner: Option<&Address>,
        current_block: Option<u64>,
    ) {
        match Self::validate(form, current_owner, current_block) {
            Ok(op) => self.flow.execute(op).await,
            Err(err) => self.flow.fail_validation(&err),
        }
    }

    fn validate(
        form: &TransferOwnershipForm,
        current_owner: Option<&Address>,
        current_block: Option<u64>,
    ) -> Result<AccessControlOp, ValidationError> {
        let new_owner = Address::new(form.new_owner.trim());
        validate_not_self(current_owner, &new_owner, "owner")?;
        let expiration_block = validate_expiration(&form.expiration_block, current_block)?;
        Ok(AccessControlOp::TransferOwnership {
            new_owner,
            expiration_block,
        })
    }
}

/// Hands the admin role to a new admin.
pub struct TransferAdminDialog<M: DialogMutation> {
    flow: TransactionFlow<M>,
}

impl<M: DialogMutation> TransferAdminDialog<M> {
    pub fn new(flow: TransactionFlow<M>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &TransactionFlow<M> {
        &self.flow
    }

    pub async fn submit(&self, new_admin: impl Into<Address>, current_admin: Option<&Address>) {
        let new_admin = new_admin.into();
        if let Err(err) = validate_not_self(current_admin, &new_admin, "admin") {
            self.flow.fail_validation(&err);
            return;
        }
        self.flow
            .execute(AccessControlOp::TransferAdmin { new_admin })
            .await;
    }
}

/// Changes the admin transfer delay.
pub struct ChangeAdminDelayDialog<M: DialogMutation> {
    flow: TransactionFlow<M>,
}

impl<M: DialogMutation> ChangeAdminDelayDialog<M> {
    pub fn new(flow: TransactionFlow<M>) -> Self {
        Self { flow }
    }

    pub fn flow(&self) -> &TransactionFlow<M> {
        &self.flow
    }

    pub async fn submit(&self, new_delay: &str) {
        let new_delay_secs: u64 = match new_delay.trim().parse() {
            Ok(secs) => secs,
            Err(_) => {
                self.flow
                    .fail_validation(&ValidationError::InvalidDelay(new_delay.trim().to_string()));
                return;
            }
        };
        self.flow
            .execute(AccessControlOp::ChangeAdminDelay { new_delay_secs })
            .await;
    }
}

/// Confirmation-only dialog for operations that take no form input:
/// accept ownership, accept/cancel an admin transfer, roll back a delay
/// change.
pub struct ConfirmDialog<M: DialogMutation> {
    flow: TransactionFlow<M>,
    op: AccessControlOp,
}

impl<M: DialogMutation> ConfirmDialog<M> {
    pub fn accept_ownership(flow: TransactionFlow<M>) -> Self {
        Self {
            flow,
            op: AccessControlOp::AcceptOwnership,
        }
    }

    pub fn accept_admin_transfer(flow: TransactionFlow<M>) -> Self {
        Self {
            flow,
            op: AccessControlOp::AcceptAdminTransfer,
        }
    }

    pub fn cancel_admin_transfer(flow: TransactionFlow<M>) -> Self {
        Self {
            flow,
            op: AccessControlOp::CancelAdminTransfer,
        }
    }

    pub fn rollback_admin_delay(flow: TransactionFlow<M>) -> Self {
        Self {
            flow,
            op: AccessControlOp::RollbackAdminDelay,
        }
    }

    pub fn flow(&self) -> &TransactionFlow<M> {
        &self.flow
    }

    pub async fn submit(&self) {
        self.flow.execute(self.op.clone()).await;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, atomic::AtomicUsize, atomic::Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::{errors::MutationError, flow::Step, service::OperationResult};

    struct FakeMutation {
        outcomes: Mutex<VecDeque<Result<OperationResult, MutationError>>>,
        calls: Mutex<Vec<AccessControlOp>>,
        resets: AtomicUsize,
    }

    impl FakeMutation {
        fn scripted(
            outcomes: impl IntoIterator<Item = Result<OperationResult, MutationError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
                calls: Mutex::new(Vec::new()),
                resets: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> Vec<AccessControlOp> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DialogMutation for FakeMutation {
        async fn mutate(&self, op: AccessControlOp) -> Result<OperationResult, MutationError> {
            self.calls.lock().unwrap().push(op);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted mutate call")
        }

        fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ownership_dialog(
        mutation: &Arc<FakeMutation>,
    ) -> TransferOwnershipDialog<FakeMutation> {
        TransferOwnershipDialog::new(TransactionFlow::new(Arc::clone(mutation)))
    }

    fn form(new_owner: &str, expiration: &str) -> TransferOwnershipForm {
        TransferOwnershipForm {
            new_owner: new_owner.to_string(),
            expiration_block: expiration.to_string(),
        }
    }

    #[tokio::test]
    async fn self_transfer_is_rejected_case_insensitively_without_a_call() {
        let mutation = FakeMutation::scripted([]);
        let dialog = ownership_dialog(&mutation);

        let current = Address::new("0xAbC123");
        dialog
            .submit(form("0xabc123", "200"), Some(&current), Some(100))
            .await;

        assert_eq!(dialog.flow().step(), Step::Failed);
        assert!(dialog.flow().error_message().unwrap().contains("yourself"));
        assert!(mutation.calls().is_empty());
    }

    #[tokio::test]
    async fn expiration_must_exceed_the_current_block() {
        let mutation = FakeMutation::scripted([]);
        let dialog = ownership_dialog(&mutation);

        dialog.submit(form("0xNEW", "100"), None, Some(100)).await;
        assert_eq!(dialog.flow().step(), Step::Failed);
        assert!(
            dialog
                .flow()
                .error_message()
                .unwrap()
                .contains("greater than current")
        );
        assert!(mutation.calls().is_empty());
    }

    #[tokio::test]
    async fn valid_expiration_is_forwarded_exactly() {
        let mutation = FakeMutation::scripted([Ok(OperationResult::new("tx-1"))]);
        let dialog = ownership_dialog(&mutation);

        dialog.submit(form("0xNEW", "101"), None, Some(100)).await;
        assert_eq!(dialog.flow().step(), Step::Success);
        assert_eq!(
            mutation.calls(),
            vec![AccessControlOp::TransferOwnership {
                new_owner: Address::new("0xNEW"),
                expiration_block: 101,
            }]
        );
    }

    #[tokio::test]
    async fn missing_current_block_is_a_distinct_error() {
        let mutation = FakeMutation::scripted([]);
        let dialog = ownership_dialog(&mutation);

        dialog.submit(form("0xNEW", "200"), None, None).await;
        assert_eq!(dialog.flow().step(), Step::Failed);
        let message = dialog.flow().error_message().unwrap();
        assert!(message.contains("not available"));
        assert!(!message.contains("greater than current"));
        assert!(mutation.calls().is_empty());
    }

    #[tokio::test]
    async fn retry_revalidates_against_the_advanced_block() {
        let mutation =
            FakeMutation::scripted([Err(MutationError::execution("Network disconnected"))]);
        let dialog = ownership_dialog(&mutation);

        // Valid at submission time.
        dialog.submit(form("0xNEW", "100"), None, Some(99)).await;
        assert_eq!(dialog.flow().step(), Step::Failed);
        assert!(dialog.flow().is_network_error());
        assert_eq!(mutation.calls().len(), 1);

        // The chain advanced past the typed expiration while the user was
        // looking at the error: retry must not resubmit.
        dialog.retry(None, Some(100)).await;
        assert_eq!(dialog.flow().step(), Step::Failed);
        assert!(
            dialog
                .flow()
                .error_message()
                .unwrap()
                .contains("greater than current")
        );
        assert_eq!(mutation.calls().len(), 1);
    }

    #[tokio::test]
    async fn admin_transfer_rejects_current_admin_as_target() {
        let mutation = FakeMutation::scripted([]);
        let dialog = TransferAdminDialog::new(TransactionFlow::new(Arc::clone(&mutation)));

        let current = Address::new("0xADmin");
        dialog.submit("0xadmin", Some(&current)).await;
        assert_eq!(dialog.flow().step(), Step::Failed);
        assert!(dialog.flow().error_message().unwrap().contains("yourself"));
        assert!(mutation.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_delay_never_reaches_the_mutation() {
        let mutation = FakeMutation::scripted([]);
        let dialog = ChangeAdminDelayDialog::new(TransactionFlow::new(Arc::clone(&mutation)));

        dialog.submit("soon").await;
        assert_eq!(dialog.flow().step(), Step::Failed);
        assert!(mutation.calls().is_empty());
    }

    #[tokio::test]
    async fn confirm_dialogs_execute_their_fixed_operation() {
        let mutation = FakeMutation::scripted([Ok(OperationResult::new("tx-1"))]);
        let dialog = ConfirmDialog::accept_ownership(TransactionFlow::new(Arc::clone(&mutation)));

        dialog.submit().await;
        assert_eq!(dialog.flow().step(), Step::Success);
        assert_eq!(mutation.calls(), vec![AccessControlOp::AcceptOwnership]);
    }
}
