use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    errors::ServiceError,
    types::{
        Address, AdminState, Capabilities, Ownership, RoleGrants, RoleId, StatusDetails, TxStatus,
    },
};

/// How a mutating call should be signed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SigningMethod {
    /// Prompt the connected browser wallet.
    #[default]
    Wallet,
    /// Submit through a relayer that pays for execution.
    Relayer,
    /// Sign with a locally held key (requires a [`RuntimeCredential`]).
    LocalKey,
}

/// Execution configuration forwarded to every mutating adapter call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    pub signing: SigningMethod,
}

impl ExecutionConfig {
    pub const fn new(signing: SigningMethod) -> Self {
        Self { signing }
    }
}

/// Opaque credential supplied at call time (never stored by this layer).
#[derive(Clone)]
pub struct RuntimeCredential(String);

impl RuntimeCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for RuntimeCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RuntimeCredential(..)")
    }
}

/// Result of a mutating adapter call: at minimum an opaque operation id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl OperationResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tx_hash: None,
        }
    }
}

/// One entry of a contract's access-control change history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unix timestamp (seconds) of the change.
    pub at: u64,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<Address>,
}

/// Callback invoked zero or more times by the adapter while a mutating call
/// progresses (signature requested, broadcast, confirmation, ...). Status
/// values are adapter-defined and passed through verbatim.
pub type OnStatusChange<'a> = &'a (dyn Fn(TxStatus, StatusDetails) + Send + Sync);

/// Capability interface implemented by chain-specific adapters.
///
/// The console only talks to a contract through this trait. Mutating methods
/// resolve once the transaction reaches the adapter's notion of completion
/// and report intermediate progress through the status callback. Operations a
/// given ecosystem lacks keep their default [`ServiceError::Unsupported`]
/// implementation.
#[async_trait]
pub trait AccessControlService: Send + Sync {
    async fn capabilities(&self, contract: &Address) -> Result<Capabilities, ServiceError>;

    async fn current_roles(&self, contract: &Address) -> Result<Vec<RoleGrants>, ServiceError>;

    async fn ownership(&self, contract: &Address) -> Result<Ownership, ServiceError>;

    async fn admin_state(&self, contract: &Address) -> Result<AdminState, ServiceError>;

    /// Current block/ledger number, polled by dialogs for expiration checks.
    async fn current_block(&self) -> Result<u64, ServiceError>;

    async fn grant_role(
        &self,
        contract: &Address,
        role_id: &RoleId,
        account: &Address,
        config: &ExecutionConfig,
        on_status: OnStatusChange<'_>,
        credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError>;

    async fn revoke_role(
        &self,
        contract: &Address,
        role_id: &RoleId,
        account: &Address,
        config: &ExecutionConfig,
        on_status: OnStatusChange<'_>,
        credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError>;

    async fn transfer_ownership(
        &self,
        contract: &Address,
        new_owner: &Address,
        expiration_block: u64,
        config: &ExecutionConfig,
        on_status: OnStatusChange<'_>,
        credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError>;

    async fn accept_ownership(
        &self,
        _contract: &Address,
        _config: &ExecutionConfig,
        _on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        Err(ServiceError::Unsupported("acceptOwnership"))
    }

    async fn transfer_admin_role(
        &self,
        _contract: &Address,
        _new_admin: &Address,
        _config: &ExecutionConfig,
        _on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        Err(ServiceError::Unsupported("transferAdminRole"))
    }

    async fn accept_admin_transfer(
        &self,
        _contract: &Address,
        _config: &ExecutionConfig,
        _on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        Err(ServiceError::Unsupported("acceptAdminTransfer"))
    }

    async fn cancel_admin_transfer(
        &self,
        _contract: &Address,
        _config: &ExecutionConfig,
        _on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        Err(ServiceError::Unsupported("cancelAdminTransfer"))
    }

    async fn change_admin_delay(
        &self,
        _contract: &Address,
        _new_delay_secs: u64,
        _config: &ExecutionConfig,
        _on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        Err(ServiceError::Unsupported("changeAdminDelay"))
    }

    async fn rollback_admin_delay(
        &self,
        _contract: &Address,
        _config: &ExecutionConfig,
        _on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        Err(ServiceError::Unsupported("rollbackAdminDelay"))
    }

    async fn history(&self, _contract: &Address) -> Result<Vec<HistoryEntry>, ServiceError> {
        Err(ServiceError::Unsupported("getHistory"))
    }
}
