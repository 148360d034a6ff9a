use std::sync::{Arc, Mutex};

use access_console::*;
use async_trait::async_trait;

/// In-memory chain adapter: applies mutations to its own state and emits the
/// signature/confirmation status sequence a wallet-backed adapter would.
pub struct FakeChain {
    pub roles: Mutex<Vec<RoleGrants>>,
    pub ownership: Mutex<Ownership>,
    pub block: Mutex<u64>,
    pub calls: Mutex<Vec<String>>,
    fail_next: Mutex<Option<String>>,
    next_id: Mutex<u64>,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            roles: Mutex::new(Vec::new()),
            ownership: Mutex::new(Ownership {
                owner: Some(Address::new("0xOWNER")),
                pending_owner: None,
            }),
            block: Mutex::new(100),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            next_id: Mutex::new(0),
        })
    }

    /// The next mutating call fails with this adapter message.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn run(
        &self,
        name: &str,
        on_status: OnStatusChange<'_>,
    ) -> Result<OperationResult, ServiceError> {
        self.calls.lock().unwrap().push(name.to_string());
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(ServiceError::adapter(message));
        }
        on_status(
            TxStatus::pending_signature(),
            StatusDetails::new("Waiting for wallet signature"),
        );
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = format!("op-{next_id}");
        on_status(
            TxStatus::pending_confirmation(),
            StatusDetails::new("Waiting for confirmation").with_tx_hash(format!("0xhash{next_id}")),
        );
        Ok(OperationResult::new(id))
    }
}

#[async_trait]
impl AccessControlService for FakeChain {
    async fn capabilities(&self, _contract: &Address) -> Result<Capabilities, ServiceError> {
        Ok(Capabilities {
            has_access_control: true,
            has_ownable: true,
            has_enumerable_roles: true,
        })
    }

    async fn current_roles(&self, _contract: &Address) -> Result<Vec<RoleGrants>, ServiceError> {
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn ownership(&self, _contract: &Address) -> Result<Ownership, ServiceError> {
        Ok(self.ownership.lock().unwrap().clone())
    }

    async fn admin_state(&self, _contract: &Address) -> Result<AdminState, ServiceError> {
        Ok(AdminState::default())
    }

    async fn current_block(&self) -> Result<u64, ServiceError> {
        Ok(*self.block.lock().unwrap())
    }

    async fn grant_role(
        &self,
        _contract: &Address,
        role_id: &RoleId,
        account: &Address,
        _config: &ExecutionConfig,
        on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        let result = self.run("grantRole", on_status)?;
        let mut roles = self.roles.lock().unwrap();
        match roles.iter_mut().find(|grants| grants.role_id == *role_id) {
            Some(grants) => grants.members.push(account.clone()),
            None => roles.push(RoleGrants {
                role_id: role_id.clone(),
                role_name: None,
                members: vec![account.clone()],
            }),
        }
        Ok(result)
    }

    async fn revoke_role(
        &self,
        _contract: &Address,
        role_id: &RoleId,
        account: &Address,
        _config: &ExecutionConfig,
        on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        let result = self.run("revokeRole", on_status)?;
        let mut roles = self.roles.lock().unwrap();
        if let Some(grants) = roles.iter_mut().find(|grants| grants.role_id == *role_id) {
            grants.members.retain(|member| !member.matches(account));
        }
        Ok(result)
    }

    async fn transfer_ownership(
        &self,
        _contract: &Address,
        new_owner: &Address,
        _expiration_block: u64,
        _config: &ExecutionConfig,
        on_status: OnStatusChange<'_>,
        _credential: Option<&RuntimeCredential>,
    ) -> Result<OperationResult, ServiceError> {
        let result = self.run("transferOwnership", on_status)?;
        self.ownership.lock().unwrap().pending_owner = Some(new_owner.clone());
        Ok(result)
    }
}

/// Query-cache double recording every invalidation call in order.
pub struct RecordingCache {
    enriched_observers: usize,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn with_enriched_observers(enriched_observers: usize) -> Arc<Self> {
        Arc::new(Self {
            enriched_observers,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl QueryCache for RecordingCache {
    fn observer_count(&self, key: &QueryKey) -> usize {
        if key.kind == QueryKind::EnrichedRoles {
            self.enriched_observers
        } else {
            0
        }
    }

    fn cancel_in_flight(&self, key: &QueryKey) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("cancel:{}", key.kind.as_str()));
    }

    fn mark_stale(&self, key: &QueryKey) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("stale:{}", key.kind.as_str()));
    }
}
