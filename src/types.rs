use serde::{Deserialize, Serialize};

/// A contract or account address as the connected chain adapter renders it.
///
/// The console treats addresses as opaque strings: equality and hashing are
/// exact, since cache keys must match whatever casing the adapter produced.
/// Use [`Address::matches`] where the UI needs a case-insensitive comparison
/// (e.g. the self-transfer check).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-insensitive comparison for user-facing identity checks.
    pub fn matches(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A role identifier as defined by the contract (hash or human-readable tag).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(String);

impl RoleId {
    pub fn new(role_id: impl Into<String>) -> Self {
        Self(role_id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Which access-control interfaces the contract was detected to implement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub has_access_control: bool,
    pub has_ownable: bool,
    pub has_enumerable_roles: bool,
}

/// One role and its current member set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleGrants {
    pub role_id: RoleId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
    pub members: Vec<Address>,
}

/// Current ownership view of the contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ownership {
    pub owner: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_owner: Option<Address>,
}

/// A scheduled admin-delay change that takes effect at a Unix timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDelayChange {
    pub new_delay_secs: u64,
    /// Unix timestamp (seconds) at which the new delay becomes effective.
    pub effective_at: u64,
}

/// A pending admin handover that becomes acceptable at a Unix timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAdminTransfer {
    pub new_admin: Address,
    /// Unix timestamp (seconds) after which the transfer can be accepted.
    pub accept_after: u64,
}

/// Admin view of the contract: the current admin plus any scheduled changes.
///
/// The poll tracker inspects the deadlines here to decide how aggressively to
/// refresh admin data as a scheduled change approaches its effective time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminState {
    pub admin: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_delay_change: Option<PendingDelayChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_admin_transfer: Option<PendingAdminTransfer>,
}

impl AdminState {
    /// The nearest pending deadline (Unix seconds), if any change is scheduled.
    pub fn next_deadline(&self) -> Option<u64> {
        let delay = self.pending_delay_change.as_ref().map(|c| c.effective_at);
        let transfer = self.pending_admin_transfer.as_ref().map(|t| t.accept_after);
        match (delay, transfer) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (deadline, None) => deadline,
            (None, deadline) => deadline,
        }
    }
}

/// Transaction status as reported by the chain adapter.
///
/// This is an open tag, not a closed enum: adapters define their own status
/// vocabulary and this layer passes values through verbatim. The constructors
/// below cover the statuses the console itself emits or inspects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxStatus(String);

impl TxStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn idle() -> Self {
        Self::new("idle")
    }

    pub fn pending_signature() -> Self {
        Self::new("pendingSignature")
    }

    pub fn pending_confirmation() -> Self {
        Self::new("pendingConfirmation")
    }

    pub fn pending_relayer() -> Self {
        Self::new("pendingRelayer")
    }

    pub fn success() -> Self {
        Self::new("success")
    }

    pub fn error() -> Self {
        Self::new("error")
    }

    pub fn is_pending_confirmation(&self) -> bool {
        self.0 == "pendingConfirmation"
    }
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form detail payload accompanying a status change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl StatusDetails {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tx_hash: None,
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }
}

/// One mutating operation against a contract's access-control configuration.
///
/// The enum doubles as the poll tracker's preview payload: serialized it
/// carries `{ "type": ..., "args": ... }`, enough for the UI to render a
/// placeholder row while waiting for the RPC to reflect the change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "camelCase")]
pub enum AccessControlOp {
    #[serde(rename_all = "camelCase")]
    GrantRole { role_id: RoleId, account: Address },
    #[serde(rename_all = "camelCase")]
    RevokeRole { role_id: RoleId, account: Address },
    #[serde(rename_all = "camelCase")]
    TransferOwnership {
        new_owner: Address,
        expiration_block: u64,
    },
    AcceptOwnership,
    #[serde(rename_all = "camelCase")]
    TransferAdmin { new_admin: Address },
    AcceptAdminTransfer,
    CancelAdminTransfer,
    #[serde(rename_all = "camelCase")]
    ChangeAdminDelay { new_delay_secs: u64 },
    RollbackAdminDelay,
}

impl AccessControlOp {
    /// Stable operation name, used for logging and preview rendering.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GrantRole { .. } => "grantRole",
            Self::RevokeRole { .. } => "revokeRole",
            Self::TransferOwnership { .. } => "transferOwnership",
            Self::AcceptOwnership => "acceptOwnership",
            Self::TransferAdmin { .. } => "transferAdmin",
            Self::AcceptAdminTransfer => "acceptAdminTransfer",
            Self::CancelAdminTransfer => "cancelAdminTransfer",
            Self::ChangeAdminDelay { .. } => "changeAdminDelay",
            Self::RollbackAdminDelay => "rollbackAdminDelay",
        }
    }

    /// Which cached views a successful run of this operation makes stale.
    pub const fn affected_views(&self) -> AffectedViews {
        match self {
            Self::GrantRole { .. } | Self::RevokeRole { .. } => AffectedViews::Roles,
            Self::TransferOwnership { .. } | Self::AcceptOwnership => AffectedViews::Ownership,
            Self::TransferAdmin { .. }
            | Self::AcceptAdminTransfer
            | Self::CancelAdminTransfer
            | Self::ChangeAdminDelay { .. }
            | Self::RollbackAdminDelay => AffectedViews::Admin,
        }
    }
}

/// The cache views a mutation invalidates on success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AffectedViews {
    /// Both the basic and the enriched role views.
    Roles,
    Ownership,
    Admin,
}

/// Logical identifier of one cached query for a contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryKind {
    Roles,
    EnrichedRoles,
    Ownership,
    Admin,
}

impl QueryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::EnrichedRoles => "enrichedRoles",
            Self::Ownership => "ownership",
            Self::Admin => "admin",
        }
    }
}

/// Cache key of one query: a contract address plus the view kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub contract: Address,
    pub kind: QueryKind,
}

impl QueryKey {
    pub fn new(contract: Address, kind: QueryKind) -> Self {
        Self { contract, kind }
    }
}
