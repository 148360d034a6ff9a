//! Versioned access-control snapshot export.
//!
//! The snapshot is built from live adapter reads fanned out concurrently and
//! aggregated all-or-nothing: a failure on any leg aborts the export with no
//! partial artifact. Cached query data is never used, so the file always
//! reflects chain state at the export instant.

use std::{
    future::Future,
    sync::{Arc, Mutex},
};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    errors::{ExportError, ServiceError},
    service::AccessControlService,
    types::{Address, Capabilities, Ownership, RoleGrants},
};

const EXPORT_TARGET: &str = "access_console::export";

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Identifies the contract a snapshot was taken from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractIdentity {
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl ContractIdentity {
    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
            label: None,
            network: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }
}

/// Point-in-time serializable view of a contract's access-control state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessSnapshot {
    pub schema_version: u32,
    /// RFC 3339 instant the aggregation completed.
    pub exported_at: String,
    pub contract: ContractIdentity,
    pub capabilities: Capabilities,
    pub roles: Vec<RoleGrants>,
    pub ownership: Ownership,
}

impl AccessSnapshot {
    /// Fetches capabilities, roles and ownership concurrently and assembles
    /// the snapshot. Any leg failing fails the whole collection.
    pub async fn collect(
        service: &dyn AccessControlService,
        contract: ContractIdentity,
    ) -> Result<Self, ExportError> {
        if contract.address.as_str().trim().is_empty() {
            return Err(ExportError::EmptyAddress);
        }
        let address = &contract.address;
        let (capabilities, roles, ownership) = futures::try_join!(
            fetch("capabilities", service.capabilities(address)),
            fetch("roles", service.current_roles(address)),
            fetch("ownership", service.ownership(address)),
        )?;
        debug!(
            target: EXPORT_TARGET,
            contract = %contract.address,
            roles = roles.len(),
            "snapshot collected"
        );
        Ok(Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            contract,
            capabilities,
            roles,
            ownership,
        })
    }

    pub fn to_pretty_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

async fn fetch<T>(
    what: &'static str,
    fut: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ExportError> {
    fut.await.map_err(|source| ExportError::Fetch { what, source })
}

/// Default download name for a snapshot. Callers may supply their own name
/// instead; this helper is only the fallback.
pub fn snapshot_filename(address: &Address, exported_at: &str) -> String {
    let short: String = address.as_str().chars().take(10).collect();
    let stamp: String = exported_at
        .chars()
        .map(|c| if c == ':' || c == '.' { '-' } else { c })
        .collect();
    format!("access-snapshot-{short}-{stamp}.json")
}

/// A finished export: the snapshot, its pretty-printed JSON, and the
/// suggested filename.
#[derive(Clone, Debug)]
pub struct ExportedSnapshot {
    pub snapshot: AccessSnapshot,
    pub json: String,
    pub filename: String,
}

/// Runs exports and keeps the outcome of the latest attempt.
///
/// Export failures live in their own error slot, separate from any
/// transaction state the surrounding dialog tracks.
pub struct SnapshotExporter {
    service: Option<Arc<dyn AccessControlService>>,
    last_error: Mutex<Option<ExportError>>,
    on_error: Option<Arc<dyn Fn(&ExportError) + Send + Sync>>,
}

impl SnapshotExporter {
    pub fn new(service: Option<Arc<dyn AccessControlService>>) -> Self {
        Self {
            service,
            last_error: Mutex::new(None),
            on_error: None,
        }
    }

    /// Invoked with every export failure, after the error slot is updated.
    pub fn on_error(mut self, callback: impl Fn(&ExportError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn last_error(&self) -> Option<ExportError> {
        self.last_error.lock().expect("exporter state poisoned").clone()
    }

    pub async fn export(
        &self,
        contract: ContractIdentity,
    ) -> Result<ExportedSnapshot, ExportError> {
        match self.build(contract).await {
            Ok(exported) => {
                *self.last_error.lock().expect("exporter state poisoned") = None;
                Ok(exported)
            }
            Err(err) => {
                warn!(target: EXPORT_TARGET, error = %err, "snapshot export failed");
                *self.last_error.lock().expect("exporter state poisoned") = Some(err.clone());
                if let Some(on_error) = &self.on_error {
                    on_error(&err);
                }
                Err(err)
            }
        }
    }

    async fn build(&self, contract: ContractIdentity) -> Result<ExportedSnapshot, ExportError> {
        let service = self
            .service
            .as_deref()
            .ok_or(ExportError::ServiceNotAvailable)?;
        let snapshot = AccessSnapshot::collect(service, contract).await?;
        let json = snapshot.to_pretty_json()?;
        let filename = snapshot_filename(&snapshot.contract.address, &snapshot.exported_at);
        Ok(ExportedSnapshot {
            snapshot,
            json,
            filename,
        })
    }
}
