//! Client-side mutation-consistency and polling layer for a smart-contract
//! access-control console
//!
//! This crate keeps cached chain views honest after mutations, including:
//! - [Transaction execution flow with a per-dialog state machine](TransactionFlow)
//! - [Mutation execution against a pluggable chain adapter](AccessControlMutation)
//! - [Post-mutation polling that detects fresh data by reference identity](MutationPollTracker)
//! - [Cache invalidation bridging role, ownership and admin views](invalidate_after)
//! - [Dialog controllers with client-side validation](dialog)
//! - [Versioned access snapshots exported from live reads](AccessSnapshot)
//!
//! # Example
//! Granting a role through a dialog wired to an adapter:
//! ```rust,no_run
//! use std::sync::Arc;
//! use access_console::*;
//!
//! # async fn example(
//! #     service: Arc<dyn AccessControlService>,
//! #     cache: Arc<dyn QueryCache>,
//! # ) {
//! let tracker = Arc::new(MutationPollTracker::new());
//! let mutation = Arc::new(AccessControlMutation::new(
//!     Some(service),
//!     Address::new("0xABC"),
//!     ExecutionConfig::default(),
//!     Arc::clone(&tracker),
//!     cache,
//! ));
//! let dialog = AssignRoleDialog::new(TransactionFlow::new(mutation));
//! dialog.submit("MINTER_ROLE", "0xDEF").await;
//! # }
//! ```

mod classify;
mod flow;
mod invalidation;
mod mutation;
mod poll;
mod service;
mod types;

pub mod dialog;
pub mod errors;
pub mod export;

pub use crate::{
    classify::{ErrorClassification, is_network_disconnection_error, is_user_rejection_error},
    dialog::{
        AssignRoleDialog, ChangeAdminDelayDialog, ConfirmDialog, RevokeRoleDialog,
        TransferAdminDialog, TransferOwnershipDialog, TransferOwnershipForm,
    },
    errors::{ExportError, MutationError, ServiceError, ValidationError},
    export::{AccessSnapshot, ContractIdentity, ExportedSnapshot, SnapshotExporter},
    flow::{CLOSE_DELAY, DialogMutation, Step, TransactionFlow},
    invalidation::{QueryCache, invalidate_after, invalidate_role_views},
    mutation::AccessControlMutation,
    poll::{
        ADMIN_NEAR_DEADLINE, ADMIN_POLL_FAST, ADMIN_POLL_NEAR, ADMIN_POLL_SLOW, COLLAPSE_WINDOW,
        Clock, DataRef, MutationPollTracker, POLL_INTERVAL, PollSubscription, SAFETY_WINDOW,
        SystemClock, TrackedMutation,
    },
    service::{
        AccessControlService, ExecutionConfig, HistoryEntry, OnStatusChange, OperationResult,
        RuntimeCredential, SigningMethod,
    },
    types::{
        AccessControlOp, Address, AdminState, AffectedViews, Capabilities, Ownership,
        PendingAdminTransfer, PendingDelayChange, QueryKey, QueryKind, RoleGrants, RoleId,
        StatusDetails, TxStatus,
    },
};
