//! Advisory classification of caught errors.
//!
//! Mutations can fail for reasons that deserve different UI treatment: a
//! dropped connection suggests a reconnect affordance, a wallet rejection is
//! an expected user choice rather than a failure. The predicates here match a
//! fixed vocabulary against the error's rendered message, case-insensitively.
//! They are advisory only and never panic.

/// Substrings that indicate the RPC connection itself failed.
const NETWORK_MARKERS: &[&str] = &[
    "network",
    "disconnect",
    "timeout",
    "timed out",
    "offline",
    "econnrefused",
    "econnreset",
    "enotfound",
    "ehostunreach",
    "connection refused",
    "connection reset",
    "fetch failed",
    "failed to fetch",
];

/// Substrings that indicate the user declined to sign or submit.
const REJECTION_MARKERS: &[&str] = &[
    "rejected",
    "cancelled",
    "canceled",
    "denied",
    "user refused",
    "declined",
];

fn matches_any(message: &str, markers: &[&str]) -> bool {
    if message.is_empty() {
        return false;
    }
    let lowered = message.to_lowercase();
    markers.iter().any(|marker| lowered.contains(marker))
}

/// Whether the message looks like a network/connectivity failure.
pub fn is_network_disconnection_error(message: &str) -> bool {
    matches_any(message, NETWORK_MARKERS)
}

/// Whether the message looks like the user rejecting the transaction.
pub fn is_user_rejection_error(message: &str) -> bool {
    matches_any(message, REJECTION_MARKERS)
}

/// Both classifications of one error, computed once at failure time.
///
/// Callers keep this next to the raw message instead of re-running the
/// substring scan on every UI read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ErrorClassification {
    pub is_network_error: bool,
    pub is_user_rejection: bool,
}

impl ErrorClassification {
    pub fn of(error: &(impl std::fmt::Display + ?Sized)) -> Self {
        Self::of_message(&error.to_string())
    }

    pub fn of_message(message: &str) -> Self {
        Self {
            is_network_error: is_network_disconnection_error(message),
            is_user_rejection: is_user_rejection_error(message),
        }
    }
}
