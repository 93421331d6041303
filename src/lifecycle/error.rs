use thiserror::Error;

use super::state::{DocumentStatus, LifecycleEvent};
use super::store::StoreError;
use crate::core::{SeriesError, TaxError, ValidationError};

/// Errors surfaced by [`DocumentLifecycle`](super::DocumentLifecycle).
///
/// Gateway rejections are not errors: they are recorded on the document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// The draft is incomplete. Every failing field is listed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A line item is invalid or the totals overflow.
    #[error(transparent)]
    Tax(#[from] TaxError),

    /// Numbering failed before a number was issued.
    #[error(transparent)]
    Series(#[from] SeriesError),

    /// The event is not in the transition table for the current status.
    #[error("document {id}: {event} is not allowed from {from}")]
    IllegalTransition {
        id: String,
        from: DocumentStatus,
        event: LifecycleEvent,
    },

    /// The document is already final; the request is moot.
    #[error("document {id} is already {status}")]
    AlreadyTerminal { id: String, status: DocumentStatus },

    /// The gateway accepted a document that was voided while pending.
    /// Needs manual reconciliation with the tax authority.
    #[error("document {id} was voided while pending but the gateway accepted it")]
    VoidConflict { id: String },

    /// Concurrent updates kept winning the revision race.
    #[error("document {id} is being modified concurrently")]
    Conflict { id: String },

    #[error("a void reason is required")]
    MissingVoidReason,

    #[error("document {0} not found")]
    NotFound(String),

    /// The gateway did not answer. The document stays PENDING; poll again
    /// later rather than resubmitting.
    #[error("gateway timed out for document {id}; it remains pending")]
    GatewayTimeout { id: String },

    #[error("gateway error for document {id}: {reason}")]
    Gateway { id: String, reason: String },

    /// Persistence failed after the number was reserved. The number is
    /// permanently skipped and must be reconciled by hand.
    #[error("document number {number} burned: {reason}")]
    NumberBurned { number: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DocumentError {
    /// Whether the caller can fix the request and try again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Tax(_)
                | Self::AlreadyTerminal { .. }
                | Self::MissingVoidReason
                | Self::GatewayTimeout { .. }
                | Self::Conflict { .. }
        )
    }
}
