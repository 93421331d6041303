use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use super::state::{DocumentStatus, LifecycleEvent, Refusal, Transition};
use crate::core::{
    DocumentKind, DocumentNumber, Draft, LineItem, Party, Totals, WaybillDetails,
};

/// Bookkeeping that stays writable in every status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrail {
    /// Bumped on every stored change; stores compare it to detect races.
    pub revision: u64,
    pub updated_at: DateTime<Utc>,
    /// Status a VOID document was voided from.
    pub voided_from: Option<DocumentStatus>,
    pub dispatch_attempts: u32,
    pub last_dispatch_error: Option<String>,
}

/// A numbered invoice, receipt or waybill.
///
/// Fields are read-only outside the lifecycle engine: totals are derived
/// once at submission and the number is assigned exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalDocument {
    number: DocumentNumber,
    status: DocumentStatus,
    party: Party,
    lines: Vec<LineItem>,
    /// Rounded for presentation.
    totals: Totals,
    issued_at: DateTime<Utc>,
    waybill: Option<WaybillDetails>,
    total_gross_weight: Option<Decimal>,
    void_reason: Option<String>,
    gateway_message: Option<String>,
    audit: AuditTrail,
}

impl FiscalDocument {
    /// Turn a validated draft into a PENDING document.
    pub(crate) fn submitted(
        number: DocumentNumber,
        draft: Draft,
        totals: Totals,
        now: DateTime<Utc>,
    ) -> Self {
        let total_gross_weight =
            (draft.kind == DocumentKind::Waybill).then(|| draft.total_gross_weight());
        let waybill = if draft.kind == DocumentKind::Waybill {
            draft.waybill
        } else {
            None
        };
        Self {
            number,
            status: DocumentStatus::Pending,
            party: draft.party,
            lines: draft.lines,
            totals,
            issued_at: draft.issued_at.unwrap_or(now),
            waybill,
            total_gross_weight,
            void_reason: None,
            gateway_message: None,
            audit: AuditTrail {
                revision: 0,
                updated_at: now,
                voided_from: None,
                dispatch_attempts: 0,
                last_dispatch_error: None,
            },
        }
    }

    pub fn id(&self) -> &DocumentNumber {
        &self.number
    }

    pub fn kind(&self) -> DocumentKind {
        self.number.kind
    }

    pub fn series(&self) -> &str {
        &self.number.series
    }

    /// `{series}-{number:08}`.
    pub fn display_number(&self) -> String {
        self.number.to_string()
    }

    pub fn status(&self) -> DocumentStatus {
        self.status
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn subtotal(&self) -> Decimal {
        self.totals.subtotal
    }

    pub fn tax_amount(&self) -> Decimal {
        self.totals.tax_amount
    }

    pub fn total(&self) -> Decimal {
        self.totals.total
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn waybill(&self) -> Option<&WaybillDetails> {
        self.waybill.as_ref()
    }

    /// Sum of line weights. Waybills only.
    pub fn total_gross_weight(&self) -> Option<Decimal> {
        self.total_gross_weight
    }

    /// Present only when VOID.
    pub fn void_reason(&self) -> Option<&str> {
        self.void_reason.as_deref()
    }

    /// Present only when REJECTED.
    pub fn gateway_message(&self) -> Option<&str> {
        self.gateway_message.as_deref()
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn revision(&self) -> u64 {
        self.audit.revision
    }

    /// Run `event` through the transition table. Returns whether the status
    /// changed.
    pub(crate) fn apply(&mut self, event: LifecycleEvent) -> Result<bool, DocumentError> {
        match self.status.apply(event) {
            Ok(Transition::Move(to)) => {
                if to == DocumentStatus::Void {
                    self.audit.voided_from = Some(self.status);
                }
                self.status = to;
                Ok(true)
            }
            Ok(Transition::Stay) => Ok(false),
            Err(_)
                if event == LifecycleEvent::GatewayAccepted
                    && self.status == DocumentStatus::Void
                    && self.audit.voided_from == Some(DocumentStatus::Pending) =>
            {
                Err(DocumentError::VoidConflict {
                    id: self.display_number(),
                })
            }
            Err(Refusal::AlreadyTerminal) => Err(DocumentError::AlreadyTerminal {
                id: self.display_number(),
                status: self.status,
            }),
            Err(Refusal::Illegal) => Err(DocumentError::IllegalTransition {
                id: self.display_number(),
                from: self.status,
                event,
            }),
        }
    }

    pub(crate) fn record_rejection(&mut self, reason: String) {
        self.gateway_message = Some(reason);
    }

    pub(crate) fn record_void(&mut self, reason: String) {
        self.void_reason = Some(reason);
    }

    pub(crate) fn record_dispatch(&mut self, error: Option<String>) {
        self.audit.dispatch_attempts = self.audit.dispatch_attempts.saturating_add(1);
        self.audit.last_dispatch_error = error;
    }

    /// Bump the revision ahead of a store update.
    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.audit.revision += 1;
        self.audit.updated_at = now;
    }
}
