use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::document::FiscalDocument;
use super::error::DocumentError;
use super::gateway::{Gateway, GatewayError, GatewayPayload, GatewayStatus};
use super::state::{DocumentStatus, LifecycleEvent};
use super::store::{DocumentStore, StoreError};
use crate::civil_time::CivilClock;
use crate::core::{
    DocumentNumber, Draft, SeriesRegistry, SeriesStore, TaxCalculator, TaxConfig,
    ValidationEngine,
};

/// Revision races tolerated before an update gives up with
/// [`DocumentError::Conflict`].
const MAX_UPDATE_ATTEMPTS: usize = 8;

/// Engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub tax: TaxConfig,
    pub clock: CivilClock,
}

impl LifecycleConfig {
    pub fn tax(mut self, tax: TaxConfig) -> Self {
        self.tax = tax;
        self
    }

    pub fn clock(mut self, clock: CivilClock) -> Self {
        self.clock = clock;
        self
    }
}

/// Drives documents from draft through gateway approval.
///
/// `submit` returns as soon as the document is stored as PENDING and handed
/// to the gateway. The verdict arrives later through
/// [`on_gateway_accepted`](Self::on_gateway_accepted) /
/// [`on_gateway_rejected`](Self::on_gateway_rejected) or through
/// [`poll`](Self::poll). Every update is a compare-and-swap on the stored
/// revision, so callbacks and voids racing each other are re-evaluated
/// against the transition table instead of overwriting one another.
pub struct DocumentLifecycle<S, D, G> {
    registry: SeriesRegistry<S>,
    store: D,
    gateway: G,
    validator: ValidationEngine,
    calculator: TaxCalculator,
    clock: CivilClock,
}

impl<S, D, G> DocumentLifecycle<S, D, G>
where
    S: SeriesStore,
    D: DocumentStore,
    G: Gateway,
{
    pub fn new(
        series: S,
        store: D,
        gateway: G,
        config: LifecycleConfig,
    ) -> Result<Self, DocumentError> {
        Ok(Self {
            registry: SeriesRegistry::new(series),
            store,
            gateway,
            validator: ValidationEngine::new(),
            calculator: TaxCalculator::new(config.tax)?,
            clock: config.clock,
        })
    }

    pub fn registry(&self) -> &SeriesRegistry<S> {
        &self.registry
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn clock(&self) -> &CivilClock {
        &self.clock
    }

    /// Validate, price, number, persist as PENDING, and dispatch.
    ///
    /// Nothing is reserved unless validation and pricing pass. If the store
    /// refuses the document after its number was reserved, the number is
    /// burned and [`DocumentError::NumberBurned`] is returned. A failed
    /// dispatch leaves the document PENDING with the error in its audit
    /// trail; use [`poll`](Self::poll) or [`redispatch`](Self::redispatch),
    /// never a second `submit`. Once stored, the document is returned even
    /// when the dispatch attempt cannot be recorded.
    pub fn submit(&self, draft: Draft) -> Result<FiscalDocument, DocumentError> {
        self.validator.validate(&draft)?;
        let totals = self.calculator.compute(&draft.lines)?.presented();
        let number = self.registry.reserve_next(draft.kind, &draft.series)?;

        let document = FiscalDocument::submitted(number, draft, totals, Utc::now());
        if let Err(err) = self.store.insert(&document) {
            tracing::error!(
                kind = document.kind().code(),
                number = %document.id(),
                error = %err,
                "persistence failed after reservation, number burned"
            );
            return Err(DocumentError::NumberBurned {
                number: document.display_number(),
                reason: err.to_string(),
            });
        }

        tracing::info!(
            kind = document.kind().code(),
            number = %document.id(),
            total = %document.total(),
            "document submitted"
        );

        Ok(self.send(document))
    }

    /// Resend the payload of a PENDING document under its existing number.
    pub fn redispatch(&self, id: &DocumentNumber) -> Result<FiscalDocument, DocumentError> {
        let mut document = self.load(id)?;
        document.apply(LifecycleEvent::Dispatch)?;
        Ok(self.send(document))
    }

    /// `PENDING → ACCEPTED`. Repeating it on an accepted document is a no-op.
    pub fn on_gateway_accepted(&self, id: &DocumentNumber) -> Result<FiscalDocument, DocumentError> {
        let document = self
            .update(id, |doc| doc.apply(LifecycleEvent::GatewayAccepted))
            .inspect_err(|err| {
                if matches!(err, DocumentError::VoidConflict { .. }) {
                    tracing::error!(number = %id, "gateway accepted a document voided while pending");
                }
            })?;
        tracing::info!(number = %id, status = %document.status(), "gateway accepted document");
        Ok(document)
    }

    /// `PENDING → REJECTED`, keeping the gateway's reason on the document.
    pub fn on_gateway_rejected(
        &self,
        id: &DocumentNumber,
        reason: &str,
    ) -> Result<FiscalDocument, DocumentError> {
        let document = self.update(id, |doc| {
            let changed = doc.apply(LifecycleEvent::GatewayRejected)?;
            doc.record_rejection(reason.to_string());
            Ok(changed)
        })?;
        tracing::info!(number = %id, reason, "gateway rejected document");
        Ok(document)
    }

    /// `PENDING | ACCEPTED → VOID` under a mandatory reason.
    ///
    /// Voiding a pending document does not stop the gateway from accepting
    /// it; a later acceptance fails with [`DocumentError::VoidConflict`].
    pub fn void(&self, id: &DocumentNumber, reason: &str) -> Result<FiscalDocument, DocumentError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(DocumentError::MissingVoidReason);
        }
        let document = self.update(id, |doc| {
            let changed = doc.apply(LifecycleEvent::Void)?;
            doc.record_void(reason.to_string());
            Ok(changed)
        })?;
        tracing::info!(
            number = %id,
            voided_from = ?document.audit().voided_from,
            reason,
            "document voided"
        );
        Ok(document)
    }

    /// Ask the gateway for the verdict on a PENDING document and apply it.
    ///
    /// A document voided while pending is still checked: an acceptance that
    /// arrived after the void fails with [`DocumentError::VoidConflict`].
    /// Documents in any other status are returned as they are.
    pub fn poll(&self, id: &DocumentNumber) -> Result<FiscalDocument, DocumentError> {
        let document = self.load(id)?;
        let voided_while_pending = document.status() == DocumentStatus::Void
            && document.audit().voided_from == Some(DocumentStatus::Pending);
        if document.status() != DocumentStatus::Pending && !voided_while_pending {
            return Ok(document);
        }

        match self.gateway.status(id) {
            Ok(GatewayStatus::Pending) => Ok(document),
            Ok(GatewayStatus::Accepted) => self.on_gateway_accepted(id),
            // The void already stands; a rejection agrees with it.
            Ok(GatewayStatus::Rejected(_)) if voided_while_pending => Ok(document),
            Ok(GatewayStatus::Rejected(reason)) => self.on_gateway_rejected(id, &reason),
            Err(GatewayError::Timeout) => {
                tracing::warn!(number = %id, "gateway poll timed out");
                Err(DocumentError::GatewayTimeout { id: id.to_string() })
            }
            Err(err) => Err(DocumentError::Gateway {
                id: id.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    pub fn get(&self, id: &DocumentNumber) -> Result<FiscalDocument, DocumentError> {
        self.load(id)
    }

    fn load(&self, id: &DocumentNumber) -> Result<FiscalDocument, DocumentError> {
        self.store
            .get(id)?
            .ok_or_else(|| DocumentError::NotFound(id.to_string()))
    }

    /// Dispatch the payload of a stored document and record the attempt.
    ///
    /// A failed audit write is logged and the stored document is returned.
    fn send(&self, document: FiscalDocument) -> FiscalDocument {
        let id = document.id().clone();
        let payload = GatewayPayload::from_document(&document, &self.calculator, &self.clock);
        let outcome = self.gateway.dispatch(&payload);
        if let Err(err) = &outcome {
            tracing::warn!(number = %id, error = %err, "dispatch failed, document stays pending");
        }
        let error = outcome.err().map(|e| e.to_string());

        // Audit only: applies whatever status a racing callback left behind.
        match self.update(&id, |doc| {
            doc.record_dispatch(error.clone());
            Ok(true)
        }) {
            Ok(updated) => updated,
            Err(err) => {
                tracing::warn!(number = %id, error = %err, "dispatch attempt not recorded");
                document
            }
        }
    }

    /// Load, mutate and compare-and-swap, re-reading on revision conflicts.
    ///
    /// `mutate` returns whether anything changed; unchanged documents are
    /// not written back.
    fn update<F>(&self, id: &DocumentNumber, mut mutate: F) -> Result<FiscalDocument, DocumentError>
    where
        F: FnMut(&mut FiscalDocument) -> Result<bool, DocumentError>,
    {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let mut document = self.load(id)?;
            let expected = document.revision();
            if !mutate(&mut document)? {
                return Ok(document);
            }
            document.touch(Utc::now());
            match self.store.update(&document, expected) {
                Ok(()) => return Ok(document),
                Err(StoreError::Conflict { found, .. }) => {
                    tracing::debug!(number = %id, expected, found, "revision conflict, re-reading");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(DocumentError::Conflict { id: id.to_string() })
    }
}
