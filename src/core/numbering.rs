use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::error::SeriesError;
use super::types::{DocumentKind, DocumentNumber};

/// Persistence port for per-series counters.
///
/// `reserve_next` must be atomic per `(kind, series)`: two concurrent calls
/// never observe or return the same value. A database-backed store does this
/// with a row lock or a single `UPDATE ... RETURNING`.
pub trait SeriesStore: Send + Sync {
    /// Create the counter, or raise it to `current_number`.
    fn configure(
        &self,
        kind: DocumentKind,
        series: &str,
        current_number: u64,
    ) -> Result<(), SeriesError>;

    /// Increment the counter and return the newly issued number.
    fn reserve_next(&self, kind: DocumentKind, series: &str) -> Result<u64, SeriesError>;

    /// Last issued number (0 before the first reservation).
    fn current(&self, kind: DocumentKind, series: &str) -> Result<u64, SeriesError>;
}

impl<S: SeriesStore + ?Sized> SeriesStore for Arc<S> {
    fn configure(
        &self,
        kind: DocumentKind,
        series: &str,
        current_number: u64,
    ) -> Result<(), SeriesError> {
        (**self).configure(kind, series, current_number)
    }

    fn reserve_next(&self, kind: DocumentKind, series: &str) -> Result<u64, SeriesError> {
        (**self).reserve_next(kind, series)
    }

    fn current(&self, kind: DocumentKind, series: &str) -> Result<u64, SeriesError> {
        (**self).current(kind, series)
    }
}

/// Mutex-guarded in-process counters.
///
/// Correct for a single process only; multi-instance deployments back
/// [`SeriesStore`] with their database.
#[derive(Debug, Default)]
pub struct InMemorySeriesStore {
    counters: Mutex<HashMap<(DocumentKind, String), u64>>,
}

impl InMemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeriesStore for InMemorySeriesStore {
    fn configure(
        &self,
        kind: DocumentKind,
        series: &str,
        current_number: u64,
    ) -> Result<(), SeriesError> {
        let mut counters = self.counters.lock();
        let slot = counters.entry((kind, series.to_string())).or_insert(0);
        if current_number < *slot {
            return Err(SeriesError::Regression {
                series: series.to_string(),
                current: *slot,
                requested: current_number,
            });
        }
        *slot = current_number;
        Ok(())
    }

    fn reserve_next(&self, kind: DocumentKind, series: &str) -> Result<u64, SeriesError> {
        let mut counters = self.counters.lock();
        let slot = counters
            .get_mut(&(kind, series.to_string()))
            .ok_or_else(|| SeriesError::NotFound {
                kind,
                series: series.to_string(),
            })?;
        *slot = slot.checked_add(1).ok_or_else(|| SeriesError::Exhausted {
            series: series.to_string(),
        })?;
        Ok(*slot)
    }

    fn current(&self, kind: DocumentKind, series: &str) -> Result<u64, SeriesError> {
        self.counters
            .lock()
            .get(&(kind, series.to_string()))
            .copied()
            .ok_or_else(|| SeriesError::NotFound {
                kind,
                series: series.to_string(),
            })
    }
}

/// Hands out sequential document numbers per `(kind, series)`.
///
/// Numbers are never reused. A number reserved for a document that then
/// fails to persist is burned: the stream gets a gap, never a duplicate.
#[derive(Debug, Clone)]
pub struct SeriesRegistry<S> {
    store: S,
}

impl<S: SeriesStore> SeriesRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a series, optionally continuing from an already issued number.
    pub fn configure(
        &self,
        kind: DocumentKind,
        series: &str,
        current_number: u64,
    ) -> Result<(), SeriesError> {
        self.store.configure(kind, series, current_number)?;
        tracing::info!(kind = kind.code(), series, current_number, "series configured");
        Ok(())
    }

    /// Atomically issue the next number of the series.
    pub fn reserve_next(
        &self,
        kind: DocumentKind,
        series: &str,
    ) -> Result<DocumentNumber, SeriesError> {
        let number = self.store.reserve_next(kind, series)?;
        tracing::debug!(kind = kind.code(), series, number, "document number reserved");
        Ok(DocumentNumber::new(kind, series, number))
    }

    /// Preview the next number without consuming it.
    pub fn peek(&self, kind: DocumentKind, series: &str) -> Result<DocumentNumber, SeriesError> {
        let current = self.store.current(kind, series)?;
        Ok(DocumentNumber::new(kind, series, current.saturating_add(1)))
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SeriesRegistry<InMemorySeriesStore> {
        let registry = SeriesRegistry::new(InMemorySeriesStore::new());
        registry
            .configure(DocumentKind::Invoice, "F001", 0)
            .unwrap();
        registry
    }

    #[test]
    fn sequential_numbering() {
        let reg = registry();
        let n1 = reg.reserve_next(DocumentKind::Invoice, "F001").unwrap();
        let n2 = reg.reserve_next(DocumentKind::Invoice, "F001").unwrap();
        assert_eq!(n1.to_string(), "F001-00000001");
        assert_eq!(n2.to_string(), "F001-00000002");
    }

    #[test]
    fn peek_does_not_consume() {
        let reg = registry();
        assert_eq!(reg.peek(DocumentKind::Invoice, "F001").unwrap().number, 1);
        assert_eq!(reg.peek(DocumentKind::Invoice, "F001").unwrap().number, 1);
        assert_eq!(reg.reserve_next(DocumentKind::Invoice, "F001").unwrap().number, 1);
        assert_eq!(reg.peek(DocumentKind::Invoice, "F001").unwrap().number, 2);
    }

    #[test]
    fn continues_from_configured_number() {
        let reg = SeriesRegistry::new(InMemorySeriesStore::new());
        reg.configure(DocumentKind::Receipt, "B001", 41).unwrap();
        let n = reg.reserve_next(DocumentKind::Receipt, "B001").unwrap();
        assert_eq!(n.to_string(), "B001-00000042");
    }

    #[test]
    fn unknown_series_is_not_retryable() {
        let reg = registry();
        let err = reg.reserve_next(DocumentKind::Invoice, "F999").unwrap_err();
        assert!(matches!(err, SeriesError::NotFound { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn same_code_different_kind_is_separate_stream() {
        let reg = registry();
        let err = reg.reserve_next(DocumentKind::Receipt, "F001").unwrap_err();
        assert!(matches!(err, SeriesError::NotFound { .. }));
    }

    #[test]
    fn configure_rejects_regression() {
        let reg = registry();
        reg.reserve_next(DocumentKind::Invoice, "F001").unwrap();
        reg.reserve_next(DocumentKind::Invoice, "F001").unwrap();
        let err = reg.configure(DocumentKind::Invoice, "F001", 1).unwrap_err();
        assert!(matches!(err, SeriesError::Regression { current: 2, .. }));
        // Re-configuring at the current value is a no-op
        reg.configure(DocumentKind::Invoice, "F001", 2).unwrap();
        assert_eq!(reg.reserve_next(DocumentKind::Invoice, "F001").unwrap().number, 3);
    }

    #[test]
    fn exhausted_series() {
        let reg = SeriesRegistry::new(InMemorySeriesStore::new());
        reg.configure(DocumentKind::Waybill, "T001", u64::MAX).unwrap();
        let err = reg.reserve_next(DocumentKind::Waybill, "T001").unwrap_err();
        assert!(matches!(err, SeriesError::Exhausted { .. }));
    }
}
