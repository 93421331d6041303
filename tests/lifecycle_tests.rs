#![cfg(feature = "lifecycle")]

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use comprobante::core::*;
use comprobante::lifecycle::*;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// --- Test doubles ---

/// Records every payload and answers polls with a scripted verdict.
#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<GatewayPayload>>,
    fail_dispatch: Mutex<Option<GatewayError>>,
    verdict: Mutex<Option<Result<GatewayStatus, GatewayError>>>,
}

impl RecordingGateway {
    fn sent_numbers(&self) -> Vec<String> {
        self.sent.lock().iter().map(|p| p.full_number.clone()).collect()
    }
}

impl Gateway for RecordingGateway {
    fn dispatch(&self, payload: &GatewayPayload) -> Result<(), GatewayError> {
        if let Some(err) = self.fail_dispatch.lock().clone() {
            return Err(err);
        }
        self.sent.lock().push(payload.clone());
        Ok(())
    }

    fn status(&self, _id: &DocumentNumber) -> Result<GatewayStatus, GatewayError> {
        self.verdict.lock().clone().unwrap_or(Ok(GatewayStatus::Pending))
    }
}

/// Store whose inserts always fail, as when the database drops mid-request.
#[derive(Default)]
struct BrokenStore {
    inner: InMemoryDocumentStore,
}

impl DocumentStore for BrokenStore {
    fn insert(&self, _document: &FiscalDocument) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection reset".into()))
    }

    fn get(&self, id: &DocumentNumber) -> Result<Option<FiscalDocument>, StoreError> {
        self.inner.get(id)
    }

    fn update(&self, document: &FiscalDocument, expected_revision: u64) -> Result<(), StoreError> {
        self.inner.update(document, expected_revision)
    }
}

/// Store that accepts new documents but fails every later write.
#[derive(Default)]
struct ReadOnlyAfterInsertStore {
    inner: InMemoryDocumentStore,
}

impl DocumentStore for ReadOnlyAfterInsertStore {
    fn insert(&self, document: &FiscalDocument) -> Result<(), StoreError> {
        self.inner.insert(document)
    }

    fn get(&self, id: &DocumentNumber) -> Result<Option<FiscalDocument>, StoreError> {
        self.inner.get(id)
    }

    fn update(&self, _document: &FiscalDocument, _expected_revision: u64) -> Result<(), StoreError> {
        Err(StoreError::Backend("replica is read-only".into()))
    }
}

type Engine = DocumentLifecycle<InMemorySeriesStore, InMemoryDocumentStore, Arc<RecordingGateway>>;

fn series() -> InMemorySeriesStore {
    let series = InMemorySeriesStore::new();
    series.configure(DocumentKind::Invoice, "F001", 0).unwrap();
    series.configure(DocumentKind::Receipt, "B001", 0).unwrap();
    series.configure(DocumentKind::Waybill, "T001", 0).unwrap();
    series
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn engine() -> (Engine, Arc<RecordingGateway>) {
    init_tracing();
    let gateway = Arc::new(RecordingGateway::default());
    let engine = DocumentLifecycle::new(
        series(),
        InMemoryDocumentStore::new(),
        Arc::clone(&gateway),
        LifecycleConfig::default(),
    )
    .unwrap();
    (engine, gateway)
}

fn invoice() -> Draft {
    DraftBuilder::new(DocumentKind::Invoice, "F001")
        .party(
            PartyBuilder::tax_id("20100047218", "Agroexportadora del Sur SAC")
                .address("Av. Ejército 710, Yanahuara, Arequipa")
                .build(),
        )
        .add_line(LineItemBuilder::new("Flete", dec!(1), dec!(10.00)).build())
        .add_line(LineItemBuilder::new("Embalaje", dec!(2), dec!(5.00)).build())
        .build()
}

fn receipt() -> Draft {
    DraftBuilder::new(DocumentKind::Receipt, "B001")
        .add_line(LineItemBuilder::new("Pasaje Lima - Huaral", dec!(1), dec!(11.80)).build())
        .build()
}

fn waybill(license: &str) -> Draft {
    DraftBuilder::new(DocumentKind::Waybill, "T001")
        .party(PartyBuilder::tax_id("20100047218", "Agroexportadora del Sur SAC").build())
        .add_line(
            LineItemBuilder::new("Cajas de palta Hass", dec!(20), dec!(0))
                .unit("BX")
                .weight_kg(dec!(10))
                .build(),
        )
        .waybill(
            WaybillBuilder::new(NaiveDate::from_ymd_opt(2026, 1, 24).unwrap())
                .origin("Av. Nicolás Arriola 240, La Victoria, Lima", "150115")
                .destination("Calle Mercaderes 120, Arequipa", "040101")
                .carrier("20512345678", "Transportes Andinos SAC")
                .driver("45678912", "Juan Pérez Quispe", license)
                .vehicle_plate("ABC-123")
                .package_count(20)
                .build(),
        )
        .build()
}

// --- Submission ---

#[test]
fn submit_numbers_prices_and_dispatches() {
    let (engine, gateway) = engine();
    let doc = engine.submit(invoice()).unwrap();

    assert_eq!(doc.status(), DocumentStatus::Pending);
    assert_eq!(doc.display_number(), "F001-00000001");
    assert_eq!(doc.subtotal(), dec!(16.95));
    assert_eq!(doc.tax_amount(), dec!(3.05));
    assert_eq!(doc.total(), dec!(20.00));
    assert_eq!(gateway.sent_numbers(), vec!["F001-00000001"]);
    assert_eq!(engine.store().len(), 1);
}

#[test]
fn numbers_are_sequential_per_series() {
    let (engine, _) = engine();
    let numbers: Vec<String> = (0..3)
        .map(|_| engine.submit(receipt()).unwrap().display_number())
        .collect();
    assert_eq!(numbers, ["B001-00000001", "B001-00000002", "B001-00000003"]);
    assert_eq!(engine.submit(invoice()).unwrap().display_number(), "F001-00000001");
}

#[test]
fn invalid_waybill_reserves_no_number() {
    let (engine, gateway) = engine();
    let err = engine.submit(waybill("")).unwrap_err();

    match &err {
        DocumentError::Validation(v) => assert_eq!(v.fields(), vec!["waybill.driver.license"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(err.is_recoverable());
    assert_eq!(
        engine.registry().peek(DocumentKind::Waybill, "T001").unwrap().to_string(),
        "T001-00000001"
    );
    assert!(engine.store().is_empty());
    assert!(gateway.sent_numbers().is_empty());
}

#[test]
fn valid_waybill_carries_transport_data() {
    let (engine, gateway) = engine();
    let doc = engine.submit(waybill("Q45678912")).unwrap();

    assert_eq!(doc.total_gross_weight(), Some(dec!(200)));
    assert_eq!(doc.total(), dec!(0));
    let sent = gateway.sent.lock();
    let payload = sent[0].waybill.as_ref().unwrap();
    assert_eq!(payload.driver_license, "Q45678912");
    assert_eq!(payload.transfer_start, "2026-01-24");
    assert_eq!(payload.total_gross_weight, dec!(200));
}

#[test]
fn unknown_series_is_refused_before_storage() {
    let (engine, _) = engine();
    let draft = DraftBuilder::new(DocumentKind::Receipt, "B009")
        .add_line(LineItemBuilder::new("Pasaje", dec!(1), dec!(10)).build())
        .build();
    let err = engine.submit(draft).unwrap_err();
    assert!(matches!(err, DocumentError::Series(SeriesError::NotFound { .. })));
    assert!(engine.store().is_empty());
}

#[test]
fn store_failure_burns_the_number() {
    let engine = DocumentLifecycle::new(
        series(),
        BrokenStore::default(),
        RecordingGateway::default(),
        LifecycleConfig::default(),
    )
    .unwrap();

    let err = engine.submit(receipt()).unwrap_err();
    match err {
        DocumentError::NumberBurned { number, reason } => {
            assert_eq!(number, "B001-00000001");
            assert!(reason.contains("connection reset"));
        }
        other => panic!("expected burned number, got {other:?}"),
    }
    // The burned number is never handed out again.
    assert_eq!(engine.registry().peek(DocumentKind::Receipt, "B001").unwrap().number, 2);
    assert!(engine.gateway().sent_numbers().is_empty());
}

#[test]
fn overflowing_amounts_reserve_no_number() {
    let (engine, gateway) = engine();
    let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
        .add_line(LineItemBuilder::new("Lote", dec!(2), Decimal::MAX).build())
        .build();

    let err = engine.submit(draft).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::Tax(TaxError::InvalidLineItem { index: 0, .. })
    ));
    assert_eq!(engine.registry().peek(DocumentKind::Receipt, "B001").unwrap().number, 1);
    assert!(engine.store().is_empty());
    assert!(gateway.sent_numbers().is_empty());
}

#[test]
fn unrecorded_dispatch_still_returns_stored_document() {
    let gateway = Arc::new(RecordingGateway::default());
    let engine = DocumentLifecycle::new(
        series(),
        ReadOnlyAfterInsertStore::default(),
        Arc::clone(&gateway),
        LifecycleConfig::default(),
    )
    .unwrap();

    let doc = engine.submit(receipt()).unwrap();
    assert_eq!(doc.display_number(), "B001-00000001");
    assert_eq!(doc.status(), DocumentStatus::Pending);
    assert_eq!(doc.audit().dispatch_attempts, 0);
    assert_eq!(gateway.sent_numbers(), vec!["B001-00000001"]);
    assert_eq!(engine.get(doc.id()).unwrap(), doc);
}

#[test]
fn failed_dispatch_leaves_document_pending() {
    let (engine, gateway) = engine();
    *gateway.fail_dispatch.lock() = Some(GatewayError::Unavailable("503".into()));

    let doc = engine.submit(receipt()).unwrap();
    assert_eq!(doc.status(), DocumentStatus::Pending);
    assert_eq!(doc.audit().dispatch_attempts, 1);
    assert_eq!(
        doc.audit().last_dispatch_error.as_deref(),
        Some("gateway unavailable: 503")
    );

    *gateway.fail_dispatch.lock() = None;
    let retried = engine.redispatch(doc.id()).unwrap();
    assert_eq!(retried.id(), doc.id());
    assert_eq!(retried.audit().dispatch_attempts, 2);
    assert_eq!(retried.audit().last_dispatch_error, None);
    assert_eq!(gateway.sent_numbers(), vec!["B001-00000001"]);
}

// --- Gateway verdicts ---

#[test]
fn acceptance_is_idempotent() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();

    let first = engine.on_gateway_accepted(doc.id()).unwrap();
    let second = engine.on_gateway_accepted(doc.id()).unwrap();
    assert_eq!(first.status(), DocumentStatus::Accepted);
    assert_eq!(second, first);
}

#[test]
fn rejection_keeps_gateway_message() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    let rejected = engine
        .on_gateway_rejected(doc.id(), "2800 - número de documento inválido")
        .unwrap();
    assert_eq!(rejected.status(), DocumentStatus::Rejected);
    assert_eq!(
        rejected.gateway_message(),
        Some("2800 - número de documento inválido")
    );
}

#[test]
fn rejection_after_acceptance_is_illegal() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    engine.on_gateway_accepted(doc.id()).unwrap();

    let err = engine.on_gateway_rejected(doc.id(), "late").unwrap_err();
    insta::assert_snapshot!(
        err.to_string(),
        @"document B001-00000001: gateway rejection is not allowed from ACCEPTED"
    );
    let stored = engine.get(doc.id()).unwrap();
    assert_eq!(stored.status(), DocumentStatus::Accepted);
    assert_eq!(stored.gateway_message(), None);
}

#[test]
fn poll_applies_acceptance() {
    let (engine, gateway) = engine();
    let doc = engine.submit(receipt()).unwrap();

    assert_eq!(engine.poll(doc.id()).unwrap().status(), DocumentStatus::Pending);
    *gateway.verdict.lock() = Some(Ok(GatewayStatus::Accepted));
    assert_eq!(engine.poll(doc.id()).unwrap().status(), DocumentStatus::Accepted);
}

#[test]
fn poll_timeout_is_recoverable() {
    let (engine, gateway) = engine();
    let doc = engine.submit(receipt()).unwrap();
    *gateway.verdict.lock() = Some(Err(GatewayError::Timeout));

    let err = engine.poll(doc.id()).unwrap_err();
    assert!(matches!(err, DocumentError::GatewayTimeout { .. }));
    assert!(err.is_recoverable());
    assert_eq!(engine.get(doc.id()).unwrap().status(), DocumentStatus::Pending);
}

// --- Voiding ---

#[test]
fn void_requires_reason() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    assert!(matches!(
        engine.void(doc.id(), "   "),
        Err(DocumentError::MissingVoidReason)
    ));
    assert_eq!(engine.get(doc.id()).unwrap().status(), DocumentStatus::Pending);
}

#[test]
fn void_accepted_document() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    engine.on_gateway_accepted(doc.id()).unwrap();

    let voided = engine.void(doc.id(), "  error en el monto  ").unwrap();
    assert_eq!(voided.status(), DocumentStatus::Void);
    assert_eq!(voided.void_reason(), Some("error en el monto"));
    assert_eq!(voided.audit().voided_from, Some(DocumentStatus::Accepted));
}

#[test]
fn void_rejected_document_is_refused_unchanged() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    let rejected = engine.on_gateway_rejected(doc.id(), "RUC no existe").unwrap();

    let err = engine.void(doc.id(), "duplicado").unwrap_err();
    assert!(matches!(
        err,
        DocumentError::AlreadyTerminal { status: DocumentStatus::Rejected, .. }
    ));
    assert_eq!(engine.get(doc.id()).unwrap(), rejected);
}

#[test]
fn void_twice_is_refused() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    let voided = engine.void(doc.id(), "cliente desistió").unwrap();
    let err = engine.void(doc.id(), "otra vez").unwrap_err();
    assert!(matches!(err, DocumentError::AlreadyTerminal { .. }));
    assert_eq!(engine.get(doc.id()).unwrap().void_reason(), voided.void_reason());
}

#[test]
fn acceptance_after_pending_void_is_reported() {
    let (engine, _) = engine();
    let doc = engine.submit(receipt()).unwrap();
    engine.void(doc.id(), "cliente desistió").unwrap();

    let err = engine.on_gateway_accepted(doc.id()).unwrap_err();
    assert!(matches!(err, DocumentError::VoidConflict { .. }));
    assert!(!err.is_recoverable());
    assert_eq!(engine.get(doc.id()).unwrap().status(), DocumentStatus::Void);
}

#[test]
fn poll_reports_acceptance_after_pending_void() {
    let (engine, gateway) = engine();
    let doc = engine.submit(receipt()).unwrap();
    engine.void(doc.id(), "cliente desistió").unwrap();
    *gateway.verdict.lock() = Some(Ok(GatewayStatus::Accepted));

    let err = engine.poll(doc.id()).unwrap_err();
    assert!(matches!(err, DocumentError::VoidConflict { .. }));
    assert_eq!(engine.get(doc.id()).unwrap().status(), DocumentStatus::Void);
}

#[test]
fn poll_of_pending_void_ignores_rejection() {
    let (engine, gateway) = engine();
    let doc = engine.submit(receipt()).unwrap();
    let voided = engine.void(doc.id(), "cliente desistió").unwrap();
    *gateway.verdict.lock() = Some(Ok(GatewayStatus::Rejected("duplicado".into())));

    assert_eq!(engine.poll(doc.id()).unwrap(), voided);
}

#[test]
fn poll_of_accepted_void_skips_gateway() {
    let (engine, gateway) = engine();
    let doc = engine.submit(receipt()).unwrap();
    engine.on_gateway_accepted(doc.id()).unwrap();
    let voided = engine.void(doc.id(), "error en el monto").unwrap();
    *gateway.verdict.lock() = Some(Err(GatewayError::Timeout));

    // A timeout would surface if the gateway were asked.
    assert_eq!(engine.poll(doc.id()).unwrap(), voided);
}

#[test]
fn racing_void_and_acceptance_end_void() {
    for _ in 0..20 {
        let (engine, _) = engine();
        let doc = engine.submit(receipt()).unwrap();
        let id = doc.id().clone();

        let (accepted, voided) = std::thread::scope(|scope| {
            let accept = scope.spawn(|| engine.on_gateway_accepted(&id));
            let void = scope.spawn(|| engine.void(&id, "anulado en caja"));
            (accept.join().unwrap(), void.join().unwrap())
        });

        let voided = voided.unwrap();
        let stored = engine.get(&id).unwrap();
        assert_eq!(stored.status(), DocumentStatus::Void);
        match accepted {
            // Acceptance landed first, the void followed it.
            Ok(_) => assert_eq!(voided.audit().voided_from, Some(DocumentStatus::Accepted)),
            Err(DocumentError::VoidConflict { .. }) => {
                assert_eq!(voided.audit().voided_from, Some(DocumentStatus::Pending))
            }
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
}

// --- Payload ---

#[test]
fn payload_uses_civil_date_and_time() {
    let (engine, gateway) = engine();
    let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
        .add_line(LineItemBuilder::new("Pasaje", dec!(1), dec!(11.80)).build())
        .issued_at(Utc.with_ymd_and_hms(2026, 1, 25, 3, 30, 0).unwrap())
        .build();
    engine.submit(draft).unwrap();

    let payload = gateway.sent.lock()[0].clone();
    insta::assert_snapshot!(
        format!(
            "{} {} {} {}",
            payload.document_type, payload.full_number, payload.issue_date, payload.issue_time
        ),
        @"03 B001-00000001 2026-01-24 22:30:00"
    );
    assert_eq!(payload.subtotal, dec!(10.00));
    assert_eq!(payload.tax_amount, dec!(1.80));
    assert_eq!(payload.lines[0].base_amount, dec!(10.00));

    let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
    assert_eq!(json["issued_at"], "2026-01-25T03:30:00.000Z");
    assert_eq!(json["customer"]["doc_type"], "-");
    assert!(json.get("waybill").is_none());
}

#[test]
fn lifecycle_config_from_json() {
    let config: LifecycleConfig = serde_json::from_str(
        r#"{"tax":{"rate":"0.10"},"clock":{"zone":"UTC","offset_seconds":0}}"#,
    )
    .unwrap();
    assert_eq!(config.tax.rate, dec!(0.10));

    let gateway = Arc::new(RecordingGateway::default());
    let engine = DocumentLifecycle::new(
        series(),
        InMemoryDocumentStore::new(),
        Arc::clone(&gateway),
        config,
    )
    .unwrap();
    let doc = engine
        .submit(
            DraftBuilder::new(DocumentKind::Receipt, "B001")
                .add_line(LineItemBuilder::new("Servicio", dec!(1), dec!(110)).build())
                .issued_at(Utc.with_ymd_and_hms(2026, 1, 25, 3, 30, 0).unwrap())
                .build(),
        )
        .unwrap();
    assert_eq!(doc.subtotal(), dec!(100));
    assert_eq!(gateway.sent.lock()[0].issue_date, "2026-01-25");
}

#[test]
fn invalid_rate_is_refused_at_construction() {
    let result = DocumentLifecycle::new(
        series(),
        InMemoryDocumentStore::new(),
        RecordingGateway::default(),
        LifecycleConfig::default().tax(TaxConfig::default().with_rate(dec!(1.5))),
    );
    assert!(matches!(result, Err(DocumentError::Tax(TaxError::InvalidRate(_)))));
}
