//! Document lifecycle: numbering, persistence, and gateway approval.
//!
//! ```
//! use comprobante::core::*;
//! use comprobante::lifecycle::*;
//! use rust_decimal_macros::dec;
//!
//! struct AcceptAll;
//!
//! impl Gateway for AcceptAll {
//!     fn dispatch(&self, _payload: &GatewayPayload) -> Result<(), GatewayError> {
//!         Ok(())
//!     }
//!     fn status(&self, _id: &DocumentNumber) -> Result<GatewayStatus, GatewayError> {
//!         Ok(GatewayStatus::Accepted)
//!     }
//! }
//!
//! let series = InMemorySeriesStore::new();
//! series.configure(DocumentKind::Receipt, "B001", 0).unwrap();
//! let engine = DocumentLifecycle::new(
//!     series,
//!     InMemoryDocumentStore::new(),
//!     AcceptAll,
//!     LifecycleConfig::default(),
//! )
//! .unwrap();
//!
//! let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
//!     .add_line(LineItemBuilder::new("Encomienda 5 kg", dec!(1), dec!(23.60)).build())
//!     .build();
//! let doc = engine.submit(draft).unwrap();
//! assert_eq!(doc.display_number(), "B001-00000001");
//! assert_eq!(doc.status(), DocumentStatus::Pending);
//!
//! let doc = engine.poll(doc.id()).unwrap();
//! assert_eq!(doc.status(), DocumentStatus::Accepted);
//! assert_eq!(doc.subtotal(), dec!(20.00));
//! ```

mod document;
mod engine;
mod error;
mod gateway;
mod state;
mod store;

pub use document::{AuditTrail, FiscalDocument};
pub use engine::{DocumentLifecycle, LifecycleConfig};
pub use error::DocumentError;
pub use gateway::{
    Gateway, GatewayError, GatewayPayload, GatewayStatus, PayloadLine, PayloadParty,
    PayloadWaybill,
};
pub use state::{DocumentStatus, LifecycleEvent, Refusal, Transition};
pub use store::{DocumentStore, InMemoryDocumentStore, StoreError};
