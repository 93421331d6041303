//! # comprobante
//!
//! Fiscal document lifecycle engine for invoices (`01`), receipts (`03`)
//! and waybills (`09`): series numbering, tax-inclusive totals, gateway
//! approval, and civil time normalization.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Unit prices are tax-inclusive; totals are derived, never entered.
//!
//! ## Quick Start
//!
//! ```rust
//! use comprobante::core::*;
//! use rust_decimal_macros::dec;
//!
//! let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
//!     .party(PartyBuilder::personal_id("45678912", "Rosa Mamani").build())
//!     .add_line(LineItemBuilder::new("Pasaje Lima - Ica", dec!(1), dec!(10.00)).build())
//!     .add_line(LineItemBuilder::new("Encomienda", dec!(2), dec!(5.00)).build())
//!     .build();
//!
//! assert!(ValidationEngine::new().validate(&draft).is_ok());
//!
//! let totals = TaxCalculator::default().compute(&draft.lines).unwrap().presented();
//! assert_eq!(totals.subtotal, dec!(16.95));
//! assert_eq!(totals.tax_amount, dec!(3.05));
//! assert_eq!(totals.total, dec!(20.00));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document types, validation, tax, series numbering |
//! | `civil-time` (default) | Wire/civil time normalization and formatting |
//! | `lifecycle` (default) | State machine, store and gateway ports, payloads |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "civil-time")]
pub mod civil_time;

#[cfg(feature = "lifecycle")]
pub mod lifecycle;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
