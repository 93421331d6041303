use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fiscal document kind, keyed by the tax authority's document type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKind {
    /// 01: Factura (invoice).
    Invoice,
    /// 03: Boleta de venta (receipt).
    Receipt,
    /// 09: Guía de remisión remitente (waybill).
    Waybill,
}

impl DocumentKind {
    /// Tax authority document type code. Preserved verbatim on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "01",
            Self::Receipt => "03",
            Self::Waybill => "09",
        }
    }

    /// Parse from the tax authority document type code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Invoice),
            "03" => Some(Self::Receipt),
            "09" => Some(Self::Waybill),
            _ => None,
        }
    }

    /// Leading letter every series code of this kind must carry.
    pub fn series_prefix(&self) -> char {
        match self {
            Self::Invoice => 'F',
            Self::Receipt => 'B',
            Self::Waybill => 'T',
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invoice => "invoice",
            Self::Receipt => "receipt",
            Self::Waybill => "waybill",
        };
        f.write_str(name)
    }
}

/// Counterparty identity document type (catálogo 06).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentityDocType {
    /// 1: DNI, personal national ID.
    PersonalId,
    /// 6: RUC, tax ID.
    TaxId,
    /// `-`: no identity document (anonymous receipt).
    None,
}

impl IdentityDocType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PersonalId => "1",
            Self::TaxId => "6",
            Self::None => "-",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::PersonalId),
            "6" => Some(Self::TaxId),
            "-" => Some(Self::None),
            _ => None,
        }
    }

    /// Exact digit count of a well-formed number of this type, if fixed.
    pub fn digit_count(&self) -> Option<usize> {
        match self {
            Self::PersonalId => Some(8),
            Self::TaxId => Some(11),
            Self::None => None,
        }
    }
}

/// A fully qualified document number: kind, series and sequential number.
///
/// Also the identifier of a stored document, since the number is unique
/// within its `(kind, series)` stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentNumber {
    pub kind: DocumentKind,
    pub series: String,
    pub number: u64,
}

impl DocumentNumber {
    pub fn new(kind: DocumentKind, series: impl Into<String>, number: u64) -> Self {
        Self {
            kind,
            series: series.into(),
            number,
        }
    }
}

/// Renders `{series}-{number:08}`, e.g. `F001-00000042`.
impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:08}", self.series, self.number)
    }
}

/// Counterparty of a document (customer, or recipient for waybills).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub doc_type: IdentityDocType,
    /// Identity number; empty when `doc_type` is [`IdentityDocType::None`].
    pub id_number: String,
    /// Legal or display name.
    pub name: String,
    pub address: Option<String>,
}

/// A sold or transported item. Unit prices are tax-inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    /// Tax-inclusive price per unit.
    pub gross_unit_price: Decimal,
    /// Unit of measure (catálogo 03, e.g. "NIU" unit, "KGM" kilogram).
    pub unit_code: String,
    /// Gross weight of the whole line in kilograms. Waybills only.
    pub weight_kg: Option<Decimal>,
}

impl LineItem {
    /// `gross_unit_price × quantity`, or `None` if it overflows.
    pub fn gross_amount(&self) -> Option<Decimal> {
        self.gross_unit_price.checked_mul(self.quantity)
    }
}

/// Carrier company moving the goods of a waybill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    /// RUC of the carrier.
    pub tax_id: String,
    pub name: String,
}

/// Driver in charge of a waybill's vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub doc_type: IdentityDocType,
    pub id_number: String,
    pub names: String,
    pub license: String,
}

/// One end of a transfer: street address plus 6-digit geographic code (ubigeo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub zone_code: String,
}

/// Reason for moving goods (catálogo 20, subset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferReason {
    /// 01: Sale.
    Sale,
    /// 04: Transfer between establishments of the same company.
    BetweenEstablishments,
    /// 13: Other.
    Other,
}

impl TransferReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sale => "01",
            Self::BetweenEstablishments => "04",
            Self::Other => "13",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "01" => Some(Self::Sale),
            "04" => Some(Self::BetweenEstablishments),
            "13" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Transport data carried by waybills on top of the common document fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaybillDetails {
    pub origin: Location,
    pub destination: Location,
    pub carrier: Carrier,
    pub driver: Driver,
    pub vehicle_plate: Option<String>,
    pub package_count: u32,
    pub transfer_reason: TransferReason,
    /// Civil date the goods start moving.
    pub transfer_start: NaiveDate,
}

/// A document not yet numbered. Input of validation and submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub kind: DocumentKind,
    /// Series code the number will be drawn from, e.g. "F001".
    pub series: String,
    pub party: Party,
    pub lines: Vec<LineItem>,
    /// Present for waybills, ignored otherwise.
    pub waybill: Option<WaybillDetails>,
    /// Issue instant; the submission time is used when absent.
    pub issued_at: Option<DateTime<Utc>>,
}

impl Draft {
    /// Sum of line weights. Zero when no line declares a weight; saturates
    /// instead of overflowing.
    pub fn total_gross_weight(&self) -> Decimal {
        self.lines
            .iter()
            .filter_map(|l| l.weight_kg)
            .fold(Decimal::ZERO, |acc, w| acc.saturating_add(w))
    }
}

/// Document totals. Tax-exclusive `subtotal`, `tax_amount` and `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    /// Σ `gross_unit_price × quantity` of the source lines.
    pub gross_sum: Decimal,
}
