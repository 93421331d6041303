use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::FiscalDocument;
use crate::civil_time::{CivilClock, WireTime};
use crate::core::{DocumentNumber, TaxCalculator, round_half_up};

/// What the tax-authority gateway currently says about a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum GatewayStatus {
    Accepted,
    Rejected(String),
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// No answer in time. The request may or may not have landed.
    #[error("gateway timed out")]
    Timeout,

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Port to the external submission service.
///
/// `dispatch` hands the payload over and returns without waiting for a
/// verdict; the verdict arrives through the lifecycle's callbacks or
/// through `status` polling.
pub trait Gateway: Send + Sync {
    fn dispatch(&self, payload: &GatewayPayload) -> Result<(), GatewayError>;

    fn status(&self, id: &DocumentNumber) -> Result<GatewayStatus, GatewayError>;
}

impl<G: Gateway + ?Sized> Gateway for std::sync::Arc<G> {
    fn dispatch(&self, payload: &GatewayPayload) -> Result<(), GatewayError> {
        (**self).dispatch(payload)
    }

    fn status(&self, id: &DocumentNumber) -> Result<GatewayStatus, GatewayError> {
        (**self).status(id)
    }
}

/// Document body as sent to the gateway. Amounts are rounded to 2 places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayload {
    /// Tax authority document code ("01", "03", "09").
    pub document_type: String,
    pub series: String,
    pub number: u64,
    /// `{series}-{number:08}`.
    pub full_number: String,
    pub issued_at: WireTime,
    /// Civil issue date, `YYYY-MM-DD`.
    pub issue_date: String,
    /// Civil issue time, `HH:MM:SS`.
    pub issue_time: String,
    pub customer: PayloadParty,
    pub lines: Vec<PayloadLine>,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waybill: Option<PayloadWaybill>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadParty {
    pub doc_type: String,
    pub id_number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadLine {
    pub description: String,
    pub unit_code: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub base_amount: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadWaybill {
    pub transfer_reason: String,
    /// Civil date, `YYYY-MM-DD`.
    pub transfer_start: String,
    pub origin_address: String,
    pub origin_zone_code: String,
    pub destination_address: String,
    pub destination_zone_code: String,
    pub carrier_tax_id: String,
    pub carrier_name: String,
    pub driver_doc_type: String,
    pub driver_id_number: String,
    pub driver_names: String,
    pub driver_license: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_plate: Option<String>,
    pub package_count: u32,
    pub total_gross_weight: Decimal,
}

impl GatewayPayload {
    pub fn from_document(
        doc: &FiscalDocument,
        calculator: &TaxCalculator,
        clock: &CivilClock,
    ) -> Self {
        let rate = calculator.rate();
        let civil = clock.to_civil(doc.issued_at());
        let party = doc.party();

        let lines = doc
            .lines()
            .iter()
            .map(|line| {
                // Totals were computed from these lines, so neither overflows.
                let base = calculator.line_base(line).unwrap_or_default();
                PayloadLine {
                    description: line.description.clone(),
                    unit_code: line.unit_code.clone(),
                    quantity: line.quantity,
                    unit_price: round_half_up(line.gross_unit_price, 2),
                    base_amount: round_half_up(base, 2),
                    tax_amount: round_half_up(base * rate, 2),
                    line_total: round_half_up(line.gross_amount().unwrap_or_default(), 2),
                    weight_kg: line.weight_kg,
                }
            })
            .collect();

        let waybill = doc.waybill().map(|w| PayloadWaybill {
            transfer_reason: w.transfer_reason.code().to_string(),
            transfer_start: w.transfer_start.format("%Y-%m-%d").to_string(),
            origin_address: w.origin.address.clone(),
            origin_zone_code: w.origin.zone_code.clone(),
            destination_address: w.destination.address.clone(),
            destination_zone_code: w.destination.zone_code.clone(),
            carrier_tax_id: w.carrier.tax_id.clone(),
            carrier_name: w.carrier.name.clone(),
            driver_doc_type: w.driver.doc_type.code().to_string(),
            driver_id_number: w.driver.id_number.clone(),
            driver_names: w.driver.names.clone(),
            driver_license: w.driver.license.clone(),
            vehicle_plate: w.vehicle_plate.clone(),
            package_count: w.package_count,
            total_gross_weight: doc.total_gross_weight().unwrap_or_default(),
        });

        Self {
            document_type: doc.kind().code().to_string(),
            series: doc.series().to_string(),
            number: doc.id().number,
            full_number: doc.display_number(),
            issued_at: WireTime::Instant(doc.issued_at()),
            issue_date: civil.format("%Y-%m-%d").to_string(),
            issue_time: civil.format("%H:%M:%S").to_string(),
            customer: PayloadParty {
                doc_type: party.doc_type.code().to_string(),
                id_number: party.id_number.clone(),
                name: party.name.clone(),
                address: party.address.clone(),
            },
            lines,
            tax_rate: rate,
            subtotal: doc.subtotal(),
            tax_amount: doc.tax_amount(),
            total: doc.total(),
            waybill,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
