use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::types::*;

/// Builder for document drafts.
///
/// ```
/// use comprobante::core::*;
/// use rust_decimal_macros::dec;
///
/// let draft = DraftBuilder::new(DocumentKind::Invoice, "F001")
///     .party(
///         PartyBuilder::tax_id("20123456789", "Transportes Andinos SAC")
///             .address("Av. Javier Prado 123, Lima")
///             .build(),
///     )
///     .add_line(LineItemBuilder::new("Flete Lima - Arequipa", dec!(1), dec!(354.00)).build())
///     .build();
///
/// assert!(ValidationEngine::new().validate(&draft).is_ok());
/// ```
pub struct DraftBuilder {
    kind: DocumentKind,
    series: String,
    party: Party,
    lines: Vec<LineItem>,
    waybill: Option<WaybillDetails>,
    issued_at: Option<DateTime<Utc>>,
}

impl DraftBuilder {
    pub fn new(kind: DocumentKind, series: impl Into<String>) -> Self {
        Self {
            kind,
            series: series.into(),
            party: PartyBuilder::anonymous().build(),
            lines: Vec::new(),
            waybill: None,
            issued_at: None,
        }
    }

    pub fn party(mut self, party: Party) -> Self {
        self.party = party;
        self
    }

    pub fn add_line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    pub fn lines(mut self, lines: impl IntoIterator<Item = LineItem>) -> Self {
        self.lines.extend(lines);
        self
    }

    pub fn waybill(mut self, details: WaybillDetails) -> Self {
        self.waybill = Some(details);
        self
    }

    pub fn issued_at(mut self, at: DateTime<Utc>) -> Self {
        self.issued_at = Some(at);
        self
    }

    /// Assemble the draft. Completeness is checked later by
    /// [`ValidationEngine`](super::ValidationEngine), which reports every
    /// missing field at once.
    pub fn build(self) -> Draft {
        Draft {
            kind: self.kind,
            series: self.series,
            party: self.party,
            lines: self.lines,
            waybill: self.waybill,
            issued_at: self.issued_at,
        }
    }
}

/// Builder for Party (customer or recipient).
pub struct PartyBuilder {
    doc_type: IdentityDocType,
    id_number: String,
    name: String,
    address: Option<String>,
}

impl PartyBuilder {
    pub fn new(
        doc_type: IdentityDocType,
        id_number: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            doc_type,
            id_number: id_number.into(),
            name: name.into(),
            address: None,
        }
    }

    /// Company identified by RUC.
    pub fn tax_id(ruc: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(IdentityDocType::TaxId, ruc, name)
    }

    /// Person identified by DNI.
    pub fn personal_id(dni: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(IdentityDocType::PersonalId, dni, name)
    }

    /// Walk-in customer without identity document.
    pub fn anonymous() -> Self {
        Self::new(IdentityDocType::None, "", "")
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn build(self) -> Party {
        Party {
            doc_type: self.doc_type,
            id_number: self.id_number,
            name: self.name,
            address: self.address,
        }
    }
}

/// Builder for LineItem.
pub struct LineItemBuilder {
    description: String,
    quantity: Decimal,
    gross_unit_price: Decimal,
    unit_code: String,
    weight_kg: Option<Decimal>,
}

impl LineItemBuilder {
    pub fn new(description: impl Into<String>, quantity: Decimal, gross_unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            gross_unit_price,
            unit_code: "NIU".to_string(),
            weight_kg: None,
        }
    }

    pub fn unit(mut self, code: impl Into<String>) -> Self {
        self.unit_code = code.into();
        self
    }

    pub fn weight_kg(mut self, weight: Decimal) -> Self {
        self.weight_kg = Some(weight);
        self
    }

    pub fn build(self) -> LineItem {
        LineItem {
            description: self.description,
            quantity: self.quantity,
            gross_unit_price: self.gross_unit_price,
            unit_code: self.unit_code,
            weight_kg: self.weight_kg,
        }
    }
}

/// Builder for WaybillDetails.
pub struct WaybillBuilder {
    origin: Location,
    destination: Location,
    carrier: Carrier,
    driver: Driver,
    vehicle_plate: Option<String>,
    package_count: u32,
    transfer_reason: TransferReason,
    transfer_start: NaiveDate,
}

impl WaybillBuilder {
    pub fn new(transfer_start: NaiveDate) -> Self {
        Self {
            origin: Location {
                address: String::new(),
                zone_code: String::new(),
            },
            destination: Location {
                address: String::new(),
                zone_code: String::new(),
            },
            carrier: Carrier {
                tax_id: String::new(),
                name: String::new(),
            },
            driver: Driver {
                doc_type: IdentityDocType::PersonalId,
                id_number: String::new(),
                names: String::new(),
                license: String::new(),
            },
            vehicle_plate: None,
            package_count: 1,
            transfer_reason: TransferReason::Sale,
            transfer_start,
        }
    }

    pub fn origin(mut self, address: impl Into<String>, zone_code: impl Into<String>) -> Self {
        self.origin = Location {
            address: address.into(),
            zone_code: zone_code.into(),
        };
        self
    }

    pub fn destination(
        mut self,
        address: impl Into<String>,
        zone_code: impl Into<String>,
    ) -> Self {
        self.destination = Location {
            address: address.into(),
            zone_code: zone_code.into(),
        };
        self
    }

    pub fn carrier(mut self, tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        self.carrier = Carrier {
            tax_id: tax_id.into(),
            name: name.into(),
        };
        self
    }

    pub fn driver(
        mut self,
        id_number: impl Into<String>,
        names: impl Into<String>,
        license: impl Into<String>,
    ) -> Self {
        self.driver = Driver {
            doc_type: IdentityDocType::PersonalId,
            id_number: id_number.into(),
            names: names.into(),
            license: license.into(),
        };
        self
    }

    pub fn vehicle_plate(mut self, plate: impl Into<String>) -> Self {
        self.vehicle_plate = Some(plate.into());
        self
    }

    pub fn package_count(mut self, count: u32) -> Self {
        self.package_count = count;
        self
    }

    pub fn transfer_reason(mut self, reason: TransferReason) -> Self {
        self.transfer_reason = reason;
        self
    }

    pub fn build(self) -> WaybillDetails {
        WaybillDetails {
            origin: self.origin,
            destination: self.destination,
            carrier: self.carrier,
            driver: self.driver,
            vehicle_plate: self.vehicle_plate,
            package_count: self.package_count,
            transfer_reason: self.transfer_reason,
            transfer_start: self.transfer_start,
        }
    }
}
