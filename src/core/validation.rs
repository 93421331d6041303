use rust_decimal::Decimal;

use super::error::{FieldViolation, ValidationError};
use super::types::*;

/// Checks that a draft is complete enough to leave DRAFT.
///
/// Rules differ by [`DocumentKind`]. Every failing field is reported, not
/// only the first one, so callers can surface all problems at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationEngine;

impl ValidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Return the draft unchanged if it passes every rule of its kind.
    pub fn validate<'a>(&self, draft: &'a Draft) -> Result<&'a Draft, ValidationError> {
        let violations = self.violations(draft);
        if violations.is_empty() {
            Ok(draft)
        } else {
            Err(ValidationError { violations })
        }
    }

    /// All rule failures of `draft`, empty when it is valid.
    pub fn violations(&self, draft: &Draft) -> Vec<FieldViolation> {
        let mut errors = Vec::new();

        validate_series(draft.kind, &draft.series, &mut errors);

        match draft.kind {
            DocumentKind::Invoice => validate_invoice_party(&draft.party, &mut errors),
            DocumentKind::Receipt => validate_receipt_party(&draft.party, &mut errors),
            DocumentKind::Waybill => validate_waybill(draft, &mut errors),
        }

        if draft.kind != DocumentKind::Waybill {
            validate_sale_lines(&draft.lines, &mut errors);
        }

        errors
    }
}

fn validate_series(kind: DocumentKind, series: &str, errors: &mut Vec<FieldViolation>) {
    let prefix = kind.series_prefix();
    let well_formed = series.len() == 4
        && series.starts_with(prefix)
        && series
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase());
    if !well_formed {
        errors.push(FieldViolation::with_rule(
            "series",
            format!(
                "{kind} series must be 4 uppercase alphanumeric characters starting with '{prefix}', got '{series}'"
            ),
            "DOC-01",
        ));
    }
}

// Invoices are only issued to companies: RUC, name and fiscal address.
fn validate_invoice_party(party: &Party, errors: &mut Vec<FieldViolation>) {
    if party.doc_type != IdentityDocType::TaxId {
        errors.push(FieldViolation::with_rule(
            "party.doc_type",
            format!(
                "invoice customer must be identified by RUC (code 6), got code {}",
                party.doc_type.code()
            ),
            "INV-01",
        ));
    }

    require(&party.name, "party.name", "customer name must not be empty", "INV-02", errors);

    if require(
        &party.id_number,
        "party.id_number",
        "customer RUC must not be empty",
        "INV-03",
        errors,
    ) && party.doc_type == IdentityDocType::TaxId
    {
        validate_id_format(party.doc_type, &party.id_number, "party.id_number", errors);
    }

    let address = party.address.as_deref().unwrap_or_default();
    require(address, "party.address", "customer address must not be empty", "INV-04", errors);
}

// Receipts may go to anonymous customers; identity fields become mandatory
// once a document type is chosen.
fn validate_receipt_party(party: &Party, errors: &mut Vec<FieldViolation>) {
    if party.doc_type == IdentityDocType::None {
        return;
    }

    require(&party.name, "party.name", "customer name must not be empty", "RCP-01", errors);

    if require(
        &party.id_number,
        "party.id_number",
        "customer identity number must not be empty",
        "RCP-02",
        errors,
    ) {
        validate_id_format(party.doc_type, &party.id_number, "party.id_number", errors);
    }
}

fn validate_sale_lines(lines: &[LineItem], errors: &mut Vec<FieldViolation>) {
    if lines.is_empty() {
        errors.push(FieldViolation::with_rule(
            "lines",
            "document must have at least one line item",
            "DOC-02",
        ));
    }

    for (i, line) in lines.iter().enumerate() {
        require(
            &line.description,
            &format!("lines[{i}].description"),
            "item description must not be empty",
            "DOC-03",
            errors,
        );
    }
}

fn validate_waybill(draft: &Draft, errors: &mut Vec<FieldViolation>) {
    let party = &draft.party;
    if party.doc_type == IdentityDocType::None {
        errors.push(FieldViolation::with_rule(
            "party.doc_type",
            "waybill recipient must carry an identity document",
            "WB-01",
        ));
    }
    if require(
        &party.id_number,
        "party.id_number",
        "recipient identity number must not be empty",
        "WB-01",
        errors,
    ) {
        validate_id_format(party.doc_type, &party.id_number, "party.id_number", errors);
    }
    require(&party.name, "party.name", "recipient name must not be empty", "WB-02", errors);

    match &draft.waybill {
        Some(details) => validate_transport(details, errors),
        None => errors.push(FieldViolation::with_rule(
            "waybill",
            "waybill transport details are required",
            "WB-00",
        )),
    }

    if draft.lines.is_empty() {
        errors.push(FieldViolation::with_rule(
            "lines",
            "waybill must list at least one item",
            "WB-10",
        ));
    }
    for (i, line) in draft.lines.iter().enumerate() {
        require(
            &line.description,
            &format!("lines[{i}].description"),
            "item description must not be empty",
            "WB-10",
            errors,
        );
        if line.quantity <= Decimal::ZERO {
            errors.push(FieldViolation::with_rule(
                format!("lines[{i}].quantity"),
                format!("item quantity must be positive, got {}", line.quantity),
                "WB-11",
            ));
        }
        if let Some(weight) = line.weight_kg.filter(|w| *w < Decimal::ZERO) {
            errors.push(FieldViolation::with_rule(
                format!("lines[{i}].weight_kg"),
                format!("item weight must not be negative, got {weight}"),
                "WB-13",
            ));
        }
    }

    if !draft.lines.is_empty() && draft.total_gross_weight() <= Decimal::ZERO {
        errors.push(FieldViolation::with_rule(
            "total_gross_weight",
            "total gross weight of the goods must be positive",
            "WB-12",
        ));
    }
}

fn validate_transport(details: &WaybillDetails, errors: &mut Vec<FieldViolation>) {
    for (prefix, location) in [
        ("waybill.origin", &details.origin),
        ("waybill.destination", &details.destination),
    ] {
        require(
            &location.address,
            &format!("{prefix}.address"),
            "address must not be empty",
            "WB-03",
            errors,
        );
        if !is_zone_code(&location.zone_code) {
            errors.push(FieldViolation::with_rule(
                format!("{prefix}.zone_code"),
                format!(
                    "geographic zone code must be exactly 6 digits, got '{}'",
                    location.zone_code
                ),
                "WB-04",
            ));
        }
    }

    if require(
        &details.carrier.tax_id,
        "waybill.carrier.tax_id",
        "carrier RUC must not be empty",
        "WB-05",
        errors,
    ) {
        validate_id_format(
            IdentityDocType::TaxId,
            &details.carrier.tax_id,
            "waybill.carrier.tax_id",
            errors,
        );
    }
    require(
        &details.carrier.name,
        "waybill.carrier.name",
        "carrier name must not be empty",
        "WB-05",
        errors,
    );

    let driver = &details.driver;
    if require(
        &driver.id_number,
        "waybill.driver.id_number",
        "driver identity number must not be empty",
        "WB-06",
        errors,
    ) {
        validate_id_format(driver.doc_type, &driver.id_number, "waybill.driver.id_number", errors);
    }
    require(
        &driver.names,
        "waybill.driver.names",
        "driver names must not be empty",
        "WB-06",
        errors,
    );
    require(
        &driver.license,
        "waybill.driver.license",
        "driver license must not be empty",
        "WB-07",
        errors,
    );

    if details.package_count == 0 {
        errors.push(FieldViolation::with_rule(
            "waybill.package_count",
            "package count must be positive",
            "WB-08",
        ));
    }
}

/// Push a violation when `value` is blank. Returns whether it was present.
fn require(
    value: &str,
    field: &str,
    message: &str,
    rule: &str,
    errors: &mut Vec<FieldViolation>,
) -> bool {
    if value.trim().is_empty() {
        errors.push(FieldViolation::with_rule(field, message, rule));
        false
    } else {
        true
    }
}

fn validate_id_format(
    doc_type: IdentityDocType,
    value: &str,
    field: &str,
    errors: &mut Vec<FieldViolation>,
) {
    let Some(len) = doc_type.digit_count() else {
        return;
    };
    if value.len() != len || !value.chars().all(|c| c.is_ascii_digit()) {
        errors.push(FieldViolation::with_rule(
            field,
            format!(
                "identity number for document type {} must be exactly {len} digits, got '{value}'",
                doc_type.code()
            ),
            "ID-01",
        ));
    }
}

/// Whether `code` is a well-formed 6-digit geographic zone code (ubigeo).
pub fn is_zone_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DraftBuilder, LineItemBuilder, PartyBuilder, WaybillBuilder};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ticket() -> LineItem {
        LineItemBuilder::new("Pasaje Lima - Trujillo", dec!(1), dec!(60)).build()
    }

    fn waybill_details() -> WaybillBuilder {
        WaybillBuilder::new(NaiveDate::from_ymd_opt(2026, 1, 24).unwrap())
            .origin("Av. Nicolás Arriola 240, La Victoria", "150115")
            .destination("Jr. Pizarro 510, Trujillo", "130101")
            .carrier("20512345678", "Transportes Andinos SAC")
            .driver("45678912", "Juan Pérez Quispe", "Q45678912")
            .vehicle_plate("ABC-123")
            .package_count(2)
    }

    #[test]
    fn valid_invoice_passes() {
        let draft = DraftBuilder::new(DocumentKind::Invoice, "F001")
            .party(
                PartyBuilder::tax_id("20123456789", "Minera Sur SA")
                    .address("Calle Real 100, Arequipa")
                    .build(),
            )
            .add_line(ticket())
            .build();
        assert!(ValidationEngine::new().validate(&draft).is_ok());
    }

    #[test]
    fn invoice_requires_tax_id_party() {
        let draft = DraftBuilder::new(DocumentKind::Invoice, "F001")
            .party(PartyBuilder::personal_id("12345678", "Ana Torres").build())
            .add_line(ticket())
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(err.fields(), vec!["party.doc_type", "party.address"]);
    }

    #[test]
    fn invoice_reports_all_missing_fields() {
        let draft = DraftBuilder::new(DocumentKind::Invoice, "B001")
            .party(PartyBuilder::tax_id("", "").build())
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(
            err.fields(),
            vec!["series", "party.name", "party.id_number", "party.address", "lines"]
        );
    }

    #[test]
    fn anonymous_receipt_passes() {
        let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
            .add_line(ticket())
            .build();
        assert!(ValidationEngine::new().validate(&draft).is_ok());
    }

    #[test]
    fn receipt_with_dni_requires_name_and_number() {
        let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
            .party(PartyBuilder::personal_id("", "").build())
            .add_line(ticket())
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(err.fields(), vec!["party.name", "party.id_number"]);
    }

    #[test]
    fn receipt_dni_format() {
        let draft = DraftBuilder::new(DocumentKind::Receipt, "B001")
            .party(PartyBuilder::personal_id("1234", "Ana Torres").build())
            .add_line(ticket())
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].rule.as_deref(), Some("ID-01"));
    }

    #[test]
    fn waybill_missing_license_only() {
        let draft = DraftBuilder::new(DocumentKind::Waybill, "T001")
            .party(PartyBuilder::tax_id("20123456789", "Minera Sur SA").build())
            .add_line(
                LineItemBuilder::new("Cajas de repuestos", dec!(2), dec!(0))
                    .weight_kg(dec!(35.5))
                    .build(),
            )
            .waybill(
                waybill_details()
                    .driver("45678912", "Juan Pérez Quispe", "")
                    .build(),
            )
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(err.fields(), vec!["waybill.driver.license"]);
    }

    #[test]
    fn waybill_zone_codes_and_weight() {
        let draft = DraftBuilder::new(DocumentKind::Waybill, "T001")
            .party(PartyBuilder::tax_id("20123456789", "Minera Sur SA").build())
            .add_line(LineItemBuilder::new("Sobre", dec!(1), dec!(0)).build())
            .waybill(
                waybill_details()
                    .origin("Av. Grau 1", "15011")
                    .destination("Jr. Lima 2", "13O101")
                    .build(),
            )
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(
            err.fields(),
            vec![
                "waybill.origin.zone_code",
                "waybill.destination.zone_code",
                "total_gross_weight"
            ]
        );
    }

    #[test]
    fn waybill_without_details() {
        let draft = DraftBuilder::new(DocumentKind::Waybill, "T001")
            .party(PartyBuilder::tax_id("20123456789", "Minera Sur SA").build())
            .add_line(
                LineItemBuilder::new("Sobre", dec!(1), dec!(0))
                    .weight_kg(dec!(0.2))
                    .build(),
            )
            .build();
        let err = ValidationEngine::new().validate(&draft).unwrap_err();
        assert_eq!(err.fields(), vec!["waybill"]);
    }

    #[test]
    fn zone_code_format() {
        assert!(is_zone_code("150101"));
        assert!(!is_zone_code("15010"));
        assert!(!is_zone_code("1501011"));
        assert!(!is_zone_code("15O101"));
    }
}
