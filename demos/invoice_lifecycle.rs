use comprobante::core::*;
use comprobante::lifecycle::*;
use parking_lot::Mutex;
use rust_decimal_macros::dec;

/// Gateway that holds every document until `decide` is called.
#[derive(Default)]
struct DeskGateway {
    verdict: Mutex<Option<GatewayStatus>>,
}

impl DeskGateway {
    fn decide(&self, status: GatewayStatus) {
        *self.verdict.lock() = Some(status);
    }
}

impl Gateway for DeskGateway {
    fn dispatch(&self, payload: &GatewayPayload) -> Result<(), GatewayError> {
        println!("-> gateway: {}", payload.to_json().unwrap_or_default());
        Ok(())
    }

    fn status(&self, _id: &DocumentNumber) -> Result<GatewayStatus, GatewayError> {
        Ok(self.verdict.lock().clone().unwrap_or(GatewayStatus::Pending))
    }
}

fn main() {
    let series = InMemorySeriesStore::new();
    series.configure(DocumentKind::Invoice, "F001", 0).unwrap();

    let engine = DocumentLifecycle::new(
        series,
        InMemoryDocumentStore::new(),
        DeskGateway::default(),
        LifecycleConfig::default(),
    )
    .unwrap();

    let draft = DraftBuilder::new(DocumentKind::Invoice, "F001")
        .party(
            PartyBuilder::tax_id("20100047218", "Agroexportadora del Sur SAC")
                .address("Av. Ejército 710, Yanahuara, Arequipa")
                .build(),
        )
        .add_line(LineItemBuilder::new("Flete", dec!(1), dec!(10.00)).build())
        .add_line(LineItemBuilder::new("Embalaje", dec!(2), dec!(5.00)).build())
        .build();

    let invoice = engine.submit(draft).unwrap();
    println!("{} is {}", invoice.display_number(), invoice.status());
    println!("  Subtotal: {:>8}", invoice.subtotal());
    println!("  IGV:      {:>8}", invoice.tax_amount());
    println!("  Total:    {:>8}", invoice.total());

    // Nothing decided yet: the document stays pending.
    let polled = engine.poll(invoice.id()).unwrap();
    println!("{} is {}", polled.display_number(), polled.status());

    engine.gateway().decide(GatewayStatus::Accepted);
    let accepted = engine.poll(invoice.id()).unwrap();
    println!("{} is {}", accepted.display_number(), accepted.status());

    let voided = engine.void(invoice.id(), "error en la razón social").unwrap();
    println!(
        "{} is {} ({})",
        voided.display_number(),
        voided.status(),
        voided.void_reason().unwrap_or_default()
    );

    // A second submit of an invalid draft reports every failing field.
    let incomplete = DraftBuilder::new(DocumentKind::Invoice, "F001")
        .party(PartyBuilder::tax_id("2010004721", "").build())
        .build();
    match engine.submit(incomplete) {
        Ok(doc) => println!("unexpectedly issued {}", doc.display_number()),
        Err(DocumentError::Validation(err)) => {
            println!("refused:");
            for violation in &err.violations {
                println!("  {violation}");
            }
        }
        Err(err) => println!("refused: {err}"),
    }
}
