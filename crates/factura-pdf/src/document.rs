//! # Invoice Document View-Model
//!
//! The flat, id-free structure handed to the renderer. Everything the
//! document shows is copied in at composition time: product names, party
//! details, frozen prices. The document never reaches back into the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use factura_core::{Customer, Factory, Invoice, InvoiceItem, InvoiceStatus, Money, Product};

/// A billed or billing party as printed on the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetails {
    pub name: String,
    pub gstin: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<&Customer> for PartyDetails {
    fn from(customer: &Customer) -> Self {
        PartyDetails {
            name: customer.name.clone(),
            gstin: customer.gstin.clone(),
            phone: customer.phone.clone(),
            email: customer.email.clone(),
            address: customer.address.clone(),
        }
    }
}

impl From<&Factory> for PartyDetails {
    fn from(factory: &Factory) -> Self {
        PartyDetails {
            name: factory.name.clone(),
            gstin: factory.gstin.clone(),
            phone: factory.phone.clone(),
            email: factory.email.clone(),
            address: factory.address.clone(),
        }
    }
}

/// One row of the document's item table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentLine {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_price_cents: i64,
}

impl DocumentLine {
    /// Unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total as Money.
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// The composed invoice document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub status: InvoiceStatus,
    pub lines: Vec<DocumentLine>,
    pub total_cents: i64,
    pub tax_cents: Option<i64>,
    pub discount_cents: Option<i64>,
    pub notes: Option<String>,
    pub factory: PartyDetails,
    pub customer: PartyDetails,
}

impl InvoiceDocument {
    /// Composes the document from a saved invoice and its related records.
    ///
    /// `lines` pairs each item with its product so the table can show names
    /// instead of ids (see `InvoiceRepository::get_document_lines`).
    pub fn compose(
        invoice: &Invoice,
        customer: &Customer,
        factory: &Factory,
        lines: &[(InvoiceItem, Product)],
    ) -> Self {
        InvoiceDocument {
            invoice_number: invoice.invoice_number.clone(),
            date: invoice.date,
            due_date: invoice.due_date,
            status: invoice.status,
            lines: lines
                .iter()
                .map(|(item, product)| DocumentLine {
                    product_name: product.name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                    total_price_cents: item.total_price_cents,
                })
                .collect(),
            total_cents: invoice.total_cents,
            tax_cents: invoice.tax_cents,
            discount_cents: invoice.discount_cents,
            notes: invoice.notes.clone(),
            factory: PartyDetails::from(factory),
            customer: PartyDetails::from(customer),
        }
    }

    /// Subtotal (sum of line totals) as Money.
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Grand total for the totals block: `total + tax - discount`.
    pub fn grand_total(&self) -> Money {
        Money::from_cents(
            self.total_cents + self.tax_cents.unwrap_or(0) - self.discount_cents.unwrap_or(0),
        )
    }

    /// File name used when sharing the rendered document.
    ///
    /// ## Example
    /// `Invoice-INV-ADH20240315001.pdf`
    pub fn file_name(&self) -> String {
        format!("Invoice-{}.pdf", self.invoice_number)
    }

    /// Renders the printable HTML page.
    pub fn to_html(&self) -> String {
        crate::html::render(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

/// Fully-populated fixture shared by this crate's tests.
#[cfg(test)]
pub(crate) fn sample_document() -> InvoiceDocument {
    use chrono::Utc;
    use factura_core::generate_id;

    let now = Utc::now();
    let customer = Customer {
        id: generate_id(),
        name: "Sharma Traders".to_string(),
        gstin: "23AABCS5678G1Z9".to_string(),
        phone: "9898989898".to_string(),
        email: Some("accounts@sharmatraders.in".to_string()),
        address: Some("14 MG Road, Indore".to_string()),
        company: None,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    let factory = Factory {
        id: generate_id(),
        name: "Adhunik Textiles".to_string(),
        gstin: "23AACCA1234F1Z5".to_string(),
        phone: "9876543210".to_string(),
        email: None,
        address: Some("Plot 9, Industrial Area, Dewas".to_string()),
        code: Some("ADH".to_string()),
        created_at: now,
        updated_at: now,
    };
    let product = Product {
        id: generate_id(),
        factory_id: factory.id.clone(),
        name: "Cotton Fabric Roll".to_string(),
        sku: Some("CFR-10".to_string()),
        description: None,
        price_cents: 999,
        in_stock: true,
        created_at: now,
        updated_at: now,
    };
    let invoice = Invoice {
        id: generate_id(),
        invoice_number: "INV-ADH20240315001".to_string(),
        customer_id: customer.id.clone(),
        factory_id: factory.id.clone(),
        date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        due_date: None,
        status: InvoiceStatus::Pending,
        total_cents: 2498,
        tax_cents: Some(200),
        discount_cents: Some(100),
        notes: Some("Net 30".to_string()),
        created_at: now,
        updated_at: now,
    };
    let item = InvoiceItem {
        id: generate_id(),
        invoice_id: invoice.id.clone(),
        product_id: product.id.clone(),
        quantity: 2,
        unit_price_cents: 999,
        total_price_cents: 1998,
        created_at: now,
        updated_at: now,
    };
    let second_product = Product {
        id: generate_id(),
        name: "Silk Blend Sheet".to_string(),
        price_cents: 500,
        ..product.clone()
    };
    let second_item = InvoiceItem {
        id: generate_id(),
        product_id: second_product.id.clone(),
        quantity: 1,
        unit_price_cents: 500,
        total_price_cents: 500,
        ..item.clone()
    };

    InvoiceDocument::compose(
        &invoice,
        &customer,
        &factory,
        &[(item, product), (second_item, second_product)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_copies_names_and_frozen_prices() {
        let doc = sample_document();

        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].product_name, "Cotton Fabric Roll");
        assert_eq!(doc.lines[0].quantity, 2);
        assert_eq!(doc.lines[0].unit_price_cents, 999);
        assert_eq!(doc.lines[0].total_price_cents, 1998);

        assert_eq!(doc.factory.name, "Adhunik Textiles");
        assert_eq!(doc.customer.name, "Sharma Traders");
    }

    #[test]
    fn test_grand_total() {
        let doc = sample_document();
        assert_eq!(doc.total().cents(), 2498);
        assert_eq!(doc.grand_total().cents(), 2598);
    }

    #[test]
    fn test_file_name() {
        let doc = sample_document();
        assert_eq!(doc.file_name(), "Invoice-INV-ADH20240315001.pdf");
    }

    #[test]
    fn test_view_model_serializes_camel_case() {
        let doc = sample_document();
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["invoiceNumber"], "INV-ADH20240315001");
        assert_eq!(json["items"].as_array(), None); // lines, not items
        assert_eq!(json["lines"][0]["productName"], "Cotton Fabric Roll");
        assert_eq!(json["factory"]["gstin"], "23AACCA1234F1Z5");
    }
}
