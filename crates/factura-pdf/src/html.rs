//! # HTML Renderer
//!
//! Renders an [`InvoiceDocument`] into a self-contained printable page:
//! factory identity on the left, invoice metadata on the right, a bill-to
//! block, the item table, the totals block, and a notes footer.
//!
//! The output goes straight into a print/PDF dialog, so everything
//! (styles included) is inlined and all field values are HTML-escaped.

use chrono::NaiveDate;

use crate::document::{InvoiceDocument, PartyDetails};
use factura_core::Money;

/// Renders the complete HTML page for an invoice document.
pub fn render(doc: &InvoiceDocument) -> String {
    let mut page = String::with_capacity(4096);

    page.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <meta charset=\"utf-8\" />\n\
         <style>\n",
    );
    page.push_str(STYLES);
    page.push_str("</style>\n</head>\n<body>\n");

    render_header(&mut page, doc);
    render_bill_to(&mut page, &doc.customer);
    render_item_table(&mut page, doc);
    render_totals(&mut page, doc);
    render_notes(&mut page, doc);

    page.push_str("</body>\n</html>\n");
    page
}

const STYLES: &str = "\
body { font-family: 'Helvetica Neue', Helvetica, Arial, sans-serif; padding: 20px; color: #333; }
.invoice-header { display: flex; justify-content: space-between; margin-bottom: 40px; }
.invoice-title { font-size: 24px; font-weight: bold; margin-bottom: 20px; color: #007AFF; }
.invoice-meta { text-align: right; }
.invoice-meta .number { font-size: 18px; font-weight: bold; }
.bill-to { margin-bottom: 30px; }
.bill-to .label { font-weight: bold; margin-bottom: 10px; }
table { width: 100%; border-collapse: collapse; margin-bottom: 20px; }
th { background-color: #f2f2f2; text-align: left; padding: 10px 8px; }
td { padding: 8px; border-bottom: 1px solid #ddd; }
.totals { text-align: right; margin-top: 20px; }
.total-row { display: flex; justify-content: flex-end; margin-bottom: 5px; }
.total-label { width: 150px; font-weight: bold; }
.grand-total { font-size: 18px; font-weight: bold; color: #007AFF; margin-top: 10px; }
.notes { margin-top: 30px; border-top: 1px solid #ddd; padding-top: 20px; }
";

fn render_header(page: &mut String, doc: &InvoiceDocument) {
    page.push_str("<div class=\"invoice-header\">\n<div>\n");
    page.push_str("<div class=\"invoice-title\">INVOICE</div>\n");
    push_line(page, &doc.factory.name);
    push_line(page, &doc.factory.gstin);
    if let Some(address) = &doc.factory.address {
        push_line(page, address);
    }
    push_line(page, &format!("Phone: {}", doc.factory.phone));
    if let Some(email) = &doc.factory.email {
        push_line(page, &format!("Email: {email}"));
    }
    page.push_str("</div>\n<div class=\"invoice-meta\">\n");
    page.push_str(&format!(
        "<div class=\"number\">Invoice #{}</div>\n",
        escape(&doc.invoice_number)
    ));
    push_line(
        page,
        &format!("Status: {}", doc.status.to_string().to_uppercase()),
    );
    push_line(page, &format!("Date: {}", format_date(doc.date)));
    let due = match doc.due_date {
        Some(due) => format_date(due),
        None => "N/A".to_string(),
    };
    push_line(page, &format!("Due Date: {due}"));
    page.push_str("</div>\n</div>\n");
}

fn render_bill_to(page: &mut String, customer: &PartyDetails) {
    page.push_str("<div class=\"bill-to\">\n<div class=\"label\">Bill To:</div>\n");
    push_line(page, &customer.name);
    push_line(page, &customer.gstin);
    if let Some(address) = &customer.address {
        push_line(page, address);
    }
    if let Some(email) = &customer.email {
        push_line(page, email);
    }
    push_line(page, &customer.phone);
    page.push_str("</div>\n");
}

fn render_item_table(page: &mut String, doc: &InvoiceDocument) {
    page.push_str(
        "<table>\n<thead>\n<tr>\
         <th style=\"width: 5%\">#</th>\
         <th style=\"width: 40%\">Item</th>\
         <th style=\"width: 15%\">Quantity</th>\
         <th style=\"width: 20%\">Unit Price</th>\
         <th style=\"width: 20%\">Total</th>\
         </tr>\n</thead>\n<tbody>\n",
    );

    for (index, line) in doc.lines.iter().enumerate() {
        page.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            index + 1,
            escape(&line.product_name),
            line.quantity,
            line.unit_price(),
            line.total_price(),
        ));
    }

    page.push_str("</tbody>\n</table>\n");
}

fn render_totals(page: &mut String, doc: &InvoiceDocument) {
    page.push_str("<div class=\"totals\">\n");
    push_total_row(page, "Subtotal:", doc.total());
    if let Some(tax) = doc.tax_cents {
        push_total_row(page, "Tax:", Money::from_cents(tax));
    }
    if let Some(discount) = doc.discount_cents {
        push_total_row(page, "Discount:", Money::from_cents(discount));
    }
    page.push_str(&format!(
        "<div class=\"total-row grand-total\">\
         <div class=\"total-label\">Grand Total:</div><div>{}</div></div>\n",
        doc.grand_total()
    ));
    page.push_str("</div>\n");
}

fn render_notes(page: &mut String, doc: &InvoiceDocument) {
    if let Some(notes) = &doc.notes {
        page.push_str(&format!(
            "<div class=\"notes\"><div class=\"label\">Notes:</div><div>{}</div></div>\n",
            escape(notes)
        ));
    }
}

fn push_line(page: &mut String, text: &str) {
    page.push_str(&format!("<div>{}</div>\n", escape(text)));
}

fn push_total_row(page: &mut String, label: &str, amount: Money) {
    page.push_str(&format!(
        "<div class=\"total-row\">\
         <div class=\"total-label\">{label}</div><div>{amount}</div></div>\n",
    ));
}

/// Short display date, e.g. `Mar 15, 2024`.
fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Minimal HTML escaping for field values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
