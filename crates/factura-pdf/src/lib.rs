//! # factura-pdf: Printable Invoice Documents
//!
//! Composes a saved invoice into a document view-model and renders it as a
//! self-contained HTML page, ready for a platform print/PDF dialog or share
//! sheet.
//!
//! ## Rendering Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Document Pipeline                                  │
//! │                                                                         │
//! │  Invoice + Customer + Factory + [(InvoiceItem, Product)]               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InvoiceDocument::compose()  ← flat view-model, no ids                 │
//! │       │                                                                 │
//! │       ├──► document.file_name()  →  "Invoice-INV-ADH20240315001.pdf"   │
//! │       │                                                                 │
//! │       └──► document.to_html()    →  printable HTML page                │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │        platform print / share dialog (external collaborator)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod document;
pub mod html;

pub use document::{DocumentLine, InvoiceDocument, PartyDetails};
