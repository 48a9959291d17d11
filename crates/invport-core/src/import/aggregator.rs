//! Grouping of extracted lines into invoices keyed by invoice number.

use std::collections::HashMap;

use tracing::warn;

use crate::models::invoice::{InvoiceAggregate, InvoiceHeader};

/// Insertion-ordered map from invoice number to aggregate.
///
/// Keys are compared exactly, so `INV-1` and `inv-1` are different invoices.
#[derive(Debug, Default)]
pub struct Aggregator {
    index: HashMap<String, usize>,
    invoices: Vec<InvoiceAggregate>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the aggregate for `number`, creating it from `make_header` on first sight.
    pub fn get_or_insert_with(
        &mut self,
        number: &str,
        make_header: impl FnOnce() -> InvoiceHeader,
    ) -> &mut InvoiceAggregate {
        let position = match self.index.get(number) {
            Some(&i) => i,
            None => {
                let i = self.invoices.len();
                self.invoices.push(InvoiceAggregate::new(make_header()));
                self.index.insert(number.to_string(), i);
                i
            }
        };
        &mut self.invoices[position]
    }

    /// Insert an aggregate under its own invoice number unless already present.
    pub fn insert(&mut self, header: InvoiceHeader) -> &mut InvoiceAggregate {
        let number = header.invoice_number.clone();
        self.get_or_insert_with(&number, || header)
    }

    pub fn get_mut(&mut self, number: &str) -> Option<&mut InvoiceAggregate> {
        let i = *self.index.get(number)?;
        self.invoices.get_mut(i)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.index.contains_key(number)
    }

    /// Compute totals for every invoice and return them in first-seen order.
    ///
    /// Totals that overflow are left at zero and reported by validation.
    pub fn finish(self) -> Vec<InvoiceAggregate> {
        let mut invoices = self.invoices;
        for invoice in &mut invoices {
            if !invoice.recalculate() {
                warn!("Totals of invoice {} are out of range", invoice.invoice_number());
            }
        }
        invoices
    }
}
