//! Derived-table aggregator: results rows sectioned by business.
//!
//! Purely structural. Rows are grouped, never summed; the TOTAL / AVERAGE
//! mode only records which endpoint produced them.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{ResultRow, ResultsTable, TableMode};

/// Result rows grouped by business, in ascending business order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedResults {
    pub mode: TableMode,
    pub current_period: String,
    pub prior_period: String,
    groups: BTreeMap<String, Vec<ResultRow>>,
}

impl GroupedResults {
    /// Group a flat row sequence. Relative order within a business is kept.
    pub fn from_rows(mode: TableMode, rows: impl IntoIterator<Item = ResultRow>) -> Self {
        let mut groups: BTreeMap<String, Vec<ResultRow>> = BTreeMap::new();
        for row in rows {
            groups.entry(row.business.clone()).or_default().push(row);
        }
        Self {
            mode,
            current_period: String::new(),
            prior_period: String::new(),
            groups,
        }
    }

    /// Group a results-table payload, using its flat `filas` list.
    pub fn from_table(table: ResultsTable) -> Self {
        let rows = if table.rows.is_empty() {
            table.rows_by_business.into_values().flatten().collect()
        } else {
            table.rows
        };
        let mut grouped = Self::from_rows(table.mode, rows);
        grouped.current_period = table.current_period;
        grouped.prior_period = table.prior_period;
        grouped
    }

    /// Businesses in display order.
    pub fn businesses(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Rows of one business; empty when the business is absent.
    pub fn rows_for(&self, business: &str) -> &[ResultRow] {
        self.groups.get(business).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(business, rows)` sections in display order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[ResultRow])> {
        self.groups.iter().map(|(b, rows)| (b.as_str(), rows.as_slice()))
    }

    pub fn row_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
