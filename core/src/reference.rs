//! Read-only product reference data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    error::PanelResult,
    store::PanelStore,
    types::{ItemName, Timestamp},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub item_name:       ItemName,
    pub current_price:   f64,
    pub simulated_price: f64,
    pub variation_pct:   f64,
    pub predicted_sales: f64,
    pub updated_at:      Timestamp,
}

impl ProductRecord {
    pub fn current_revenue(&self) -> f64 {
        self.current_price * self.predicted_sales
    }
}

/// One record per product, the freshest `updated_at` winning.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    records: Vec<ProductRecord>,
    index:   HashMap<ItemName, usize>,
}

impl ReferenceData {
    /// Build from rows already ordered freshest first; later duplicates
    /// of an item are discarded.
    pub fn from_rows(rows: Vec<ProductRecord>) -> Self {
        let mut data = Self::default();
        for row in rows {
            if data.index.contains_key(&row.item_name) {
                continue;
            }
            data.index.insert(row.item_name.clone(), data.records.len());
            data.records.push(row);
        }
        data
    }

    pub fn load(store: &PanelStore, table: &str) -> PanelResult<Self> {
        let rows = store.product_records(table)?;
        let total = rows.len();
        let data = Self::from_rows(rows);
        if data.is_empty() {
            log::warn!("reference: table {table} returned no rows");
        } else {
            log::info!(
                "reference: loaded {} products from {total} rows of {table}",
                data.len()
            );
        }
        Ok(data)
    }

    pub fn get(&self, item_name: &str) -> Option<&ProductRecord> {
        self.index.get(item_name).map(|&i| &self.records[i])
    }

    /// Product names in freshness order, for the selector.
    pub fn item_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.item_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
