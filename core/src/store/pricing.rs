//! Store methods for the pricing reference table.
//!
//! The table name comes from validated configuration (see
//! `PanelConfig::validate`); values are always bound as parameters.

use rusqlite::params;

use super::{decode_timestamp, encode_timestamp, PanelStore};
use crate::{error::PanelResult, reference::ProductRecord};

impl PanelStore {
    /// All rows, freshest first. Ties on updated_at fall back to insertion order, newest first.
    pub fn product_records(&self, table: &str) -> PanelResult<Vec<ProductRecord>> {
        let sql = format!(
            "SELECT item_name, current_price, simulated_price, variation_pct,
                    predicted_sales, updated_at
             FROM {table}
             ORDER BY updated_at DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProductRecord {
                    item_name:       row.get(0)?,
                    current_price:   row.get(1)?,
                    simulated_price: row.get(2)?,
                    variation_pct:   row.get(3)?,
                    predicted_sales: row.get(4)?,
                    updated_at:      decode_timestamp(5, &row.get::<_, String>(5)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn insert_product_record(&self, table: &str, record: &ProductRecord) -> PanelResult<()> {
        let sql = format!(
            "INSERT INTO {table} (item_name, current_price, simulated_price, variation_pct,
                                  predicted_sales, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
        self.conn.execute(
            &sql,
            params![
                record.item_name,
                record.current_price,
                record.simulated_price,
                record.variation_pct,
                record.predicted_sales,
                encode_timestamp(&record.updated_at),
            ],
        )?;
        Ok(())
    }
}
