//! Price-change simulation and sensitivity sweep.
//!
//! For a product and a candidate price, build one model input row,
//! predict sales, and compare against the product's recorded sales and
//! revenue (revenue = price × sales).
//!
//! Both operations return `Ok(None)` when the product is not in the
//! loaded reference set. Model failures come back as
//! `PanelError::Inference`, never as a zero prediction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::SensitivityConfig,
    error::{PanelError, PanelResult},
    features::derive_features,
    model::{expm1_sales, ModelBundle},
    reference::{ProductRecord, ReferenceData},
};

/// One-hot column prefix for the product identity.
pub const ITEM_COLUMN_PREFIX: &str = "ITEM_";

/// Upper bound on sensitivity curve samples.
pub const MAX_CURVE_POINTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum PriceChange {
    /// Explicit candidate price.
    Target(f64),
    /// Change relative to the current price, in percent.
    Percent(f64),
}

impl PriceChange {
    pub fn resolve(&self, current_price: f64) -> f64 {
        match *self {
            PriceChange::Target(price) => price,
            PriceChange::Percent(pct) => current_price * (1.0 + pct / 100.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub item_name:          String,
    pub current_price:      f64,
    pub new_price:          f64,
    pub price_change_pct:   f64,
    pub current_sales:      f64,
    pub predicted_sales:    f64,
    pub sales_change:       f64,
    pub sales_change_pct:   f64,
    pub current_revenue:    f64,
    pub predicted_revenue:  f64,
    pub revenue_change:     f64,
    pub revenue_change_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub price:             f64,
    pub predicted_sales:   f64,
    pub predicted_revenue: f64,
}

/// Allowed range for the candidate price input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceBounds {
    pub current: f64,
    pub min:     f64,
    pub max:     f64,
}

impl PriceBounds {
    /// `current × (1 ± band)`.
    pub fn around(current: f64, band: f64) -> Self {
        Self {
            current,
            min: current * (1.0 - band),
            max: current * (1.0 + band),
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

pub struct PricingSimulator {
    bundle:         Arc<ModelBundle>,
    reference:      Arc<ReferenceData>,
    reference_date: NaiveDate,
    sweep:          SensitivityConfig,
    price_band:     f64,
}

impl PricingSimulator {
    pub fn new(
        bundle: Arc<ModelBundle>,
        reference: Arc<ReferenceData>,
        reference_date: NaiveDate,
        sweep: SensitivityConfig,
        price_band: f64,
    ) -> Self {
        Self { bundle, reference, reference_date, sweep, price_band }
    }

    pub fn simulate(&self, item_name: &str, change: PriceChange) -> PanelResult<Option<SimulationResult>> {
        let Some(record) = self.reference.get(item_name) else {
            log::debug!("simulator: product '{item_name}' not in reference set");
            return Ok(None);
        };
        let current_price = record.current_price;
        let new_price = change.resolve(current_price);
        check_price(new_price)?;

        // The recorded sales are the forecast at the current price, so an
        // unchanged price reproduces them exactly. They are used as stored,
        // unrounded, and may differ from the model's integer prediction at
        // the same price (the 1.0x point of the sensitivity curve).
        let predicted_sales = if new_price == current_price {
            record.predicted_sales
        } else {
            self.predict_sales(record, new_price)?
        };

        let current_sales = record.predicted_sales;
        let current_revenue = record.current_revenue();
        let predicted_revenue = new_price * predicted_sales;
        let sales_change = predicted_sales - current_sales;
        let revenue_change = predicted_revenue - current_revenue;

        let result = SimulationResult {
            item_name: record.item_name.clone(),
            current_price,
            new_price,
            price_change_pct: pct_change(new_price - current_price, current_price),
            current_sales,
            predicted_sales,
            sales_change,
            sales_change_pct: pct_change(sales_change, current_sales),
            current_revenue,
            predicted_revenue,
            revenue_change,
            revenue_change_pct: pct_change(revenue_change, current_revenue),
        };
        log::debug!(
            "simulator: {item_name} price {current_price:.2} -> {new_price:.2}, sales {current_sales} -> {predicted_sales}"
        );
        Ok(Some(result))
    }

    /// Sweep from `low_factor` to `high_factor` × current price over
    /// `num_points` samples, both endpoints included.
    pub fn sensitivity_curve(
        &self,
        item_name: &str,
        num_points: usize,
    ) -> PanelResult<Option<Vec<SensitivityPoint>>> {
        if !(2..=MAX_CURVE_POINTS).contains(&num_points) {
            return Err(PanelError::Validation(format!(
                "a sensitivity curve needs 2 to {MAX_CURVE_POINTS} points, got {num_points}"
            )));
        }
        let Some(record) = self.reference.get(item_name) else {
            return Ok(None);
        };
        check_price(record.current_price)?;

        let low = record.current_price * self.sweep.low_factor;
        let high = record.current_price * self.sweep.high_factor;
        let step = (high - low) / (num_points - 1) as f64;

        let mut points = Vec::with_capacity(num_points);
        for i in 0..num_points {
            let price = if i == num_points - 1 { high } else { low + step * i as f64 };
            let predicted_sales = self.predict_sales(record, price)?;
            points.push(SensitivityPoint {
                price,
                predicted_sales,
                predicted_revenue: price * predicted_sales,
            });
        }
        Ok(Some(points))
    }

    /// Curve with the configured number of points.
    pub fn default_sensitivity_curve(&self, item_name: &str) -> PanelResult<Option<Vec<SensitivityPoint>>> {
        self.sensitivity_curve(item_name, self.sweep.points)
    }

    pub fn price_bounds(&self, item_name: &str) -> Option<PriceBounds> {
        self.reference
            .get(item_name)
            .map(|r| PriceBounds::around(r.current_price, self.price_band))
    }

    /// Model prediction in real units for `record` priced at `price`.
    pub fn predict_sales(&self, record: &ProductRecord, price: f64) -> PanelResult<f64> {
        let mut row = self.bundle.input_row();
        row.set("PRECO_SIMULADO", price);
        row.set("PRECO_MEDIO", price);
        row.set("PRECO_ATUAL", record.current_price);
        row.set("VARIACAO_PERCENTUAL", record.variation_pct);
        row.set("VENDAS_PREVISTAS", record.predicted_sales);
        for (column, value) in derive_features(self.reference_date).columns() {
            row.set(column, value);
        }
        let item_column = format!("{ITEM_COLUMN_PREFIX}{}", record.item_name);
        if !row.set(&item_column, 1.0) {
            log::debug!("simulator: model has no column {item_column}, identity left at zero");
        }

        let pred_log = self.bundle.predict_log(&row)?;
        let sales = expm1_sales(pred_log);
        if !sales.is_finite() {
            return Err(PanelError::Inference(format!(
                "log prediction {pred_log} for {} overflows sales",
                record.item_name
            )));
        }
        Ok(sales)
    }
}

fn check_price(price: f64) -> PanelResult<()> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(PanelError::Validation(format!("price must be a positive number, got {price}")))
    }
}

/// Percentage change, defined as 0 when the baseline is 0.
pub fn pct_change(delta: f64, baseline: f64) -> f64 {
    if baseline > 0.0 {
        delta / baseline * 100.0
    } else {
        0.0
    }
}
