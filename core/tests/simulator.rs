//! Price simulation and sensitivity sweep tests.
//!
//! Tests cover: the zero-change identity, known linear predictions, the
//! zero-baseline percentage rule, unknown products, price validation,
//! model failures, the 20-point curve and the sample model artifact.

use chrono::{NaiveDate, TimeZone, Utc};
use elasticity_core::{
    config::SensitivityConfig,
    error::PanelError,
    model::{ModelBundle, PricingModel},
    reference::{ProductRecord, ReferenceData},
    simulator::{pct_change, PriceChange, PricingSimulator, MAX_CURVE_POINTS},
};
use std::sync::Arc;

const INTERCEPT: f64 = 5.0;
const PRICE_COEF: f64 = -0.05;

fn reference_date() -> NaiveDate {
    // Outside every seasonal window.
    NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
}

fn record(item: &str, price: f64, sales: f64) -> ProductRecord {
    ProductRecord {
        item_name:       item.to_string(),
        current_price:   price,
        simulated_price: price,
        variation_pct:   0.0,
        predicted_sales: sales,
        updated_at:      Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    }
}

fn bundle_with(intercept: f64, price_coef: f64) -> ModelBundle {
    let columns = ["PRECO_SIMULADO", "PRECO_ATUAL", "ITEM_Shampoo", "ITEM_Conditioner", "eh_black_friday"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    ModelBundle::new(
        "test",
        columns,
        PricingModel::Linear {
            intercept,
            coefficients: vec![price_coef, 0.0, 0.3, 0.1, 0.2],
        },
    )
    .unwrap()
}

fn simulator_with(bundle: ModelBundle) -> PricingSimulator {
    let reference = ReferenceData::from_rows(vec![
        record("Shampoo", 20.0, 100.0),
        record("Conditioner", 35.5, 42.0),
        record("Freebie", 10.0, 0.0),
        record("Unlisted", 12.0, 7.0),
    ]);
    PricingSimulator::new(
        Arc::new(bundle),
        Arc::new(reference),
        reference_date(),
        SensitivityConfig::default(),
        0.10,
    )
}

fn simulator() -> PricingSimulator {
    simulator_with(bundle_with(INTERCEPT, PRICE_COEF))
}

fn expected_sales(price: f64, item_coef: f64) -> f64 {
    (INTERCEPT + (PRICE_COEF * price + item_coef)).exp_m1().round().max(0.0)
}

#[test]
fn unchanged_price_gives_exact_zero_deltas() {
    let sim = simulator();
    for change in [PriceChange::Percent(0.0), PriceChange::Target(20.0)] {
        let r = sim.simulate("Shampoo", change).unwrap().unwrap();
        assert_eq!(r.new_price, 20.0);
        assert_eq!(r.price_change_pct, 0.0);
        assert_eq!(r.predicted_sales, 100.0);
        assert_eq!(r.sales_change, 0.0);
        assert_eq!(r.sales_change_pct, 0.0);
        assert_eq!(r.revenue_change, 0.0);
        assert_eq!(r.revenue_change_pct, 0.0);
        assert_eq!(r.current_revenue, 2000.0);
    }
}

#[test]
fn target_price_uses_model_prediction() {
    let sim = simulator();
    let r = sim.simulate("Shampoo", PriceChange::Target(22.0)).unwrap().unwrap();

    let predicted = expected_sales(22.0, 0.3);
    assert_eq!(r.predicted_sales, predicted);
    assert_eq!(r.predicted_revenue, 22.0 * predicted);
    assert_eq!(r.sales_change, predicted - 100.0);
    assert!((r.price_change_pct - 10.0).abs() < 1e-9);
    assert!((r.sales_change_pct - (predicted - 100.0)).abs() < 1e-9);
    assert!((r.revenue_change_pct - (22.0 * predicted - 2000.0) / 2000.0 * 100.0).abs() < 1e-9);
}

#[test]
fn percent_change_resolves_against_current_price() {
    let sim = simulator();
    let r = sim.simulate("Conditioner", PriceChange::Percent(-5.0)).unwrap().unwrap();
    assert!((r.new_price - 35.5 * 0.95).abs() < 1e-9);
    assert!((r.price_change_pct + 5.0).abs() < 1e-9);
    assert_eq!(r.predicted_sales, expected_sales(r.new_price, 0.1));
}

#[test]
fn product_identity_column_is_one_hot() {
    let sim = simulator();
    let shampoo = sim.predict_sales(&record("Shampoo", 20.0, 1.0), 25.0).unwrap();
    let unlisted = sim.predict_sales(&record("Unlisted", 20.0, 1.0), 25.0).unwrap();
    assert_eq!(shampoo, expected_sales(25.0, 0.3));
    // No ITEM_ column for this product: identity stays at zero.
    assert_eq!(unlisted, expected_sales(25.0, 0.0));
}

#[test]
fn zero_baseline_percentages_are_zero() {
    let sim = simulator();
    let r = sim.simulate("Freebie", PriceChange::Percent(10.0)).unwrap().unwrap();
    assert_eq!(r.current_sales, 0.0);
    assert_eq!(r.current_revenue, 0.0);
    assert!(r.predicted_sales > 0.0);
    assert_eq!(r.sales_change_pct, 0.0);
    assert_eq!(r.revenue_change_pct, 0.0);
    assert_eq!(pct_change(5.0, 0.0), 0.0);
    assert_eq!(pct_change(5.0, -1.0), 0.0);
}

#[test]
fn unknown_product_is_none() {
    let sim = simulator();
    assert!(sim.simulate("Nope", PriceChange::Percent(5.0)).unwrap().is_none());
    assert!(sim.sensitivity_curve("Nope", 20).unwrap().is_none());
    assert!(sim.price_bounds("Nope").is_none());
}

#[test]
fn non_positive_prices_are_rejected() {
    let sim = simulator();
    for change in [
        PriceChange::Target(0.0),
        PriceChange::Target(-3.0),
        PriceChange::Target(f64::NAN),
        PriceChange::Percent(-100.0),
    ] {
        let err = sim.simulate("Shampoo", change).unwrap_err();
        assert!(matches!(err, PanelError::Validation(_)), "{change:?}: {err:?}");
    }
}

#[test]
fn predictions_never_go_negative() {
    let sim = simulator_with(bundle_with(-20.0, PRICE_COEF));
    let r = sim.simulate("Shampoo", PriceChange::Percent(5.0)).unwrap().unwrap();
    assert_eq!(r.predicted_sales, 0.0);
    assert_eq!(r.predicted_revenue, 0.0);
}

#[test]
fn non_finite_model_output_is_an_inference_error() {
    let sim = simulator_with(bundle_with(0.0, f64::MAX));
    let err = sim.simulate("Shampoo", PriceChange::Percent(5.0)).unwrap_err();
    assert!(matches!(err, PanelError::Inference(_)), "got {err:?}");
    assert!(err.is_retryable());
}

/// A finite log prediction can still overflow once exponentiated.
#[test]
fn overflowing_sales_prediction_is_an_inference_error() {
    let sim = simulator_with(bundle_with(800.0, PRICE_COEF));
    let err = sim.simulate("Shampoo", PriceChange::Percent(5.0)).unwrap_err();
    assert!(matches!(err, PanelError::Inference(_)), "got {err:?}");

    let err = sim.sensitivity_curve("Shampoo", 5).unwrap_err();
    assert!(matches!(err, PanelError::Inference(_)), "got {err:?}");
}

#[test]
fn unchanged_price_keeps_recorded_sales_unrounded() {
    let reference = ReferenceData::from_rows(vec![record("Shampoo", 20.0, 100.4)]);
    let sim = PricingSimulator::new(
        Arc::new(bundle_with(INTERCEPT, PRICE_COEF)),
        Arc::new(reference),
        reference_date(),
        SensitivityConfig::default(),
        0.10,
    );

    let r = sim.simulate("Shampoo", PriceChange::Percent(0.0)).unwrap().unwrap();
    assert_eq!(r.predicted_sales, 100.4);
    assert_eq!(r.sales_change, 0.0);
    assert_eq!(r.revenue_change, 0.0);

    // The 1.0x curve point goes through the model and is rounded.
    let curve = sim.sensitivity_curve("Shampoo", 3).unwrap().unwrap();
    assert_eq!(curve[1].price, 20.0);
    assert_eq!(curve[1].predicted_sales, expected_sales(20.0, 0.3));
    assert_eq!(curve[1].predicted_sales.fract(), 0.0);
}

#[test]
fn default_curve_has_twenty_increasing_points() {
    let sim = simulator();
    let curve = sim.default_sensitivity_curve("Shampoo").unwrap().unwrap();

    assert_eq!(curve.len(), 20);
    assert_eq!(curve[0].price, 20.0 * 0.8);
    assert_eq!(curve[19].price, 20.0 * 1.2);
    for pair in curve.windows(2) {
        assert!(pair[0].price < pair[1].price);
        // Negative price coefficient: sales never rise with price.
        assert!(pair[0].predicted_sales >= pair[1].predicted_sales);
    }
    for p in &curve {
        assert_eq!(p.predicted_sales, expected_sales(p.price, 0.3));
        assert_eq!(p.predicted_revenue, p.price * p.predicted_sales);
    }
}

#[test]
fn curve_needs_two_points() {
    let sim = simulator();
    assert!(matches!(sim.sensitivity_curve("Shampoo", 1), Err(PanelError::Validation(_))));
    let two = sim.sensitivity_curve("Shampoo", 2).unwrap().unwrap();
    assert_eq!(two.len(), 2);
}

#[test]
fn curve_point_count_is_capped() {
    let sim = simulator();
    for n in [MAX_CURVE_POINTS + 1, usize::MAX / 2, usize::MAX] {
        let err = sim.sensitivity_curve("Shampoo", n).unwrap_err();
        assert!(matches!(err, PanelError::Validation(_)), "{n}: {err:?}");
    }
    let full = sim.sensitivity_curve("Shampoo", MAX_CURVE_POINTS).unwrap().unwrap();
    assert_eq!(full.len(), MAX_CURVE_POINTS);
    assert_eq!(full[MAX_CURVE_POINTS - 1].price, 20.0 * 1.2);
}

#[test]
fn price_bounds_are_ten_percent_band() {
    let sim = simulator();
    let b = sim.price_bounds("Shampoo").unwrap();
    assert_eq!(b.current, 20.0);
    assert!((b.min - 18.0).abs() < 1e-9);
    assert!((b.max - 22.0).abs() < 1e-9);
    assert!(b.contains(20.0));
    assert!(!b.contains(23.0));
}

#[test]
fn seasonal_flags_reach_the_model() {
    let bundle = Arc::new(bundle_with(INTERCEPT, PRICE_COEF));
    let reference = Arc::new(ReferenceData::from_rows(vec![record("Shampoo", 20.0, 100.0)]));
    let black_friday = NaiveDate::from_ymd_opt(2024, 11, 20).unwrap();
    let sim = PricingSimulator::new(bundle, reference, black_friday, SensitivityConfig::default(), 0.10);

    let sales = sim.predict_sales(&record("Shampoo", 20.0, 100.0), 22.0).unwrap();
    assert_eq!(sales, (INTERCEPT + ((PRICE_COEF * 22.0 + 0.3) + 0.2)).exp_m1().round());
}

#[test]
fn bundled_sample_model_decodes_and_predicts() {
    let bytes = include_bytes!("../../artifacts/panel-artifacts/models/elasticity/model.json");
    let bundle = ModelBundle::from_slice(bytes).unwrap();
    assert!(bundle.has_column("ITEM_Detangler Original"));

    let reference = ReferenceData::from_rows(vec![record("Detangler Original", 49.9, 120.0)]);
    let sim = PricingSimulator::new(
        Arc::new(bundle),
        Arc::new(reference),
        reference_date(),
        SensitivityConfig::default(),
        0.10,
    );
    let curve = sim.default_sensitivity_curve("Detangler Original").unwrap().unwrap();
    assert!(curve.first().unwrap().predicted_sales >= curve.last().unwrap().predicted_sales);
}

#[test]
fn corrupt_model_artifact_is_an_inference_error() {
    let err = ModelBundle::from_slice(b"{\"version\": 1}").unwrap_err();
    assert!(matches!(err, PanelError::Inference(_)));
}
